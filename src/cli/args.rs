use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "meetsync")]
#[command(about = "Send recording bots to calendar meetings and collect transcripts", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Run the API server and reconciliation loop (default)
    Serve,
    /// Run a single reconciliation sweep and exit
    Sweep,
    /// List recent meetings and their transcript state
    Meetings(MeetingsCliArgs),
    /// Print version information
    Version,
}

#[derive(ClapArgs, Debug)]
pub struct MeetingsCliArgs {
    /// Only show meetings for this user ID
    #[arg(short, long)]
    pub user: Option<i64>,
    /// Maximum number of results to show
    #[arg(short, long, default_value = "20")]
    pub limit: usize,
}
