pub mod args;
pub mod meetings;
pub mod sweep;

pub use args::{Cli, CliCommand, MeetingsCliArgs};
pub use meetings::handle_meetings_command;
pub use sweep::handle_sweep_command;
