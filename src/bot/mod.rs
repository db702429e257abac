//! Bot orchestration engine: lifecycle, status mapping, transcript readiness
//! and reconciliation.

pub mod clock;
pub mod lifecycle;
pub mod readiness;
pub mod scheduler;
pub mod status;
pub mod transcript;

#[cfg(test)]
pub(crate) mod fake;

pub use clock::{Clock, ManualClock, SystemClock};
pub use lifecycle::{bot_display_name, BotLifecycleController, CreateOutcome, LifecycleError};
pub use readiness::{evaluate, FetchOutcome, QuiescenceWindows, Readiness, TranscriptReadinessEvaluator};
pub use scheduler::{ReconciliationScheduler, SweepReport};
pub use status::{BotStatus, MeetingStatus};
pub use transcript::extract_transcript;
