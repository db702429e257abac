//! API route modules.

pub mod bots;
pub mod events;
pub mod meetings;
pub mod sweep;
pub mod users;

/// Default page size for list endpoints.
pub(crate) const DEFAULT_LIMIT: usize = 20;
/// Largest page size a client may request.
pub(crate) const MAX_LIMIT: usize = 200;

pub(crate) fn clamp_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}
