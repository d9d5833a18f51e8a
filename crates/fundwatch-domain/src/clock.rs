//! Wall-clock helpers

use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds in one hour
pub const HOUR_SECS: u64 = 3600;

/// Seconds in one day
pub const DAY_SECS: u64 = 86_400;

/// Current timestamp in seconds since Unix epoch
///
/// A clock set before 1970 reads as 0 rather than failing.
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
