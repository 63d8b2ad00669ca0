//! Time and timestamp utilities.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local};
use once_cell::sync::Lazy;
use std::fmt::Write;
use std::time::{Duration, Instant};

static PROCESS_START: Lazy<Instant> = Lazy::new(Instant::now);

/// Default sub-pattern for `%d` when none is given.
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Pin the reference instant used by [`elapsed`].
///
/// Called when the logger manager is built; later calls are no-ops.
pub fn mark_start() {
    Lazy::force(&PROCESS_START);
}

/// Time since [`mark_start`] (or the first call to this function).
pub fn elapsed() -> Duration {
    PROCESS_START.elapsed()
}

/// [`elapsed`] in whole milliseconds.
pub fn elapsed_ms() -> u64 {
    u64::try_from(elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Whether `format` is a strftime pattern chrono can render.
pub fn is_valid_strftime(format: &str) -> bool {
    !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

/// Append `timestamp` rendered with `format` to `out`.
///
/// Returns `false` and leaves `out` untouched if the format is invalid.
pub fn write_timestamp(out: &mut String, timestamp: &DateTime<Local>, format: &str) -> bool {
    if !is_valid_strftime(format) {
        return false;
    }
    let mark = out.len();
    if write!(out, "{}", timestamp.format(format)).is_err() {
        out.truncate(mark);
        return false;
    }
    true
}
