//! Quiet-hours adjustment: deferral, not suppression.

use chrono::{Days, NaiveDateTime};

use crate::storage::settings::QuietHoursConfig;

/// Shift `instant` forward to the end of the quiet window if it falls
/// inside one.
///
/// The window is half-open `[start, end)` in local time-of-day;
/// `start > end` means it wraps past midnight. Disabled (or degenerate
/// zero-length) windows return the input unchanged. Idempotent, and never
/// moves an instant earlier.
pub fn adjust(instant: NaiveDateTime, quiet: &QuietHoursConfig) -> NaiveDateTime {
    let Some((start, end)) = quiet.window() else {
        return instant;
    };

    let t = instant.time();
    if start < end {
        if t >= start && t < end {
            instant.date().and_time(end)
        } else {
            instant
        }
    } else if t >= start {
        // Window wraps midnight and we're on the near side: defer to
        // tomorrow's end time.
        match instant.date().checked_add_days(Days::new(1)) {
            Some(next_day) => next_day.and_time(end),
            None => instant,
        }
    } else if t < end {
        instant.date().and_time(end)
    } else {
        instant
    }
}
