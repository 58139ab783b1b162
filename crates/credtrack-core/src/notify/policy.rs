//! Interval policy: day-offset expansion into candidate trigger instants.

use std::collections::BTreeSet;

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};

/// Fixed local time-of-day at which reminders are delivered.
pub const DELIVERY_HOUR: u32 = 9;

fn delivery_time() -> NaiveTime {
    // Falls back to midnight, unreachable for an in-range hour constant.
    NaiveTime::from_hms_opt(DELIVERY_HOUR, 0, 0).unwrap_or(NaiveTime::MIN)
}

/// Expand `offsets` against `deadline` into candidate trigger instants.
///
/// Each offset `d` produces `deadline - d days` at the fixed delivery
/// time-of-day. Candidates strictly in the past relative to `now` are
/// dropped -- a reminder whose window already elapsed must never be
/// (re)scheduled. A deadline in the past yields an empty set.
///
/// Offsets are deduplicated by the `BTreeSet`; results come back paired
/// with their offset so callers can build stable reminder identities.
pub fn expand(
    deadline: NaiveDate,
    offsets: &BTreeSet<u32>,
    now: NaiveDateTime,
) -> Vec<(u32, NaiveDateTime)> {
    if deadline < now.date() {
        return Vec::new();
    }

    offsets
        .iter()
        .filter_map(|&offset| {
            let day = deadline.checked_sub_days(Days::new(u64::from(offset)))?;
            let trigger = day.and_time(delivery_time());
            if trigger < now {
                None
            } else {
                Some((offset, trigger))
            }
        })
        .collect()
}
