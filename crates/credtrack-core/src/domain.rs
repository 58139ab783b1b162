//! Domain records supplied by the surrounding application.
//!
//! The engine never mutates these; they arrive as a read-only snapshot at
//! refresh time. All dates are user-local wall-clock values.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// User profile fields relevant to cycle reminders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    /// Start date of the current (or an earlier) requirement cycle.
    pub cycle_start: NaiveDate,
    /// Cycle length in months (e.g. 24 for a two-year renewal cycle).
    pub cycle_months: u32,
}

impl UserProfile {
    /// End date of the requirement cycle that contains `today`.
    ///
    /// Rolls the cycle forward from `cycle_start` in `cycle_months`
    /// increments until the end falls after `today`. Returns `None` when
    /// the profile has no usable cycle length.
    pub fn current_cycle_end(&self, today: NaiveDate) -> Option<NaiveDate> {
        if self.cycle_months == 0 {
            return None;
        }
        let mut end = self.cycle_start.checked_add_months(Months::new(self.cycle_months))?;
        while end <= today {
            end = end.checked_add_months(Months::new(self.cycle_months))?;
        }
        Some(end)
    }
}

/// A professional license tracked by the application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct License {
    pub id: String,
    pub name: String,
    pub expires_on: NaiveDate,
}

/// A user-created reminder for an upcoming event (conference, course, exam).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventReminder {
    pub id: String,
    pub title: String,
    pub event_date: NaiveDate,
}

/// Credit progress for the current requirement cycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub earned: f64,
    pub required: f64,
}

impl ProgressSnapshot {
    /// Whether the cycle requirement is already met.
    pub fn is_complete(&self) -> bool {
        self.earned >= self.required
    }

    /// Credits still outstanding (never negative).
    pub fn remaining(&self) -> f64 {
        (self.required - self.earned).max(0.0)
    }
}
