//! Reminder scheduling engine.
//!
//! This module decides which reminder notifications should exist at any
//! moment and how the persisted schedule must change to match:
//! - `policy`: per-category day-offset expansion into candidate triggers
//! - `quiet_hours`: deferral of triggers that land in the do-not-disturb window
//! - `desired`: composition of all domain inputs into the desired set
//! - `reconcile`: three-way diff of desired vs currently-scheduled

pub mod desired;
pub mod policy;
pub mod quiet_hours;
pub mod reconcile;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

pub use desired::build_desired;
pub use quiet_hours::adjust;
pub use reconcile::{reconcile, ReconcilePlan};

/// Reminder category, each independently configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderCategory {
    Cycle,
    License,
    Event,
}

impl ReminderCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderCategory::Cycle => "cycle",
            ReminderCategory::License => "license",
            ReminderCategory::Event => "event",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cycle" => Some(ReminderCategory::Cycle),
            "license" => Some(ReminderCategory::License),
            "event" => Some(ReminderCategory::Event),
            _ => None,
        }
    }
}

/// Kind of the source entity a reminder points back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Cycle,
    License,
    Event,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Cycle => "cycle",
            EntityKind::License => "license",
            EntityKind::Event => "event",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cycle" => Some(EntityKind::Cycle),
            "license" => Some(EntityKind::License),
            "event" => Some(EntityKind::Event),
            _ => None,
        }
    }
}

/// Stable key matching desired and scheduled reminders across refreshes.
///
/// Stays constant as long as the underlying deadline does not change; a
/// moved deadline is detected via `ScheduledEntry::deadline_snapshot`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReminderIdentity {
    pub category: ReminderCategory,
    pub entity_kind: EntityKind,
    pub entity_id: String,
    pub offset_days: u32,
}

/// Structured request content handed to the delivery collaborator.
///
/// The engine decides whether/when a notification exists; wording is the
/// delivery side's job, so the payload carries facts, not copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderPayload {
    pub category: ReminderCategory,
    pub entity_id: String,
    /// Display label of the source entity (license name, event title, ...).
    pub label: String,
    pub deadline: NaiveDate,
    pub offset_days: u32,
    /// Outstanding credits, present for cycle reminders only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_credits: Option<f64>,
}

/// A reminder that should exist right now.
///
/// Recomputed fresh on every refresh and discarded after reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesiredNotification {
    pub identity: ReminderIdentity,
    pub deadline: NaiveDate,
    pub trigger_at: NaiveDateTime,
    pub payload: ReminderPayload,
}

/// A reminder the engine has scheduled on the delivery platform.
///
/// Persisted in the schedule store; the store is the ground truth for
/// "currently scheduled" -- the platform is never enumerated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledEntry {
    pub identity: ReminderIdentity,
    pub trigger_at: NaiveDateTime,
    pub delivery_handle: String,
    /// Deadline at scheduling time, so a moved deadline forces a
    /// reschedule even when the identity tuple is unchanged.
    pub deadline_snapshot: NaiveDate,
}

impl ScheduledEntry {
    /// Build the store entry for a freshly scheduled desired reminder.
    pub fn from_desired(desired: &DesiredNotification, delivery_handle: String) -> Self {
        Self {
            identity: desired.identity.clone(),
            trigger_at: desired.trigger_at,
            delivery_handle,
            deadline_snapshot: desired.deadline,
        }
    }
}
