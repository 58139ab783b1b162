//! Three-way diff between the desired set and the persisted schedule.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{DesiredNotification, ReminderIdentity, ScheduledEntry};

/// Instructions produced by [`reconcile`].
///
/// `to_reschedule` pairs are applied as cancel-existing-handle plus
/// create-new; `kept` counts matches needing no action.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconcilePlan {
    pub to_cancel: Vec<ScheduledEntry>,
    pub to_create: Vec<DesiredNotification>,
    pub to_reschedule: Vec<(ScheduledEntry, DesiredNotification)>,
    pub kept: usize,
}

impl ReconcilePlan {
    /// True when applying the plan would change nothing.
    pub fn is_noop(&self) -> bool {
        self.to_cancel.is_empty() && self.to_create.is_empty() && self.to_reschedule.is_empty()
    }
}

/// Diff `desired` against `scheduled`, both indexed by identity tuple.
///
/// - scheduled with no desired match: cancel (reason disappeared)
/// - desired with no scheduled match: create
/// - matching identity with a changed trigger instant or moved deadline:
///   reschedule
/// - otherwise: keep
///
/// This guarantees no duplicate alerts for an unchanged reminder and
/// prompt cleanup of alerts whose underlying reason disappeared.
pub fn reconcile(desired: &[DesiredNotification], scheduled: &[ScheduledEntry]) -> ReconcilePlan {
    let desired_by_identity: BTreeMap<&ReminderIdentity, &DesiredNotification> =
        desired.iter().map(|d| (&d.identity, d)).collect();
    let scheduled_by_identity: BTreeMap<&ReminderIdentity, &ScheduledEntry> =
        scheduled.iter().map(|s| (&s.identity, s)).collect();

    let mut plan = ReconcilePlan::default();

    for (identity, entry) in &scheduled_by_identity {
        match desired_by_identity.get(identity) {
            None => plan.to_cancel.push((*entry).clone()),
            Some(item) => {
                if item.trigger_at != entry.trigger_at || item.deadline != entry.deadline_snapshot {
                    plan.to_reschedule.push(((*entry).clone(), (*item).clone()));
                } else {
                    plan.kept += 1;
                }
            }
        }
    }

    for (identity, item) in &desired_by_identity {
        if !scheduled_by_identity.contains_key(*identity) {
            plan.to_create.push((*item).clone());
        }
    }

    plan
}
