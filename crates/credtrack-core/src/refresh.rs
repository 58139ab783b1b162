//! Refresh orchestrator: the engine's only public trigger surface.
//!
//! Serializes refresh requests behind a run lock with trailing-edge
//! coalescing, diffs desired vs scheduled, applies the plan through the
//! delivery collaborator, and keeps the schedule store consistent.
//!
//! Failure policy:
//! - store faults abort the run before any unpersisted platform change
//! - per-item delivery faults are counted, never propagated; the next
//!   refresh naturally retries them via the reconciler's diff
//! - missing permission degrades the run to cancel-only

use std::sync::{Arc, Mutex};

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::delivery::NotificationDelivery;
use crate::domain::{EventReminder, License, ProgressSnapshot, UserProfile};
use crate::error::{CoreError, Result};
use crate::notify::{build_desired, reconcile, ScheduledEntry};
use crate::storage::settings::NotificationSettings;
use crate::storage::ScheduleStore;

/// Read-only snapshot of everything a refresh derives its decision from.
///
/// Settings are passed explicitly on every invocation; there is no ambient
/// "current settings" singleton.
#[derive(Debug, Clone)]
pub struct RefreshInputs {
    pub settings: NotificationSettings,
    pub user: UserProfile,
    pub licenses: Vec<License>,
    pub events: Vec<EventReminder>,
    pub progress: ProgressSnapshot,
}

/// Aggregate counts returned to the caller for observability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshSummary {
    pub created: usize,
    pub cancelled: usize,
    pub rescheduled: usize,
    pub failed: usize,
    pub kept: usize,
    /// The run could not create or reschedule alerts (cleanup still ran).
    pub permission_limited: bool,
    /// This call was absorbed by an in-flight run's trailing pass.
    pub coalesced: bool,
    pub refreshed_at: NaiveDateTime,
}

impl RefreshSummary {
    fn empty(at: NaiveDateTime) -> Self {
        Self {
            created: 0,
            cancelled: 0,
            rescheduled: 0,
            failed: 0,
            kept: 0,
            permission_limited: false,
            coalesced: false,
            refreshed_at: at,
        }
    }
}

/// Display-only counters for the rest of the application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusStats {
    pub active_scheduled_count: usize,
    pub last_refresh_at: Option<NaiveDateTime>,
    /// Whether the last completed refresh ran in cancel-only mode.
    pub last_run_permission_limited: bool,
}

/// Orchestrates refreshes against a schedule store and delivery platform.
///
/// At most one refresh executes at a time; a call arriving mid-run lands
/// in a single-slot pending queue (latest wins) and triggers exactly one
/// trailing pass, so bursts of rapid data mutations collapse instead of
/// stacking.
pub struct ReminderScheduler {
    store: Mutex<ScheduleStore>,
    delivery: Arc<dyn NotificationDelivery>,
    run_lock: tokio::sync::Mutex<()>,
    pending: Mutex<Option<RefreshInputs>>,
    last_summary: Mutex<Option<RefreshSummary>>,
}

impl ReminderScheduler {
    pub fn new(store: ScheduleStore, delivery: Arc<dyn NotificationDelivery>) -> Self {
        Self {
            store: Mutex::new(store),
            delivery,
            run_lock: tokio::sync::Mutex::new(()),
            pending: Mutex::new(None),
            last_summary: Mutex::new(None),
        }
    }

    /// Recompute the desired set and make the schedule match it.
    ///
    /// Never fails for individual delivery-platform errors; only
    /// store/persistence faults abort the run.
    pub async fn refresh_all(&self, inputs: RefreshInputs) -> Result<RefreshSummary> {
        self.refresh_all_at(inputs, Local::now().naive_local()).await
    }

    /// Like [`refresh_all`](Self::refresh_all) with an explicit `now`.
    pub async fn refresh_all_at(
        &self,
        inputs: RefreshInputs,
        now: NaiveDateTime,
    ) -> Result<RefreshSummary> {
        self.pending.lock().unwrap().replace(inputs);
        let _run = self.run_lock.lock().await;

        // An in-flight run's trailing pass may have consumed our inputs
        // already; in that case the work is done and we report as much.
        let Some(inputs) = self.pending.lock().unwrap().take() else {
            let mut summary = self
                .last_summary
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| RefreshSummary::empty(now));
            summary.coalesced = true;
            return Ok(summary);
        };

        let summary = self.run(&inputs, now).await?;
        *self.last_summary.lock().unwrap() = Some(summary.clone());
        Ok(summary)
    }

    async fn run(&self, inputs: &RefreshInputs, now: NaiveDateTime) -> Result<RefreshSummary> {
        let desired = build_desired(
            &inputs.settings,
            &inputs.user,
            &inputs.licenses,
            &inputs.events,
            &inputs.progress,
            now,
        );
        let scheduled = self.store.lock().unwrap().list_all().map_err(CoreError::from)?;
        let plan = reconcile(&desired, &scheduled);
        let has_permission = self.delivery.has_permission().await;

        tracing::debug!(
            desired = desired.len(),
            scheduled = scheduled.len(),
            to_cancel = plan.to_cancel.len(),
            to_create = plan.to_create.len(),
            to_reschedule = plan.to_reschedule.len(),
            has_permission,
            "reconciled desired set"
        );

        let mut summary = RefreshSummary::empty(now);
        summary.kept = plan.kept;
        summary.permission_limited = !has_permission;

        // Cleanup is always safe, permission or not. The store row goes
        // away regardless of the cancel outcome: a failed cancel on an
        // alert that already fired is not an error.
        for entry in &plan.to_cancel {
            if let Err(err) = self.delivery.cancel(&entry.delivery_handle).await {
                tracing::debug!(handle = %entry.delivery_handle, %err, "cancel failed");
            }
            self.store.lock().unwrap().remove(&entry.identity)?;
            summary.cancelled += 1;
        }

        if has_permission {
            for item in &plan.to_create {
                match self.delivery.schedule(item.trigger_at, &item.payload).await {
                    Ok(handle) => {
                        let entry = ScheduledEntry::from_desired(item, handle);
                        self.store.lock().unwrap().upsert(&entry)?;
                        summary.created += 1;
                    }
                    Err(err) => {
                        tracing::warn!(entity = %item.identity.entity_id, %err, "schedule failed");
                        summary.failed += 1;
                    }
                }
            }

            for (old, item) in &plan.to_reschedule {
                if let Err(err) = self.delivery.cancel(&old.delivery_handle).await {
                    tracing::debug!(handle = %old.delivery_handle, %err, "cancel failed");
                }
                match self.delivery.schedule(item.trigger_at, &item.payload).await {
                    Ok(handle) => {
                        let entry = ScheduledEntry::from_desired(item, handle);
                        self.store.lock().unwrap().upsert(&entry)?;
                        summary.rescheduled += 1;
                    }
                    Err(err) => {
                        // Leave the existing store entry alone; the next
                        // refresh retries since the mismatch persists.
                        tracing::warn!(entity = %item.identity.entity_id, %err, "reschedule failed");
                        summary.failed += 1;
                    }
                }
            }
        } else if !plan.to_create.is_empty() || !plan.to_reschedule.is_empty() {
            tracing::warn!(
                skipped = plan.to_create.len() + plan.to_reschedule.len(),
                "notification permission not granted; skipping schedule calls"
            );
        }

        {
            let store = self.store.lock().unwrap();
            store.set_last_refresh_at(now)?;
            store.set_last_run_permission_limited(summary.permission_limited)?;
        }
        Ok(summary)
    }

    /// Display-only counters: active entry count and last refresh time.
    pub fn status_stats(&self) -> Result<StatusStats> {
        let store = self.store.lock().unwrap();
        Ok(StatusStats {
            active_scheduled_count: store.count()?,
            last_refresh_at: store.last_refresh_at()?,
            last_run_permission_limited: store.last_run_permission_limited()?,
        })
    }
}
