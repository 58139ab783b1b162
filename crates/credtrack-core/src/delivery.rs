//! Delivery-platform collaborator contract.
//!
//! The engine only ever issues schedule/cancel commands; it never asks the
//! platform to enumerate alerts (platform-level listing may be unavailable
//! or slow). The schedule store remains the single source of truth.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::error::DeliveryError;
use crate::notify::ReminderPayload;

/// Every delivery platform implements this trait.
///
/// `cancel` must be idempotent: cancelling an already-fired or
/// already-cancelled handle is not an error.
#[async_trait]
pub trait NotificationDelivery: Send + Sync {
    /// Schedule an alert; returns the platform's handle for it.
    async fn schedule(
        &self,
        trigger_at: NaiveDateTime,
        payload: &ReminderPayload,
    ) -> Result<String, DeliveryError>;

    /// Cancel a previously scheduled alert.
    async fn cancel(&self, handle: &str) -> Result<(), DeliveryError>;

    /// Whether the platform currently allows scheduling alerts.
    async fn has_permission(&self) -> bool;

    /// Prompt for permission; returns the resulting grant state.
    async fn request_permission(&self) -> bool;
}

/// In-memory delivery platform for tests and dry runs.
///
/// Supports permission toggling and schedule-call failure injection so
/// orchestrator behavior under partial failure can be exercised.
pub struct MemoryDelivery {
    alerts: RwLock<HashMap<String, (NaiveDateTime, ReminderPayload)>>,
    permission: AtomicBool,
    fail_schedules: AtomicBool,
    fail_cancels: AtomicBool,
    schedule_calls: AtomicUsize,
    cancel_calls: AtomicUsize,
}

impl MemoryDelivery {
    /// Create a platform with permission granted.
    pub fn new() -> Self {
        Self {
            alerts: RwLock::new(HashMap::new()),
            permission: AtomicBool::new(true),
            fail_schedules: AtomicBool::new(false),
            fail_cancels: AtomicBool::new(false),
            schedule_calls: AtomicUsize::new(0),
            cancel_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_permission(&self, granted: bool) {
        self.permission.store(granted, Ordering::SeqCst);
    }

    /// Make every subsequent schedule call fail.
    pub fn set_fail_schedules(&self, fail: bool) {
        self.fail_schedules.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent cancel call fail.
    pub fn set_fail_cancels(&self, fail: bool) {
        self.fail_cancels.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of currently scheduled alerts by handle.
    pub fn alerts(&self) -> HashMap<String, (NaiveDateTime, ReminderPayload)> {
        self.alerts.read().unwrap().clone()
    }

    pub fn alert_count(&self) -> usize {
        self.alerts.read().unwrap().len()
    }

    pub fn schedule_calls(&self) -> usize {
        self.schedule_calls.load(Ordering::SeqCst)
    }

    pub fn cancel_calls(&self) -> usize {
        self.cancel_calls.load(Ordering::SeqCst)
    }
}

impl Default for MemoryDelivery {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationDelivery for MemoryDelivery {
    async fn schedule(
        &self,
        trigger_at: NaiveDateTime,
        payload: &ReminderPayload,
    ) -> Result<String, DeliveryError> {
        self.schedule_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_schedules.load(Ordering::SeqCst) {
            return Err(DeliveryError::ScheduleFailed("injected failure".to_string()));
        }
        let handle = uuid::Uuid::new_v4().to_string();
        self.alerts
            .write()
            .unwrap()
            .insert(handle.clone(), (trigger_at, payload.clone()));
        Ok(handle)
    }

    async fn cancel(&self, handle: &str) -> Result<(), DeliveryError> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_cancels.load(Ordering::SeqCst) {
            return Err(DeliveryError::CancelFailed("injected failure".to_string()));
        }
        // Unknown handle: the alert already fired or was cancelled.
        self.alerts.write().unwrap().remove(handle);
        Ok(())
    }

    async fn has_permission(&self) -> bool {
        self.permission.load(Ordering::SeqCst)
    }

    async fn request_permission(&self) -> bool {
        self.permission.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::ReminderCategory;
    use chrono::NaiveDate;

    fn payload() -> ReminderPayload {
        ReminderPayload {
            category: ReminderCategory::License,
            entity_id: "a".to_string(),
            label: "License a".to_string(),
            deadline: "2026-10-01".parse().unwrap(),
            offset_days: 7,
            remaining_credits: None,
        }
    }

    fn trigger() -> NaiveDateTime {
        "2026-09-24".parse::<NaiveDate>().unwrap().and_hms_opt(9, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn schedule_and_cancel_round_trip() {
        let delivery = MemoryDelivery::new();
        let handle = delivery.schedule(trigger(), &payload()).await.unwrap();
        assert_eq!(delivery.alert_count(), 1);

        delivery.cancel(&handle).await.unwrap();
        assert_eq!(delivery.alert_count(), 0);
    }

    #[tokio::test]
    async fn cancel_is_idempotent() {
        let delivery = MemoryDelivery::new();
        let handle = delivery.schedule(trigger(), &payload()).await.unwrap();
        delivery.cancel(&handle).await.unwrap();
        delivery.cancel(&handle).await.unwrap();
        delivery.cancel("never-existed").await.unwrap();
    }

    #[tokio::test]
    async fn failure_injection_fails_schedules_only() {
        let delivery = MemoryDelivery::new();
        delivery.set_fail_schedules(true);
        assert!(delivery.schedule(trigger(), &payload()).await.is_err());
        assert!(delivery.cancel("h").await.is_ok());
        assert_eq!(delivery.schedule_calls(), 1);
    }

    #[tokio::test]
    async fn cancel_failure_injection_leaves_alert_in_place() {
        let delivery = MemoryDelivery::new();
        let handle = delivery.schedule(trigger(), &payload()).await.unwrap();

        delivery.set_fail_cancels(true);
        assert!(delivery.cancel(&handle).await.is_err());
        assert_eq!(delivery.alert_count(), 1);

        delivery.set_fail_cancels(false);
        delivery.cancel(&handle).await.unwrap();
        assert_eq!(delivery.alert_count(), 0);
    }
}
