//! # Credtrack Core Library
//!
//! Core business logic for Credtrack, a personal continuing-education
//! credit tracker. This crate implements the notification scheduling and
//! reconciliation engine: it decides which reminder notifications should
//! exist at any moment, translates user-configurable rules (per-category
//! day-offsets, quiet hours, master on/off) into concrete future-dated
//! alerts, and keeps the persisted schedule consistent as the underlying
//! data changes.
//!
//! ## Architecture
//!
//! - **Notify**: pure interval policy, quiet-hours adjuster, desired-set
//!   builder, and the three-way reconciler
//! - **Storage**: SQLite-based schedule store and TOML-based settings
//! - **Delivery**: async collaborator trait the platform implements;
//!   the engine issues schedule/cancel commands and never enumerates
//! - **Refresh**: run-lock orchestrator with trailing-edge coalescing
//!
//! ## Key Components
//!
//! - [`ReminderScheduler`]: refresh orchestrator, the only trigger surface
//! - [`ScheduleStore`]: persisted identity-to-handle mapping
//! - [`NotificationSettings`]: user rule configuration
//! - [`NotificationDelivery`]: trait for the delivery platform

pub mod delivery;
pub mod domain;
pub mod error;
pub mod notify;
pub mod refresh;
pub mod storage;

pub use delivery::{MemoryDelivery, NotificationDelivery};
pub use domain::{EventReminder, License, ProgressSnapshot, UserProfile};
pub use error::{CoreError, DeliveryError, SettingsError, StoreError};
pub use notify::{
    build_desired, reconcile, DesiredNotification, EntityKind, ReconcilePlan, ReminderCategory,
    ReminderIdentity, ReminderPayload, ScheduledEntry,
};
pub use refresh::{RefreshInputs, RefreshSummary, ReminderScheduler, StatusStats};
pub use storage::{NotificationSettings, ScheduleStore};
