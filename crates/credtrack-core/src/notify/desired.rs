//! Desired-set builder: domain inputs in, full desired notification set out.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDateTime;

use super::{
    policy, quiet_hours, DesiredNotification, EntityKind, ReminderCategory, ReminderIdentity,
    ReminderPayload,
};
use crate::domain::{EventReminder, License, ProgressSnapshot, UserProfile};
use crate::storage::settings::NotificationSettings;

/// Display label for the requirement-cycle entity.
const CYCLE_LABEL: &str = "Requirement cycle";

/// Build the full set of reminders that should exist at `now`.
///
/// Pure function of its inputs: identical inputs and the same `now` yield
/// an identical set, which is what makes reconciliation safe to re-run.
/// Results are ordered by identity.
///
/// When the master switch is off the set is empty unconditionally. A
/// completed requirement cycle suppresses cycle reminders only; licenses
/// and events are unaffected.
pub fn build_desired(
    settings: &NotificationSettings,
    user: &UserProfile,
    licenses: &[License],
    events: &[EventReminder],
    progress: &ProgressSnapshot,
    now: NaiveDateTime,
) -> Vec<DesiredNotification> {
    let mut out: BTreeMap<ReminderIdentity, DesiredNotification> = BTreeMap::new();

    if !settings.enabled {
        return Vec::new();
    }

    if settings.cycle_reminders.enabled && !progress.is_complete() {
        if let Some(deadline) = user.current_cycle_end(now.date()) {
            for (offset, trigger) in
                policy::expand(deadline, &settings.cycle_reminders.interval_days, now)
            {
                let desired = make(
                    ReminderCategory::Cycle,
                    EntityKind::Cycle,
                    &user.id,
                    CYCLE_LABEL,
                    deadline,
                    offset,
                    trigger,
                    Some(progress.remaining()),
                    settings,
                );
                out.insert(desired.identity.clone(), desired);
            }
        }
    }

    if settings.license_reminders.enabled {
        for license in licenses {
            for (offset, trigger) in policy::expand(
                license.expires_on,
                &settings.license_reminders.interval_days,
                now,
            ) {
                let desired = make(
                    ReminderCategory::License,
                    EntityKind::License,
                    &license.id,
                    &license.name,
                    license.expires_on,
                    offset,
                    trigger,
                    None,
                    settings,
                );
                out.insert(desired.identity.clone(), desired);
            }
        }
    }

    if settings.event_reminders.enabled {
        let offsets: BTreeSet<u32> =
            [settings.event_reminders.default_interval_days].into_iter().collect();
        for event in events {
            for (offset, trigger) in policy::expand(event.event_date, &offsets, now) {
                let desired = make(
                    ReminderCategory::Event,
                    EntityKind::Event,
                    &event.id,
                    &event.title,
                    event.event_date,
                    offset,
                    trigger,
                    None,
                    settings,
                );
                out.insert(desired.identity.clone(), desired);
            }
        }
    }

    out.into_values().collect()
}

#[allow(clippy::too_many_arguments)]
fn make(
    category: ReminderCategory,
    entity_kind: EntityKind,
    entity_id: &str,
    label: &str,
    deadline: chrono::NaiveDate,
    offset_days: u32,
    trigger: NaiveDateTime,
    remaining_credits: Option<f64>,
    settings: &NotificationSettings,
) -> DesiredNotification {
    DesiredNotification {
        identity: ReminderIdentity {
            category,
            entity_kind,
            entity_id: entity_id.to_string(),
            offset_days,
        },
        deadline,
        trigger_at: quiet_hours::adjust(trigger, &settings.quiet_hours),
        payload: ReminderPayload {
            category,
            entity_id: entity_id.to_string(),
            label: label.to_string(),
            deadline,
            offset_days,
            remaining_credits,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        "2026-08-29".parse::<NaiveDate>().unwrap().and_hms_opt(12, 0, 0).unwrap()
    }

    fn user() -> UserProfile {
        UserProfile {
            id: "user-1".to_string(),
            cycle_start: "2025-01-01".parse().unwrap(),
            cycle_months: 24,
        }
    }

    fn license(id: &str, expires_on: &str) -> License {
        License {
            id: id.to_string(),
            name: format!("License {id}"),
            expires_on: expires_on.parse().unwrap(),
        }
    }

    fn event(id: &str, date: &str) -> EventReminder {
        EventReminder {
            id: id.to_string(),
            title: format!("Event {id}"),
            event_date: date.parse().unwrap(),
        }
    }

    fn in_progress() -> ProgressSnapshot {
        ProgressSnapshot { earned: 10.0, required: 24.0 }
    }

    #[test]
    fn master_switch_off_yields_empty_set() {
        let mut settings = NotificationSettings::default();
        settings.enabled = false;
        let out = build_desired(
            &settings,
            &user(),
            &[license("a", "2026-10-01")],
            &[event("e", "2026-09-10")],
            &in_progress(),
            now(),
        );
        assert!(out.is_empty());
    }

    #[test]
    fn builds_per_category_with_stable_identities() {
        let settings = NotificationSettings::default();
        let out = build_desired(
            &settings,
            &user(),
            &[license("a", "2026-10-13")],
            &[event("e", "2026-09-10")],
            &in_progress(),
            now(),
        );

        // License expiring in 45 days: offsets 1,7,14,30 survive.
        let license_offsets: Vec<u32> = out
            .iter()
            .filter(|d| d.identity.category == ReminderCategory::License)
            .map(|d| d.identity.offset_days)
            .collect();
        assert_eq!(license_offsets, vec![1, 7, 14, 30]);

        // Events use the single default lead time.
        let event_items: Vec<_> = out
            .iter()
            .filter(|d| d.identity.category == ReminderCategory::Event)
            .collect();
        assert_eq!(event_items.len(), 1);
        assert_eq!(event_items[0].identity.offset_days, 1);

        // Cycle reminders target the current cycle end (2027-01-01).
        let cycle_items: Vec<_> = out
            .iter()
            .filter(|d| d.identity.category == ReminderCategory::Cycle)
            .collect();
        assert!(!cycle_items.is_empty());
        assert!(cycle_items.iter().all(|d| d.deadline == "2027-01-01".parse().unwrap()));
        assert!(cycle_items.iter().all(|d| d.payload.remaining_credits == Some(14.0)));
    }

    #[test]
    fn disabled_category_contributes_nothing() {
        let mut settings = NotificationSettings::default();
        settings.license_reminders.enabled = false;
        let out = build_desired(
            &settings,
            &user(),
            &[license("a", "2026-10-01")],
            &[],
            &in_progress(),
            now(),
        );
        assert!(out.iter().all(|d| d.identity.category != ReminderCategory::License));
        assert!(out.iter().any(|d| d.identity.category == ReminderCategory::Cycle));
    }

    #[test]
    fn completed_progress_suppresses_cycle_reminders_only() {
        let settings = NotificationSettings::default();
        let done = ProgressSnapshot { earned: 24.0, required: 24.0 };
        let out = build_desired(&settings, &user(), &[license("a", "2026-10-01")], &[], &done, now());
        assert!(out.iter().all(|d| d.identity.category != ReminderCategory::Cycle));
        assert!(out.iter().any(|d| d.identity.category == ReminderCategory::License));
    }

    #[test]
    fn quiet_hours_applied_to_every_trigger() {
        let mut settings = NotificationSettings::default();
        // A window that swallows the 09:00 delivery time.
        settings.quiet_hours.enabled = true;
        settings.quiet_hours.start_time = "08:00".into();
        settings.quiet_hours.end_time = "10:30".into();

        let out = build_desired(
            &settings,
            &user(),
            &[license("a", "2026-10-01")],
            &[event("e", "2026-09-10")],
            &in_progress(),
            now(),
        );
        assert!(!out.is_empty());
        assert!(out
            .iter()
            .all(|d| d.trigger_at.time() == "10:30".parse().unwrap()));
    }

    #[test]
    fn deterministic_for_identical_inputs() {
        let settings = NotificationSettings::default();
        let licenses = [license("a", "2026-10-13"), license("b", "2026-11-02")];
        let events = [event("e", "2026-09-10")];
        let a = build_desired(&settings, &user(), &licenses, &events, &in_progress(), now());
        let b = build_desired(&settings, &user(), &licenses, &events, &in_progress(), now());
        assert_eq!(a, b);
    }

    #[test]
    fn expired_license_contributes_nothing_but_others_survive() {
        let settings = NotificationSettings::default();
        let out = build_desired(
            &settings,
            &user(),
            &[license("old", "2026-01-01"), license("new", "2026-10-13")],
            &[],
            &in_progress(),
            now(),
        );
        assert!(out.iter().all(|d| d.identity.entity_id != "old"));
        assert!(out.iter().any(|d| d.identity.entity_id == "new"));
    }
}
