use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use credtrack_core::{
    EventReminder, License, MemoryDelivery, NotificationSettings, ProgressSnapshot, RefreshInputs,
    ReminderScheduler, ScheduleStore, UserProfile,
};
use serde::Deserialize;

/// Domain snapshot supplied by the surrounding application.
#[derive(Deserialize)]
struct Snapshot {
    user: UserProfile,
    #[serde(default)]
    licenses: Vec<License>,
    #[serde(default)]
    events: Vec<EventReminder>,
    progress: ProgressSnapshot,
}

#[derive(Args)]
pub struct RefreshArgs {
    /// Path to a JSON snapshot of domain records (user, licenses, events, progress)
    #[arg(long)]
    pub input: PathBuf,
    /// Simulate a delivery platform with notification permission denied
    #[arg(long)]
    pub deny_permission: bool,
}

pub async fn run(args: RefreshArgs) -> Result<(), Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(&args.input)?;
    let snapshot: Snapshot = serde_json::from_str(&content)?;
    let settings = NotificationSettings::load()?;

    let delivery = Arc::new(MemoryDelivery::new());
    delivery.set_permission(!args.deny_permission);

    let store = ScheduleStore::open()?;
    let scheduler = ReminderScheduler::new(store, delivery);

    let summary = scheduler
        .refresh_all(RefreshInputs {
            settings,
            user: snapshot.user,
            licenses: snapshot.licenses,
            events: snapshot.events,
            progress: snapshot.progress,
        })
        .await?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
