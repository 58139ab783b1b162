use credtrack_core::{ScheduleStore, StatusStats};

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let store = ScheduleStore::open()?;
    let stats = StatusStats {
        active_scheduled_count: store.count()?,
        last_refresh_at: store.last_refresh_at()?,
        last_run_permission_limited: store.last_run_permission_limited()?,
    };
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
