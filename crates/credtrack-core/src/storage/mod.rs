pub mod schedule_store;
pub mod settings;

pub use schedule_store::ScheduleStore;
pub use settings::{
    CategoryConfig, EventRemindersConfig, NotificationSettings, QuietHoursConfig,
};

use std::path::PathBuf;

/// Returns `~/.config/credtrack[-dev]/` based on CREDTRACK_ENV.
///
/// Set CREDTRACK_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("CREDTRACK_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("credtrack-dev")
    } else {
        base_dir.join("credtrack")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
