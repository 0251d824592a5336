pub mod config;
pub mod run;
pub mod sites;
pub mod stats;
pub mod timer;

use focusguard_core::{Database, HostsBackend, Settings, TimerService};

/// Build a service over the standard data locations: the SQLite database,
/// the TOML settings file and the hosts-file rule backend (honoring
/// FOCUSGUARD_HOSTS_FILE).
pub fn open_service() -> Result<TimerService, Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let settings = Settings::load_or_default();
    let settings_path = Settings::default_path()?;
    Ok(TimerService::new(
        db,
        settings,
        settings_path,
        Box::new(HostsBackend::from_env()),
    ))
}
