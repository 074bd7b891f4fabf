pub mod board;
pub mod config;
pub mod duration;
pub mod nickname;
pub mod run;

use focusflow_core::{AppSettings, Config, Database, FocusApp, Gated, Notifier};

/// Open the app over the default database with settings from the config file.
pub fn open_app<N: Notifier>(
    notifier: N,
) -> Result<FocusApp<Database, Gated<N>>, Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let db = Database::open()?;
    let notifier = Gated::new(notifier, config.notifications.enabled);
    Ok(FocusApp::open(AppSettings::from(&config), db, notifier))
}
