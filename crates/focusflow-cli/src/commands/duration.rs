use clap::Subcommand;
use focusflow_core::LogNotifier;

use super::open_app;

#[derive(Subcommand)]
pub enum DurationAction {
    /// Print the session duration in minutes
    Get,
    /// Set the session duration
    Set {
        /// Duration in minutes
        minutes: u32,
    },
}

pub fn run(action: DurationAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut app = open_app(LogNotifier)?;

    match action {
        DurationAction::Get => {
            let secs = app.engine().duration_secs();
            if secs % 60 == 0 {
                println!("{}", secs / 60);
            } else {
                println!("{}", focusflow_core::format_clock(secs));
            }
        }
        DurationAction::Set { minutes } => {
            app.configure_minutes(minutes)?;
            println!("ok");
        }
    }
    Ok(())
}
