use chrono::Local;
use clap::Args;
use focusflow_core::{LogNotifier, Records};

use super::open_app;

#[derive(Args)]
pub struct BoardArgs {
    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: BoardArgs) -> Result<(), Box<dyn std::error::Error>> {
    let app = open_app(LogNotifier)?;
    let records = app.records();

    match records.records() {
        Records::Leaderboard(_) => {
            let rows = records.leaderboard_rows(app.identity());
            if args.json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else if rows.is_empty() {
                println!("No scores yet. Complete a session to get on the board!");
            } else {
                for row in rows {
                    let marker = if row.is_current { "*" } else { " " };
                    println!("{marker}{:>3}. {:<20} {:>6} pts", row.rank, row.nickname, row.points);
                }
            }
        }
        Records::History(entries) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(entries)?);
            } else if entries.is_empty() {
                println!("No sessions yet for '{}'.", app.identity());
            } else {
                for entry in entries {
                    let at = entry.completed_at.with_timezone(&Local);
                    println!("{}  {:>3} min", at.format("%Y-%m-%d %H:%M"), entry.duration_minutes);
                }
            }
        }
    }
    Ok(())
}
