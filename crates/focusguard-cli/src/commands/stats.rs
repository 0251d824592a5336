use chrono::Local;
use clap::Subcommand;
use focusguard_core::{Database, StatsAggregator};
use serde_json::json;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's focused time
    Today,
    /// The per-day focus ledger
    History {
        /// Only the most recent N days, newest first
        #[arg(long)]
        days: Option<u32>,
    },
    /// Clear the ledger and counters
    Reset,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let mut stats = StatsAggregator::load(&db);
    stats.rollover_if_needed(&db, Local::now().date_naive());

    match action {
        StatsAction::Today => {
            let today = Local::now().date_naive();
            let output = json!({
                "date": today.format("%Y-%m-%d").to_string(),
                "focusedSeconds": stats.today_focused_secs(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        StatsAction::History { days } => {
            let entries: Vec<_> = match days {
                Some(days) => db.history_recent(days)?,
                None => db
                    .history_all()?
                    .into_iter()
                    .rev() // newest first, like the windowed view
                    .collect(),
            };
            let output: Vec<_> = entries
                .iter()
                .map(|(day, seconds)| {
                    json!({
                        "date": day.format("%Y-%m-%d").to_string(),
                        "focusedSeconds": seconds,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        StatsAction::Reset => {
            stats.reset_all(&db);
            println!("{}", json!({ "success": true }));
        }
    }
    Ok(())
}
