use clap::Subcommand;
use focuscall_core::stats::{CompanionStats, CompanionStore, CompanionTracker, LocalCalendar, SqliteCompanionStore};
use focuscall_core::Database;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Current companion days and streak
    Show,
    /// Count a completed session for today
    Record,
    /// Clear all companion counters
    Reset,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = SqliteCompanionStore::new(Database::open()?);

    match action {
        StatsAction::Show => {
            let stats = store.read()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        StatsAction::Record => {
            let mut tracker = CompanionTracker::new(Box::new(store), Box::new(LocalCalendar));
            match tracker.record_completion() {
                Some(stats) => println!("{}", serde_json::to_string_pretty(&stats)?),
                None => {
                    eprintln!("already recorded today");
                    println!("{}", serde_json::to_string_pretty(tracker.stats())?);
                }
            }
        }
        StatsAction::Reset => {
            store.write(&CompanionStats::default())?;
            println!("companion stats reset");
        }
    }
    Ok(())
}
