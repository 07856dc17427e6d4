//! Companion statistics: streak rules and the stores that keep them.

mod companion;
mod store;

pub use companion::{CompanionStats, CompanionTracker, DateSource, FixedDate, LocalCalendar};
pub use store::{
    CompanionStore, MemoryCompanionStore, SqliteCompanionStore, KEY_COMPANION_DAYS,
    KEY_LAST_FOCUS_DATE, KEY_STREAK_DAYS,
};
