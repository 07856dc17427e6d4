//! Durable homes for [`CompanionStats`].

use std::cell::RefCell;
use std::rc::Rc;

use super::companion::CompanionStats;
use crate::error::StatsError;
use crate::storage::Database;

pub const KEY_LAST_FOCUS_DATE: &str = "last_focus_date";
pub const KEY_COMPANION_DAYS: &str = "companion_days";
pub const KEY_STREAK_DAYS: &str = "companion_streak_days";

pub trait CompanionStore {
    /// Missing records read as defaults; only real I/O failures are errors.
    fn read(&self) -> Result<CompanionStats, StatsError>;

    /// Persist all three fields together.
    fn write(&mut self, stats: &CompanionStats) -> Result<(), StatsError>;
}

/// Stats kept in the SQLite `kv` table.
pub struct SqliteCompanionStore {
    db: Database,
}

impl SqliteCompanionStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

impl CompanionStore for SqliteCompanionStore {
    fn read(&self) -> Result<CompanionStats, StatsError> {
        let last = self.db.kv_get(KEY_LAST_FOCUS_DATE)?;
        let days = self.db.kv_get(KEY_COMPANION_DAYS)?;
        let streak = self.db.kv_get(KEY_STREAK_DAYS)?;
        Ok(CompanionStats::from_raw(
            last.as_deref(),
            days.as_deref(),
            streak.as_deref(),
        ))
    }

    fn write(&mut self, stats: &CompanionStats) -> Result<(), StatsError> {
        let days = stats.companion_days.to_string();
        let streak = stats.streak_days.to_string();
        self.db.kv_set_many(&[
            (KEY_LAST_FOCUS_DATE, stats.last_focus_date.as_str()),
            (KEY_COMPANION_DAYS, days.as_str()),
            (KEY_STREAK_DAYS, streak.as_str()),
        ])?;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    stats: CompanionStats,
    fail_reads: bool,
    fail_writes: bool,
}

/// In-process store with switchable failures. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryCompanionStore {
    state: Rc<RefCell<MemoryState>>,
}

impl MemoryCompanionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stats(stats: CompanionStats) -> Self {
        let store = Self::new();
        store.replace(stats);
        store
    }

    pub fn replace(&self, stats: CompanionStats) {
        self.state.borrow_mut().stats = stats;
    }

    pub fn snapshot(&self) -> CompanionStats {
        self.state.borrow().stats.clone()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.state.borrow_mut().fail_reads = fail;
    }

    pub fn fail_writes(&self, fail: bool) {
        self.state.borrow_mut().fail_writes = fail;
    }
}

impl CompanionStore for MemoryCompanionStore {
    fn read(&self) -> Result<CompanionStats, StatsError> {
        let state = self.state.borrow();
        if state.fail_reads {
            return Err(StatsError::Unavailable("read disabled".into()));
        }
        Ok(state.stats.clone())
    }

    fn write(&mut self, stats: &CompanionStats) -> Result<(), StatsError> {
        let mut state = self.state.borrow_mut();
        if state.fail_writes {
            return Err(StatsError::Unavailable("write disabled".into()));
        }
        state.stats = stats.clone();
        Ok(())
    }
}
