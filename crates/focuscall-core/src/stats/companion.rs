//! Companionship streak counters.
//!
//! A completed session counts once per calendar day. Consecutive days extend
//! the streak; any gap resets it to one.

use std::cell::Cell;
use std::rc::Rc;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use super::store::CompanionStore;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanionStats {
    /// ISO date of the last completed session, or empty.
    pub last_focus_date: String,
    pub companion_days: u32,
    pub streak_days: u32,
}

impl CompanionStats {
    /// Build from raw stored strings, tolerating anything malformed.
    ///
    /// Missing or unparsable counters read as 0, negatives clamp to 0, a
    /// missing streak falls back to `companion_days`, and the streak never
    /// exceeds `companion_days`.
    pub fn from_raw(
        last_focus_date: Option<&str>,
        companion_days: Option<&str>,
        streak_days: Option<&str>,
    ) -> Self {
        let companion_days = parse_counter(companion_days);
        let streak_days = match streak_days {
            Some(raw) => parse_counter(Some(raw)),
            None => companion_days,
        };
        Self {
            last_focus_date: last_focus_date.unwrap_or_default().trim().to_string(),
            companion_days,
            streak_days: streak_days.min(companion_days),
        }
    }

    pub fn last_focus(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.last_focus_date, DATE_FORMAT).ok()
    }

    /// Apply one completed session on `today`.
    ///
    /// Returns `false` when a session was already recorded today.
    pub fn record_completion(&mut self, today: NaiveDate) -> bool {
        let last = self.last_focus();
        if last == Some(today) {
            return false;
        }
        let continues = last.and_then(|d| d.succ_opt()) == Some(today);
        self.streak_days = if continues {
            self.streak_days.saturating_add(1)
        } else {
            1
        };
        self.companion_days = self.companion_days.saturating_add(1);
        self.streak_days = self.streak_days.min(self.companion_days);
        self.last_focus_date = today.format(DATE_FORMAT).to_string();
        true
    }
}

fn parse_counter(raw: Option<&str>) -> u32 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .map(|n| n.clamp(0, i64::from(u32::MAX)) as u32)
        .unwrap_or(0)
}

/// Source of the current calendar date.
pub trait DateSource {
    fn today(&self) -> NaiveDate;
}

/// The machine's local calendar.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalCalendar;

impl DateSource for LocalCalendar {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A settable date; clones share the same value.
#[derive(Debug, Clone)]
pub struct FixedDate(Rc<Cell<NaiveDate>>);

impl FixedDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(Rc::new(Cell::new(date)))
    }

    pub fn set(&self, date: NaiveDate) {
        self.0.set(date);
    }

    /// Move forward by `days`.
    pub fn advance(&self, days: u64) {
        let next = self.0.get() + chrono::Days::new(days);
        self.0.set(next);
    }
}

impl DateSource for FixedDate {
    fn today(&self) -> NaiveDate {
        self.0.get()
    }
}

/// Keeps the in-memory stats and writes them through to a store.
///
/// Store failures never escape: reads fall back to defaults and writes are
/// logged and dropped.
pub struct CompanionTracker {
    store: Box<dyn CompanionStore>,
    dates: Box<dyn DateSource>,
    stats: CompanionStats,
}

impl CompanionTracker {
    pub fn new(store: Box<dyn CompanionStore>, dates: Box<dyn DateSource>) -> Self {
        let mut tracker = Self {
            store,
            dates,
            stats: CompanionStats::default(),
        };
        tracker.reload();
        tracker
    }

    pub fn stats(&self) -> &CompanionStats {
        &self.stats
    }

    /// Re-read the store, picking up external edits.
    pub fn reload(&mut self) -> &CompanionStats {
        self.stats = match self.store.read() {
            Ok(stats) => stats,
            Err(err) => {
                tracing::warn!(error = %err, "companion stats unreadable, using defaults");
                CompanionStats::default()
            }
        };
        &self.stats
    }

    /// Record a completed session for today.
    ///
    /// Returns the updated stats, or `None` if today was already counted.
    pub fn record_completion(&mut self) -> Option<CompanionStats> {
        let today = self.dates.today();
        if !self.stats.record_completion(today) {
            tracing::debug!(%today, "completion already recorded today");
            return None;
        }
        tracing::info!(
            days = self.stats.companion_days,
            streak = self.stats.streak_days,
            "companion stats updated"
        );
        if let Err(err) = self.store.write(&self.stats) {
            tracing::warn!(error = %err, "failed to persist companion stats");
        }
        Some(self.stats.clone())
    }
}
