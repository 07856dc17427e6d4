//! Streak bookkeeping across whole sessions and across process restarts.

mod support;

use focuscall_core::media::{BackgroundSettings, MediaCatalog};
use focuscall_core::stats::{
    CompanionStats, CompanionStore, CompanionTracker, FixedDate, SqliteCompanionStore,
    KEY_COMPANION_DAYS, KEY_STREAK_DAYS,
};
use focuscall_core::storage::database::DATABASE_FILE;
use focuscall_core::timer::SessionEvent;
use focuscall_core::Database;

use support::{date, Harness};

fn stats(last: &str, days: u32, streak: u32) -> CompanionStats {
    CompanionStats {
        last_focus_date: last.into(),
        companion_days: days,
        streak_days: streak,
    }
}

fn run_one_session(h: &mut Harness) {
    h.open_to_config();
    h.start(1, 1, 1);
    h.ticks(2);
    h.send(SessionEvent::Hangup);
}

#[test]
fn session_after_yesterday_extends_streak() {
    let mut h = Harness::with(
        MediaCatalog::with_seed(0),
        BackgroundSettings::default(),
        stats("2026-06-14", 10, 4),
    );
    run_one_session(&mut h);
    assert_eq!(h.store.snapshot(), stats("2026-06-15", 11, 5));
}

#[test]
fn session_after_gap_resets_streak() {
    let mut h = Harness::with(
        MediaCatalog::with_seed(0),
        BackgroundSettings::default(),
        stats("2026-06-12", 10, 4),
    );
    run_one_session(&mut h);
    assert_eq!(h.store.snapshot(), stats("2026-06-15", 11, 1));
}

#[test]
fn second_session_same_day_is_noop() {
    let mut h = Harness::new(MediaCatalog::with_seed(0));
    run_one_session(&mut h);
    run_one_session(&mut h);
    assert_eq!(h.count("SessionCompleted"), 2);
    assert_eq!(h.count("CompanionUpdated"), 1);
    assert_eq!(h.store.snapshot(), stats("2026-06-15", 1, 1));

    h.dates.advance(1);
    run_one_session(&mut h);
    assert_eq!(h.store.snapshot(), stats("2026-06-16", 2, 2));
}

#[test]
fn failed_write_does_not_stop_the_session() {
    let mut h = Harness::new(MediaCatalog::with_seed(0));
    h.store.fail_writes(true);
    h.open_to_config();
    h.start(1, 1, 1);
    h.ticks(2);
    assert_eq!(h.orch.phase(), focuscall_core::SessionPhase::Config);
    assert_eq!(h.orch.companion().stats().companion_days, 1);
    assert_eq!(h.store.snapshot(), CompanionStats::default());
}

#[test]
fn sqlite_stats_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(DATABASE_FILE);
    let dates = FixedDate::new(date(2026, 1, 30));

    {
        let store = SqliteCompanionStore::new(Database::open_at(&path).unwrap());
        let mut tracker = CompanionTracker::new(Box::new(store), Box::new(dates.clone()));
        tracker.record_completion();
    }
    dates.advance(1);
    {
        let store = SqliteCompanionStore::new(Database::open_at(&path).unwrap());
        let mut tracker = CompanionTracker::new(Box::new(store), Box::new(dates.clone()));
        assert_eq!(tracker.stats(), &stats("2026-01-30", 1, 1));
        tracker.record_completion();
    }

    let store = SqliteCompanionStore::new(Database::open_at(&path).unwrap());
    assert_eq!(store.read().unwrap(), stats("2026-01-31", 2, 2));
}

#[test]
fn sqlite_malformed_values_read_as_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open_at(&dir.path().join(DATABASE_FILE)).unwrap();
    db.kv_set(KEY_COMPANION_DAYS, "many").unwrap();
    db.kv_set(KEY_STREAK_DAYS, "-7").unwrap();
    let store = SqliteCompanionStore::new(db);
    assert_eq!(store.read().unwrap(), CompanionStats::default());
}
