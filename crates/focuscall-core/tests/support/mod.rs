//! Shared harness: an orchestrator wired to recording adapters and a
//! manually advanced clock.

#![allow(dead_code)]

use std::time::Instant;

use chrono::NaiveDate;
use focuscall_core::media::recording::{RecordingChannels, RecordingPlayer};
use focuscall_core::media::{BackgroundSettings, ClipKind, MediaCatalog, MediaDirector, MediaItem};
use focuscall_core::stats::{CompanionStats, CompanionTracker, FixedDate, MemoryCompanionStore};
use focuscall_core::timer::{SessionConfig, SessionEngine, SessionEvent};
use focuscall_core::{Event, Orchestrator};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn full_catalog() -> MediaCatalog {
    MediaCatalog::with_seed(11)
        .with_clip(ClipKind::Answering, MediaItem::new("call/answering.mp4"))
        .with_clip(ClipKind::Hangup, MediaItem::new("call/hangup.mp4"))
        .with_clip(ClipKind::FocusIntro, MediaItem::new("call/start1.mp4"))
        .with_clip(ClipKind::BreakIntro, MediaItem::new("call/break1.mp4"))
        .with_clip(ClipKind::End, MediaItem::new("call/end.mp4"))
        .with_clip(ClipKind::Backdrop, MediaItem::new("call/withyou.mp4"))
}

pub struct Harness {
    pub orch: Orchestrator,
    pub player: RecordingPlayer,
    pub channels: RecordingChannels,
    pub store: MemoryCompanionStore,
    pub dates: FixedDate,
    pub now: Instant,
    pub events: Vec<Event>,
}

impl Harness {
    pub fn new(catalog: MediaCatalog) -> Self {
        Self::with(catalog, BackgroundSettings::default(), CompanionStats::default())
    }

    pub fn with(catalog: MediaCatalog, settings: BackgroundSettings, stats: CompanionStats) -> Self {
        let player = RecordingPlayer::new();
        let channels = RecordingChannels::new();
        let store = MemoryCompanionStore::with_stats(stats);
        let dates = FixedDate::new(date(2026, 6, 15));

        let media = MediaDirector::new(
            Box::new(player.clone()),
            Box::new(channels.clone()),
            settings,
        )
        .with_tracks(
            Some(MediaItem::new("audio/noise.mp3")),
            Some(MediaItem::new("audio/bgm.mp3")),
        );
        let companion = CompanionTracker::new(Box::new(store.clone()), Box::new(dates.clone()));
        let orch = Orchestrator::new(SessionEngine::new(catalog), media, companion);

        Self {
            orch,
            player,
            channels,
            store,
            dates,
            now: Instant::now(),
            events: Vec::new(),
        }
    }

    pub fn send(&mut self, event: SessionEvent) -> Vec<Event> {
        let out = self.orch.handle(event, self.now);
        self.events.extend(out.iter().cloned());
        out
    }

    /// Advance to the next clock deadline and deliver the tick. With the
    /// clock stopped the tick is sent anyway, as a stray timer would.
    pub fn tick(&mut self) -> Vec<Event> {
        match self.orch.next_deadline() {
            Some(due) => {
                self.now = due;
                let out = self.orch.poll_clock(self.now);
                self.events.extend(out.iter().cloned());
                out
            }
            None => self.send(SessionEvent::Tick),
        }
    }

    pub fn ticks(&mut self, n: u32) {
        for _ in 0..n {
            self.tick();
        }
    }

    /// Report the current foreground item as finished.
    pub fn finish_clip(&mut self) -> Vec<Event> {
        let token = self.player.last_token().expect("nothing was played");
        self.send(SessionEvent::MediaCompleted { token })
    }

    pub fn open_to_config(&mut self) {
        self.send(SessionEvent::OpenCall);
        if self.orch.phase() == focuscall_core::SessionPhase::Answering {
            self.finish_clip();
        }
    }

    pub fn start(&mut self, rounds: u32, focus: u32, break_: u32) -> Vec<Event> {
        self.send(SessionEvent::Start(
            SessionConfig::new(rounds, focus, break_).unwrap(),
        ))
    }

    pub fn count(&self, kind: &str) -> usize {
        self.events.iter().filter(|e| e.kind() == kind).count()
    }

    pub fn plays_of(&self, path: &str) -> usize {
        self.player
            .plays()
            .iter()
            .filter(|(item, _)| item.path().to_str() == Some(path))
            .count()
    }
}
