//! Orchestrator
//!
//! Owns one call: the session engine plus everything its commands act on.
//! Every input goes through [`Orchestrator::handle`] (or
//! [`Orchestrator::poll_clock`] for the ticker) and runs to completion before
//! the next; nothing here returns an error.

use std::time::Instant;

use chrono::Utc;

use crate::events::Event;
use crate::media::MediaDirector;
use crate::mirror::{status_line, MirrorHub, MirrorId, MirrorIntent, MirrorSurface};
use crate::stats::CompanionTracker;
use crate::timer::{Command, SessionEngine, SessionEvent, SessionPhase, Ticker};

pub struct Orchestrator {
    engine: SessionEngine,
    media: MediaDirector,
    companion: CompanionTracker,
    mirrors: MirrorHub,
    ticker: Ticker,
    mini_mode: Option<Vec<MirrorId>>,
}

impl Orchestrator {
    pub fn new(engine: SessionEngine, media: MediaDirector, companion: CompanionTracker) -> Self {
        let mut orchestrator = Self {
            engine,
            media,
            companion,
            mirrors: MirrorHub::new(),
            ticker: Ticker::new(),
            mini_mode: None,
        };
        orchestrator.publish_status();
        orchestrator
    }

    pub fn with_ticker(mut self, ticker: Ticker) -> Self {
        self.ticker = ticker;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn engine(&self) -> &SessionEngine {
        &self.engine
    }

    pub fn phase(&self) -> SessionPhase {
        self.engine.phase()
    }

    pub fn media(&self) -> &MediaDirector {
        &self.media
    }

    pub fn companion(&self) -> &CompanionTracker {
        &self.companion
    }

    pub fn mirrors(&self) -> &MirrorHub {
        &self.mirrors
    }

    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    pub fn status_line(&self) -> String {
        status_line(&self.engine)
    }

    pub fn is_mini_mode(&self) -> bool {
        self.mini_mode.is_some()
    }

    /// When the runtime should next call [`Self::poll_clock`].
    pub fn next_deadline(&self) -> Option<Instant> {
        self.ticker.next_due()
    }

    pub fn snapshot(&self) -> Event {
        let progress = self.engine.progress();
        Event::StateSnapshot {
            phase: self.engine.phase(),
            current_round: progress.current_round,
            total_rounds: self.engine.config().total_rounds(),
            step_type: progress.step_type(),
            remaining_secs: progress.remaining_seconds,
            is_paused: progress.is_paused,
            status_line: self.status_line(),
            companion: self.companion.stats().clone(),
            at: Utc::now(),
        }
    }

    // ── Inputs ───────────────────────────────────────────────────────

    /// Process one event and return what was emitted.
    pub fn handle(&mut self, event: SessionEvent, now: Instant) -> Vec<Event> {
        match &event {
            SessionEvent::MediaCompleted { token } | SessionEvent::MediaFailed { token, .. } => {
                if !self.media.finish_foreground(*token) {
                    return Vec::new();
                }
            }
            _ => {}
        }

        let commands = self.engine.handle(event);
        let mut events = Vec::new();
        for command in commands {
            self.execute(command, now, &mut events);
        }
        self.publish_status();

        // Mirrors see the final line before the compact surfaces go away.
        let leaves_mini_mode = events
            .iter()
            .any(|e| matches!(e, Event::ExpandRequested { .. } | Event::CallEnded { .. }));
        if leaves_mini_mode {
            let exited = self.exit_mini_mode();
            events.extend(exited);
        }
        events
    }

    pub fn handle_intent(&mut self, intent: MirrorIntent, now: Instant) -> Vec<Event> {
        tracing::debug!(?intent, "mirror intent");
        self.handle(intent.into(), now)
    }

    /// Deliver a tick if the clock is due.
    pub fn poll_clock(&mut self, now: Instant) -> Vec<Event> {
        if self.ticker.poll(now) {
            self.handle(SessionEvent::Tick, now)
        } else {
            Vec::new()
        }
    }

    // ── Mirrors ──────────────────────────────────────────────────────

    pub fn attach_mirror(&mut self, surface: Box<dyn MirrorSurface>) -> MirrorId {
        self.mirrors.attach(surface)
    }

    pub fn detach_mirror(&mut self, id: MirrorId) -> bool {
        if let Some(ids) = &mut self.mini_mode {
            ids.retain(|m| *m != id);
        }
        self.mirrors.detach(id)
    }

    /// Attach the compact surfaces. Refused while the call is answering or
    /// hanging up.
    pub fn enter_mini_mode(&mut self, surfaces: Vec<Box<dyn MirrorSurface>>) -> Vec<Event> {
        match self.engine.phase() {
            SessionPhase::Answering | SessionPhase::Hangup | SessionPhase::Idle => {
                tracing::debug!(phase = ?self.engine.phase(), "mini mode refused");
                return Vec::new();
            }
            SessionPhase::Config | SessionPhase::Running => {}
        }
        if self.mini_mode.is_some() {
            return Vec::new();
        }
        let ids = surfaces
            .into_iter()
            .map(|surface| self.mirrors.attach(surface))
            .collect();
        self.mini_mode = Some(ids);
        vec![Event::MiniModeChanged {
            active: true,
            at: Utc::now(),
        }]
    }

    pub fn exit_mini_mode(&mut self) -> Vec<Event> {
        let Some(ids) = self.mini_mode.take() else {
            return Vec::new();
        };
        for id in ids {
            self.mirrors.detach(id);
        }
        vec![Event::MiniModeChanged {
            active: false,
            at: Utc::now(),
        }]
    }

    // ── Background audio controls ────────────────────────────────────

    /// Ambient may only start while a stage is running.
    pub fn set_ambient_enabled(&mut self, enabled: bool) {
        let may_start = self.engine.phase() == SessionPhase::Running;
        self.media.set_ambient_enabled(enabled, may_start);
    }

    /// Music may start while running or in settings.
    pub fn set_music_enabled(&mut self, enabled: bool) {
        let may_start = matches!(
            self.engine.phase(),
            SessionPhase::Running | SessionPhase::Config
        );
        self.media.set_music_enabled(enabled, may_start);
    }

    pub fn set_ambient_volume(&mut self, percent: u8) {
        self.media.set_ambient_volume(percent);
    }

    pub fn set_music_volume(&mut self, percent: u8) {
        self.media.set_music_volume(percent);
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn execute(&mut self, command: Command, now: Instant, events: &mut Vec<Event>) {
        match command {
            Command::PlayForeground(request) => {
                self.media.play_foreground(request);
            }
            Command::StopForeground => self.media.stop_transition_playback(),
            Command::StopAll => self.media.stop_all_playback(),
            Command::StartBackground => self.media.start_background(),
            Command::StopBackground => self.media.stop_background(),
            Command::PlayChime(item) => self.media.play_chime(&item),
            Command::ArmClock => self.ticker.arm(now),
            Command::DisarmClock => self.ticker.disarm(),
            Command::PauseClock => self.ticker.pause(now),
            Command::ResumeClock => self.ticker.resume(now),
            Command::RecordCompletion => {
                if let Some(stats) = self.companion.record_completion() {
                    events.push(Event::CompanionUpdated {
                        stats,
                        at: Utc::now(),
                    });
                }
            }
            Command::ReloadStats => {
                self.companion.reload();
            }
            Command::Notify(event) => events.push(event),
        }
    }

    fn publish_status(&mut self) {
        let line = status_line(&self.engine);
        self.mirrors.publish(line);
    }
}
