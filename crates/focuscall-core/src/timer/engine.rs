//! Session state machine.
//!
//! The engine is a plain value: it owns the phase, round counters, the
//! resume snapshot and the record of which foreground media is active, and
//! it never touches a clock, a player or a store. Each call to
//! [`SessionEngine::handle`] consumes one [`SessionEvent`] and returns the
//! [`Command`]s the caller must carry out, in order.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Answering -> Config <-> Running(focus|break) -> Hangup -> Idle
//!                        ^               |
//!                        +-- completion -+
//! ```
//!
//! Handlers are looked up by `(phase, event kind)`; pairs without an entry
//! are ignored.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = SessionEngine::new(catalog);
//! for command in engine.handle(SessionEvent::OpenCall) {
//!     // execute command
//! }
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::schedule::{SessionConfig, StepType};
use crate::events::Event;
use crate::media::{ClipKind, MediaCatalog, MediaItem, MediaRequest, PlaybackToken};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    Idle,
    Answering,
    Config,
    Running,
    Hangup,
}

/// Round counters and countdown of the current run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundProgress {
    /// 1-indexed; 0 only while no run has started.
    pub current_round: u32,
    pub is_break_phase: bool,
    pub remaining_seconds: u32,
    pub is_paused: bool,
}

impl RoundProgress {
    pub fn cleared() -> Self {
        Self {
            current_round: 0,
            is_break_phase: false,
            remaining_seconds: 0,
            is_paused: false,
        }
    }

    fn first_round(config: &SessionConfig) -> Self {
        Self {
            current_round: 1,
            is_break_phase: false,
            remaining_seconds: config.focus_seconds(),
            is_paused: false,
        }
    }

    pub fn step_type(&self) -> StepType {
        if self.is_break_phase {
            StepType::Break
        } else {
            StepType::Focus
        }
    }
}

/// Progress saved when the user opens settings mid-run.
///
/// `progress.is_paused` holds the pause flag from before settings were opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeSnapshot {
    pub config: SessionConfig,
    pub progress: RoundProgress,
}

/// Foreground media the engine is waiting on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveMedia {
    None,
    /// A one-shot clip whose end moves the call into `return_phase`.
    Transition {
        kind: ClipKind,
        return_phase: SessionPhase,
    },
    /// The stage backdrop, looping until replaced.
    Loop { item: MediaItem },
}

/// Inputs to the engine: clock ticks, media callbacks and user intents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    OpenCall,
    Start(SessionConfig),
    Tick,
    TogglePause,
    Skip,
    BackToSettings,
    ReturnWithoutChanges,
    Hangup,
    /// Escape: end the current one-shot clip early.
    Cancel,
    MediaCompleted { token: PlaybackToken },
    MediaFailed { token: PlaybackToken, reason: String },
    Expand,
    OpenChat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    OpenCall,
    Start,
    Tick,
    TogglePause,
    Skip,
    BackToSettings,
    ReturnWithoutChanges,
    Hangup,
    Cancel,
    /// Completion and failure share one kind: both end the clip.
    MediaEnded,
    Expand,
    OpenChat,
}

impl SessionEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            SessionEvent::OpenCall => EventKind::OpenCall,
            SessionEvent::Start(_) => EventKind::Start,
            SessionEvent::Tick => EventKind::Tick,
            SessionEvent::TogglePause => EventKind::TogglePause,
            SessionEvent::Skip => EventKind::Skip,
            SessionEvent::BackToSettings => EventKind::BackToSettings,
            SessionEvent::ReturnWithoutChanges => EventKind::ReturnWithoutChanges,
            SessionEvent::Hangup => EventKind::Hangup,
            SessionEvent::Cancel => EventKind::Cancel,
            SessionEvent::MediaCompleted { .. } | SessionEvent::MediaFailed { .. } => {
                EventKind::MediaEnded
            }
            SessionEvent::Expand => EventKind::Expand,
            SessionEvent::OpenChat => EventKind::OpenChat,
        }
    }
}

/// Side effects requested by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    PlayForeground(MediaRequest),
    /// Stop the foreground item only; ambient and music continue.
    StopForeground,
    /// Stop foreground, voice, ambient and music.
    StopAll,
    StartBackground,
    StopBackground,
    PlayChime(MediaItem),
    ArmClock,
    DisarmClock,
    PauseClock,
    ResumeClock,
    /// Record a completed session; must run before the next event is handled.
    RecordCompletion,
    ReloadStats,
    Notify(Event),
}

type Handler = fn(&mut SessionEngine, SessionEvent, &mut Vec<Command>);

pub struct SessionEngine {
    phase: SessionPhase,
    config: SessionConfig,
    progress: RoundProgress,
    resume: Option<ResumeSnapshot>,
    active: ActiveMedia,
    catalog: MediaCatalog,
    call_active: bool,
}

impl SessionEngine {
    pub fn new(catalog: MediaCatalog) -> Self {
        Self {
            phase: SessionPhase::Idle,
            config: SessionConfig::default(),
            progress: RoundProgress::cleared(),
            resume: None,
            active: ActiveMedia::None,
            catalog,
            call_active: false,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn progress(&self) -> &RoundProgress {
        &self.progress
    }

    pub fn resume_snapshot(&self) -> Option<&ResumeSnapshot> {
        self.resume.as_ref()
    }

    pub fn active_media(&self) -> &ActiveMedia {
        &self.active
    }

    pub fn is_call_active(&self) -> bool {
        self.call_active
    }

    /// True while the end-of-session clip plays.
    pub fn is_completing(&self) -> bool {
        matches!(
            self.active,
            ActiveMedia::Transition {
                kind: ClipKind::End,
                ..
            }
        )
    }

    pub fn catalog(&self) -> &MediaCatalog {
        &self.catalog
    }

    // ── Dispatch ─────────────────────────────────────────────────────

    /// Handle one event to completion and return the commands it produced.
    pub fn handle(&mut self, event: SessionEvent) -> Vec<Command> {
        let kind = event.kind();
        let Some(handler) = Self::route(self.phase, kind) else {
            tracing::debug!(phase = ?self.phase, ?kind, "event ignored in this phase");
            return Vec::new();
        };

        let before = self.phase;
        let mut out = Vec::new();
        handler(self, event, &mut out);
        if self.phase != before {
            tracing::info!(from = ?before, to = ?self.phase, "phase changed");
            out.push(Command::Notify(Event::PhaseChanged {
                from: before,
                to: self.phase,
                at: Utc::now(),
            }));
        }
        out
    }

    fn route(phase: SessionPhase, kind: EventKind) -> Option<Handler> {
        use EventKind as K;
        use SessionPhase as P;

        let handler: Handler = match (phase, kind) {
            (P::Idle, K::OpenCall) => Self::on_open_call,
            (P::Config, K::Start) => Self::on_start,
            (P::Config, K::ReturnWithoutChanges) => Self::on_return_without_changes,
            (P::Config | P::Running, K::Hangup) => Self::on_hangup,
            (P::Running, K::Tick) => Self::on_tick,
            (P::Running, K::Skip) => Self::on_skip,
            (P::Running, K::TogglePause) => Self::on_toggle_pause,
            (P::Running, K::BackToSettings) => Self::on_back_to_settings,
            (P::Answering | P::Running | P::Hangup, K::MediaEnded) => Self::on_media_ended,
            (P::Answering | P::Running | P::Hangup, K::Cancel) => Self::on_cancel,
            (P::Answering | P::Config | P::Running | P::Hangup, K::Expand) => Self::on_expand,
            (P::Answering | P::Config | P::Running | P::Hangup, K::OpenChat) => {
                Self::on_open_chat
            }
            _ => return None,
        };
        Some(handler)
    }

    // ── Handlers ─────────────────────────────────────────────────────

    fn on_open_call(&mut self, _event: SessionEvent, out: &mut Vec<Command>) {
        self.call_active = true;
        self.progress = RoundProgress::cleared();
        self.resume = None;
        out.push(Command::ReloadStats);
        out.push(Command::Notify(Event::CallStarted { at: Utc::now() }));

        if self.play_transition(ClipKind::Answering, SessionPhase::Config, out) {
            self.phase = SessionPhase::Answering;
        } else {
            self.enter_config(false);
        }
    }

    fn on_start(&mut self, event: SessionEvent, out: &mut Vec<Command>) {
        let SessionEvent::Start(config) = event else {
            return;
        };
        self.resume = None;
        self.config = config;
        self.progress = RoundProgress::first_round(&config);
        self.phase = SessionPhase::Running;

        out.push(Command::ArmClock);
        out.push(Command::Notify(Event::SessionStarted {
            total_rounds: config.total_rounds(),
            focus_seconds: config.focus_seconds(),
            break_seconds: config.break_seconds(),
            at: Utc::now(),
        }));
        self.notify_stage_started(out);
        self.play_focus_entry(out);
        out.push(Command::StartBackground);
    }

    fn on_tick(&mut self, _event: SessionEvent, out: &mut Vec<Command>) {
        if self.progress.is_paused || self.is_completing() {
            return;
        }
        self.progress.remaining_seconds = self.progress.remaining_seconds.saturating_sub(1);
        if self.progress.remaining_seconds == 0 {
            self.advance_stage(out);
        }
    }

    fn on_skip(&mut self, _event: SessionEvent, out: &mut Vec<Command>) {
        // Skipping the outro ends it the way the clip finishing would.
        if let ActiveMedia::Transition {
            kind: kind @ ClipKind::End,
            return_phase,
        } = self.active.clone()
        {
            out.push(Command::StopForeground);
            self.finish_transition(kind, return_phase, out);
            return;
        }
        if self.progress.is_paused {
            self.progress.is_paused = false;
            out.push(Command::ResumeClock);
        }
        out.push(Command::Notify(Event::StageSkipped {
            round: self.progress.current_round,
            step_type: self.progress.step_type(),
            remaining_secs: self.progress.remaining_seconds,
            at: Utc::now(),
        }));
        self.advance_stage(out);
    }

    fn on_toggle_pause(&mut self, _event: SessionEvent, out: &mut Vec<Command>) {
        if self.is_completing() {
            return;
        }
        self.progress.is_paused = !self.progress.is_paused;
        let at = Utc::now();
        if self.progress.is_paused {
            out.push(Command::PauseClock);
            out.push(Command::Notify(Event::Paused {
                remaining_secs: self.progress.remaining_seconds,
                at,
            }));
        } else {
            out.push(Command::ResumeClock);
            // Returning to a paused stage from settings leaves no backdrop running.
            if self.active == ActiveMedia::None {
                self.play_stage_loop(out);
            }
            out.push(Command::Notify(Event::Resumed {
                remaining_secs: self.progress.remaining_seconds,
                at,
            }));
        }
    }

    fn on_back_to_settings(&mut self, _event: SessionEvent, out: &mut Vec<Command>) {
        if self.is_completing() {
            return;
        }
        self.resume = Some(ResumeSnapshot {
            config: self.config,
            progress: self.progress,
        });
        out.push(Command::DisarmClock);
        out.push(Command::StopForeground);
        self.progress.is_paused = true;
        self.enter_config(true);
    }

    fn on_return_without_changes(&mut self, _event: SessionEvent, out: &mut Vec<Command>) {
        let Some(snapshot) = self.resume.take() else {
            tracing::debug!("return requested without a resume snapshot");
            return;
        };
        self.config = snapshot.config;
        self.progress = snapshot.progress;
        self.phase = SessionPhase::Running;

        out.push(Command::ArmClock);
        if self.progress.is_paused {
            out.push(Command::PauseClock);
        } else {
            // Straight back to the stage backdrop; intro clips are not replayed.
            self.play_stage_loop(out);
        }
    }

    fn on_hangup(&mut self, _event: SessionEvent, out: &mut Vec<Command>) {
        out.push(Command::DisarmClock);
        out.push(Command::StopBackground);
        self.resume = None;
        self.phase = SessionPhase::Hangup;
        if !self.play_transition(ClipKind::Hangup, SessionPhase::Idle, out) {
            self.close(out);
        }
    }

    fn on_media_ended(&mut self, event: SessionEvent, out: &mut Vec<Command>) {
        if let SessionEvent::MediaFailed { reason, .. } = &event {
            tracing::warn!(%reason, "media playback failed, continuing as if completed");
        }
        match self.active.clone() {
            ActiveMedia::Transition { kind, return_phase } => {
                self.finish_transition(kind, return_phase, out);
            }
            ActiveMedia::Loop { item } => {
                // The player stopped looping on its own; ask again.
                out.push(Command::PlayForeground(MediaRequest::looped(item)));
            }
            ActiveMedia::None => {}
        }
    }

    fn on_cancel(&mut self, _event: SessionEvent, out: &mut Vec<Command>) {
        match self.active.clone() {
            // Escape backs out of hanging up: the call stays open in settings.
            ActiveMedia::Transition {
                kind: ClipKind::Hangup,
                ..
            } => {
                out.push(Command::StopForeground);
                self.enter_config(false);
            }
            ActiveMedia::Transition { kind, return_phase } => {
                out.push(Command::StopForeground);
                self.finish_transition(kind, return_phase, out);
            }
            ActiveMedia::Loop { .. } | ActiveMedia::None => {}
        }
    }

    fn on_expand(&mut self, _event: SessionEvent, out: &mut Vec<Command>) {
        out.push(Command::Notify(Event::ExpandRequested { at: Utc::now() }));
    }

    fn on_open_chat(&mut self, _event: SessionEvent, out: &mut Vec<Command>) {
        out.push(Command::Notify(Event::ChatRequested { at: Utc::now() }));
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Follow-up of a one-shot clip. Natural end, failure and cancel all land here.
    fn finish_transition(&mut self, kind: ClipKind, return_phase: SessionPhase, out: &mut Vec<Command>) {
        tracing::debug!(?kind, ?return_phase, "transition clip finished");
        self.active = ActiveMedia::None;
        match return_phase {
            SessionPhase::Config => self.enter_config(false),
            SessionPhase::Running => self.play_stage_loop(out),
            SessionPhase::Idle => self.close(out),
            SessionPhase::Answering | SessionPhase::Hangup => {}
        }
    }

    /// Move to the next stage; natural expiry and skip share this path.
    fn advance_stage(&mut self, out: &mut Vec<Command>) {
        if !self.progress.is_break_phase {
            self.progress.is_break_phase = true;
            self.progress.remaining_seconds = self.config.break_seconds();
            self.notify_stage_started(out);
            self.play_break_entry(out);
        } else if self.progress.current_round >= self.config.total_rounds() {
            self.finish_all_rounds(out);
        } else {
            self.progress.is_break_phase = false;
            self.progress.current_round += 1;
            self.progress.remaining_seconds = self.config.focus_seconds();
            self.notify_stage_started(out);
            self.play_focus_entry(out);
        }
    }

    fn finish_all_rounds(&mut self, out: &mut Vec<Command>) {
        self.progress.remaining_seconds = 0;
        self.progress.is_paused = false;
        out.push(Command::DisarmClock);
        // Recorded before any outro plays, so cancelling the outro cannot skip it.
        out.push(Command::RecordCompletion);
        out.push(Command::Notify(Event::SessionCompleted {
            total_rounds: self.config.total_rounds(),
            at: Utc::now(),
        }));
        tracing::info!(rounds = self.config.total_rounds(), "all rounds complete");

        if !self.play_transition(ClipKind::End, SessionPhase::Config, out) {
            out.push(Command::StopForeground);
            self.active = ActiveMedia::None;
            self.enter_config(false);
        }
    }

    fn enter_config(&mut self, preserve_progress: bool) {
        self.phase = SessionPhase::Config;
        self.active = ActiveMedia::None;
        if !preserve_progress {
            self.progress = RoundProgress::cleared();
            self.resume = None;
        }
    }

    fn close(&mut self, out: &mut Vec<Command>) {
        out.push(Command::DisarmClock);
        out.push(Command::StopAll);
        self.phase = SessionPhase::Idle;
        self.active = ActiveMedia::None;
        self.progress = RoundProgress::cleared();
        self.resume = None;
        if self.call_active {
            self.call_active = false;
            out.push(Command::Notify(Event::CallEnded { at: Utc::now() }));
        }
    }

    /// Start a one-shot clip of `kind` if one exists. Returns `false` when absent.
    fn play_transition(&mut self, kind: ClipKind, return_phase: SessionPhase, out: &mut Vec<Command>) -> bool {
        let Some(item) = self.catalog.pick(kind) else {
            tracing::debug!(?kind, "no clip available, skipping transition media");
            return false;
        };
        self.active = ActiveMedia::Transition { kind, return_phase };
        out.push(Command::PlayForeground(MediaRequest::one_shot(item)));
        true
    }

    fn play_focus_entry(&mut self, out: &mut Vec<Command>) {
        if self.play_transition(ClipKind::FocusIntro, SessionPhase::Running, out) {
            return;
        }
        if let Some(chime) = self.catalog.pick(ClipKind::StartChime) {
            out.push(Command::PlayChime(chime));
        }
        self.play_stage_loop(out);
    }

    fn play_break_entry(&mut self, out: &mut Vec<Command>) {
        if !self.play_transition(ClipKind::BreakIntro, SessionPhase::Running, out) {
            self.play_stage_loop(out);
        }
    }

    fn play_stage_loop(&mut self, out: &mut Vec<Command>) {
        match self.catalog.pick(ClipKind::Backdrop) {
            Some(item) => {
                self.active = ActiveMedia::Loop { item: item.clone() };
                out.push(Command::PlayForeground(MediaRequest::looped(item)));
            }
            None => {
                if self.active != ActiveMedia::None {
                    out.push(Command::StopForeground);
                }
                self.active = ActiveMedia::None;
            }
        }
    }

    fn notify_stage_started(&self, out: &mut Vec<Command>) {
        let step_type = self.progress.step_type();
        out.push(Command::Notify(Event::StageStarted {
            round: self.progress.current_round,
            total_rounds: self.config.total_rounds(),
            step_type,
            duration_secs: self.config.stage_seconds(step_type),
            at: Utc::now(),
        }));
    }
}
