//! The one-line status shown on mirrors: `"{stage} · {MM:SS}"`.

use crate::timer::{SessionEngine, SessionPhase};

pub const STAGE_IN_CALL: &str = "In call";
pub const STAGE_PAUSED: &str = "Paused";
pub const STAGE_BREAK: &str = "Break";
pub const STAGE_FOCUS: &str = "Focus";
pub const STAGE_SETTINGS: &str = "Settings";
pub const STAGE_ENDING: &str = "Ending";

/// `MM:SS`; minutes are not wrapped into hours.
pub fn format_countdown(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

pub fn stage_label(engine: &SessionEngine) -> &'static str {
    let progress = engine.progress();
    match engine.phase() {
        SessionPhase::Running if progress.is_paused => STAGE_PAUSED,
        SessionPhase::Running if progress.is_break_phase => STAGE_BREAK,
        SessionPhase::Running => STAGE_FOCUS,
        SessionPhase::Config => STAGE_SETTINGS,
        SessionPhase::Hangup => STAGE_ENDING,
        SessionPhase::Idle | SessionPhase::Answering => STAGE_IN_CALL,
    }
}

pub fn status_line(engine: &SessionEngine) -> String {
    format!(
        "{} · {}",
        stage_label(engine),
        format_countdown(engine.progress().remaining_seconds)
    )
}
