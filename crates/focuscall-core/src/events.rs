use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::stats::CompanionStats;
use crate::timer::{SessionPhase, StepType};

/// Every observable change in a call produces an Event.
/// Hosts render them; the CLI prints them as JSON lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    CallStarted {
        at: DateTime<Utc>,
    },
    /// The call surface should close.
    CallEnded {
        at: DateTime<Utc>,
    },
    PhaseChanged {
        from: SessionPhase,
        to: SessionPhase,
        at: DateTime<Utc>,
    },
    SessionStarted {
        total_rounds: u32,
        focus_seconds: u32,
        break_seconds: u32,
        at: DateTime<Utc>,
    },
    StageStarted {
        round: u32,
        total_rounds: u32,
        step_type: StepType,
        duration_secs: u32,
        at: DateTime<Utc>,
    },
    StageSkipped {
        round: u32,
        step_type: StepType,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    Paused {
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    Resumed {
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    SessionCompleted {
        total_rounds: u32,
        at: DateTime<Utc>,
    },
    CompanionUpdated {
        stats: CompanionStats,
        at: DateTime<Utc>,
    },
    /// User asked to see the chat overlay.
    ChatRequested {
        at: DateTime<Utc>,
    },
    /// A mirror asked to bring the full call surface back.
    ExpandRequested {
        at: DateTime<Utc>,
    },
    MiniModeChanged {
        active: bool,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        phase: SessionPhase,
        current_round: u32,
        total_rounds: u32,
        step_type: StepType,
        remaining_secs: u32,
        is_paused: bool,
        status_line: String,
        companion: CompanionStats,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// The `type` tag as serialized.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::CallStarted { .. } => "CallStarted",
            Event::CallEnded { .. } => "CallEnded",
            Event::PhaseChanged { .. } => "PhaseChanged",
            Event::SessionStarted { .. } => "SessionStarted",
            Event::StageStarted { .. } => "StageStarted",
            Event::StageSkipped { .. } => "StageSkipped",
            Event::Paused { .. } => "Paused",
            Event::Resumed { .. } => "Resumed",
            Event::SessionCompleted { .. } => "SessionCompleted",
            Event::CompanionUpdated { .. } => "CompanionUpdated",
            Event::ChatRequested { .. } => "ChatRequested",
            Event::ExpandRequested { .. } => "ExpandRequested",
            Event::MiniModeChanged { .. } => "MiniModeChanged",
            Event::StateSnapshot { .. } => "StateSnapshot",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let event = Event::Paused {
            remaining_secs: 42,
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "Paused");
        assert_eq!(json["remaining_secs"], 42);
        assert_eq!(event.kind(), "Paused");
    }

    #[test]
    fn phase_is_lowercase_on_the_wire() {
        let event = Event::PhaseChanged {
            from: SessionPhase::Config,
            to: SessionPhase::Running,
            at: Utc::now(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"from\":\"config\""));
        assert!(json.contains("\"to\":\"running\""));
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
