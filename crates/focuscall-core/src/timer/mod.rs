mod engine;
mod schedule;
mod ticker;

pub use engine::{
    ActiveMedia, Command, EventKind, ResumeSnapshot, RoundProgress, SessionEngine, SessionEvent,
    SessionPhase,
};
pub use schedule::{SessionConfig, StepType};
pub use ticker::{Ticker, TICK_INTERVAL};
