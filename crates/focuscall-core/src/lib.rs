//! # FocusCall Core Library
//!
//! Core logic for a "focus call": a companion video call that walks the user
//! through N focus rounds, each followed by a break, with cinematic
//! transition clips over a looping backdrop. The CLI binary and any GUI host
//! are thin layers over this crate.
//!
//! ## Architecture
//!
//! - **Session Engine**: a pure state machine; events in, commands out
//! - **Media Director**: one foreground item plus ambient and music channels,
//!   with ducking while voice clips play
//! - **Companion Stats**: day-granularity streak counters in SQLite
//! - **Mirrors**: status-line observers such as a floating bar or tray entry
//! - **Runtime**: a single-threaded tokio loop feeding the orchestrator
//!
//! ## Key Components
//!
//! - [`SessionEngine`]: phase and round state machine
//! - [`Orchestrator`]: executes engine commands against the adapters
//! - [`MediaDirector`]: foreground/background media coordination
//! - [`CompanionTracker`]: streak bookkeeping over a [`CompanionStore`]
//! - [`Config`]: application configuration management

pub mod error;
pub mod events;
pub mod media;
pub mod mirror;
pub mod orchestrator;
pub mod runtime;
pub mod stats;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, StatsError, ValidationError};
pub use events::Event;
pub use media::{BackgroundSettings, ClipKind, MediaCatalog, MediaDirector, MediaItem};
pub use mirror::{MirrorHub, MirrorIntent, MirrorSurface};
pub use orchestrator::Orchestrator;
pub use runtime::{session_channel, Inbound, SessionHandle, SessionInbox, SessionRuntime};
pub use stats::{CompanionStats, CompanionStore, CompanionTracker};
pub use storage::{Config, Database};
pub use timer::{SessionConfig, SessionEngine, SessionEvent, SessionPhase, StepType};
