use std::io::{BufRead, IsTerminal};
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use focuscall_core::media::{ClipKind, MediaCatalog, MediaDirector, MediaItem};
use focuscall_core::stats::{
    CompanionStore, CompanionTracker, LocalCalendar, MemoryCompanionStore, SqliteCompanionStore,
};
use focuscall_core::timer::{SessionConfig, SessionEngine, SessionEvent, SessionPhase};
use focuscall_core::{session_channel, Config, Database, Event, Orchestrator, SessionHandle, SessionRuntime};

use super::terminal::{LoggedChannels, SimulatedPlayer, StatusLine};

#[derive(Subcommand)]
pub enum SessionAction {
    /// Open a call and run sessions until it is hung up
    Run(RunArgs),
    /// Show which call clips are found
    Assets {
        /// Clip directory (defaults to assets.call_dir)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

#[derive(Args)]
pub struct RunArgs {
    /// Number of focus rounds
    #[arg(long)]
    rounds: Option<u32>,
    /// Focus stage length in seconds
    #[arg(long)]
    focus: Option<u32>,
    /// Break stage length in seconds
    #[arg(long = "break")]
    break_secs: Option<u32>,
    /// How long a simulated one-shot clip plays, in seconds
    #[arg(long, default_value = "2")]
    clip_secs: u64,
    /// Seed for clip selection
    #[arg(long)]
    seed: Option<u64>,
    /// Clip directory (defaults to assets.call_dir)
    #[arg(long)]
    call_dir: Option<PathBuf>,
    /// Hang up as soon as all rounds complete
    #[arg(long)]
    exit_on_complete: bool,
}

pub fn run(action: SessionAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        SessionAction::Run(args) => run_call(args),
        SessionAction::Assets { dir } => {
            let config = Config::load()?;
            let dir = dir.or_else(|| config.call_dir()).ok_or("no call directory configured")?;
            let catalog = MediaCatalog::discover(&dir, Some(0));
            let found: serde_json::Map<String, serde_json::Value> = ClipKind::ALL
                .iter()
                .map(|kind| {
                    let paths: Vec<String> = catalog
                        .candidates(*kind)
                        .iter()
                        .map(|item| item.to_string())
                        .collect();
                    let key = serde_json::to_value(kind)
                        .ok()
                        .and_then(|v| v.as_str().map(str::to_string))
                        .unwrap_or_else(|| format!("{kind:?}"));
                    (key, serde_json::json!(paths))
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&found)?);
            Ok(())
        }
    }
}

fn session_config(config: &Config, args: &RunArgs) -> Result<SessionConfig, Box<dyn std::error::Error>> {
    Ok(SessionConfig::new(
        args.rounds.unwrap_or(config.session.total_rounds),
        args.focus.unwrap_or(config.session.focus_seconds),
        args.break_secs.unwrap_or(config.session.break_seconds),
    )?)
}

fn companion_store() -> Box<dyn CompanionStore> {
    match Database::open() {
        Ok(db) => Box::new(SqliteCompanionStore::new(db)),
        Err(e) => {
            tracing::warn!(error = %e, "stats database unavailable, streak will not be saved");
            Box::new(MemoryCompanionStore::new())
        }
    }
}

fn run_call(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let session = session_config(&config, &args)?;
    let settings = config.background_settings()?;

    let catalog = match args.call_dir.clone().or_else(|| config.call_dir()) {
        Some(dir) => MediaCatalog::discover(&dir, args.seed),
        None => match args.seed {
            Some(seed) => MediaCatalog::with_seed(seed),
            None => MediaCatalog::empty(),
        },
    };
    let ambient = config.assets.ambient.as_deref().filter(|p| !p.is_empty()).map(MediaItem::new);
    let music = config.assets.music.as_deref().filter(|p| !p.is_empty()).map(MediaItem::new);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    rt.block_on(async move {
        let (handle, inbox) = session_channel();
        let player = SimulatedPlayer::new(Duration::from_secs(args.clip_secs), handle.clone());
        let media = MediaDirector::new(Box::new(player), Box::new(LoggedChannels), settings)
            .with_tracks(ambient, music);
        let companion = CompanionTracker::new(companion_store(), Box::new(LocalCalendar));
        let mut orchestrator = Orchestrator::new(SessionEngine::new(catalog), media, companion);
        if std::io::stderr().is_terminal() {
            orchestrator.attach_mirror(Box::new(StatusLine));
        }

        let runtime = SessionRuntime::with_inbox(orchestrator, handle.clone(), inbox);
        spawn_key_reader(handle.clone(), session);
        handle.send(SessionEvent::OpenCall);

        let mut auto_started = false;
        let orchestrator = runtime
            .run(|event, _| {
                print_event(event);
                match event {
                    Event::PhaseChanged {
                        to: SessionPhase::Config,
                        ..
                    } if !auto_started => {
                        auto_started = true;
                        handle.send(SessionEvent::Start(session));
                    }
                    Event::SessionCompleted { .. } if args.exit_on_complete => {
                        handle.send(SessionEvent::Hangup);
                    }
                    Event::CallEnded { .. } => return ControlFlow::Break(()),
                    _ => {}
                }
                ControlFlow::Continue(())
            })
            .await;

        print_event(&orchestrator.snapshot());
    });
    Ok(())
}

fn print_event(event: &Event) {
    match serde_json::to_string(event) {
        Ok(json) => println!("{json}"),
        Err(e) => tracing::warn!(error = %e, "failed to serialize event"),
    }
}

/// Single-letter commands from stdin, one per line.
fn spawn_key_reader(handle: SessionHandle, session: SessionConfig) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let event = match line.trim() {
                "p" => SessionEvent::TogglePause,
                "s" => SessionEvent::Skip,
                "b" => SessionEvent::BackToSettings,
                "r" => SessionEvent::ReturnWithoutChanges,
                "g" => SessionEvent::Start(session),
                "c" => SessionEvent::OpenChat,
                "x" => SessionEvent::Cancel,
                "h" => SessionEvent::Hangup,
                "q" => {
                    handle.shutdown();
                    break;
                }
                "" => continue,
                other => {
                    tracing::warn!(key = other, "unknown key (p s b r g c x h q)");
                    continue;
                }
            };
            if !handle.send(event) {
                break;
            }
        }
    });
}
