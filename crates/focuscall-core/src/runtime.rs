//! Single-threaded event loop around an [`Orchestrator`].
//!
//! Inputs from any task (user keys, media adapters, mirrors) go into one
//! unbounded inbox. The loop handles them one at a time, interleaved with
//! clock ticks, so the orchestrator never needs a lock.

use std::ops::ControlFlow;
use std::time::Instant;

use tokio::sync::mpsc;

use crate::events::Event;
use crate::mirror::MirrorIntent;
use crate::orchestrator::Orchestrator;
use crate::timer::SessionEvent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Session(SessionEvent),
    Intent(MirrorIntent),
    Shutdown,
}

/// Cloneable sender into a running [`SessionRuntime`].
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<Inbound>,
}

impl SessionHandle {
    /// Returns `false` once the runtime has stopped.
    pub fn send(&self, event: SessionEvent) -> bool {
        self.tx.send(Inbound::Session(event)).is_ok()
    }

    pub fn intent(&self, intent: MirrorIntent) -> bool {
        self.tx.send(Inbound::Intent(intent)).is_ok()
    }

    pub fn shutdown(&self) -> bool {
        self.tx.send(Inbound::Shutdown).is_ok()
    }
}

/// Receiving end of the inbox, consumed by [`SessionRuntime::with_inbox`].
#[derive(Debug)]
pub struct SessionInbox {
    rx: mpsc::UnboundedReceiver<Inbound>,
}

/// Create the inbox ahead of the runtime, for adapters that must hold a
/// [`SessionHandle`] before the orchestrator exists.
pub fn session_channel() -> (SessionHandle, SessionInbox) {
    let (tx, rx) = mpsc::unbounded_channel();
    (SessionHandle { tx }, SessionInbox { rx })
}

pub struct SessionRuntime {
    orchestrator: Orchestrator,
    handle: SessionHandle,
    rx: mpsc::UnboundedReceiver<Inbound>,
}

impl SessionRuntime {
    pub fn new(orchestrator: Orchestrator) -> Self {
        let (handle, inbox) = session_channel();
        Self::with_inbox(orchestrator, handle, inbox)
    }

    pub fn with_inbox(orchestrator: Orchestrator, handle: SessionHandle, inbox: SessionInbox) -> Self {
        Self {
            orchestrator,
            handle,
            rx: inbox.rx,
        }
    }

    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    pub fn orchestrator_mut(&mut self) -> &mut Orchestrator {
        &mut self.orchestrator
    }

    /// Run until shutdown or until `on_event` breaks. Returns the orchestrator
    /// so callers can inspect the final state.
    ///
    /// `on_event` sees every emitted event together with the orchestrator
    /// state after the event that produced it.
    pub async fn run<F>(mut self, mut on_event: F) -> Orchestrator
    where
        F: FnMut(&Event, &mut Orchestrator) -> ControlFlow<()>,
    {
        tracing::debug!("session runtime started");
        loop {
            let deadline = self.orchestrator.next_deadline();
            let events = tokio::select! {
                inbound = self.rx.recv() => match inbound {
                    Some(Inbound::Session(event)) => self.orchestrator.handle(event, Instant::now()),
                    Some(Inbound::Intent(intent)) => self.orchestrator.handle_intent(intent, Instant::now()),
                    Some(Inbound::Shutdown) | None => break,
                },
                () = sleep_until(deadline) => self.orchestrator.poll_clock(Instant::now()),
            };

            for event in &events {
                if on_event(event, &mut self.orchestrator).is_break() {
                    tracing::debug!("session runtime stopped by observer");
                    return self.orchestrator;
                }
            }
        }
        tracing::debug!("session runtime shut down");
        self.orchestrator
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::recording::{RecordingChannels, RecordingPlayer};
    use crate::media::{BackgroundSettings, MediaCatalog, MediaDirector};
    use crate::stats::{CompanionTracker, FixedDate, MemoryCompanionStore};
    use crate::timer::{SessionConfig, SessionEngine, SessionPhase, Ticker};
    use chrono::NaiveDate;
    use std::time::Duration;

    fn orchestrator() -> Orchestrator {
        let media = MediaDirector::new(
            Box::new(RecordingPlayer::new()),
            Box::new(RecordingChannels::new()),
            BackgroundSettings::default(),
        );
        let companion = CompanionTracker::new(
            Box::new(MemoryCompanionStore::new()),
            Box::new(FixedDate::new(NaiveDate::from_ymd_opt(2026, 6, 1).unwrap())),
        );
        Orchestrator::new(SessionEngine::new(MediaCatalog::with_seed(0)), media, companion)
            .with_ticker(Ticker::with_interval(Duration::from_millis(5)))
    }

    #[tokio::test]
    async fn runs_full_session_on_clock() {
        let runtime = SessionRuntime::new(orchestrator());
        let handle = runtime.handle();
        handle.send(SessionEvent::OpenCall);
        handle.send(SessionEvent::Start(SessionConfig::new(1, 2, 2).unwrap()));

        let mut seen = Vec::new();
        let orch = runtime
            .run(|event, _| {
                seen.push(event.kind());
                if matches!(event, Event::SessionCompleted { .. }) {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .await;

        assert!(seen.contains(&"CompanionUpdated"));
        assert_eq!(orch.companion().stats().companion_days, 1);
    }

    #[tokio::test]
    async fn shutdown_stops_loop() {
        let runtime = SessionRuntime::new(orchestrator());
        let handle = runtime.handle();
        handle.send(SessionEvent::OpenCall);
        handle.shutdown();
        let orch = runtime.run(|_, _| ControlFlow::Continue(())).await;
        assert_eq!(orch.phase(), SessionPhase::Config);
    }
}
