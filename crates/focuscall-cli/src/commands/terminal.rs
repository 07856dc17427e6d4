//! Terminal stand-ins for the media stack and the mirror surfaces.
//!
//! Nothing is decoded or rendered. One-shot clips "finish" after a fixed
//! delay by posting a completion into the session inbox.

use std::io::Write;
use std::time::Duration;

use focuscall_core::media::{AudioChannels, Channel, MediaItem, MediaPlayer, PlaybackToken};
use focuscall_core::timer::SessionEvent;
use focuscall_core::{MirrorSurface, SessionHandle};
use tokio::task::JoinHandle;

pub struct SimulatedPlayer {
    clip_length: Duration,
    inbox: SessionHandle,
    pending: Option<JoinHandle<()>>,
}

impl SimulatedPlayer {
    pub fn new(clip_length: Duration, inbox: SessionHandle) -> Self {
        Self {
            clip_length,
            inbox,
            pending: None,
        }
    }

    fn cancel_pending(&mut self) {
        if let Some(task) = self.pending.take() {
            task.abort();
        }
    }
}

impl MediaPlayer for SimulatedPlayer {
    fn play(&mut self, item: &MediaItem, looping: bool, token: PlaybackToken) {
        self.cancel_pending();
        tracing::info!(%item, looping, %token, "playing");
        if looping {
            return;
        }
        let inbox = self.inbox.clone();
        let delay = self.clip_length;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            inbox.send(SessionEvent::MediaCompleted { token });
        }));
    }

    fn stop(&mut self) {
        self.cancel_pending();
    }
}

impl Drop for SimulatedPlayer {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

/// Audio channels that only log what they are asked to do.
#[derive(Debug, Default)]
pub struct LoggedChannels;

impl AudioChannels for LoggedChannels {
    fn set_volume(&mut self, channel: Channel, percent: u8) {
        tracing::debug!(%channel, percent, "volume");
    }

    fn set_enabled(&mut self, channel: Channel, enabled: bool) {
        tracing::debug!(%channel, enabled, "enabled");
    }

    fn play(&mut self, channel: Channel, item: &MediaItem, looping: bool) {
        tracing::info!(%channel, %item, looping, "channel play");
    }

    fn pause(&mut self, channel: Channel) {
        tracing::debug!(%channel, "channel pause");
    }

    fn resume(&mut self, channel: Channel) {
        tracing::debug!(%channel, "channel resume");
    }

    fn stop(&mut self, channel: Channel) {
        tracing::debug!(%channel, "channel stop");
    }
}

/// Status line on stderr, rewritten in place.
#[derive(Debug, Default)]
pub struct StatusLine;

impl MirrorSurface for StatusLine {
    fn on_status_changed(&mut self, line: &str) {
        let mut err = std::io::stderr().lock();
        let _ = write!(err, "\r\x1b[2K{line}");
        let _ = err.flush();
    }
}
