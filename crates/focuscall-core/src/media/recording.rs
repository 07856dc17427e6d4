//! In-memory adapters that record every call.
//!
//! Used by headless hosts and by tests. Clones share one log, so a host can
//! keep a handle while the orchestrator owns the boxed adapter.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::adapter::{AudioChannels, Channel, MediaPlayer, PlaybackToken};
use super::catalog::MediaItem;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerCall {
    Play {
        item: MediaItem,
        looping: bool,
        token: PlaybackToken,
    },
    Stop,
}

#[derive(Debug, Clone, Default)]
pub struct RecordingPlayer {
    calls: Rc<RefCell<Vec<PlayerCall>>>,
}

impl RecordingPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<PlayerCall> {
        self.calls.borrow().clone()
    }

    /// `(item, looping)` of every play request, in order.
    pub fn plays(&self) -> Vec<(MediaItem, bool)> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                PlayerCall::Play { item, looping, .. } => Some((item.clone(), *looping)),
                PlayerCall::Stop => None,
            })
            .collect()
    }

    /// Token of the most recent play request.
    pub fn last_token(&self) -> Option<PlaybackToken> {
        self.calls.borrow().iter().rev().find_map(|c| match c {
            PlayerCall::Play { token, .. } => Some(*token),
            PlayerCall::Stop => None,
        })
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }
}

impl MediaPlayer for RecordingPlayer {
    fn play(&mut self, item: &MediaItem, looping: bool, token: PlaybackToken) {
        self.calls.borrow_mut().push(PlayerCall::Play {
            item: item.clone(),
            looping,
            token,
        });
    }

    fn stop(&mut self) {
        self.calls.borrow_mut().push(PlayerCall::Stop);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelStatus {
    #[default]
    Stopped,
    Playing,
    Paused,
}

#[derive(Debug, Clone, Default)]
pub struct ChannelState {
    pub volume: u8,
    pub enabled: bool,
    pub status: ChannelStatus,
    pub item: Option<MediaItem>,
}

#[derive(Debug, Clone, Default)]
pub struct RecordingChannels {
    state: Rc<RefCell<HashMap<Channel, ChannelState>>>,
}

impl RecordingChannels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, channel: Channel) -> ChannelState {
        self.state
            .borrow()
            .get(&channel)
            .cloned()
            .unwrap_or_default()
    }

    pub fn volume(&self, channel: Channel) -> u8 {
        self.state(channel).volume
    }

    pub fn status(&self, channel: Channel) -> ChannelStatus {
        self.state(channel).status
    }

    fn with(&self, channel: Channel, f: impl FnOnce(&mut ChannelState)) {
        let mut map = self.state.borrow_mut();
        f(map.entry(channel).or_default());
    }
}

impl AudioChannels for RecordingChannels {
    fn set_volume(&mut self, channel: Channel, percent: u8) {
        self.with(channel, |s| s.volume = percent);
    }

    fn set_enabled(&mut self, channel: Channel, enabled: bool) {
        self.with(channel, |s| s.enabled = enabled);
    }

    fn play(&mut self, channel: Channel, item: &MediaItem, _looping: bool) {
        self.with(channel, |s| {
            s.item = Some(item.clone());
            s.status = ChannelStatus::Playing;
        });
    }

    fn pause(&mut self, channel: Channel) {
        self.with(channel, |s| {
            if s.status == ChannelStatus::Playing {
                s.status = ChannelStatus::Paused;
            }
        });
    }

    fn resume(&mut self, channel: Channel) {
        self.with(channel, |s| {
            if s.status == ChannelStatus::Paused {
                s.status = ChannelStatus::Playing;
            }
        });
    }

    fn stop(&mut self, channel: Channel) {
        self.with(channel, |s| {
            s.status = ChannelStatus::Stopped;
            s.item = None;
        });
    }
}
