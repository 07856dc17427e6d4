//! Seams to the platform media stack.
//!
//! Both traits are fire-and-forget: calls return immediately and the player
//! reports the end of a foreground item later, through
//! [`SessionEvent::MediaCompleted`](crate::timer::SessionEvent::MediaCompleted)
//! or [`SessionEvent::MediaFailed`](crate::timer::SessionEvent::MediaFailed),
//! tagged with the token it was given.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use super::catalog::MediaItem;

/// Identifies one foreground play request.
///
/// Tokens increase monotonically, so a callback carrying anything but the
/// latest token belongs to a superseded request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlaybackToken(u64);

impl PlaybackToken {
    pub fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::SeqCst))
    }

    #[must_use]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PlaybackToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "play-{}", self.0)
    }
}

/// Foreground video/cinematic player.
pub trait MediaPlayer {
    /// Start `item`. One-shot items must eventually be reported completed or
    /// failed exactly once for `token`, unless a later `play`/`stop` supersedes them.
    fn play(&mut self, item: &MediaItem, looping: bool, token: PlaybackToken);

    fn stop(&mut self);
}

/// Independently controllable audio channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Voice-over and transition sound effects.
    Voice,
    /// Ambient soundscape loop.
    Ambient,
    /// Background music.
    Music,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Channel::Voice => "voice",
            Channel::Ambient => "ambient",
            Channel::Music => "music",
        };
        f.write_str(name)
    }
}

pub trait AudioChannels {
    /// `percent` is within 0..=100.
    fn set_volume(&mut self, channel: Channel, percent: u8);
    fn set_enabled(&mut self, channel: Channel, enabled: bool);
    fn play(&mut self, channel: Channel, item: &MediaItem, looping: bool);
    fn pause(&mut self, channel: Channel);
    fn resume(&mut self, channel: Channel);
    fn stop(&mut self, channel: Channel);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_monotonic() {
        let a = PlaybackToken::next();
        let b = PlaybackToken::next();
        assert!(b > a);
        assert_ne!(a.as_u64(), b.as_u64());
    }
}
