//! Foreground/background media coordination.
//!
//! At most one foreground item (a one-shot cinematic clip or the backdrop
//! loop) is active. Two background channels, ambient soundscape and music,
//! run underneath it. While a one-shot clip plays, music is ducked to
//! [`DUCKING_RATIO_PERCENT`] of its user level and any background audio that
//! was playing is paused; both are undone once the foreground becomes a loop
//! or stops.

use serde::{Deserialize, Serialize};

use super::adapter::{AudioChannels, Channel, MediaPlayer, PlaybackToken};
use super::catalog::MediaItem;
use crate::error::ValidationError;

/// Music level while a one-shot voice/cinematic clip plays, in percent of the user level.
pub const DUCKING_RATIO_PERCENT: u32 = 35;

/// Scale `volume` by the ducking ratio, rounding half up.
pub fn ducked_volume(volume: u8) -> u8 {
    let scaled = (u32::from(volume) * DUCKING_RATIO_PERCENT + 50) / 100;
    scaled.min(100) as u8
}

/// A foreground play request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRequest {
    pub item: MediaItem,
    pub looping: bool,
}

impl MediaRequest {
    pub fn one_shot(item: MediaItem) -> Self {
        Self {
            item,
            looping: false,
        }
    }

    pub fn looped(item: MediaItem) -> Self {
        Self {
            item,
            looping: true,
        }
    }
}

/// User-controlled state of the two background channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundSettings {
    pub ambient_enabled: bool,
    pub ambient_volume: u8,
    pub music_enabled: bool,
    pub music_volume: u8,
}

impl Default for BackgroundSettings {
    fn default() -> Self {
        Self {
            ambient_enabled: true,
            ambient_volume: 50,
            music_enabled: true,
            music_volume: 60,
        }
    }
}

impl BackgroundSettings {
    /// # Errors
    /// Returns [`ValidationError::VolumeOutOfRange`] when a volume exceeds 100.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (channel, value) in [
            (Channel::Ambient, self.ambient_volume),
            (Channel::Music, self.music_volume),
        ] {
            if value > 100 {
                return Err(ValidationError::VolumeOutOfRange {
                    channel: channel.to_string(),
                    value: u32::from(value),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BackgroundState {
    Stopped,
    Playing,
    Paused,
}

#[derive(Debug, Clone)]
struct Foreground {
    request: MediaRequest,
    token: PlaybackToken,
    playing: bool,
}

/// Which background channels were paused for a voice clip.
#[derive(Debug, Clone, Copy)]
struct VoiceHold {
    resume_ambient: bool,
    resume_music: bool,
}

pub struct MediaDirector {
    player: Box<dyn MediaPlayer>,
    audio: Box<dyn AudioChannels>,
    settings: BackgroundSettings,
    ambient_track: Option<MediaItem>,
    music_track: Option<MediaItem>,
    foreground: Option<Foreground>,
    ambient: BackgroundState,
    music: BackgroundState,
    voice_hold: Option<VoiceHold>,
}

impl MediaDirector {
    pub fn new(
        player: Box<dyn MediaPlayer>,
        audio: Box<dyn AudioChannels>,
        settings: BackgroundSettings,
    ) -> Self {
        let mut director = Self {
            player,
            audio,
            settings: BackgroundSettings {
                ambient_volume: settings.ambient_volume.min(100),
                music_volume: settings.music_volume.min(100),
                ..settings
            },
            ambient_track: None,
            music_track: None,
            foreground: None,
            ambient: BackgroundState::Stopped,
            music: BackgroundState::Stopped,
            voice_hold: None,
        };
        director
            .audio
            .set_enabled(Channel::Ambient, director.settings.ambient_enabled);
        director
            .audio
            .set_enabled(Channel::Music, director.settings.music_enabled);
        director.audio.set_volume(Channel::Voice, 100);
        director.apply_volumes();
        director
    }

    pub fn with_tracks(mut self, ambient: Option<MediaItem>, music: Option<MediaItem>) -> Self {
        self.ambient_track = ambient;
        self.music_track = music;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn settings(&self) -> BackgroundSettings {
        self.settings
    }

    /// The active foreground request, if any.
    pub fn foreground(&self) -> Option<&MediaRequest> {
        self.foreground.as_ref().map(|f| &f.request)
    }

    pub fn current_token(&self) -> Option<PlaybackToken> {
        self.foreground.as_ref().map(|f| f.token)
    }

    /// True while a one-shot clip is the playing foreground item.
    pub fn is_ducking(&self) -> bool {
        self.foreground
            .as_ref()
            .is_some_and(|f| f.playing && !f.request.looping)
    }

    /// Music channel volume after ducking.
    pub fn effective_music_volume(&self) -> u8 {
        if self.is_ducking() {
            ducked_volume(self.settings.music_volume)
        } else {
            self.settings.music_volume
        }
    }

    // ── Foreground ───────────────────────────────────────────────────

    /// Play `request` in the foreground.
    ///
    /// A request identical to the one already playing is a no-op and returns
    /// the existing token; anything else stops the current item first.
    pub fn play_foreground(&mut self, request: MediaRequest) -> PlaybackToken {
        if let Some(current) = &self.foreground {
            if current.playing && current.request == request {
                tracing::debug!(item = %request.item, looping = request.looping, "foreground already playing");
                return current.token;
            }
        }

        if request.looping {
            self.restore_background_after_voice(true);
        } else {
            self.pause_background_for_voice();
        }

        self.player.stop();
        let token = PlaybackToken::next();
        tracing::debug!(item = %request.item, looping = request.looping, %token, "foreground play");
        self.player.play(&request.item, request.looping, token);
        self.foreground = Some(Foreground {
            request,
            token,
            playing: true,
        });
        self.apply_volumes();
        token
    }

    /// Record that the player finished (or failed) the item for `token`.
    ///
    /// Returns `false` for callbacks from superseded requests.
    pub fn finish_foreground(&mut self, token: PlaybackToken) -> bool {
        match &mut self.foreground {
            Some(current) if current.token == token => {
                current.playing = false;
            }
            _ => {
                tracing::debug!(%token, "stale media callback ignored");
                return false;
            }
        }
        self.restore_background_after_voice(true);
        self.apply_volumes();
        true
    }

    /// Stop only the foreground item and voice channel; ambient and music keep going.
    pub fn stop_transition_playback(&mut self) {
        self.player.stop();
        self.audio.stop(Channel::Voice);
        self.foreground = None;
        self.restore_background_after_voice(true);
        self.apply_volumes();
    }

    /// Stop foreground, voice, ambient and music, and forget what was playing.
    pub fn stop_all_playback(&mut self) {
        self.player.stop();
        self.audio.stop(Channel::Voice);
        self.foreground = None;
        self.restore_background_after_voice(false);
        self.stop_background();
        self.apply_volumes();
    }

    /// Short one-shot sound on the voice channel; does not touch the foreground.
    pub fn play_chime(&mut self, item: &MediaItem) {
        self.audio.stop(Channel::Voice);
        self.audio.play(Channel::Voice, item, false);
    }

    // ── Background ───────────────────────────────────────────────────

    /// Start whichever background channels are enabled and not already playing.
    pub fn start_background(&mut self) {
        self.start_ambient();
        self.start_music();
    }

    pub fn stop_background(&mut self) {
        if self.ambient != BackgroundState::Stopped {
            self.audio.stop(Channel::Ambient);
            self.ambient = BackgroundState::Stopped;
        }
        if self.music != BackgroundState::Stopped {
            self.audio.stop(Channel::Music);
            self.music = BackgroundState::Stopped;
        }
    }

    /// Toggle ambient. When enabling, playback starts only if `may_start`.
    pub fn set_ambient_enabled(&mut self, enabled: bool, may_start: bool) {
        self.settings.ambient_enabled = enabled;
        self.audio.set_enabled(Channel::Ambient, enabled);
        if enabled {
            if !may_start {
                return;
            }
            // Under a voice clip the channel waits for the clip to end.
            match &mut self.voice_hold {
                Some(hold) => hold.resume_ambient = true,
                None => self.start_ambient(),
            }
        } else if self.ambient != BackgroundState::Stopped {
            self.audio.stop(Channel::Ambient);
            self.ambient = BackgroundState::Stopped;
        }
    }

    /// Toggle music. When enabling, playback starts only if `may_start`.
    pub fn set_music_enabled(&mut self, enabled: bool, may_start: bool) {
        self.settings.music_enabled = enabled;
        self.audio.set_enabled(Channel::Music, enabled);
        if enabled {
            if !may_start {
                return;
            }
            match &mut self.voice_hold {
                Some(hold) => hold.resume_music = true,
                None => self.start_music(),
            }
        } else if self.music != BackgroundState::Stopped {
            self.audio.stop(Channel::Music);
            self.music = BackgroundState::Stopped;
        }
    }

    pub fn set_ambient_volume(&mut self, percent: u8) {
        self.settings.ambient_volume = percent.min(100);
        self.apply_volumes();
    }

    pub fn set_music_volume(&mut self, percent: u8) {
        self.settings.music_volume = percent.min(100);
        self.apply_volumes();
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn start_ambient(&mut self) {
        if !self.settings.ambient_enabled || self.ambient != BackgroundState::Stopped {
            return;
        }
        let Some(track) = self.ambient_track.clone() else {
            return;
        };
        self.audio.play(Channel::Ambient, &track, true);
        self.ambient = BackgroundState::Playing;
        self.apply_volumes();
    }

    fn start_music(&mut self) {
        if !self.settings.music_enabled || self.music != BackgroundState::Stopped {
            return;
        }
        let Some(track) = self.music_track.clone() else {
            return;
        };
        self.audio.play(Channel::Music, &track, true);
        self.music = BackgroundState::Playing;
        self.apply_volumes();
    }

    fn pause_background_for_voice(&mut self) {
        if self.voice_hold.is_some() {
            return;
        }
        let hold = VoiceHold {
            resume_ambient: self.settings.ambient_enabled
                && self.ambient == BackgroundState::Playing,
            resume_music: self.settings.music_enabled && self.music == BackgroundState::Playing,
        };
        if hold.resume_ambient {
            self.audio.pause(Channel::Ambient);
            self.ambient = BackgroundState::Paused;
        }
        if hold.resume_music {
            self.audio.pause(Channel::Music);
            self.music = BackgroundState::Paused;
        }
        self.voice_hold = Some(hold);
    }

    /// Undo [`Self::pause_background_for_voice`]. Enabled flags are checked
    /// again at this point, so a channel switched off meanwhile stays off,
    /// and one switched back on meanwhile starts now.
    fn restore_background_after_voice(&mut self, resume: bool) {
        let Some(hold) = self.voice_hold.take() else {
            return;
        };
        if !resume {
            return;
        }
        if hold.resume_ambient && self.settings.ambient_enabled {
            match self.ambient {
                BackgroundState::Paused => {
                    self.audio.resume(Channel::Ambient);
                    self.ambient = BackgroundState::Playing;
                }
                BackgroundState::Stopped => self.start_ambient(),
                BackgroundState::Playing => {}
            }
        }
        if hold.resume_music && self.settings.music_enabled {
            match self.music {
                BackgroundState::Paused => {
                    self.audio.resume(Channel::Music);
                    self.music = BackgroundState::Playing;
                }
                BackgroundState::Stopped => self.start_music(),
                BackgroundState::Playing => {}
            }
        }
    }

    fn apply_volumes(&mut self) {
        self.audio
            .set_volume(Channel::Ambient, self.settings.ambient_volume);
        let music = self.effective_music_volume();
        self.audio.set_volume(Channel::Music, music);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::recording::{ChannelStatus, PlayerCall, RecordingChannels, RecordingPlayer};

    fn director(settings: BackgroundSettings) -> (MediaDirector, RecordingPlayer, RecordingChannels) {
        let player = RecordingPlayer::new();
        let audio = RecordingChannels::new();
        let d = MediaDirector::new(Box::new(player.clone()), Box::new(audio.clone()), settings)
            .with_tracks(
                Some(MediaItem::new("noise.mp3")),
                Some(MediaItem::new("bgm.mp3")),
            );
        (d, player, audio)
    }

    fn clip(name: &str) -> MediaItem {
        MediaItem::new(name)
    }

    #[test]
    fn ducked_volume_rounds() {
        assert_eq!(ducked_volume(80), 28);
        assert_eq!(ducked_volume(100), 35);
        assert_eq!(ducked_volume(0), 0);
        assert_eq!(ducked_volume(10), 4);
    }

    #[test]
    fn identical_playing_request_is_noop() {
        let (mut d, player, _) = director(BackgroundSettings::default());
        let a = d.play_foreground(MediaRequest::looped(clip("withyou.mp4")));
        let b = d.play_foreground(MediaRequest::looped(clip("withyou.mp4")));
        assert_eq!(a, b);
        assert_eq!(player.plays().len(), 1);
    }

    #[test]
    fn same_item_different_loop_flag_restarts() {
        let (mut d, player, _) = director(BackgroundSettings::default());
        d.play_foreground(MediaRequest::one_shot(clip("a.mp4")));
        d.play_foreground(MediaRequest::looped(clip("a.mp4")));
        assert_eq!(player.plays().len(), 2);
        let calls = player.calls();
        assert!(matches!(calls[calls.len() - 2], PlayerCall::Stop));
    }

    #[test]
    fn finished_item_can_be_replayed() {
        let (mut d, player, _) = director(BackgroundSettings::default());
        let token = d.play_foreground(MediaRequest::one_shot(clip("a.mp4")));
        assert!(d.finish_foreground(token));
        d.play_foreground(MediaRequest::one_shot(clip("a.mp4")));
        assert_eq!(player.plays().len(), 2);
    }

    #[test]
    fn stale_token_is_rejected() {
        let (mut d, _, _) = director(BackgroundSettings::default());
        let old = d.play_foreground(MediaRequest::one_shot(clip("a.mp4")));
        d.play_foreground(MediaRequest::one_shot(clip("b.mp4")));
        assert!(!d.finish_foreground(old));
        assert!(d.is_ducking());
    }

    #[test]
    fn music_ducks_during_one_shot_and_restores_on_loop() {
        let settings = BackgroundSettings {
            music_volume: 80,
            ..BackgroundSettings::default()
        };
        let (mut d, _, audio) = director(settings);
        d.start_background();
        assert_eq!(audio.volume(Channel::Music), 80);

        d.play_foreground(MediaRequest::one_shot(clip("break1.mp4")));
        assert_eq!(audio.volume(Channel::Music), 28);
        assert_eq!(audio.status(Channel::Music), ChannelStatus::Paused);
        assert_eq!(audio.status(Channel::Ambient), ChannelStatus::Paused);

        d.play_foreground(MediaRequest::looped(clip("withyou.mp4")));
        assert_eq!(audio.volume(Channel::Music), 80);
        assert_eq!(audio.status(Channel::Music), ChannelStatus::Playing);
        assert_eq!(audio.status(Channel::Ambient), ChannelStatus::Playing);
    }

    #[test]
    fn channel_disabled_during_voice_is_not_resumed() {
        let (mut d, _, audio) = director(BackgroundSettings::default());
        d.start_background();
        d.play_foreground(MediaRequest::one_shot(clip("start1.mp4")));
        d.set_music_enabled(false, true);
        assert_eq!(audio.status(Channel::Music), ChannelStatus::Stopped);

        d.play_foreground(MediaRequest::looped(clip("withyou.mp4")));
        assert_eq!(audio.status(Channel::Music), ChannelStatus::Stopped);
        assert_eq!(audio.status(Channel::Ambient), ChannelStatus::Playing);
    }

    #[test]
    fn stop_transition_keeps_background() {
        let (mut d, _, audio) = director(BackgroundSettings::default());
        d.start_background();
        d.play_foreground(MediaRequest::one_shot(clip("end.mp4")));
        d.stop_transition_playback();
        assert!(d.foreground().is_none());
        assert_eq!(audio.status(Channel::Music), ChannelStatus::Playing);
        assert_eq!(audio.status(Channel::Ambient), ChannelStatus::Playing);
    }

    #[test]
    fn stop_all_clears_everything() {
        let (mut d, _, audio) = director(BackgroundSettings::default());
        d.start_background();
        d.play_foreground(MediaRequest::one_shot(clip("end.mp4")));
        d.stop_all_playback();
        assert!(d.foreground().is_none());
        assert!(!d.is_ducking());
        assert_eq!(audio.status(Channel::Music), ChannelStatus::Stopped);
        assert_eq!(audio.status(Channel::Ambient), ChannelStatus::Stopped);
    }

    #[test]
    fn enabling_without_permission_does_not_start() {
        let settings = BackgroundSettings {
            ambient_enabled: false,
            ..BackgroundSettings::default()
        };
        let (mut d, _, audio) = director(settings);
        d.set_ambient_enabled(true, false);
        assert_eq!(audio.status(Channel::Ambient), ChannelStatus::Stopped);
        d.set_ambient_enabled(true, true);
        assert_eq!(audio.status(Channel::Ambient), ChannelStatus::Playing);
    }

    #[test]
    fn reenabling_paused_music_during_voice_keeps_it_paused() {
        let (mut d, _, audio) = director(BackgroundSettings::default());
        d.start_background();
        let token = d.play_foreground(MediaRequest::one_shot(clip("break1.mp4")));
        assert_eq!(audio.status(Channel::Music), ChannelStatus::Paused);

        d.set_music_enabled(true, true);
        d.set_ambient_enabled(true, true);
        assert_eq!(audio.status(Channel::Music), ChannelStatus::Paused);
        assert_eq!(audio.status(Channel::Ambient), ChannelStatus::Paused);

        d.finish_foreground(token);
        assert_eq!(audio.status(Channel::Music), ChannelStatus::Playing);
        assert_eq!(audio.status(Channel::Ambient), ChannelStatus::Playing);
    }

    #[test]
    fn music_switched_back_on_during_voice_starts_after_clip() {
        let (mut d, _, audio) = director(BackgroundSettings::default());
        d.start_background();
        let token = d.play_foreground(MediaRequest::one_shot(clip("break1.mp4")));
        d.set_music_enabled(false, true);
        d.set_music_enabled(true, true);
        assert_eq!(audio.status(Channel::Music), ChannelStatus::Stopped);
        assert!(d.is_ducking());

        d.finish_foreground(token);
        assert_eq!(audio.status(Channel::Music), ChannelStatus::Playing);
        assert_eq!(audio.volume(Channel::Music), 60);
    }

    #[test]
    fn music_first_enabled_during_voice_waits_for_clip() {
        let settings = BackgroundSettings {
            music_enabled: false,
            ..BackgroundSettings::default()
        };
        let (mut d, _, audio) = director(settings);
        d.start_background();
        d.play_foreground(MediaRequest::one_shot(clip("start1.mp4")));
        d.set_music_enabled(true, true);
        assert_eq!(audio.status(Channel::Music), ChannelStatus::Stopped);

        d.stop_transition_playback();
        assert_eq!(audio.status(Channel::Music), ChannelStatus::Playing);
    }

    #[test]
    fn volume_above_range_is_rejected_by_validation() {
        let settings = BackgroundSettings {
            music_volume: 120,
            ..BackgroundSettings::default()
        };
        assert!(settings.validate().is_err());
        assert!(BackgroundSettings::default().validate().is_ok());
    }
}
