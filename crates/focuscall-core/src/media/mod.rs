mod adapter;
mod catalog;
mod director;
pub mod recording;

pub use adapter::{AudioChannels, Channel, MediaPlayer, PlaybackToken};
pub use catalog::{ClipKind, MediaCatalog, MediaItem};
pub use director::{
    ducked_volume, BackgroundSettings, MediaDirector, MediaRequest, DUCKING_RATIO_PERCENT,
};
