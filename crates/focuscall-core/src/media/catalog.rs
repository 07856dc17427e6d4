//! Media assets known to a call.
//!
//! The catalog only answers two questions: does a clip of this kind exist,
//! and which one should play next. Decoding and rendering belong to the
//! player adapter.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

/// Reference to a playable local file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaItem {
    path: PathBuf,
}

impl MediaItem {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for MediaItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Role a clip plays in the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipKind {
    Answering,
    Hangup,
    FocusIntro,
    BreakIntro,
    End,
    /// Short chime played on the voice channel when a focus stage starts
    /// without an intro clip.
    StartChime,
    /// Continuous backdrop looped during focus and break stages.
    Backdrop,
}

impl ClipKind {
    pub const ALL: [ClipKind; 7] = [
        ClipKind::Answering,
        ClipKind::Hangup,
        ClipKind::FocusIntro,
        ClipKind::BreakIntro,
        ClipKind::End,
        ClipKind::StartChime,
        ClipKind::Backdrop,
    ];

    /// File stems probed inside the call directory.
    fn stems(self) -> &'static [&'static str] {
        match self {
            ClipKind::Answering => &["answering"],
            ClipKind::Hangup => &["hangup"],
            ClipKind::FocusIntro => &["start1", "start2"],
            ClipKind::BreakIntro => &["break1", "break2", "break3"],
            ClipKind::End => &["end", "end2"],
            ClipKind::StartChime => &["start"],
            ClipKind::Backdrop => &["withyou", "with_you"],
        }
    }

    fn extensions(self) -> &'static [&'static str] {
        match self {
            ClipKind::StartChime => &["mp3", "MP3", "wav", "WAV"],
            _ => &["mov", "mp4", "MOV", "MP4"],
        }
    }

    /// Kinds where every existing file is a candidate rather than just the first.
    fn collects_all(self) -> bool {
        matches!(
            self,
            ClipKind::FocusIntro | ClipKind::BreakIntro | ClipKind::End
        )
    }
}

pub struct MediaCatalog {
    clips: HashMap<ClipKind, Vec<MediaItem>>,
    rng: Pcg32,
}

impl MediaCatalog {
    /// Catalog with no assets at all; every transition degenerates to an
    /// immediate phase change.
    pub fn empty() -> Self {
        Self::with_seed(rand::random())
    }

    /// Empty catalog with a deterministic clip picker.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            clips: HashMap::new(),
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Probe `dir` for the well-known clip names.
    ///
    /// A missing directory yields an empty catalog.
    pub fn discover(dir: &Path, seed: Option<u64>) -> Self {
        let mut catalog = match seed {
            Some(seed) => Self::with_seed(seed),
            None => Self::empty(),
        };
        for kind in ClipKind::ALL {
            let mut found = Vec::new();
            'stems: for stem in kind.stems() {
                for ext in kind.extensions() {
                    let candidate = dir.join(format!("{stem}.{ext}"));
                    if candidate.is_file() {
                        found.push(MediaItem::new(candidate));
                        if !kind.collects_all() {
                            break 'stems;
                        }
                        continue 'stems;
                    }
                }
            }
            for item in found {
                catalog.insert(kind, item);
            }
        }
        tracing::debug!(dir = %dir.display(), kinds = catalog.clips.len(), "media catalog discovered");
        catalog
    }

    pub fn insert(&mut self, kind: ClipKind, item: MediaItem) {
        self.clips.entry(kind).or_default().push(item);
    }

    pub fn with_clip(mut self, kind: ClipKind, item: MediaItem) -> Self {
        self.insert(kind, item);
        self
    }

    pub fn has(&self, kind: ClipKind) -> bool {
        self.clips.get(&kind).is_some_and(|items| !items.is_empty())
    }

    pub fn candidates(&self, kind: ClipKind) -> &[MediaItem] {
        self.clips.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Choose one clip of `kind` at random.
    pub fn pick(&mut self, kind: ClipKind) -> Option<MediaItem> {
        let items = self.clips.get(&kind)?;
        items.choose(&mut self.rng).cloned()
    }
}

impl Default for MediaCatalog {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for MediaCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaCatalog")
            .field("clips", &self.clips)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_catalog_has_nothing() {
        let mut catalog = MediaCatalog::with_seed(1);
        for kind in ClipKind::ALL {
            assert!(!catalog.has(kind));
            assert!(catalog.pick(kind).is_none());
        }
    }

    #[test]
    fn pick_returns_one_of_the_candidates() {
        let mut catalog = MediaCatalog::with_seed(7)
            .with_clip(ClipKind::BreakIntro, MediaItem::new("break1.mp4"))
            .with_clip(ClipKind::BreakIntro, MediaItem::new("break2.mp4"));
        for _ in 0..20 {
            let item = catalog.pick(ClipKind::BreakIntro).unwrap();
            assert!(catalog.candidates(ClipKind::BreakIntro).contains(&item));
        }
    }

    #[test]
    fn same_seed_same_sequence() {
        let build = || {
            MediaCatalog::with_seed(42)
                .with_clip(ClipKind::End, MediaItem::new("end.mp4"))
                .with_clip(ClipKind::End, MediaItem::new("end2.mp4"))
        };
        let (mut a, mut b) = (build(), build());
        let seq_a: Vec<_> = (0..8).map(|_| a.pick(ClipKind::End)).collect();
        let seq_b: Vec<_> = (0..8).map(|_| b.pick(ClipKind::End)).collect();
        assert_eq!(seq_a, seq_b);
    }

    #[test]
    fn discover_probes_known_names() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["answering.mp4", "start1.mov", "start2.MP4", "break3.mov", "start.wav", "withyou.mp4", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        let catalog = MediaCatalog::discover(dir.path(), Some(3));
        assert!(catalog.has(ClipKind::Answering));
        assert_eq!(catalog.candidates(ClipKind::FocusIntro).len(), 2);
        assert_eq!(catalog.candidates(ClipKind::BreakIntro).len(), 1);
        assert!(catalog.has(ClipKind::StartChime));
        assert!(catalog.has(ClipKind::Backdrop));
        assert!(!catalog.has(ClipKind::Hangup));
        assert!(!catalog.has(ClipKind::End));
    }

    #[test]
    fn discover_missing_dir_is_empty() {
        let catalog = MediaCatalog::discover(Path::new("/definitely/not/here"), Some(0));
        assert!(ClipKind::ALL.iter().all(|k| !catalog.has(*k)));
    }
}
