//! Mirror surfaces
//!
//! Compact views of a live call (the floating control bar, the tray entry).
//! They only ever see the status line and can only send back four intents.
//! Any number may be attached, including none.

mod status;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::timer::SessionEvent;

pub use status::{
    format_countdown, stage_label, status_line, STAGE_BREAK, STAGE_ENDING, STAGE_FOCUS,
    STAGE_IN_CALL, STAGE_PAUSED, STAGE_SETTINGS,
};

/// Observer of the status line.
pub trait MirrorSurface {
    fn on_status_changed(&mut self, line: &str);
}

/// Handle returned by [`MirrorHub::attach`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MirrorId(u64);

impl MirrorId {
    fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::SeqCst))
    }

    #[must_use]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for MirrorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mirror-{}", self.0)
    }
}

/// What a mirror may ask of the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MirrorIntent {
    Expand,
    OpenChat,
    TogglePause,
    Hangup,
}

impl From<MirrorIntent> for SessionEvent {
    fn from(intent: MirrorIntent) -> Self {
        match intent {
            MirrorIntent::Expand => SessionEvent::Expand,
            MirrorIntent::OpenChat => SessionEvent::OpenChat,
            MirrorIntent::TogglePause => SessionEvent::TogglePause,
            MirrorIntent::Hangup => SessionEvent::Hangup,
        }
    }
}

/// Fan-out of the status line to attached surfaces.
#[derive(Default)]
pub struct MirrorHub {
    surfaces: BTreeMap<MirrorId, Box<dyn MirrorSurface>>,
    last_line: Option<String>,
}

impl MirrorHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a surface; it immediately receives the current line, if any.
    pub fn attach(&mut self, mut surface: Box<dyn MirrorSurface>) -> MirrorId {
        let id = MirrorId::new();
        if let Some(line) = &self.last_line {
            surface.on_status_changed(line);
        }
        self.surfaces.insert(id, surface);
        tracing::debug!(%id, attached = self.surfaces.len(), "mirror attached");
        id
    }

    pub fn detach(&mut self, id: MirrorId) -> bool {
        let removed = self.surfaces.remove(&id).is_some();
        if removed {
            tracing::debug!(%id, attached = self.surfaces.len(), "mirror detached");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    pub fn current_line(&self) -> Option<&str> {
        self.last_line.as_deref()
    }

    /// Push `line` to every surface unless it equals the last one pushed.
    pub fn publish(&mut self, line: String) -> bool {
        if self.last_line.as_deref() == Some(line.as_str()) {
            return false;
        }
        for surface in self.surfaces.values_mut() {
            surface.on_status_changed(&line);
        }
        self.last_line = Some(line);
        true
    }
}

impl fmt::Debug for MirrorHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MirrorHub")
            .field("surfaces", &self.surfaces.keys().collect::<Vec<_>>())
            .field("last_line", &self.last_line)
            .finish()
    }
}

/// Surface that keeps every line it was sent. Clones share the log.
#[derive(Debug, Clone, Default)]
pub struct RecordingMirror {
    lines: Rc<RefCell<Vec<String>>>,
}

impl RecordingMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.lines.borrow().last().cloned()
    }
}

impl MirrorSurface for RecordingMirror {
    fn on_status_changed(&mut self, line: &str) {
        self.lines.borrow_mut().push(line.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_skips_duplicates() {
        let mut hub = MirrorHub::new();
        let mirror = RecordingMirror::new();
        hub.attach(Box::new(mirror.clone()));
        assert!(hub.publish("Focus · 00:03".into()));
        assert!(!hub.publish("Focus · 00:03".into()));
        assert!(hub.publish("Focus · 00:02".into()));
        assert_eq!(mirror.lines(), vec!["Focus · 00:03", "Focus · 00:02"]);
    }

    #[test]
    fn late_attach_gets_current_line() {
        let mut hub = MirrorHub::new();
        hub.publish("Break · 04:59".into());
        let mirror = RecordingMirror::new();
        hub.attach(Box::new(mirror.clone()));
        assert_eq!(mirror.last().as_deref(), Some("Break · 04:59"));
    }

    #[test]
    fn detached_surface_stops_receiving() {
        let mut hub = MirrorHub::new();
        let bar = RecordingMirror::new();
        let tray = RecordingMirror::new();
        let bar_id = hub.attach(Box::new(bar.clone()));
        hub.attach(Box::new(tray.clone()));

        assert!(hub.detach(bar_id));
        assert!(!hub.detach(bar_id));
        hub.publish("Paused · 10:00".into());
        assert!(bar.lines().is_empty());
        assert_eq!(tray.lines().len(), 1);
        assert_eq!(hub.len(), 1);
    }

    #[test]
    fn intents_map_to_session_events() {
        assert_eq!(SessionEvent::from(MirrorIntent::Hangup), SessionEvent::Hangup);
        assert_eq!(
            SessionEvent::from(MirrorIntent::TogglePause),
            SessionEvent::TogglePause
        );
    }
}
