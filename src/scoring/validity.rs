use serde::{Deserialize, Serialize};

use crate::scoring::types::Score;

/// Whether a playback attempt may still be saved. The four invalidating flags latch:
/// once set they stay set until the session is reset.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Validity {
    pub started: bool,
    pub paused: bool,
    pub track_changed: bool,
    pub manual_stop: bool,
    pub seeked: bool,
}

impl Validity {
    /// Started from the beginning and never interrupted.
    pub fn is_clean(&self) -> bool {
        self.started && !self.paused && !self.track_changed && !self.manual_stop && !self.seeked
    }

    pub fn permits_persistence(&self, score: &Score) -> bool {
        self.is_clean() && score.total > 0
    }

    pub(crate) fn latch(&mut self, signal: PlaybackSignal) {
        match signal {
            PlaybackSignal::Pause => self.paused = true,
            PlaybackSignal::ManualStop => self.manual_stop = true,
            PlaybackSignal::TrackChanged => self.track_changed = true,
            PlaybackSignal::Seek => self.seeked = true,
            PlaybackSignal::Started { .. } | PlaybackSignal::SongLoaded | PlaybackSignal::Reset => {}
        }
    }
}

/// Out-of-band signals from the playback controller.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(tag = "signal", rename_all = "snake_case")]
pub enum PlaybackSignal {
    Started { from_beginning: bool },
    Pause,
    ManualStop,
    TrackChanged,
    Seek,
    SongLoaded,
    Reset,
}

impl PlaybackSignal {
    /// Signals that discard the whole session before anything else happens.
    pub fn resets_session(&self) -> bool {
        matches!(
            self,
            PlaybackSignal::ManualStop | PlaybackSignal::SongLoaded | PlaybackSignal::Reset
        )
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    Active,
    ValidComplete,
    InvalidComplete,
}
