use serde::{Deserialize, Serialize};

use crate::config::ScoringConfig;
use crate::expectation::TabBeat;
use crate::scoring::engine::ScoringEngine;
use crate::scoring::types::{ExpectedBeat, PitchOutcome, PitchSample, TrackInfo};
use crate::scoring::validity::PlaybackSignal;

/// One input from either producer, in the order it reached the scorer.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    Beat(ExpectedBeat),
    TabBeat(TabBeat),
    Pitch(PitchSample),
    Signal(PlaybackSignal),
}

impl SessionEvent {
    /// Feed this event to the engine. Pitch samples yield their outcome.
    pub fn apply_to(&self, engine: &mut ScoringEngine) -> Option<PitchOutcome> {
        match self {
            SessionEvent::Beat(beat) => {
                engine.on_expected_beat(beat);
                None
            }
            SessionEvent::TabBeat(tab) => {
                engine.on_expected_beat(&ExpectedBeat::from(tab));
                None
            }
            SessionEvent::Pitch(sample) => Some(engine.on_pitch(*sample)),
            SessionEvent::Signal(signal) => {
                engine.signal(*signal);
                None
            }
        }
    }
}

impl From<ExpectedBeat> for SessionEvent {
    fn from(beat: ExpectedBeat) -> Self {
        SessionEvent::Beat(beat)
    }
}

impl From<PitchSample> for SessionEvent {
    fn from(sample: PitchSample) -> Self {
        SessionEvent::Pitch(sample)
    }
}

impl From<PlaybackSignal> for SessionEvent {
    fn from(signal: PlaybackSignal) -> Self {
        SessionEvent::Signal(signal)
    }
}

/// A captured playback attempt that can be replayed offline.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct SessionRecording {
    #[serde(default)]
    pub config: Option<ScoringConfig>,
    #[serde(default)]
    pub track: TrackInfo,
    pub events: Vec<SessionEvent>,
}

impl SessionRecording {
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        let recording: SessionRecording = serde_json::from_str(json)?;
        if let Some(config) = &recording.config {
            config.validate()?;
        }
        Ok(recording)
    }
}
