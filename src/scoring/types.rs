use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::scoring::validity::Validity;

/// MIDI-like note number. Compared octave-folded, so 60 and 72 both match a C.
pub type PitchClass = i32;

/// Unique beat identifier across a song, `bar * 1000 + beat`.
pub type BeatId = i32;

/// One detection tick from the pitch source.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct PitchSample {
    pub hz: f64,
    /// Producer timestamp in milliseconds, monotonic within a session.
    pub t_ms: f64,
}

impl PitchSample {
    pub fn new(hz: f64, t_ms: f64) -> Self {
        PitchSample { hz, t_ms }
    }

    pub fn is_valid(&self) -> bool {
        self.hz.is_finite() && self.hz > 0.0
    }
}

/// Notes expected at one playback beat.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ExpectedBeat {
    pub beat_id: BeatId,
    /// Each inner list sounds together; a single note is a chord of one.
    pub chords: Vec<Vec<PitchClass>>,
    #[serde(default)]
    pub is_first_beat: bool,
}

impl ExpectedBeat {
    pub fn new(beat_id: BeatId, chords: Vec<Vec<PitchClass>>, is_first_beat: bool) -> Self {
        ExpectedBeat {
            beat_id,
            chords,
            is_first_beat,
        }
    }

    /// Number of scoring units in this beat: one per non-empty chord.
    pub fn chord_units(&self) -> u32 {
        self.chords.iter().filter(|c| !c.is_empty()).count() as u32
    }

    pub fn has_notes(&self) -> bool {
        self.chord_units() > 0
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Score {
    pub hits: u32,
    pub total: u32,
}

impl Score {
    /// Rounded hit percentage, `None` when nothing was expected.
    pub fn percentage(&self) -> Option<u32> {
        if self.total == 0 {
            return None;
        }
        Some((self.hits as f64 / self.total as f64 * 100.0).round() as u32)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NoteResult {
    Correct,
    /// Reserved for rendering collaborators; the engine only emits correct and missed.
    Incorrect,
    Missed,
}

/// beat id -> pitch class -> result, for feedback coloring.
pub type BeatResults = BTreeMap<BeatId, BTreeMap<PitchClass, NoteResult>>;

/// Live intonation readout, refreshed on every pitch sample.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct LiveReadout {
    /// Signed, octave-folded error in `[-600, 600)`; 0 when there is no target.
    pub err_cents: f64,
    pub in_tune_stable: bool,
    pub target: Option<PitchClass>,
}

impl LiveReadout {
    pub fn silent() -> Self {
        LiveReadout::default()
    }
}

/// A hit granted by the award logic.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Award {
    pub beat_id: BeatId,
    /// Every pitch class marked correct by this award (all members for a chord).
    pub pitch_classes: Vec<PitchClass>,
    pub chord: bool,
}

/// What processing one pitch sample produced.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PitchOutcome {
    pub live: LiveReadout,
    pub award: Option<Award>,
}

pub const UNKNOWN_INSTRUMENT: &str = "Unknown Instrument";

/// Identifies what was being played, supplied by the playback controller at song end.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct TrackInfo {
    pub track_id: Option<i32>,
    pub song_name: String,
    pub instrument_name: Option<String>,
}

/// Emitted once when playback finishes naturally.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SongSummary {
    pub score: Score,
    pub validity: Validity,
    pub track_id: Option<i32>,
    pub song_name: String,
    pub instrument_name: String,
}

impl SongSummary {
    pub fn new(score: Score, validity: Validity, track: TrackInfo) -> Self {
        let instrument_name = track
            .instrument_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_INSTRUMENT.to_string());
        SongSummary {
            score,
            validity,
            track_id: track.track_id,
            song_name: track.song_name,
            instrument_name,
        }
    }
}
