use serde::{Deserialize, Serialize};

use crate::scoring::types::{BeatId, ExpectedBeat, PitchClass};

/// Playback positions below this count as "from the beginning".
pub const FROM_BEGINNING_MAX_SEC: f64 = 1.0;

/// A note as reported by the score player for the beat under the cursor.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TabNote {
    /// Sounding pitch as a MIDI number.
    pub value: f64,
    /// Grace note drawn in parentheses.
    #[serde(default)]
    pub is_ghost: bool,
    /// Muted/percussive note drawn as an X.
    #[serde(default)]
    pub is_dead: bool,
}

impl TabNote {
    pub fn new(value: f64) -> Self {
        TabNote {
            value,
            is_ghost: false,
            is_dead: false,
        }
    }

    fn pitch(&self) -> Option<PitchClass> {
        if self.is_ghost || self.is_dead || !self.value.is_finite() {
            return None;
        }
        Some(self.value.round() as PitchClass)
    }
}

/// One beat reached by the playback cursor, indexed by bar and beat within the bar.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TabBeat {
    pub bar_index: i32,
    pub beat_index: i32,
    pub notes: Vec<TabNote>,
}

pub fn beat_id(bar_index: i32, beat_index: i32) -> BeatId {
    if bar_index < 0 || beat_index < 0 {
        return -1;
    }
    bar_index * 1000 + beat_index
}

/// Whether a play press at this position restarts the song rather than resuming it.
pub fn started_from_beginning(time_position_sec: f64) -> bool {
    time_position_sec < FROM_BEGINNING_MAX_SEC
}

impl From<&TabBeat> for ExpectedBeat {
    /// All playable notes of a beat sound together, so they form a single chord.
    /// Ghost and dead notes are not scored.
    fn from(beat: &TabBeat) -> Self {
        let pitches: Vec<PitchClass> = beat.notes.iter().filter_map(TabNote::pitch).collect();
        let chords = if pitches.is_empty() {
            Vec::new()
        } else {
            vec![pitches]
        };
        ExpectedBeat {
            beat_id: beat_id(beat.bar_index, beat.beat_index),
            chords,
            is_first_beat: beat.bar_index == 0 && beat.beat_index == 0,
        }
    }
}
