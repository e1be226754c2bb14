use serde::Serialize;
use wasm_bindgen::prelude::*;

pub mod config;
pub mod error;
pub mod expectation;
pub mod pitch;
pub mod scoring;
pub mod session;

pub use config::ScoringConfig;
pub use error::Error;
pub use scoring::engine::{EngineSnapshot, ScoringEngine};
pub use scoring::types::{
    Award, BeatId, BeatResults, ExpectedBeat, LiveReadout, NoteResult, PitchClass, PitchOutcome,
    PitchSample, Score, SongSummary, TrackInfo,
};
pub use scoring::validity::{PlaybackSignal, SessionPhase, Validity};
pub use session::gate::{Rejection, SaveFailure, SaveOffer, SessionGate};

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn from_js<T: serde::de::DeserializeOwned>(value: JsValue) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Result of a natural song end: the summary plus the gate's decision.
#[derive(Serialize)]
struct SongEnd {
    summary: SongSummary,
    offer: Option<SaveOffer>,
    rejection: Option<String>,
}

/// One scoring session for the page. Owns the engine, so the pitch worklet callback and
/// the score player's beat callback are applied strictly one after another.
#[wasm_bindgen]
pub struct ScoringSession {
    engine: ScoringEngine,
    gate: SessionGate,
}

#[wasm_bindgen]
impl ScoringSession {
    #[wasm_bindgen(constructor)]
    pub fn new(track_id: Option<i32>) -> ScoringSession {
        ScoringSession {
            engine: ScoringEngine::default(),
            gate: SessionGate::new(track_id),
        }
    }

    /// Build a session with a custom `ScoringConfig` object; missing fields use defaults.
    pub fn with_config(
        config_js: JsValue,
        track_id: Option<i32>,
    ) -> Result<ScoringSession, JsValue> {
        let config: ScoringConfig = from_js(config_js)?;
        config
            .validate()
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(ScoringSession {
            engine: ScoringEngine::new(config),
            gate: SessionGate::new(track_id),
        })
    }

    /// `{ beat_id, chords: number[][], is_first_beat }` from the score player.
    pub fn expected_beat(&mut self, beat_js: JsValue) -> Result<(), JsValue> {
        let beat: ExpectedBeat = from_js(beat_js)?;
        self.engine.on_expected_beat(&beat);
        Ok(())
    }

    /// `{ bar_index, beat_index, notes: [{ value, is_ghost, is_dead }] }` straight from
    /// the tab player's beat-changed callback.
    pub fn tab_beat(&mut self, beat_js: JsValue) -> Result<(), JsValue> {
        let tab: expectation::TabBeat = from_js(beat_js)?;
        self.engine.on_expected_beat(&ExpectedBeat::from(&tab));
        Ok(())
    }

    /// Returns Float64Array [err_cents, in_tune_stable (0/1), target pitch class or NaN].
    pub fn pitch_detected(&mut self, hz: f64, t_ms: f64) -> js_sys::Float64Array {
        let live = self.engine.on_pitch(PitchSample::new(hz, t_ms)).live;
        let arr = js_sys::Float64Array::new_with_length(3);
        arr.set_index(0, live.err_cents);
        arr.set_index(1, if live.in_tune_stable { 1.0 } else { 0.0 });
        arr.set_index(2, live.target.map(|t| t as f64).unwrap_or(f64::NAN));
        arr
    }

    /// Call on play. Restarting near position zero resets the session; returns whether it
    /// counted as a start from the beginning.
    pub fn playback_started(&mut self, time_position_sec: f64) -> bool {
        let from_beginning = expectation::started_from_beginning(time_position_sec);
        self.engine.signal(PlaybackSignal::Started { from_beginning });
        from_beginning
    }

    pub fn pause(&mut self) {
        self.engine.signal(PlaybackSignal::Pause);
    }

    pub fn manual_stop(&mut self) {
        self.engine.signal(PlaybackSignal::ManualStop);
    }

    pub fn track_changed(&mut self, track_id: Option<i32>) {
        self.gate.set_default_track_id(track_id);
        self.engine.signal(PlaybackSignal::TrackChanged);
    }

    pub fn seek(&mut self) {
        self.engine.signal(PlaybackSignal::Seek);
    }

    pub fn song_loaded(&mut self) {
        self.engine.signal(PlaybackSignal::SongLoaded);
    }

    pub fn reset(&mut self) {
        self.engine.signal(PlaybackSignal::Reset);
    }

    pub fn live(&self) -> Result<JsValue, JsValue> {
        to_js(&self.engine.live())
    }

    pub fn score(&self) -> Result<JsValue, JsValue> {
        to_js(&self.engine.score())
    }

    pub fn validity(&self) -> Result<JsValue, JsValue> {
        to_js(&self.engine.validity())
    }

    pub fn phase(&self) -> Result<JsValue, JsValue> {
        to_js(&self.engine.phase())
    }

    /// Map<beatId, Map<pitchClass, "correct" | "incorrect" | "missed">>
    pub fn note_results(&self) -> Result<JsValue, JsValue> {
        to_js(self.engine.note_results())
    }

    pub fn beat_results(&self, beat_id: i32) -> Result<JsValue, JsValue> {
        to_js(&self.engine.beat_results(beat_id))
    }

    /// Call when playback finishes on its own. Returns `{ summary, offer, rejection }`,
    /// or `null` if this session already reported its end.
    pub fn song_finished(
        &mut self,
        track_id: Option<i32>,
        song_name: String,
        instrument_name: Option<String>,
        now_ms: f64,
    ) -> Result<JsValue, JsValue> {
        let track = TrackInfo {
            track_id,
            song_name,
            instrument_name,
        };
        let Some(summary) = self.engine.finish(track) else {
            return Ok(JsValue::NULL);
        };
        let (offer, rejection) = match self.gate.evaluate(&summary, now_ms) {
            Ok(offer) => (Some(offer), None),
            Err(reason) => (None, Some(reason.to_string())),
        };
        to_js(&SongEnd {
            summary,
            offer,
            rejection,
        })
    }
}

/// Octave-agnostic cents error of `hz` against `pitch_class`, in [-600, 600).
#[wasm_bindgen]
pub fn cents_error(hz: f64, pitch_class: i32) -> f64 {
    pitch::comparator::cents_error(hz, pitch_class)
}

/// Message to show for a failed save request, or undefined if the status is a success.
#[wasm_bindgen]
pub fn save_failure_message(status: u16, server_message: Option<String>) -> Option<String> {
    SaveFailure::from_response(status, server_message.as_deref()).map(|f| f.to_string())
}
