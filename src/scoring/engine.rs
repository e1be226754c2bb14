use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::config::ScoringConfig;
use crate::pitch::comparator::cents_error;
use crate::scoring::pending::{PendingEntry, PendingSet};
use crate::scoring::types::*;
use crate::scoring::validity::{PlaybackSignal, SessionPhase, Validity};
use crate::scoring::window::{Frame, StabilityWindow};

/// Everything a UI or the session gate reads from the engine, in one value.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EngineSnapshot {
    pub live: LiveReadout,
    pub score: Score,
    pub validity: Validity,
    pub phase: SessionPhase,
    pub current_beat: Option<BeatId>,
    pub note_results: BeatResults,
}

/// Judges detected pitches against the notes expected at the current beat.
///
/// Owns all per-session state. Beats and pitch samples must be fed one at a time in
/// arrival order; every pitch sample is matched against the pending set of the most
/// recent beat.
#[derive(Clone, Debug)]
pub struct ScoringEngine {
    config: ScoringConfig,
    pending: PendingSet,
    window: StabilityWindow,
    cooldown_until_ms: Option<f64>,
    last_target: Option<PitchClass>,
    current_beat: Option<BeatId>,
    score: Score,
    results: BeatResults,
    validity: Validity,
    live: LiveReadout,
    // Playback controller reported a start from (near) position zero.
    resumed_from_start: bool,
    start_judged: bool,
    finished: bool,
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new(ScoringConfig::default())
    }
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig) -> Self {
        let window = StabilityWindow::new(config.window_size);
        ScoringEngine {
            config,
            pending: PendingSet::new(),
            window,
            cooldown_until_ms: None,
            last_target: None,
            current_beat: None,
            score: Score::default(),
            results: BeatResults::new(),
            validity: Validity::default(),
            live: LiveReadout::silent(),
            resumed_from_start: false,
            start_judged: false,
            finished: false,
        }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Move to a new beat: backfill misses for the previous beat, replace the pending
    /// targets, grow the total and, on the first beat with notes, decide whether the
    /// attempt started legitimately.
    pub fn on_expected_beat(&mut self, beat: &ExpectedBeat) {
        if self.finished {
            trace!(beat_id = beat.beat_id, "session finished, ignoring beat");
            return;
        }

        self.backfill_missed();

        self.pending = PendingSet::from_beat(beat);
        self.current_beat = Some(beat.beat_id);
        if let Some(first) = self.pending.first() {
            self.last_target = Some(first);
        }

        let units = beat.chord_units();
        self.score.total += units;

        if !self.start_judged && beat.has_notes() {
            self.start_judged = true;
            if beat.is_first_beat || self.resumed_from_start {
                self.validity.started = true;
                self.resumed_from_start = false;
                info!(
                    beat_id = beat.beat_id,
                    is_first_beat = beat.is_first_beat,
                    "session started from the beginning"
                );
            } else {
                self.validity.seeked = true;
                info!(
                    beat_id = beat.beat_id,
                    "first notes arrived mid-song, session will not be saved"
                );
            }
        }

        self.window.clear();
        self.cooldown_until_ms = None;

        debug!(
            beat_id = beat.beat_id,
            units,
            pending = self.pending.len(),
            total = self.score.total,
            "beat transition"
        );
    }

    /// Match one detected pitch against the pending targets and award a hit once the
    /// match has been stable long enough.
    pub fn on_pitch(&mut self, sample: PitchSample) -> PitchOutcome {
        if self.finished {
            return PitchOutcome {
                live: self.live,
                award: None,
            };
        }

        if !sample.is_valid() || sample.hz <= self.config.silence_floor_hz {
            self.window.clear();
            return self.emit(LiveReadout::silent(), None);
        }

        if self.pending.is_empty() {
            // Keep showing intonation against the last target; nothing left to award.
            let live = match self.last_target {
                Some(target) => {
                    let err = cents_error(sample.hz, target);
                    self.track(err);
                    LiveReadout {
                        err_cents: err,
                        in_tune_stable: self.window.is_stable(self.config.required_ok),
                        target: Some(target),
                    }
                }
                None => {
                    self.window.clear();
                    LiveReadout::silent()
                }
            };
            return self.emit(live, None);
        }

        let Some((target, err)) = self.nearest_target(sample.hz) else {
            self.window.clear();
            return self.emit(LiveReadout::silent(), None);
        };

        self.track(err);
        let stable = self.window.is_stable(self.config.required_ok);
        trace!(hz = sample.hz, target, err, stable, "pitch sample");

        let live = LiveReadout {
            err_cents: err,
            in_tune_stable: stable,
            target: Some(target),
        };

        let award = if stable && self.cooldown_elapsed(sample.t_ms) {
            self.award(target, sample.t_ms)
        } else {
            None
        };

        self.emit(live, award)
    }

    pub fn signal(&mut self, signal: PlaybackSignal) {
        if signal.resets_session() {
            self.reset();
        }
        match signal {
            PlaybackSignal::Started { from_beginning } => {
                if from_beginning {
                    self.reset();
                }
                self.resumed_from_start = from_beginning;
                debug!(from_beginning, "playback started");
            }
            PlaybackSignal::Reset | PlaybackSignal::SongLoaded => {}
            other => {
                self.validity.latch(other);
                info!(signal = ?other, validity = ?self.validity, "session invalidated");
            }
        }
    }

    /// Discard the whole session and return to idle.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.window.clear();
        self.cooldown_until_ms = None;
        self.last_target = None;
        self.current_beat = None;
        self.score = Score::default();
        self.results.clear();
        self.validity = Validity::default();
        self.live = LiveReadout::silent();
        self.resumed_from_start = false;
        self.start_judged = false;
        self.finished = false;
        info!("scoring session reset");
    }

    /// Close the session after playback finished on its own. Unmatched notes of the final
    /// beat are recorded as missed. Returns the summary once; later calls return `None`
    /// until the next reset.
    pub fn finish(&mut self, track: TrackInfo) -> Option<SongSummary> {
        if self.finished {
            return None;
        }
        self.backfill_missed();
        self.window.clear();
        self.finished = true;

        let summary = SongSummary::new(self.score, self.validity, track);
        info!(
            hits = summary.score.hits,
            total = summary.score.total,
            phase = ?self.phase(),
            song = %summary.song_name,
            "song finished"
        );
        Some(summary)
    }

    pub fn live(&self) -> LiveReadout {
        self.live
    }

    pub fn score(&self) -> Score {
        self.score
    }

    pub fn validity(&self) -> Validity {
        self.validity
    }

    pub fn note_results(&self) -> &BeatResults {
        &self.results
    }

    pub fn beat_results(&self, beat_id: BeatId) -> Option<&BTreeMap<PitchClass, NoteResult>> {
        self.results.get(&beat_id)
    }

    pub fn pending(&self) -> &PendingSet {
        &self.pending
    }

    pub fn current_beat(&self) -> Option<BeatId> {
        self.current_beat
    }

    pub fn last_target(&self) -> Option<PitchClass> {
        self.last_target
    }

    pub fn phase(&self) -> SessionPhase {
        if self.finished {
            if self.validity.permits_persistence(&self.score) {
                SessionPhase::ValidComplete
            } else {
                SessionPhase::InvalidComplete
            }
        } else if self.start_judged {
            SessionPhase::Active
        } else {
            SessionPhase::Idle
        }
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            live: self.live,
            score: self.score,
            validity: self.validity,
            phase: self.phase(),
            current_beat: self.current_beat,
            note_results: self.results.clone(),
        }
    }

    fn backfill_missed(&mut self) {
        let leftovers = self.pending.drain();
        if leftovers.is_empty() {
            return;
        }
        let Some(beat_id) = self.current_beat else {
            return;
        };
        let beat_map = self.results.entry(beat_id).or_default();
        for pc in leftovers {
            // A correct mark from an earlier award on this beat stays.
            beat_map.entry(pc).or_insert(NoteResult::Missed);
        }
    }

    /// Pending target with the smallest |cents error|; ties go to the lowest pitch class.
    fn nearest_target(&self, hz: f64) -> Option<(PitchClass, f64)> {
        let mut best: Option<(PitchClass, f64)> = None;
        for pc in self.pending.pitch_classes() {
            let err = cents_error(hz, pc);
            match best {
                Some((_, best_err)) if err.abs() >= best_err.abs() => {}
                _ => best = Some((pc, err)),
            }
        }
        best.filter(|(_, err)| err.is_finite())
    }

    fn track(&mut self, err: f64) {
        self.window.push(Frame {
            ok: err.abs() <= self.config.tolerance_cents,
            err_cents: err,
        });
    }

    fn cooldown_elapsed(&self, now_ms: f64) -> bool {
        match self.cooldown_until_ms {
            Some(until) => now_ms >= until,
            None => true,
        }
    }

    fn award(&mut self, target: PitchClass, now_ms: f64) -> Option<Award> {
        let beat_id = self.current_beat?;
        let chord = self.pending.get(target) == Some(PendingEntry::ChordMember);
        let satisfied = self.pending.consume(target);
        if satisfied.is_empty() {
            return None;
        }

        self.score.hits += 1;
        let beat_map = self.results.entry(beat_id).or_default();
        for &pc in &satisfied {
            beat_map.insert(pc, NoteResult::Correct);
        }

        self.cooldown_until_ms = Some(now_ms + self.config.cooldown_ms);
        self.window.clear();

        debug!(
            beat_id,
            target,
            chord,
            hits = self.score.hits,
            total = self.score.total,
            "note awarded"
        );
        Some(Award {
            beat_id,
            pitch_classes: satisfied,
            chord,
        })
    }

    fn emit(&mut self, live: LiveReadout, award: Option<Award>) -> PitchOutcome {
        self.live = live;
        PitchOutcome { live, award }
    }
}
