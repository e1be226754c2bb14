use tab_scorer::expectation::{TabBeat, TabNote};
use tab_scorer::*;

const STEP_MS: f64 = 21.0;

fn midi_hz(midi: i32) -> f64 {
    440.0 * 2f64.powf((midi as f64 - 69.0) / 12.0)
}

/// Hold `hz` for `n` detection ticks, returning the clock afterwards.
fn hold(engine: &mut ScoringEngine, hz: f64, mut t: f64, n: usize) -> f64 {
    for _ in 0..n {
        engine.on_pitch(PitchSample::new(hz, t));
        t += STEP_MS;
    }
    t
}

fn track() -> TrackInfo {
    TrackInfo {
        track_id: Some(42),
        song_name: "Seven Nation Army".to_string(),
        instrument_name: Some("Bass".to_string()),
    }
}

#[test]
fn test_full_clean_run_is_offered() {
    let mut engine = ScoringEngine::default();
    let mut gate = SessionGate::default();

    engine.signal(PlaybackSignal::Started { from_beginning: true });
    engine.on_expected_beat(&ExpectedBeat::new(0, vec![vec![40]], true));
    let t = hold(&mut engine, midi_hz(40), 0.0, 8);
    engine.on_expected_beat(&ExpectedBeat::new(1, vec![vec![40, 47, 52]], false));
    let t = hold(&mut engine, midi_hz(52), t, 8);
    engine.on_expected_beat(&ExpectedBeat::new(2, vec![vec![43]], false));
    hold(&mut engine, midi_hz(43) * 2.0, t, 8);

    let summary = engine.finish(track()).unwrap();
    assert_eq!(summary.score, Score { hits: 3, total: 3 });
    assert_eq!(engine.phase(), SessionPhase::ValidComplete);

    let offer = gate.evaluate(&summary, 10_000.0).unwrap();
    assert_eq!(offer.percentage, 100);
    assert_eq!(offer.track_id, 42);
    assert_eq!(offer.instrument, "Bass");

    let results = engine.note_results();
    assert_eq!(results[&1].len(), 3);
    assert!(results.values().flat_map(|b| b.values()).all(|r| *r == NoteResult::Correct));
}

#[test]
fn test_seeked_run_is_never_offered() {
    let mut engine = ScoringEngine::default();
    engine.on_expected_beat(&ExpectedBeat::new(0, vec![vec![40]], true));
    hold(&mut engine, midi_hz(40), 0.0, 8);
    engine.signal(PlaybackSignal::Seek);
    engine.on_expected_beat(&ExpectedBeat::new(5000, vec![vec![45]], false));
    hold(&mut engine, midi_hz(45), 500.0, 8);

    let summary = engine.finish(track()).unwrap();
    assert_eq!(summary.score, Score { hits: 2, total: 2 });
    assert_eq!(engine.phase(), SessionPhase::InvalidComplete);

    let err = SessionGate::default().evaluate(&summary, 0.0).unwrap_err();
    assert!(matches!(err, Rejection::Invalid(v) if v.seeked));
}

#[test]
fn test_tab_beats_drive_the_engine() {
    let mut engine = ScoringEngine::default();
    let beats = [
        TabBeat {
            bar_index: 0,
            beat_index: 0,
            notes: vec![TabNote::new(45.0), TabNote::new(52.0)],
        },
        TabBeat {
            bar_index: 0,
            beat_index: 1,
            notes: vec![],
        },
        TabBeat {
            bar_index: 1,
            beat_index: 0,
            notes: vec![TabNote::new(50.0)],
        },
    ];

    engine.on_expected_beat(&ExpectedBeat::from(&beats[0]));
    hold(&mut engine, midi_hz(45), 0.0, 8);
    engine.on_expected_beat(&ExpectedBeat::from(&beats[1]));
    engine.on_expected_beat(&ExpectedBeat::from(&beats[2]));
    engine.on_expected_beat(&ExpectedBeat::new(1001, vec![], false));

    assert_eq!(engine.score(), Score { hits: 1, total: 2 });
    let results = engine.note_results();
    assert_eq!(results[&0][&45], NoteResult::Correct);
    assert_eq!(results[&0][&52], NoteResult::Correct);
    assert_eq!(results[&1000][&50], NoteResult::Missed);
    assert!(!results.contains_key(&1));
}

#[test]
fn test_song_loaded_starts_fresh() {
    let mut engine = ScoringEngine::default();
    engine.on_expected_beat(&ExpectedBeat::new(0, vec![vec![40]], true));
    engine.signal(PlaybackSignal::TrackChanged);
    engine.signal(PlaybackSignal::SongLoaded);

    assert_eq!(engine.snapshot(), ScoringEngine::default().snapshot());

    engine.on_expected_beat(&ExpectedBeat::new(0, vec![vec![40]], true));
    assert!(engine.validity().is_clean());
}

#[test]
fn test_wrong_note_scores_nothing_and_is_missed() {
    let mut engine = ScoringEngine::default();
    engine.on_expected_beat(&ExpectedBeat::new(0, vec![vec![60]], true));
    // A fourth away, in any octave.
    hold(&mut engine, midi_hz(65), 0.0, 20);
    hold(&mut engine, midi_hz(77), 420.0, 20);
    assert_eq!(engine.live().target, Some(60));
    engine.on_expected_beat(&ExpectedBeat::new(1, vec![], false));

    assert_eq!(engine.score(), Score { hits: 0, total: 1 });
    assert_eq!(engine.note_results()[&0][&60], NoteResult::Missed);
}

#[test]
fn test_demo_recording_replays() {
    let recording =
        session::events::SessionRecording::from_json(include_str!("../demos/clean_run.json"))
            .unwrap();
    let mut engine = ScoringEngine::default();
    for event in &recording.events {
        event.apply_to(&mut engine);
    }
    let summary = engine.finish(recording.track.clone()).unwrap();
    assert_eq!(summary.score, Score { hits: 2, total: 3 });
    assert_eq!(engine.note_results()[&1000][&43], NoteResult::Missed);

    let offer = SessionGate::default().evaluate(&summary, 0.0).unwrap();
    assert_eq!(offer.percentage, 67);
    assert_eq!(offer.song_name, "Seven Nation Army");
}
