use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, warn};

use crate::config::ScoringConfig;
use crate::error::{Error, Result};
use crate::scoring::engine::{EngineSnapshot, ScoringEngine};
use crate::scoring::types::{ExpectedBeat, PitchOutcome, PitchSample, SongSummary, TrackInfo};
use crate::scoring::validity::PlaybackSignal;
use crate::session::events::SessionEvent;

pub enum ScorerCommand {
    Event(SessionEvent),
    Snapshot(Sender<EngineSnapshot>),
    Finish(TrackInfo, Sender<Option<SongSummary>>),
    Shutdown,
}

/// Cloneable sender side of the scorer. Give one clone to the pitch producer and one to
/// the expectation producer; the worker applies their commands in arrival order.
#[derive(Clone)]
pub struct ScorerHandle {
    tx: Sender<ScorerCommand>,
}

impl ScorerHandle {
    pub fn send(&self, event: impl Into<SessionEvent>) -> Result<()> {
        self.tx
            .send(ScorerCommand::Event(event.into()))
            .map_err(|_| Error::WorkerGone)
    }

    pub fn expected_beat(&self, beat: ExpectedBeat) -> Result<()> {
        self.send(beat)
    }

    pub fn pitch(&self, sample: PitchSample) -> Result<()> {
        self.send(sample)
    }

    pub fn signal(&self, signal: PlaybackSignal) -> Result<()> {
        self.send(signal)
    }

    /// State after every command sent before this call has been applied.
    pub fn snapshot(&self) -> Result<EngineSnapshot> {
        let (reply_tx, reply_rx) = crossbeam_channel::bounded(1);
        self.tx
            .send(ScorerCommand::Snapshot(reply_tx))
            .map_err(|_| Error::WorkerGone)?;
        reply_rx.recv().map_err(|_| Error::WorkerGone)
    }

    /// Close the session; `None` if it was already finished.
    pub fn finish(&self, track: TrackInfo) -> Result<Option<SongSummary>> {
        let (reply_tx, reply_rx) = crossbeam_channel::bounded(1);
        self.tx
            .send(ScorerCommand::Finish(track, reply_tx))
            .map_err(|_| Error::WorkerGone)?;
        reply_rx.recv().map_err(|_| Error::WorkerGone)
    }
}

/// Dedicated thread that owns the `ScoringEngine`.
pub struct ScorerWorker {
    handle: ScorerHandle,
    thread: Option<JoinHandle<ScoringEngine>>,
}

impl ScorerWorker {
    pub fn spawn(config: ScoringConfig) -> Self {
        Self::start(config, None)
    }

    /// Like `spawn`, also forwarding every pitch outcome (live readout and awards).
    pub fn spawn_with_readouts(config: ScoringConfig) -> (Self, Receiver<PitchOutcome>) {
        let (readout_tx, readout_rx) = crossbeam_channel::unbounded();
        (Self::start(config, Some(readout_tx)), readout_rx)
    }

    fn start(config: ScoringConfig, readouts: Option<Sender<PitchOutcome>>) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded::<ScorerCommand>();
        let engine = ScoringEngine::new(config);
        let thread = thread::spawn(move || run(engine, rx, readouts));
        ScorerWorker {
            handle: ScorerHandle { tx },
            thread: Some(thread),
        }
    }

    pub fn handle(&self) -> ScorerHandle {
        self.handle.clone()
    }

    /// Stop after draining queued commands and hand back the engine.
    pub fn shutdown(mut self) -> Result<ScoringEngine> {
        self.stop().ok_or(Error::WorkerGone)
    }

    fn stop(&mut self) -> Option<ScoringEngine> {
        let thread = self.thread.take()?;
        // The worker may already be gone; joining still reports it.
        let _ = self.handle.tx.send(ScorerCommand::Shutdown);
        match thread.join() {
            Ok(engine) => Some(engine),
            Err(_) => {
                warn!("scorer worker panicked");
                None
            }
        }
    }
}

impl Drop for ScorerWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(
    mut engine: ScoringEngine,
    rx: Receiver<ScorerCommand>,
    mut readouts: Option<Sender<PitchOutcome>>,
) -> ScoringEngine {
    debug!("scorer worker started");
    for command in rx.iter() {
        match command {
            ScorerCommand::Event(event) => {
                let Some(outcome) = event.apply_to(&mut engine) else {
                    continue;
                };
                if let Some(tx) = &readouts {
                    if tx.send(outcome).is_err() {
                        debug!("readout receiver dropped");
                        readouts = None;
                    }
                }
            }
            ScorerCommand::Snapshot(reply) => {
                let _ = reply.send(engine.snapshot());
            }
            ScorerCommand::Finish(track, reply) => {
                let _ = reply.send(engine.finish(track));
            }
            ScorerCommand::Shutdown => break,
        }
    }
    debug!("scorer worker stopped");
    engine
}
