//! Replays a recorded playback attempt through the scorer and prints the song-end summary
//! together with the save decision.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tab_scorer::session::actor::ScorerWorker;
use tab_scorer::session::events::SessionRecording;
use tab_scorer::{ScoringConfig, SaveOffer, SessionGate, SongSummary};

#[derive(Parser, Debug)]
#[command(name = "tab-replay", about = "Score a recorded session offline")]
struct Args {
    /// Recording: { "config"?, "track"?, "events": [...] }
    recording: PathBuf,

    /// Scoring config JSON; overrides the one embedded in the recording.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Wall-clock time handed to the session gate, in milliseconds.
    #[arg(long, default_value_t = 0.0)]
    now_ms: f64,
}

#[derive(Serialize)]
struct Report {
    summary: Option<SongSummary>,
    offer: Option<SaveOffer>,
    rejection: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let raw = std::fs::read_to_string(&args.recording)
        .with_context(|| format!("Failed to read recording: {:?}", args.recording))?;
    let recording = SessionRecording::from_json(&raw).context("Failed to parse recording")?;

    let config = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {:?}", path))?;
            ScoringConfig::from_json(&raw).context("Failed to parse config")?
        }
        None => recording.config.clone().unwrap_or_default(),
    };

    info!(events = recording.events.len(), "replaying session");
    let worker = ScorerWorker::spawn(config);
    let handle = worker.handle();
    for event in recording.events {
        handle.send(event)?;
    }
    let summary = handle.finish(recording.track.clone())?;
    worker.shutdown()?;

    let mut gate = SessionGate::new(recording.track.track_id);
    let (offer, rejection) = match &summary {
        Some(summary) => match gate.evaluate(summary, args.now_ms) {
            Ok(offer) => (Some(offer), None),
            Err(reason) => (None, Some(reason.to_string())),
        },
        None => (None, Some("session already finished".to_string())),
    };

    let report = Report {
        summary,
        offer,
        rejection,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
