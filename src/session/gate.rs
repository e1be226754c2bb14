use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::scoring::types::SongSummary;
use crate::scoring::validity::Validity;

/// A finished session that may be offered to the player for saving.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SaveOffer {
    pub percentage: u32,
    pub hits: u32,
    pub total: u32,
    pub song_name: String,
    pub instrument: String,
    pub track_id: i32,
}

/// Why a finished session is not offered for saving.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Rejection {
    #[error("play session was invalid: {0:?}")]
    Invalid(Validity),

    #[error("no notes to score")]
    NoNotes,

    #[error("could not determine track id")]
    MissingTrack,

    #[error("duplicate save attempt, skipping")]
    Duplicate,
}

/// Dismissible message for a failed save. Never feeds back into engine state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SaveFailure {
    #[error("Login Required to Save Scores")]
    LoginRequired,

    #[error("{0}")]
    Server(String),

    #[error("Failed to save score")]
    Failed,
}

impl SaveFailure {
    /// Classify a persistence response; `None` for a success status.
    pub fn from_response(status: u16, server_message: Option<&str>) -> Option<Self> {
        match status {
            200..=299 => None,
            401 => Some(SaveFailure::LoginRequired),
            _ => Some(
                server_message
                    .filter(|m| !m.trim().is_empty())
                    .map(|m| SaveFailure::Server(m.to_string()))
                    .unwrap_or(SaveFailure::Failed),
            ),
        }
    }
}

/// Decides, when a song ends, whether its result should be offered for saving.
#[derive(Clone, Debug, Default)]
pub struct SessionGate {
    default_track_id: Option<i32>,
    last_offer_ms: Option<f64>,
}

impl SessionGate {
    /// Offers closer together than this are treated as the same song end firing twice.
    pub const DEDUPE_WINDOW_MS: f64 = 5000.0;

    pub fn new(default_track_id: Option<i32>) -> Self {
        SessionGate {
            default_track_id,
            last_offer_ms: None,
        }
    }

    /// Track to fall back on when a summary carries none.
    pub fn set_default_track_id(&mut self, track_id: Option<i32>) {
        self.default_track_id = track_id;
    }

    pub fn evaluate(&mut self, summary: &SongSummary, now_ms: f64) -> Result<SaveOffer, Rejection> {
        let decision = self.decide(summary, now_ms);
        match &decision {
            Ok(offer) => info!(
                percentage = offer.percentage,
                track_id = offer.track_id,
                "score ready to save"
            ),
            Err(Rejection::MissingTrack) => warn!("song finished without a track id, not saving"),
            Err(reason) => info!(%reason, "not offering score for saving"),
        }
        decision
    }

    fn decide(&mut self, summary: &SongSummary, now_ms: f64) -> Result<SaveOffer, Rejection> {
        if !summary.validity.is_clean() {
            return Err(Rejection::Invalid(summary.validity));
        }
        let percentage = summary.score.percentage().ok_or(Rejection::NoNotes)?;
        let track_id = summary
            .track_id
            .or(self.default_track_id)
            .ok_or(Rejection::MissingTrack)?;

        if let Some(last) = self.last_offer_ms {
            if now_ms - last < Self::DEDUPE_WINDOW_MS {
                return Err(Rejection::Duplicate);
            }
        }
        self.last_offer_ms = Some(now_ms);

        Ok(SaveOffer {
            percentage,
            hits: summary.score.hits,
            total: summary.score.total,
            song_name: summary.song_name.clone(),
            instrument: summary.instrument_name.clone(),
            track_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::types::{Score, TrackInfo};

    fn summary(hits: u32, total: u32, validity: Validity, track_id: Option<i32>) -> SongSummary {
        SongSummary::new(
            Score { hits, total },
            validity,
            TrackInfo {
                track_id,
                song_name: "Wonderwall".to_string(),
                instrument_name: Some("Acoustic Guitar".to_string()),
            },
        )
    }

    fn clean() -> Validity {
        Validity {
            started: true,
            ..Validity::default()
        }
    }

    #[test]
    fn test_clean_session_is_offered() {
        let mut gate = SessionGate::default();
        let offer = gate.evaluate(&summary(3, 3, clean(), Some(12)), 0.0).unwrap();
        assert_eq!(offer.percentage, 100);
        assert_eq!(offer.track_id, 12);
        assert_eq!(offer.instrument, "Acoustic Guitar");
    }

    #[test]
    fn test_percentage_rounds() {
        let mut gate = SessionGate::default();
        let offer = gate.evaluate(&summary(1, 3, clean(), Some(1)), 0.0).unwrap();
        assert_eq!(offer.percentage, 33);
    }

    #[test]
    fn test_seeked_session_rejected_regardless_of_score() {
        let mut gate = SessionGate::default();
        let validity = Validity {
            seeked: true,
            ..clean()
        };
        let err = gate.evaluate(&summary(3, 3, validity, Some(1)), 0.0).unwrap_err();
        assert_eq!(err, Rejection::Invalid(validity));
    }

    #[test]
    fn test_not_started_rejected() {
        let mut gate = SessionGate::default();
        let err = gate
            .evaluate(&summary(3, 3, Validity::default(), Some(1)), 0.0)
            .unwrap_err();
        assert!(matches!(err, Rejection::Invalid(_)));
    }

    #[test]
    fn test_empty_song_rejected() {
        let mut gate = SessionGate::default();
        let err = gate.evaluate(&summary(0, 0, clean(), Some(1)), 0.0).unwrap_err();
        assert_eq!(err, Rejection::NoNotes);
    }

    #[test]
    fn test_track_id_fallback() {
        let mut gate = SessionGate::new(Some(99));
        let offer = gate.evaluate(&summary(2, 4, clean(), None), 0.0).unwrap();
        assert_eq!(offer.track_id, 99);

        let mut gate = SessionGate::default();
        let err = gate.evaluate(&summary(2, 4, clean(), None), 0.0).unwrap_err();
        assert_eq!(err, Rejection::MissingTrack);
    }

    #[test]
    fn test_duplicate_within_window() {
        let mut gate = SessionGate::default();
        let s = summary(2, 4, clean(), Some(5));
        assert!(gate.evaluate(&s, 1_000.0).is_ok());
        assert_eq!(gate.evaluate(&s, 5_999.0).unwrap_err(), Rejection::Duplicate);
        assert!(gate.evaluate(&s, 6_000.0).is_ok());
    }

    #[test]
    fn test_rejections_do_not_arm_dedupe() {
        let mut gate = SessionGate::default();
        let _ = gate.evaluate(&summary(0, 0, clean(), Some(5)), 0.0);
        assert!(gate.evaluate(&summary(1, 1, clean(), Some(5)), 10.0).is_ok());
    }

    #[test]
    fn test_save_failure_messages() {
        assert_eq!(SaveFailure::from_response(201, None), None);
        assert_eq!(
            SaveFailure::from_response(401, Some("nope")).unwrap().to_string(),
            "Login Required to Save Scores"
        );
        assert_eq!(
            SaveFailure::from_response(400, Some("Invalid track")).unwrap().to_string(),
            "Invalid track"
        );
        assert_eq!(
            SaveFailure::from_response(500, None),
            Some(SaveFailure::Failed)
        );
    }
}
