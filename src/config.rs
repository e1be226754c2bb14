use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Tuning for the stability/award logic. Defaults are the values players are scored with;
/// changing them changes what counts as a hit.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ScoringConfig {
    /// Maximum |error| in cents for a frame to count as in tune.
    pub tolerance_cents: f64,
    /// Frames kept in the stability window.
    pub window_size: usize,
    /// In-tune frames needed within the window to call it stable.
    pub required_ok: usize,
    /// Minimum time between two awards.
    pub cooldown_ms: f64,
    /// At or below this the sample is silence (below bass low E, ~41 Hz, with margin).
    pub silence_floor_hz: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig {
            tolerance_cents: 25.0,
            window_size: 10,
            required_ok: 6,
            cooldown_ms: 200.0,
            silence_floor_hz: 30.0,
        }
    }
}

impl ScoringConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: ScoringConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.tolerance_cents.is_finite() && self.tolerance_cents > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "tolerance_cents must be positive, got {}",
                self.tolerance_cents
            )));
        }
        if self.window_size == 0 {
            return Err(Error::InvalidConfig("window_size must be at least 1".into()));
        }
        if self.required_ok == 0 || self.required_ok > self.window_size {
            return Err(Error::InvalidConfig(format!(
                "required_ok must be in 1..={}, got {}",
                self.window_size, self.required_ok
            )));
        }
        if !(self.cooldown_ms.is_finite() && self.cooldown_ms >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "cooldown_ms must be non-negative, got {}",
                self.cooldown_ms
            )));
        }
        if !(self.silence_floor_hz.is_finite() && self.silence_floor_hz >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "silence_floor_hz must be non-negative, got {}",
                self.silence_floor_hz
            )));
        }
        Ok(())
    }
}
