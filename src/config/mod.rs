// src/config/mod.rs
//! Engine configuration
//!
//! [`EngineConfig`] carries everything that shapes the simulation loop itself:
//! sample rate, sweep-window geometry, interpolation behavior, and the
//! catch-up clamp. Clinical targets live in [`crate::params`] instead, and the
//! rhythm catalog in [`crate::catalog`]; neither belongs in engine config.

pub mod constants;
pub mod loader;

pub use constants::*;
pub use loader::{ConfigError, ConfigLoader};

use crate::error::EngineError;
use serde::{Deserialize, Serialize};

mod defaults {
    use super::constants::{interpolation, shock, signal, timing};

    pub fn sample_rate_hz() -> u32 {
        signal::DEFAULT_SAMPLE_RATE_HZ
    }
    pub fn sweep_seconds() -> f64 {
        signal::DEFAULT_SWEEP_SECONDS
    }
    pub fn erase_gap_samples() -> usize {
        signal::DEFAULT_ERASE_GAP_SAMPLES
    }
    pub fn ecg_noise_mv() -> f32 {
        signal::DEFAULT_ECG_NOISE_MV
    }
    pub fn max_catchup_steps() -> u32 {
        timing::DEFAULT_MAX_CATCHUP_STEPS
    }
    pub fn interpolation_rate() -> f32 {
        interpolation::DEFAULT_RATE_PER_SEC
    }
    pub fn snap_threshold() -> f32 {
        interpolation::DEFAULT_SNAP_THRESHOLD
    }
    pub fn shock_burst_samples() -> u32 {
        shock::DEFAULT_BURST_SAMPLES
    }
}

/// Simulation engine configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Logical sample rate shared by all channels
    #[serde(default = "defaults::sample_rate_hz")]
    pub sample_rate_hz: u32,

    /// Visible sweep window in seconds; buffer length is derived from this
    #[serde(default = "defaults::sweep_seconds")]
    pub sweep_seconds: f64,

    /// Width of the moving erase gap ahead of the write cursor, in samples
    #[serde(default = "defaults::erase_gap_samples")]
    pub erase_gap_samples: usize,

    /// Baseline ECG noise amplitude in millivolts
    #[serde(default = "defaults::ecg_noise_mv")]
    pub ecg_noise_mv: f32,

    /// Maximum logical steps replayed in a single callback after a host pause
    #[serde(default = "defaults::max_catchup_steps")]
    pub max_catchup_steps: u32,

    /// Proportional approach rate for continuous numeric interpolation
    #[serde(default = "defaults::interpolation_rate")]
    pub interpolation_rate: f32,

    /// Remaining-gap threshold at which interpolating numerics snap to target
    #[serde(default = "defaults::snap_threshold")]
    pub snap_threshold: f32,

    /// Length of the ECG artifact burst injected by a shock, in samples
    #[serde(default = "defaults::shock_burst_samples")]
    pub shock_burst_samples: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: defaults::sample_rate_hz(),
            sweep_seconds: defaults::sweep_seconds(),
            erase_gap_samples: defaults::erase_gap_samples(),
            ecg_noise_mv: defaults::ecg_noise_mv(),
            max_catchup_steps: defaults::max_catchup_steps(),
            interpolation_rate: defaults::interpolation_rate(),
            snap_threshold: defaults::snap_threshold(),
            shock_burst_samples: defaults::shock_burst_samples(),
        }
    }
}

impl EngineConfig {
    /// Standard adult-monitor configuration.
    pub fn adult() -> Self {
        Self::default()
    }

    /// Demo configuration: small sweep window and fast parameter ramps, for
    /// walkthroughs where waiting out a realistic ramp is tedious.
    pub fn demo() -> Self {
        Self {
            sweep_seconds: 3.0,
            interpolation_rate: 8.0,
            ..Self::default()
        }
    }

    /// Logical sample period in seconds.
    pub fn sample_period(&self) -> f64 {
        1.0 / self.sample_rate_hz as f64
    }

    /// Sweep buffer length in samples.
    pub fn sweep_samples(&self) -> usize {
        (self.sweep_seconds * self.sample_rate_hz as f64).round() as usize
    }

    /// Validate all fields and their cross-field constraints.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.sample_rate_hz < signal::MIN_SAMPLE_RATE_HZ
            || self.sample_rate_hz > signal::MAX_SAMPLE_RATE_HZ
        {
            return Err(EngineError::InvalidParameter {
                field: "sample_rate_hz",
                reason: format!(
                    "{} outside [{}, {}]",
                    self.sample_rate_hz,
                    signal::MIN_SAMPLE_RATE_HZ,
                    signal::MAX_SAMPLE_RATE_HZ
                ),
            });
        }
        if !self.sweep_seconds.is_finite()
            || self.sweep_seconds < signal::MIN_SWEEP_SECONDS
            || self.sweep_seconds > signal::MAX_SWEEP_SECONDS
        {
            return Err(EngineError::InvalidParameter {
                field: "sweep_seconds",
                reason: format!(
                    "{} outside [{}, {}]",
                    self.sweep_seconds,
                    signal::MIN_SWEEP_SECONDS,
                    signal::MAX_SWEEP_SECONDS
                ),
            });
        }
        if self.erase_gap_samples >= self.sweep_samples() {
            return Err(EngineError::InvalidParameter {
                field: "erase_gap_samples",
                reason: format!(
                    "{} must be smaller than the sweep buffer ({} samples)",
                    self.erase_gap_samples,
                    self.sweep_samples()
                ),
            });
        }
        if !self.ecg_noise_mv.is_finite() || self.ecg_noise_mv < 0.0 {
            return Err(EngineError::InvalidParameter {
                field: "ecg_noise_mv",
                reason: "must be a finite non-negative amplitude".to_string(),
            });
        }
        if self.max_catchup_steps == 0 {
            return Err(EngineError::InvalidParameter {
                field: "max_catchup_steps",
                reason: "must be at least 1".to_string(),
            });
        }
        if !self.interpolation_rate.is_finite() || self.interpolation_rate <= 0.0 {
            return Err(EngineError::InvalidParameter {
                field: "interpolation_rate",
                reason: "must be a finite positive rate".to_string(),
            });
        }
        if !self.snap_threshold.is_finite() || self.snap_threshold < 0.0 {
            return Err(EngineError::InvalidParameter {
                field: "snap_threshold",
                reason: "must be a finite non-negative threshold".to_string(),
            });
        }
        if self.shock_burst_samples == 0 {
            return Err(EngineError::InvalidParameter {
                field: "shock_burst_samples",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
