// src/shapes/capno.rs
//! Capnogram breath shape
//!
//! Four phases: flat inspiration baseline, logistic-sigmoid expiratory
//! upstroke, linear-slope alveolar plateau, logistic downstroke back to zero.
//! The active-waveform portion of the cycle is capped at a maximum duration
//! independent of the breath period, so low respiratory rates do not stretch
//! the visible waveform unrealistically.

use crate::config::capno::{ACTIVE_FRACTION, MAX_ACTIVE_SECS};
use crate::params::CapnoVariant;
use crate::utils::numeric::finite_or;

/// Fraction of the active window spent on the initial baseline
const BASELINE_FRACTION: f64 = 0.08;
/// Logistic steepness for the normal upstroke/downstroke
const SIGMOID_STEEPNESS: f64 = 12.0;
/// Plateau starts at this fraction of the target value and rises linearly
const PLATEAU_START_LEVEL: f64 = 0.90;

fn sigmoid(progress: f64, steepness: f64) -> f64 {
    1.0 / (1.0 + (-steepness * (progress - 0.5)).exp())
}

/// Duration of the active waveform within one breath of the given period.
pub fn active_duration(breath_period: f64) -> f64 {
    if breath_period <= 0.0 || !breath_period.is_finite() {
        return 0.0;
    }
    (breath_period * ACTIVE_FRACTION).min(MAX_ACTIVE_SECS)
}

/// Instantaneous capnogram value in mmHg, `t_rel` relative to the breath
/// boundary. Disconnect and zero/negative target values render flat zero.
pub fn capno_breath(t_rel: f64, breath_period: f64, etco2: f32, variant: CapnoVariant) -> f32 {
    if variant == CapnoVariant::Disconnect {
        return 0.0;
    }
    let etco2 = finite_or(etco2, 0.0);
    if etco2 <= 0.0 {
        return 0.0;
    }
    if !t_rel.is_finite() || t_rel < 0.0 {
        return 0.0;
    }

    let active = active_duration(breath_period);
    if active <= 0.0 || t_rel >= active {
        return 0.0;
    }

    let x = t_rel / active;
    let obstructive = variant == CapnoVariant::Obstructive;

    // Phase boundaries within the active window
    let baseline_end = BASELINE_FRACTION;
    let upstroke_end = if obstructive { 0.55 } else { baseline_end + 0.15 };
    let plateau_end = 0.85;

    let target = etco2 as f64;
    let value = if x < baseline_end {
        0.0
    } else if x < upstroke_end {
        let progress = (x - baseline_end) / (upstroke_end - baseline_end);
        let steepness = if obstructive {
            SIGMOID_STEEPNESS * 0.45
        } else {
            SIGMOID_STEEPNESS
        };
        target * PLATEAU_START_LEVEL * sigmoid(progress, steepness)
    } else if x < plateau_end {
        let progress = (x - upstroke_end) / (plateau_end - upstroke_end);
        target * (PLATEAU_START_LEVEL + (1.0 - PLATEAU_START_LEVEL) * progress)
    } else {
        let progress = (x - plateau_end) / (1.0 - plateau_end);
        target * (1.0 - sigmoid(progress, SIGMOID_STEEPNESS))
    };

    finite_or(value.max(0.0) as f32, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disconnect_is_flat() {
        for i in 0..100 {
            let t = i as f64 * 0.05;
            assert_eq!(capno_breath(t, 4.0, 38.0, CapnoVariant::Disconnect), 0.0);
        }
    }

    #[test]
    fn test_zero_value_is_flat() {
        assert_eq!(capno_breath(1.0, 4.0, 0.0, CapnoVariant::Normal), 0.0);
        assert_eq!(capno_breath(1.0, 4.0, -5.0, CapnoVariant::Normal), 0.0);
        assert_eq!(capno_breath(1.0, 4.0, f32::NAN, CapnoVariant::Normal), 0.0);
    }

    #[test]
    fn test_plateau_reaches_target() {
        let period = 4.0;
        let active = active_duration(period);
        let near_plateau_end = active * 0.84;
        let v = capno_breath(near_plateau_end, period, 38.0, CapnoVariant::Normal);
        assert!(v > 36.0 && v <= 38.0, "plateau end {} should approach 38", v);
    }

    #[test]
    fn test_returns_to_zero_after_active_window() {
        let period = 4.0;
        let active = active_duration(period);
        assert_eq!(capno_breath(active + 0.01, period, 38.0, CapnoVariant::Normal), 0.0);
        assert_eq!(capno_breath(period - 0.1, period, 38.0, CapnoVariant::Normal), 0.0);
    }

    #[test]
    fn test_active_window_caps_at_low_resp_rate() {
        // 6 breaths/min -> 10 s period, but the waveform must not stretch
        let period = 10.0;
        assert_eq!(active_duration(period), MAX_ACTIVE_SECS);
        let just_past_cap = MAX_ACTIVE_SECS + 0.05;
        assert_eq!(
            capno_breath(just_past_cap, period, 38.0, CapnoVariant::Normal),
            0.0
        );
    }

    #[test]
    fn test_active_window_scales_at_normal_rate() {
        let period = 60.0 / 14.0;
        let active = active_duration(period);
        assert!(active < MAX_ACTIVE_SECS);
        assert!((active - period * ACTIVE_FRACTION).abs() < 1e-9);
    }

    #[test]
    fn test_obstructive_upstroke_is_slower() {
        let period = 4.0;
        let active = active_duration(period);
        // Early in the breath, the shark fin lags the normal upstroke
        let t_early = active * 0.22;
        let normal = capno_breath(t_early, period, 38.0, CapnoVariant::Normal);
        let obstructive = capno_breath(t_early, period, 38.0, CapnoVariant::Obstructive);
        assert!(obstructive < normal);
    }

    #[test]
    fn test_degenerate_period_is_flat() {
        assert_eq!(capno_breath(0.5, 0.0, 38.0, CapnoVariant::Normal), 0.0);
        assert_eq!(capno_breath(0.5, f64::INFINITY, 38.0, CapnoVariant::Normal), 0.0);
    }
}
