// src/shapes/pleth.rs
//! Plethysmogram pulse shape
//!
//! Rise phase is `amplitude * sin(phase)^power` over a fixed fraction of the
//! cycle, followed by exponential decay back to baseline, with a negative
//! Gaussian notch subtracted partway through the decay for the dicrotic notch.
//! Amplitude scales with the saturation percentage.

use crate::params::PlethVariant;
use crate::utils::numeric::finite_or;

/// Fraction of the cycle occupied by the systolic rise
const RISE_FRACTION: f64 = 0.30;
/// Sharpening exponent on the rise sine
const RISE_POWER: f64 = 1.8;
/// Decay rate, per unit of cycle fraction past the peak
const DECAY_RATE: f64 = 4.0;
/// Dicrotic notch position as a fraction of the cycle
const NOTCH_FRACTION: f64 = 0.45;
/// Notch width as a fraction of the cycle
const NOTCH_SIGMA: f64 = 0.035;
/// Notch depth relative to pulse amplitude
const NOTCH_DEPTH: f64 = 0.14;

/// Instantaneous pleth amplitude, `t_rel` relative to the beat boundary.
///
/// "No signal" and saturation below 1 % both collapse to a flat baseline with
/// no noise. Output is non-negative.
pub fn pleth_pulse(t_rel: f64, cycle: f64, saturation: f32, variant: PlethVariant) -> f32 {
    if variant == PlethVariant::NoSignal {
        return 0.0;
    }
    if !saturation.is_finite() || saturation < 1.0 {
        return 0.0;
    }
    if cycle <= 0.0 || !cycle.is_finite() || !t_rel.is_finite() || t_rel < 0.0 {
        return 0.0;
    }

    let x = (t_rel / cycle).min(1.0);
    let mut amplitude = (saturation.min(100.0) as f64) / 100.0;
    let damped = variant == PlethVariant::Damped;
    if damped {
        amplitude *= 0.35;
    }

    let mut value = if x < RISE_FRACTION {
        let phase = std::f64::consts::FRAC_PI_2 * x / RISE_FRACTION;
        amplitude * phase.sin().powf(RISE_POWER)
    } else {
        amplitude * (-DECAY_RATE * (x - RISE_FRACTION) / (1.0 - RISE_FRACTION)).exp()
    };

    if !damped {
        let z = (x - NOTCH_FRACTION) / NOTCH_SIGMA;
        value -= amplitude * NOTCH_DEPTH * (-0.5 * z * z).exp();
    }

    finite_or(value.max(0.0) as f32, 0.0)
}
