// src/shapes/pressure.rs
//! Arterial pressure pulse shape
//!
//! Same rise/decay/notch structure as the pleth pulse but parameterized by
//! systolic and diastolic pressure: the waveform swings from diastolic up to
//! systolic and back. Output is clamped to `[0, systolic + 15]` and floors at
//! diastolic when there is no forward pulse pressure.

use crate::params::PressureVariant;
use crate::utils::numeric::finite_or;

const RISE_FRACTION: f64 = 0.25;
const RISE_POWER: f64 = 1.5;
const DECAY_RATE: f64 = 3.2;
const NOTCH_FRACTION: f64 = 0.40;
const NOTCH_SIGMA: f64 = 0.03;
const NOTCH_DEPTH: f64 = 0.10;

/// Headroom above systolic allowed before clamping, mmHg
const CLAMP_HEADROOM: f32 = 15.0;

/// Instantaneous arterial pressure, `t_rel` relative to the beat boundary.
pub fn arterial_pulse(
    t_rel: f64,
    cycle: f64,
    systolic: f32,
    diastolic: f32,
    variant: PressureVariant,
) -> f32 {
    let systolic = finite_or(systolic, 0.0).max(0.0);
    let diastolic = finite_or(diastolic, 0.0).max(0.0);
    let ceiling = systolic + CLAMP_HEADROOM;
    let floor_value = diastolic.min(ceiling);

    if variant == PressureVariant::Flat {
        return floor_value;
    }
    let pulse_pressure = systolic - diastolic;
    if pulse_pressure <= 0.0 {
        return floor_value;
    }
    if cycle <= 0.0 || !cycle.is_finite() || !t_rel.is_finite() || t_rel < 0.0 {
        return floor_value;
    }

    let x = (t_rel / cycle).min(1.0);
    let damped = variant == PressureVariant::Damped;
    let swing = if damped {
        pulse_pressure as f64 * 0.4
    } else {
        pulse_pressure as f64
    };

    let mut contour = if x < RISE_FRACTION {
        let phase = std::f64::consts::FRAC_PI_2 * x / RISE_FRACTION;
        phase.sin().powf(RISE_POWER)
    } else {
        (-DECAY_RATE * (x - RISE_FRACTION) / (1.0 - RISE_FRACTION)).exp()
    };

    if !damped {
        let z = (x - NOTCH_FRACTION) / NOTCH_SIGMA;
        contour -= NOTCH_DEPTH * (-0.5 * z * z).exp();
    }

    let value = diastolic as f64 + swing * contour.max(0.0);
    finite_or(value as f32, floor_value).clamp(0.0, ceiling)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swings_between_diastolic_and_systolic() {
        let cycle = 0.75;
        let mut min = f32::MAX;
        let mut max = f32::MIN;
        for i in 0..300 {
            let t = i as f64 * cycle / 300.0;
            let v = arterial_pulse(t, cycle, 120.0, 80.0, PressureVariant::Normal);
            min = min.min(v);
            max = max.max(v);
        }
        assert!(min >= 75.0, "trough {} should stay near diastolic", min);
        assert!(max > 110.0 && max <= 135.0, "peak {} near systolic", max);
    }

    #[test]
    fn test_floors_at_diastolic_without_pulse_pressure() {
        assert_eq!(
            arterial_pulse(0.2, 0.8, 80.0, 80.0, PressureVariant::Normal),
            80.0
        );
        assert_eq!(
            arterial_pulse(0.2, 0.8, 70.0, 90.0, PressureVariant::Normal),
            85.0 // diastolic capped at systolic + headroom
        );
    }

    #[test]
    fn test_flat_variant_holds_floor() {
        assert_eq!(
            arterial_pulse(0.3, 0.8, 120.0, 80.0, PressureVariant::Flat),
            80.0
        );
        assert_eq!(arterial_pulse(0.3, 0.8, 0.0, 0.0, PressureVariant::Flat), 0.0);
    }

    #[test]
    fn test_damped_reduces_swing() {
        let cycle = 0.75;
        let peak_t = 0.8 * RISE_FRACTION * cycle;
        let normal = arterial_pulse(peak_t, cycle, 120.0, 80.0, PressureVariant::Normal);
        let damped = arterial_pulse(peak_t, cycle, 120.0, 80.0, PressureVariant::Damped);
        assert!(damped < normal);
        assert!(damped > 80.0);
    }

    #[test]
    fn test_clamped_to_headroom() {
        for i in 0..300 {
            let t = i as f64 * 0.0025;
            let v = arterial_pulse(t, 0.75, 200.0, 40.0, PressureVariant::Normal);
            assert!(v >= 0.0 && v <= 215.0);
        }
    }

    #[test]
    fn test_non_finite_inputs_recover() {
        assert_eq!(
            arterial_pulse(0.2, 0.8, f32::NAN, 80.0, PressureVariant::Normal),
            // systolic becomes 0, diastolic capped to headroom
            15.0
        );
        let v = arterial_pulse(f64::NAN, 0.8, 120.0, 80.0, PressureVariant::Normal);
        assert_eq!(v, 80.0);
    }
}
