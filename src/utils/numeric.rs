// src/utils/numeric.rs
//! Finite-value guards and small interpolation helpers
//!
//! A single non-finite sample must never interrupt a real-time trace, so every
//! shape and generator output funnels through [`finite_or`] with a
//! caller-supplied fallback before it can reach a sweep buffer.

use rand::rngs::SmallRng;
use rand::Rng;

/// Replace a non-finite value with the supplied default.
pub fn finite_or(value: f32, default: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        default
    }
}

/// `f64` variant of [`finite_or`] for time arithmetic.
pub fn finite_or_f64(value: f64, default: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        default
    }
}

/// Linear interpolation between `a` and `b`, `t` clamped to `[0, 1]`.
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    a + (b - a) * t
}

/// Bounded uniform jitter multiplier around 1.0.
///
/// `spread` is clamped to `[0, 0.9]` so the multiplier can never reach zero
/// and invert an interval.
pub fn jitter_factor(rng: &mut SmallRng, spread: f64) -> f64 {
    let spread = if spread.is_finite() {
        spread.clamp(0.0, 0.9)
    } else {
        0.0
    };
    if spread == 0.0 {
        return 1.0;
    }
    1.0 + rng.gen_range(-spread..=spread)
}
