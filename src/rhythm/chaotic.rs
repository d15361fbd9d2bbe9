// src/rhythm/chaotic.rs
//! Fibrillation random-walk generation
//!
//! Holds a pair of random target amplitudes and linearly interpolates between
//! them over a fixed number of samples, regenerating the far target each time
//! the hold elapses. The result flows rather than stepping, unlike literal
//! white noise. State is per-instance so concurrent simulation sessions do not
//! interfere.

use crate::utils::numeric::{finite_or, lerp};
use rand::rngs::SmallRng;
use rand::Rng;

/// Samples spent walking from one random target to the next
const HOLD_SAMPLES: u32 = 14;

/// Interpolation state for the fibrillation walk
#[derive(Debug, Clone, Default)]
pub struct ChaoticState {
    last_target: f32,
    next_target: f32,
    hold_elapsed: u32,
}

/// One fibrillation sample.
pub fn generate(state: &mut ChaoticState, amplitude: f32, rng: &mut SmallRng) -> f32 {
    let amplitude = finite_or(amplitude, 0.0).abs();
    if state.hold_elapsed >= HOLD_SAMPLES {
        state.last_target = state.next_target;
        state.next_target = (rng.gen::<f32>() - 0.5) * 2.0 * amplitude;
        state.hold_elapsed = 0;
    }
    let fraction = state.hold_elapsed as f32 / HOLD_SAMPLES as f32;
    state.hold_elapsed += 1;
    lerp(state.last_target, state.next_target, fraction)
}
