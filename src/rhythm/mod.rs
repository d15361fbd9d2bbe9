// src/rhythm/mod.rs
//! Rhythm generator families
//!
//! One generator per ECG behavior family, dispatched over the closed
//! [`GeneratorState`] enum. Stateless families (sinus, paced, flatline,
//! compression) carry no variant payload; the AV-block and chaotic families
//! own persistent state that lives exactly as long as the rhythm instance and
//! is discarded wholesale on any rhythm change, manual reset, or shock.

pub mod artifact;
pub mod av_block;
pub mod chaotic;
pub mod sinus;

pub use av_block::AvBlockState;
pub use chaotic::ChaoticState;

use crate::catalog::{GeneratorFamily, RhythmDefinition};
use crate::utils::numeric::finite_or;
use rand::rngs::SmallRng;
use rand::Rng;

/// Amplitude scale applied to the rhythm's QRS amplitude for the fibrillation
/// random walk
const CHAOTIC_SCALE: f32 = 0.55;

/// Per-tick inputs shared by all generator families
pub struct GeneratorContext<'a> {
    /// Absolute simulation time in seconds
    pub sim_time: f64,
    /// Time since the last scheduled beat boundary
    pub beat_time: f64,
    /// Current beat interval
    pub beat_interval: f64,
    /// Time since the last scheduled compression boundary
    pub compression_time: f64,
    /// Target atrial rate for conduction state machines, beats/min
    pub atrial_rate: f32,
    /// Baseline ECG noise amplitude in mV
    pub noise_amplitude: f32,
    /// Active rhythm definition
    pub def: &'a RhythmDefinition,
}

/// Private state of the active generator
#[derive(Debug, Clone)]
pub enum GeneratorState {
    /// Native PQRST complexes
    Sinus,
    /// Spike-driven complexes
    Paced,
    /// Conduction state machine
    AvBlock(AvBlockState),
    /// Fibrillation random walk
    Chaotic(ChaoticState),
    /// Baseline only
    Flatline,
    /// Chest-compression artifact
    Compression,
}

impl GeneratorState {
    /// Fresh state for a generator family. AV-block and chaotic states start
    /// empty and initialize themselves on first invocation.
    pub fn for_family(family: GeneratorFamily) -> Self {
        match family {
            GeneratorFamily::Sinus => GeneratorState::Sinus,
            GeneratorFamily::Paced => GeneratorState::Paced,
            GeneratorFamily::AvBlock => GeneratorState::AvBlock(AvBlockState::default()),
            GeneratorFamily::Chaotic => GeneratorState::Chaotic(ChaoticState::default()),
            GeneratorFamily::Flatline => GeneratorState::Flatline,
            GeneratorFamily::Compression => GeneratorState::Compression,
        }
    }
}

/// Uniform baseline noise, zero-centered.
pub fn baseline_noise(rng: &mut SmallRng, amplitude: f32) -> f32 {
    if !amplitude.is_finite() || amplitude <= 0.0 {
        return 0.0;
    }
    (rng.gen::<f32>() - 0.5) * 2.0 * amplitude
}

/// Compute one ECG sample for the active generator.
///
/// Any non-finite generator output is replaced by baseline before the noise
/// term is added.
pub fn generate_ecg(
    state: &mut GeneratorState,
    ctx: &GeneratorContext<'_>,
    rng: &mut SmallRng,
) -> f32 {
    let signal = match state {
        GeneratorState::Sinus => sinus::generate(ctx.beat_time, ctx.beat_interval, ctx.def, false),
        GeneratorState::Paced => sinus::generate(ctx.beat_time, ctx.beat_interval, ctx.def, true),
        GeneratorState::AvBlock(block) => {
            av_block::generate(block, ctx.sim_time, ctx.atrial_rate, ctx.def, rng)
        }
        GeneratorState::Chaotic(walk) => {
            chaotic::generate(walk, ctx.def.wave.qrs_amplitude * CHAOTIC_SCALE, rng)
        }
        GeneratorState::Flatline => 0.0,
        GeneratorState::Compression => artifact::compression_artifact(ctx.compression_time),
    };
    finite_or(signal, 0.0) + baseline_noise(rng, ctx.noise_amplitude)
}
