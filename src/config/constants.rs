// src/config/constants.rs
//! Engine-wide constants and default values

/// Sampling and sweep-window constants
pub mod signal {
    /// Default logical sample rate for all channels
    pub const DEFAULT_SAMPLE_RATE_HZ: u32 = 250;
    /// Lowest sample rate that still renders a recognizable QRS
    pub const MIN_SAMPLE_RATE_HZ: u32 = 50;
    /// Upper bound to keep per-frame catch-up work bounded
    pub const MAX_SAMPLE_RATE_HZ: u32 = 2000;

    /// Default visible sweep window in seconds
    pub const DEFAULT_SWEEP_SECONDS: f64 = 6.0;
    /// Minimum sweep window
    pub const MIN_SWEEP_SECONDS: f64 = 1.0;
    /// Maximum sweep window
    pub const MAX_SWEEP_SECONDS: f64 = 30.0;

    /// Default width of the moving erase gap, in samples
    pub const DEFAULT_ERASE_GAP_SAMPLES: usize = 10;

    /// Default baseline ECG noise amplitude (mV). Other channels render clean.
    pub const DEFAULT_ECG_NOISE_MV: f32 = 0.012;
}

/// Cycle timing constants
pub mod timing {
    /// Shortest permitted cardiac cycle (300 beats/min ceiling)
    pub const MIN_CYCLE_SECS: f64 = 0.2;
    /// Highest heart-rate / compression-rate target accepted from the operator
    pub const MAX_RATE_PER_MIN: f32 = 300.0;
    /// Highest respiratory-rate target accepted from the operator
    pub const MAX_RESP_RATE_PER_MIN: f32 = 60.0;
    /// Catch-up step clamp: one deferred callback may replay at most this many
    /// logical steps, so a suspended host tab cannot run the simulation ahead
    pub const DEFAULT_MAX_CATCHUP_STEPS: u32 = 512;
    /// Wall-clock dt used for numeric interpolation is clamped to this value
    pub const MAX_INTERPOLATION_DT_SECS: f64 = 0.5;
}

/// Continuous numeric interpolation constants
pub mod interpolation {
    /// Default proportional approach rate (fraction of the gap per second)
    pub const DEFAULT_RATE_PER_SEC: f32 = 2.5;
    /// Gap below which the interpolating value snaps to its target
    pub const DEFAULT_SNAP_THRESHOLD: f32 = 0.5;
}

/// Capnogram geometry
pub mod capno {
    /// Active-waveform portion of the breath cycle never exceeds this many
    /// seconds, regardless of breath period
    pub const MAX_ACTIVE_SECS: f64 = 3.5;
    /// Fraction of the breath period occupied by the active waveform when the
    /// period is short enough not to hit the cap
    pub const ACTIVE_FRACTION: f64 = 0.62;
}

/// Defibrillation artifact constants
pub mod shock {
    /// Default length of the post-shock ECG artifact burst, in samples
    pub const DEFAULT_BURST_SAMPLES: u32 = 120;
    /// Peak amplitude of the burst envelope (mV)
    pub const BURST_PEAK_MV: f32 = 2.6;
}

/// Command-intake sizing
pub mod commands {
    /// Bounded capacity of the inbound operator/relay command channel
    pub const DEFAULT_QUEUE_CAPACITY: usize = 64;
}
