// src/rhythm/artifact.rs
//! Compression artifact generation
//!
//! Chest compressions write a sharp negative Gaussian spike with a smaller
//! positive companion lobe onto the ECG channel, repeating at the compression
//! frequency rather than a cardiac rate. The flatline family renders nothing
//! here; its baseline noise comes from the shared dispatch path.

use crate::utils::numeric::finite_or;

/// Center of the main negative spike after the compression boundary, seconds
const SPIKE_CENTER_SECS: f64 = 0.10;
/// Width of the main spike
const SPIKE_SIGMA_SECS: f64 = 0.030;
/// Peak amplitude of the main spike, mV (downward deflection)
const SPIKE_AMPLITUDE_MV: f64 = -1.15;
/// Center of the positive companion lobe
const COMPANION_CENTER_SECS: f64 = 0.22;
/// Width of the companion lobe
const COMPANION_SIGMA_SECS: f64 = 0.05;
/// Companion amplitude relative to the main spike magnitude
const COMPANION_FACTOR: f64 = 0.33;

fn gaussian(t: f64, center: f64, sigma: f64) -> f64 {
    let z = (t - center) / sigma;
    (-0.5 * z * z).exp()
}

/// One compression-artifact sample, `t_rel` relative to the compression
/// boundary. The spike geometry is fixed in seconds, so slower compression
/// rates space the spikes out without stretching them.
pub fn compression_artifact(t_rel: f64) -> f32 {
    if !t_rel.is_finite() || t_rel < 0.0 {
        return 0.0;
    }
    let main = SPIKE_AMPLITUDE_MV * gaussian(t_rel, SPIKE_CENTER_SECS, SPIKE_SIGMA_SECS);
    let companion = SPIKE_AMPLITUDE_MV.abs()
        * COMPANION_FACTOR
        * gaussian(t_rel, COMPANION_CENTER_SECS, COMPANION_SIGMA_SECS);
    finite_or((main + companion) as f32, 0.0)
}
