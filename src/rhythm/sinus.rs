// src/rhythm/sinus.rs
//! Sinus-type and paced rhythm generation
//!
//! Stateless per call: the engine's beat scheduler supplies the phase-relative
//! time, and the complex renders from the shared cardiac shape functions. A
//! paced rhythm replaces the native P wave with a pacing spike, and the QRS
//! follows the spike after the capture delay instead of the PR interval.

use crate::catalog::RhythmDefinition;
use crate::shapes::cardiac::{half_sine_lobe, pqrst, qrs_t, P_ONSET_SECS};

/// One ECG sample, `t_rel` relative to the beat boundary.
pub fn generate(t_rel: f64, _cycle: f64, def: &RhythmDefinition, paced: bool) -> f32 {
    if !t_rel.is_finite() || t_rel < 0.0 {
        return 0.0;
    }
    match (paced, def.pacing.as_ref()) {
        (true, Some(pacing)) => {
            let spike = half_sine_lobe(
                t_rel - P_ONSET_SECS,
                pacing.spike_width,
                pacing.spike_amplitude,
            );
            let qrs_onset = P_ONSET_SECS + pacing.capture_delay.max(0.0);
            spike + qrs_t(t_rel - qrs_onset, &def.wave, 0.0)
        }
        _ => pqrst(t_rel, &def.wave, 0.0),
    }
}
