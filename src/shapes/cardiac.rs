// src/shapes/cardiac.rs
//! Cardiac complex shape functions
//!
//! The PQRST complex is assembled from primitive lobes: a half-sine P wave,
//! three offset Gaussian lobes for Q/R/S, an ST-segment offset, and a
//! squared-sine T wave. Rhythm generators position these on their own
//! timelines (sinus renders them as one complex; the AV-block generator
//! renders P and QRS-T independently).

use crate::catalog::WaveFactors;
use crate::utils::numeric::finite_or;

/// Gap between the J point and T-wave onset, seconds.
pub const ST_SEGMENT_SECS: f64 = 0.10;

/// Small delay from cycle start to P onset so the complex does not sit on the
/// exact beat boundary.
pub const P_ONSET_SECS: f64 = 0.02;

/// Width factor applied to escape-beat complexes (idioventricular beats render
/// wide).
pub const ESCAPE_WIDTH_FACTOR: f64 = 1.9;

/// Half-sine lobe of the given duration, gated to non-negative output.
///
/// Returns zero outside `[0, duration]` and for degenerate widths.
pub fn half_sine_lobe(t_rel: f64, duration: f64, amplitude: f32) -> f32 {
    if duration <= 0.0 || amplitude == 0.0 || !t_rel.is_finite() {
        return 0.0;
    }
    if t_rel < 0.0 || t_rel > duration {
        return 0.0;
    }
    let lobe = (std::f64::consts::PI * t_rel / duration).sin().max(0.0);
    finite_or(amplitude * lobe as f32, 0.0)
}

fn gaussian_lobe(t_rel: f64, center: f64, sigma: f64) -> f64 {
    if sigma <= 0.0 {
        return 0.0;
    }
    let z = (t_rel - center) / sigma;
    (-0.5 * z * z).exp()
}

/// P wave: half-sine lobe, `t_rel` relative to P onset.
pub fn p_wave(t_rel: f64, wave: &WaveFactors) -> f32 {
    half_sine_lobe(t_rel, wave.p_duration, wave.p_amplitude)
}

/// QRS-T complex, `t_rel` relative to QRS onset.
///
/// Q, R, and S are Gaussian lobes positioned at fixed fractions of the QRS
/// width; the ST segment and T wave follow. Non-finite intermediates are
/// replaced by `default`.
pub fn qrs_t(t_rel: f64, wave: &WaveFactors, default: f32) -> f32 {
    let width = wave.qrs_width;
    if width <= 0.0 || !t_rel.is_finite() || t_rel < 0.0 {
        return 0.0;
    }

    let mut amplitude = 0.0f64;

    if wave.qrs_amplitude != 0.0 {
        let qrs = wave.qrs_amplitude as f64;
        amplitude += qrs * wave.q_factor as f64 * gaussian_lobe(t_rel, width * 0.18, width * 0.08);
        amplitude += qrs * wave.r_factor as f64 * gaussian_lobe(t_rel, width * 0.50, width * 0.12);
        amplitude += qrs * wave.s_factor as f64 * gaussian_lobe(t_rel, width * 0.82, width * 0.08);
    }

    // ST segment runs from the J point to T onset
    let t_onset = width + ST_SEGMENT_SECS;
    if wave.st_offset != 0.0 && t_rel >= width && t_rel < t_onset {
        let st = wave.st_offset as f64;
        if st > 0.0 {
            // Elevation decays toward the T wave
            let progress = (t_rel - width) / ST_SEGMENT_SECS;
            amplitude += st * (-2.0 * progress).exp();
        } else {
            // Depression holds flat
            amplitude += st;
        }
    }

    // Squared-sine T wave; sign follows the configured amplitude
    if wave.t_amplitude != 0.0 && wave.t_duration > 0.0 {
        let t_wave_rel = t_rel - t_onset;
        if t_wave_rel >= 0.0 && t_wave_rel <= wave.t_duration {
            let phase = std::f64::consts::PI * t_wave_rel / wave.t_duration;
            amplitude += wave.t_amplitude as f64 * phase.sin().powi(2);
        }
    }

    finite_or(amplitude as f32, default)
}

/// Total render window of a QRS-T complex from QRS onset, seconds.
pub fn complex_duration(wave: &WaveFactors) -> f64 {
    wave.qrs_width.max(0.0) + ST_SEGMENT_SECS + wave.t_duration.max(0.0)
}

/// Full PQRST complex for sinus-family rhythms, `t_rel` relative to cycle
/// start. P sits at a small onset delay; the QRS follows after the PR
/// interval.
pub fn pqrst(t_rel: f64, wave: &WaveFactors, default: f32) -> f32 {
    let p = p_wave(t_rel - P_ONSET_SECS, wave);
    let qrs_onset = P_ONSET_SECS + wave.pr_interval.max(0.0);
    let complex = qrs_t(t_rel - qrs_onset, wave, default);
    finite_or(p + complex, default)
}
