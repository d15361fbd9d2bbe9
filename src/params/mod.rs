// src/params/mod.rs
//! Channel parameter model
//!
//! One struct per monitored channel, aggregated into [`ParameterSet`]. The
//! engine keeps three parallel `ParameterSet` instances: `current` (what the
//! generators read each tick), `interpolation_target` (what continuous
//! interpolation walks `current` toward), and `requested_target` (the
//! clinician's latest request). That triplication is deliberate — it is what
//! gives numeric edits a smooth ramp while categorical edits switch atomically
//! at cycle boundaries.

use crate::catalog::RhythmId;
use serde::{Deserialize, Serialize};

/// Plethysmogram waveform variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlethVariant {
    /// Normal pulse with dicrotic notch
    #[default]
    Normal,
    /// Damped pulse: reduced amplitude, no notch
    Damped,
    /// Probe off / no perfusion: flat baseline
    NoSignal,
}

/// Arterial pressure waveform variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PressureVariant {
    /// Normal arterial contour
    #[default]
    Normal,
    /// Over-damped line: reduced pulse pressure, no notch
    Damped,
    /// No forward flow: flat trace at the floor pressure
    Flat,
}

/// Capnogram waveform variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CapnoVariant {
    /// Normal four-phase breath
    #[default]
    Normal,
    /// Obstructive "shark fin": slurred upstroke merging into the plateau
    Obstructive,
    /// Circuit disconnect: flat zero
    Disconnect,
}

/// ECG channel targets
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct EcgParams {
    /// Target heart rate in beats/min (compressions/min for CPR artifact)
    pub heart_rate: f32,
    /// Active rhythm identifier
    pub rhythm: RhythmId,
    /// Trace visibility
    pub visible: bool,
}

impl Default for EcgParams {
    fn default() -> Self {
        Self {
            heart_rate: 80.0,
            rhythm: RhythmId::NormalSinus,
            visible: true,
        }
    }
}

/// SpO2 channel targets
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Spo2Params {
    /// Target saturation percentage
    pub saturation: f32,
    /// Pleth waveform variant (deferred to the next beat boundary)
    pub shape: PlethVariant,
    /// Trace visibility
    pub visible: bool,
}

impl Default for Spo2Params {
    fn default() -> Self {
        Self {
            saturation: 98.0,
            shape: PlethVariant::Normal,
            visible: true,
        }
    }
}

/// Arterial blood pressure channel targets
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct AbpParams {
    /// Target systolic pressure in mmHg
    pub systolic: f32,
    /// Target diastolic pressure in mmHg
    pub diastolic: f32,
    /// Pressure waveform variant (deferred to the next beat boundary)
    pub shape: PressureVariant,
    /// Trace visibility
    pub visible: bool,
}

impl Default for AbpParams {
    fn default() -> Self {
        Self {
            systolic: 120.0,
            diastolic: 80.0,
            shape: PressureVariant::Normal,
            visible: true,
        }
    }
}

/// Capnography channel targets
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Etco2Params {
    /// Target end-tidal CO2 in mmHg
    pub etco2_mmhg: f32,
    /// Target respiratory rate in breaths/min
    pub resp_rate: f32,
    /// Capnogram waveform variant
    pub shape: CapnoVariant,
    /// Trace visibility
    pub visible: bool,
}

impl Default for Etco2Params {
    fn default() -> Self {
        Self {
            etco2_mmhg: 38.0,
            resp_rate: 14.0,
            shape: CapnoVariant::Normal,
            visible: true,
        }
    }
}

/// Temperature channel target (numeric display only, no waveform)
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct TempParams {
    /// Target temperature in degrees Celsius
    pub celsius: f32,
    /// Readout visibility
    pub visible: bool,
}

impl Default for TempParams {
    fn default() -> Self {
        Self {
            celsius: 36.8,
            visible: true,
        }
    }
}

/// Full per-session parameter set across all channels
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
pub struct ParameterSet {
    /// ECG channel
    pub ecg: EcgParams,
    /// SpO2 channel
    pub spo2: Spo2Params,
    /// Arterial pressure channel
    pub abp: AbpParams,
    /// Capnography channel
    pub etco2: Etco2Params,
    /// Temperature channel
    pub temperature: TempParams,
}

/// A non-invasive blood pressure measurement, displayed verbatim.
///
/// This never runs through the waveform engine; the measuring device (or the
/// session relay) supplies the finished numbers.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct NibpReading {
    /// Systolic pressure in mmHg
    pub systolic: f32,
    /// Diastolic pressure in mmHg
    pub diastolic: f32,
    /// Mean arterial pressure in mmHg
    pub mean: f32,
    /// Measurement timestamp, milliseconds since an epoch the host chooses
    pub timestamp_ms: u64,
}

/// Read-only numeric vitals derived from the currently rendering parameters.
///
/// Published by the engine each callback for the alarm subsystem; threshold
/// evaluation and tone playback happen entirely outside this crate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VitalsSnapshot {
    /// Heart rate readout in beats/min
    pub heart_rate: f32,
    /// Saturation readout in percent
    pub spo2: f32,
    /// Systolic arterial pressure in mmHg
    pub systolic: f32,
    /// Diastolic arterial pressure in mmHg
    pub diastolic: f32,
    /// Mean arterial pressure in mmHg
    pub mean_arterial: f32,
    /// End-tidal CO2 in mmHg
    pub etco2: f32,
    /// Respiratory rate in breaths/min
    pub resp_rate: f32,
    /// Temperature in degrees Celsius
    pub temperature: f32,
}

impl VitalsSnapshot {
    /// Derive a snapshot from a rendering parameter set.
    pub fn from_parameters(params: &ParameterSet) -> Self {
        Self {
            heart_rate: params.ecg.heart_rate,
            spo2: params.spo2.saturation,
            systolic: params.abp.systolic,
            diastolic: params.abp.diastolic,
            mean_arterial: (params.abp.systolic + 2.0 * params.abp.diastolic) / 3.0,
            etco2: params.etco2.etco2_mmhg,
            resp_rate: params.etco2.resp_rate,
            temperature: params.temperature.celsius,
        }
    }
}
