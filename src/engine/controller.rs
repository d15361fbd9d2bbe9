// src/engine/controller.rs
//! Parameter change controller
//!
//! Owns the three parameter snapshots and governs how clinician edits migrate
//! from "requested" to "rendering": numeric magnitudes are nudged toward their
//! targets every callback, while shape and category changes are held in
//! [`PendingUpdate`] cells until the next safe cycle boundary so the trace
//! never jumps mid-waveform. Rhythm identity is deliberately not handled here;
//! rhythm switches are immediate and owned by the engine.

use crate::params::{Etco2Params, ParameterSet, PlethVariant, PressureVariant};

/// A deferred categorical change awaiting its cycle boundary.
///
/// The snapshot and the flag are kept separately on purpose: if they ever
/// disagree (snapshot without flag, or flag without snapshot), the controller
/// treats the update as pending and applies it at the next opportunity rather
/// than dropping it silently.
#[derive(Debug, Clone, Default)]
pub struct PendingUpdate<T: Clone> {
    snapshot: Option<T>,
    pending: bool,
}

impl<T: Clone> PendingUpdate<T> {
    /// Stage a new value for the next boundary, replacing any earlier one.
    pub fn request(&mut self, value: T) {
        self.snapshot = Some(value);
        self.pending = true;
    }

    /// Whether anything is waiting to apply.
    pub fn is_pending(&self) -> bool {
        self.pending || self.snapshot.is_some()
    }

    /// Consume the staged value.
    pub fn take(&mut self) -> Option<T> {
        self.pending = false;
        self.snapshot.take()
    }

    /// Drop any staged value without applying it.
    pub fn clear(&mut self) {
        self.pending = false;
        self.snapshot = None;
    }
}

/// Move `current` toward `target` by a proportional step, snapping once the
/// remaining gap falls inside `snap`. Never overshoots: the step fraction is
/// capped at the full gap.
pub fn approach(current: f32, target: f32, rate: f32, dt: f64, snap: f32) -> f32 {
    if !target.is_finite() {
        return current;
    }
    if !current.is_finite() {
        return target;
    }
    let gap = target - current;
    if gap.abs() <= snap {
        return target;
    }
    let fraction = (rate as f64 * dt).clamp(0.0, 1.0) as f32;
    current + gap * fraction
}

/// The three parameter snapshots plus the per-channel deferral cells
#[derive(Debug, Clone)]
pub struct ParameterController {
    /// Values the generators read each tick
    pub current: ParameterSet,
    /// Values continuous interpolation walks `current` toward
    pub interpolation_target: ParameterSet,
    /// The clinician's latest request, source of truth for both of the above
    pub requested: ParameterSet,
    /// Deferred ETCO2 value / respiratory rate / capnogram shape
    pub pending_etco2: PendingUpdate<Etco2Params>,
    /// Deferred pleth shape
    pub pending_pleth_shape: PendingUpdate<PlethVariant>,
    /// Deferred pressure shape
    pub pending_pressure_shape: PendingUpdate<PressureVariant>,
}

impl ParameterController {
    /// Controller with all three snapshots equal to `initial`.
    pub fn new(initial: ParameterSet) -> Self {
        Self {
            current: initial,
            interpolation_target: initial,
            requested: initial,
            pending_etco2: PendingUpdate::default(),
            pending_pleth_shape: PendingUpdate::default(),
            pending_pressure_shape: PendingUpdate::default(),
        }
    }

    /// Accept a clinician request. Numeric fields flow into the interpolation
    /// target; shape fields that differ from `current` are staged for their
    /// cycle boundary; visibility flags propagate immediately. The rhythm
    /// field is recorded on `requested` only — the engine applies rhythm
    /// switches itself.
    pub fn request(&mut self, set: ParameterSet) {
        self.requested = set;

        // Numeric magnitudes are never deferred
        self.interpolation_target.ecg.heart_rate = set.ecg.heart_rate;
        self.interpolation_target.spo2.saturation = set.spo2.saturation;
        self.interpolation_target.abp.systolic = set.abp.systolic;
        self.interpolation_target.abp.diastolic = set.abp.diastolic;
        self.interpolation_target.temperature.celsius = set.temperature.celsius;

        // Visibility propagates immediately, it only gates rendering
        self.current.ecg.visible = set.ecg.visible;
        self.current.spo2.visible = set.spo2.visible;
        self.current.abp.visible = set.abp.visible;
        self.current.etco2.visible = set.etco2.visible;
        self.current.temperature.visible = set.temperature.visible;
        self.interpolation_target.ecg.visible = set.ecg.visible;
        self.interpolation_target.spo2.visible = set.spo2.visible;
        self.interpolation_target.abp.visible = set.abp.visible;
        self.interpolation_target.etco2.visible = set.etco2.visible;
        self.interpolation_target.temperature.visible = set.temperature.visible;

        // Shape and category changes wait for their cycle boundary
        if set.spo2.shape != self.current.spo2.shape {
            self.pending_pleth_shape.request(set.spo2.shape);
        }
        if set.abp.shape != self.current.abp.shape {
            self.pending_pressure_shape.request(set.abp.shape);
        }
        if set.etco2.etco2_mmhg != self.current.etco2.etco2_mmhg
            || set.etco2.resp_rate != self.current.etco2.resp_rate
            || set.etco2.shape != self.current.etco2.shape
        {
            self.pending_etco2.request(set.etco2);
        }
    }

    /// Advance all interpolating numerics by one callback.
    pub fn interpolate(&mut self, dt: f64, rate: f32, snap: f32) {
        self.current.ecg.heart_rate = approach(
            self.current.ecg.heart_rate,
            self.interpolation_target.ecg.heart_rate,
            rate,
            dt,
            snap,
        );
        self.current.spo2.saturation = approach(
            self.current.spo2.saturation,
            self.interpolation_target.spo2.saturation,
            rate,
            dt,
            snap,
        );
        self.current.abp.systolic = approach(
            self.current.abp.systolic,
            self.interpolation_target.abp.systolic,
            rate,
            dt,
            snap,
        );
        self.current.abp.diastolic = approach(
            self.current.abp.diastolic,
            self.interpolation_target.abp.diastolic,
            rate,
            dt,
            snap,
        );
        // Temperature moves on a tighter snap threshold; whole-degree snapping
        // would be visible on the readout
        self.current.temperature.celsius = approach(
            self.current.temperature.celsius,
            self.interpolation_target.temperature.celsius,
            rate,
            dt,
            (snap * 0.1).min(0.05),
        );
    }

    /// Beat boundary crossed: staged pleth/pressure shapes become current.
    pub fn apply_beat_boundary(&mut self) {
        if let Some(shape) = self.pending_pleth_shape.take() {
            self.current.spo2.shape = shape;
            self.interpolation_target.spo2.shape = shape;
        }
        if let Some(shape) = self.pending_pressure_shape.take() {
            self.current.abp.shape = shape;
            self.interpolation_target.abp.shape = shape;
        }
    }

    /// Breath boundary crossed: a staged ETCO2 update becomes current.
    /// Returns the new respiratory rate when an update applied, so the caller
    /// reschedules the breath interval from it.
    pub fn apply_breath_boundary(&mut self) -> Option<f32> {
        let update = self.pending_etco2.take()?;
        self.current.etco2 = Etco2Params {
            visible: self.current.etco2.visible,
            ..update
        };
        self.interpolation_target.etco2 = self.current.etco2;
        Some(update.resp_rate)
    }

    /// Apply every staged update immediately, bypassing boundaries. Used on
    /// rhythm switches and shock, where the waveform is discontinuous anyway.
    pub fn flush_pending(&mut self) {
        self.apply_beat_boundary();
        let _ = self.apply_breath_boundary();
    }

    /// Discard staged updates without applying them.
    pub fn clear_pending(&mut self) {
        self.pending_etco2.clear();
        self.pending_pleth_shape.clear();
        self.pending_pressure_shape.clear();
    }
}
