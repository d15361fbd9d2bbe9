// src/engine/mod.rs
//! Simulation engine
//!
//! [`MonitorEngine`] is the composition root: it owns the parameter
//! controller, the active generator state, the beat/breath/compression
//! schedulers, the per-channel sweep buffers, and the command intake. The host
//! rendering loop drives it through [`MonitorEngine::advance`] with elapsed
//! wall-clock time; an accumulator converts that into whole fixed logical
//! steps so waveform cadence is independent of callback frequency and jitter.

pub mod commands;
pub mod controller;
pub mod scheduler;
pub mod sweep;

#[cfg(test)]
mod tests;

pub use commands::{CommandHandle, CommandQueue, EngineCommand};
pub use controller::{ParameterController, PendingUpdate};
pub use scheduler::{interval_from_rate, CycleScheduler};
pub use sweep::SweepBuffer;

use crate::catalog::{GeneratorFamily, RhythmCatalog, RhythmDefinition, RhythmId};
use crate::config::commands::DEFAULT_QUEUE_CAPACITY;
use crate::config::shock::BURST_PEAK_MV;
use crate::config::timing::{MAX_INTERPOLATION_DT_SECS, MAX_RATE_PER_MIN, MAX_RESP_RATE_PER_MIN};
use crate::config::EngineConfig;
use crate::error::{EngineError, SimResult};
use crate::params::{NibpReading, ParameterSet, VitalsSnapshot};
use crate::rhythm::{self, GeneratorContext, GeneratorState};
use crate::shapes::capno::capno_breath;
use crate::shapes::pleth::pleth_pulse;
use crate::shapes::pressure::arterial_pulse;
use crate::utils::numeric::{finite_or, jitter_factor};
use parking_lot::RwLock;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The waveform simulation engine
pub struct MonitorEngine {
    config: EngineConfig,
    catalog: RhythmCatalog,
    controller: ParameterController,
    active_def: RhythmDefinition,
    generator: GeneratorState,

    beats: CycleScheduler,
    breaths: CycleScheduler,
    compressions: CycleScheduler,

    ecg: SweepBuffer,
    pleth: SweepBuffer,
    pressure: SweepBuffer,
    capno: SweepBuffer,

    sim_time: f64,
    accumulator: f64,
    active: bool,

    rng: SmallRng,
    commands: CommandQueue,
    vitals: Arc<RwLock<VitalsSnapshot>>,
    nibp: Option<NibpReading>,
}

impl MonitorEngine {
    /// Engine with entropy-seeded jitter.
    pub fn new(config: EngineConfig, catalog: RhythmCatalog) -> SimResult<Self> {
        Self::build(config, catalog, SmallRng::from_entropy())
    }

    /// Engine with a fixed jitter seed, for deterministic runs.
    pub fn with_seed(config: EngineConfig, catalog: RhythmCatalog, seed: u64) -> SimResult<Self> {
        Self::build(config, catalog, SmallRng::seed_from_u64(seed))
    }

    fn build(config: EngineConfig, catalog: RhythmCatalog, rng: SmallRng) -> SimResult<Self> {
        config.validate()?;
        let initial = ParameterSet::default();
        let active_def = catalog
            .get(initial.ecg.rhythm)
            .cloned()
            .ok_or_else(|| EngineError::UnknownRhythm(initial.ecg.rhythm.to_string()))?;

        let len = config.sweep_samples();
        let gap = config.erase_gap_samples;
        let generator = GeneratorState::for_family(active_def.family);

        Ok(Self {
            controller: ParameterController::new(initial),
            generator,
            active_def,
            beats: CycleScheduler::new(),
            breaths: CycleScheduler::new(),
            compressions: CycleScheduler::new(),
            ecg: SweepBuffer::new(len, gap),
            pleth: SweepBuffer::new(len, gap),
            pressure: SweepBuffer::new(len, gap),
            capno: SweepBuffer::new(len, gap),
            sim_time: 0.0,
            accumulator: 0.0,
            active: false,
            rng,
            commands: CommandQueue::new(DEFAULT_QUEUE_CAPACITY),
            vitals: Arc::new(RwLock::new(VitalsSnapshot::from_parameters(&initial))),
            nibp: None,
            config,
            catalog,
        })
    }

    // ---- host-facing surface -------------------------------------------

    /// Start the simulation loop from a clean slate.
    pub fn activate(&mut self) {
        if self.active {
            return;
        }
        info!("simulation activated");
        self.reset_runtime();
        self.active = true;
    }

    /// Stop the simulation loop. All schedules, buffers, and pending-update
    /// flags reset so a later activate is not influenced by this run.
    pub fn deactivate(&mut self) {
        if !self.active {
            return;
        }
        info!("simulation deactivated");
        self.active = false;
        self.reset_runtime();
    }

    /// Advance by elapsed wall-clock seconds reported by the host loop.
    ///
    /// The elapsed time is converted into whole logical steps through an
    /// accumulator that carries fractional remainders. After a long host pause
    /// the replay is clamped to `max_catchup_steps` and the rest of the
    /// backlog is discarded, so a suspended tab cannot run the channels ahead
    /// indefinitely. Parameter reconciliation runs once per callback, not once
    /// per step.
    pub fn advance(&mut self, elapsed_seconds: f64) {
        self.drain_commands();
        if !self.active {
            return;
        }

        let elapsed = if elapsed_seconds.is_finite() && elapsed_seconds > 0.0 {
            elapsed_seconds
        } else {
            0.0
        };
        self.accumulator += elapsed;

        let period = self.config.sample_period();
        let mut steps = (self.accumulator / period) as u64;
        let max_steps = self.config.max_catchup_steps as u64;
        if steps > max_steps {
            debug!(dropped = steps - max_steps, "clamping catch-up steps");
            steps = max_steps;
            self.accumulator = 0.0;
        } else {
            self.accumulator -= steps as f64 * period;
        }

        for _ in 0..steps {
            self.step();
        }

        self.reconcile(elapsed.min(MAX_INTERPOLATION_DT_SECS));
        self.publish_vitals();
    }

    /// Apply a full target parameter set, local-panel or relay origin alike.
    ///
    /// Numeric fields are sanitized rather than rejected; an unknown rhythm
    /// refuses the whole set and the previous rhythm keeps rendering.
    pub fn set_parameters(&mut self, set: ParameterSet) -> SimResult<()> {
        if !self.catalog.contains(set.ecg.rhythm) {
            warn!(rhythm = %set.ecg.rhythm, "refusing switch to unknown rhythm");
            return Err(EngineError::UnknownRhythm(set.ecg.rhythm.to_string()));
        }
        let set = self.sanitize(set);
        let rhythm_changed = set.ecg.rhythm != self.controller.current.ecg.rhythm;
        self.controller.request(set);
        if rhythm_changed {
            self.switch_rhythm(set.ecg.rhythm);
        }
        Ok(())
    }

    /// Deliver a defibrillation shock landing on `rhythm`.
    ///
    /// Injects a fixed-length artifact burst into the ECG buffer, resets all
    /// scheduling and generator state, and reconciles companion channels to
    /// the post-shock rhythm immediately rather than at the next boundary.
    pub fn shock(&mut self, rhythm: RhythmId) -> SimResult<()> {
        if !self.catalog.contains(rhythm) {
            warn!(rhythm = %rhythm, "refusing shock to unknown rhythm");
            return Err(EngineError::UnknownRhythm(rhythm.to_string()));
        }
        info!(rhythm = %rhythm, "defibrillation shock delivered");

        let burst = self.config.shock_burst_samples;
        for i in 0..burst {
            let progress = i as f64 / burst as f64;
            let envelope = (-3.0 * progress).exp() as f32;
            let sample = BURST_PEAK_MV * envelope * (self.rng.gen::<f32>() - 0.5) * 2.0;
            self.ecg.push(Some(sample));
        }

        let mut requested = self.controller.requested;
        requested.ecg.rhythm = rhythm;
        self.controller.requested = requested;
        self.switch_rhythm(rhythm);
        Ok(())
    }

    /// Store a finished NIBP measurement for verbatim display.
    pub fn set_nibp(&mut self, reading: NibpReading) {
        self.nibp = Some(reading);
    }

    // ---- accessors ------------------------------------------------------

    /// A cloneable handle for operator panels and relay adapters.
    pub fn command_handle(&self) -> CommandHandle {
        self.commands.handle()
    }

    /// Shared read-only vitals snapshot for the alarm subsystem.
    pub fn vitals_handle(&self) -> Arc<RwLock<VitalsSnapshot>> {
        Arc::clone(&self.vitals)
    }

    /// ECG sweep buffer.
    pub fn ecg_sweep(&self) -> &SweepBuffer {
        &self.ecg
    }

    /// Pleth sweep buffer.
    pub fn pleth_sweep(&self) -> &SweepBuffer {
        &self.pleth
    }

    /// Arterial pressure sweep buffer.
    pub fn pressure_sweep(&self) -> &SweepBuffer {
        &self.pressure
    }

    /// Capnogram sweep buffer.
    pub fn capno_sweep(&self) -> &SweepBuffer {
        &self.capno
    }

    /// The currently rendering parameter snapshot.
    pub fn current_parameters(&self) -> &ParameterSet {
        &self.controller.current
    }

    /// The clinician's standing request.
    pub fn requested_parameters(&self) -> &ParameterSet {
        &self.controller.requested
    }

    /// The rhythm currently rendering.
    pub fn active_rhythm(&self) -> RhythmId {
        self.active_def.id
    }

    /// Whether the simulation loop is running.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Simulation-clock time in seconds since activation.
    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    /// The most recent NIBP measurement, if any.
    pub fn last_nibp(&self) -> Option<NibpReading> {
        self.nibp
    }

    // ---- internals ------------------------------------------------------

    fn drain_commands(&mut self) {
        while let Some(command) = self.commands.try_next() {
            match command {
                EngineCommand::SetParameters(set) => {
                    // Refusals are already logged; the previous state renders on
                    let _ = self.set_parameters(set);
                }
                EngineCommand::Activate => self.activate(),
                EngineCommand::Deactivate => self.deactivate(),
                EngineCommand::Shock { rhythm } => {
                    let _ = self.shock(rhythm);
                }
                EngineCommand::Nibp(reading) => self.set_nibp(reading),
            }
        }
    }

    /// One fixed logical step: advance cycle clocks, fire due boundaries,
    /// compute one sample per channel.
    fn step(&mut self) {
        self.sim_time += self.config.sample_period();
        let now = self.sim_time;

        // Beat scheduling runs from the interpolation-target heart rate, not
        // the ramping current value, so beat spacing does not jitter while the
        // numeric readout is still converging.
        let target_hr = self.controller.interpolation_target.ecg.heart_rate;
        let beat_interval = interval_from_rate(target_hr);
        if self.beats.idle() && beat_interval.is_finite() {
            self.beats.restart(now);
        }
        if self.beats.due(now) {
            let mut interval = beat_interval;
            if self.active_def.irregularity > 0.0 {
                interval *= jitter_factor(&mut self.rng, self.active_def.irregularity);
            }
            self.beats.fire(now, interval);
            self.controller.apply_beat_boundary();
        }

        let current_rr = self.controller.current.etco2.resp_rate;
        let breath_interval = interval_from_rate(current_rr);
        if self.breaths.idle() && breath_interval.is_finite() {
            self.breaths.restart(now);
        }
        if self.breaths.due(now) {
            match self.controller.apply_breath_boundary() {
                Some(new_rate) => self.breaths.fire(now, interval_from_rate(new_rate)),
                None => self.breaths.fire(now, breath_interval),
            }
        }

        if self.active_def.family == GeneratorFamily::Compression {
            let compression_interval = interval_from_rate(target_hr);
            if self.compressions.idle() && compression_interval.is_finite() {
                self.compressions.restart(now);
            }
            if self.compressions.due(now) {
                self.compressions.fire(now, compression_interval);
            }
        }

        let ctx = GeneratorContext {
            sim_time: now,
            beat_time: self.beats.elapsed_since_last(now),
            beat_interval: self.beats.current_interval(),
            compression_time: self.compressions.elapsed_since_last(now),
            atrial_rate: target_hr,
            noise_amplitude: self.config.ecg_noise_mv,
            def: &self.active_def,
        };
        let ecg_sample = rhythm::generate_ecg(&mut self.generator, &ctx, &mut self.rng);

        // Pulse channels ride the compression schedule during CPR, the beat
        // schedule otherwise
        let (pulse_time, pulse_interval) =
            if self.active_def.family == GeneratorFamily::Compression {
                (
                    self.compressions.elapsed_since_last(now),
                    self.compressions.current_interval(),
                )
            } else {
                (
                    self.beats.elapsed_since_last(now),
                    self.beats.current_interval(),
                )
            };

        let current = self.controller.current;
        let pleth_sample = pleth_pulse(
            pulse_time,
            pulse_interval,
            current.spo2.saturation,
            current.spo2.shape,
        );
        let pressure_sample = arterial_pulse(
            pulse_time,
            pulse_interval,
            current.abp.systolic,
            current.abp.diastolic,
            current.abp.shape,
        );
        let capno_sample = capno_breath(
            self.breaths.elapsed_since_last(now),
            self.breaths.current_interval(),
            current.etco2.etco2_mmhg,
            current.etco2.shape,
        );

        self.ecg.push(current.ecg.visible.then_some(ecg_sample));
        self.pleth.push(current.spo2.visible.then_some(pleth_sample));
        self.pressure
            .push(current.abp.visible.then_some(pressure_sample));
        self.capno.push(current.etco2.visible.then_some(capno_sample));
    }

    /// Once-per-callback parameter migration: continuous numeric interpolation
    /// plus re-clamping of rhythm-pinned channels.
    fn reconcile(&mut self, dt: f64) {
        self.controller.interpolate(
            dt,
            self.config.interpolation_rate,
            self.config.snap_threshold,
        );
        if self.active_def.forces_companions() {
            self.apply_forced_companions();
        }
    }

    fn publish_vitals(&mut self) {
        *self.vitals.write() = VitalsSnapshot::from_parameters(&self.controller.current);
    }

    /// Immediate rhythm switch: replace the generator, reset its private
    /// state, restart all schedules, and snap any rhythm-pinned companion
    /// channels so the operator sees an unambiguous state change.
    fn switch_rhythm(&mut self, id: RhythmId) {
        let Some(def) = self.catalog.get(id).cloned() else {
            // Callers validate; render on unchanged if they did not
            warn!(rhythm = %id, "rhythm vanished from catalog, keeping previous");
            return;
        };
        debug!(rhythm = %id, family = ?def.family, "switching rhythm");

        self.active_def = def;
        self.generator = GeneratorState::for_family(self.active_def.family);
        self.beats.restart(self.sim_time);
        self.breaths.restart(self.sim_time);
        self.compressions.restart(self.sim_time);

        // Rhythm identity is immediate on all three snapshots
        self.controller.current.ecg.rhythm = id;
        self.controller.interpolation_target.ecg.rhythm = id;
        self.controller.requested.ecg.rhythm = id;

        // The trace is discontinuous at a switch anyway; staged categorical
        // updates apply now instead of waiting out a boundary that no longer
        // means anything
        let standing = self.controller.requested;
        self.controller.request(standing);
        self.controller.flush_pending();

        if self.active_def.forces_companions() {
            self.apply_forced_companions();
        }
    }

    /// Snap rhythm-pinned channels to their forced values on both `current`
    /// and the interpolation target, suspending interpolation for them. The
    /// clinician's `requested` snapshot is left intact so releasing the pin
    /// (switching to a perfusing rhythm) resumes ramping toward it.
    fn apply_forced_companions(&mut self) {
        let companions = self.active_def.companions;
        let flags = self.active_def.flags;
        let controller = &mut self.controller;

        if let Some(saturation) = companions.saturation {
            controller.current.spo2.saturation = saturation;
            controller.interpolation_target.spo2.saturation = saturation;
        }
        if let Some(shape) = companions.pleth_shape {
            controller.current.spo2.shape = shape;
            controller.interpolation_target.spo2.shape = shape;
            controller.pending_pleth_shape.clear();
        }
        if let Some((systolic, diastolic)) = companions.pressure {
            controller.current.abp.systolic = systolic;
            controller.current.abp.diastolic = diastolic;
            controller.interpolation_target.abp.systolic = systolic;
            controller.interpolation_target.abp.diastolic = diastolic;
        }
        if let Some(shape) = companions.pressure_shape {
            controller.current.abp.shape = shape;
            controller.interpolation_target.abp.shape = shape;
            controller.pending_pressure_shape.clear();
        }
        if let Some(etco2) = companions.etco2 {
            controller.current.etco2.etco2_mmhg = etco2;
            controller.interpolation_target.etco2.etco2_mmhg = etco2;
        }
        if let Some(resp_rate) = companions.resp_rate {
            controller.current.etco2.resp_rate = resp_rate;
            controller.interpolation_target.etco2.resp_rate = resp_rate;
        }
        if let Some(shape) = companions.capno_shape {
            controller.current.etco2.shape = shape;
            controller.interpolation_target.etco2.shape = shape;
            controller.pending_etco2.clear();
        }

        // No organized beats: the heart-rate readout pins to zero. The CPR
        // artifact keeps the operator's rate control as compression frequency.
        if flags.is_flat || flags.is_chaotic {
            controller.current.ecg.heart_rate = 0.0;
            controller.interpolation_target.ecg.heart_rate = 0.0;
        }
    }

    fn reset_runtime(&mut self) {
        self.sim_time = 0.0;
        self.accumulator = 0.0;
        self.beats.clear();
        self.breaths.clear();
        self.compressions.clear();
        self.ecg.clear();
        self.pleth.clear();
        self.pressure.clear();
        self.capno.clear();
        self.controller.clear_pending();
        self.generator = GeneratorState::for_family(self.active_def.family);
    }

    fn sanitize(&self, mut set: ParameterSet) -> ParameterSet {
        let previous = &self.controller.requested;
        set.ecg.heart_rate =
            finite_or(set.ecg.heart_rate, previous.ecg.heart_rate).clamp(0.0, MAX_RATE_PER_MIN);
        set.spo2.saturation =
            finite_or(set.spo2.saturation, previous.spo2.saturation).clamp(0.0, 100.0);
        set.abp.systolic = finite_or(set.abp.systolic, previous.abp.systolic).clamp(0.0, 300.0);
        set.abp.diastolic = finite_or(set.abp.diastolic, previous.abp.diastolic).clamp(0.0, 300.0);
        set.etco2.etco2_mmhg =
            finite_or(set.etco2.etco2_mmhg, previous.etco2.etco2_mmhg).clamp(0.0, 150.0);
        set.etco2.resp_rate = finite_or(set.etco2.resp_rate, previous.etco2.resp_rate)
            .clamp(0.0, MAX_RESP_RATE_PER_MIN);
        set.temperature.celsius =
            finite_or(set.temperature.celsius, previous.temperature.celsius).clamp(15.0, 45.0);
        set
    }
}
