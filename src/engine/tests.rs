// src/engine/tests.rs
//! Engine-level scenario tests

use super::*;
use crate::params::{CapnoVariant, PlethVariant, PressureVariant};

const FRAME: f64 = 1.0 / 60.0;

fn engine() -> MonitorEngine {
    MonitorEngine::with_seed(EngineConfig::default(), RhythmCatalog::standard(), 42).unwrap()
}

fn running_engine() -> MonitorEngine {
    let mut engine = engine();
    engine.activate();
    engine
}

fn advance_seconds(engine: &mut MonitorEngine, seconds: f64) {
    let frames = (seconds / FRAME).ceil() as usize;
    for _ in 0..frames {
        engine.advance(FRAME);
    }
}

#[test]
fn test_inactive_engine_renders_nothing() {
    let mut engine = engine();
    engine.advance(1.0);
    assert_eq!(engine.ecg_sweep().filled(), 0);
    assert_eq!(engine.sim_time(), 0.0);
}

#[test]
fn test_active_engine_fills_sweep_buffers() {
    let mut engine = running_engine();
    advance_seconds(&mut engine, 2.0);

    // 2 s at 250 Hz, minus the erase gap
    let expected = 2.0 * 250.0;
    assert!((engine.ecg_sweep().filled() as f64 - expected).abs() <= engine.config.erase_gap_samples as f64 + 1.0);
    assert!(engine.pleth_sweep().filled() > 0);
    assert!(engine.pressure_sweep().filled() > 0);
    assert!(engine.capno_sweep().filled() > 0);
}

#[test]
fn test_sinus_produces_r_peaks_at_beat_spacing() {
    let mut engine = running_engine();
    advance_seconds(&mut engine, 6.0);

    let peaks: Vec<f32> = engine
        .ecg_sweep()
        .samples()
        .iter()
        .filter_map(|s| *s)
        .filter(|v| *v > 0.6)
        .collect();
    // 80 bpm over a 6 s window: several complexes must be visible
    assert!(peaks.len() >= 5, "expected R peaks, found {}", peaks.len());
}

#[test]
fn test_heart_rate_change_takes_effect_at_next_beat() {
    let mut engine = running_engine();
    advance_seconds(&mut engine, 1.0);

    let mut set = *engine.requested_parameters();
    set.ecg.heart_rate = 120.0;
    engine.set_parameters(set).unwrap();

    // Beat spacing recomputes from the target at the next boundary; ride past
    // one full old interval to be sure it fired
    advance_seconds(&mut engine, 1.0);
    assert!(
        (engine.beats.current_interval() - 0.5).abs() < 1e-9,
        "interval {} should be 60/120",
        engine.beats.current_interval()
    );

    // The numeric readout is still ramping, strictly between old and new
    let readout = engine.current_parameters().ecg.heart_rate;
    assert!(readout > 80.0 && readout <= 120.0, "readout {}", readout);

    // And it converges
    advance_seconds(&mut engine, 10.0);
    assert_eq!(engine.current_parameters().ecg.heart_rate, 120.0);
}

#[test]
fn test_zero_heart_rate_stops_beats() {
    let mut engine = running_engine();
    advance_seconds(&mut engine, 1.0);

    let mut set = *engine.requested_parameters();
    set.ecg.heart_rate = 0.0;
    engine.set_parameters(set).unwrap();
    advance_seconds(&mut engine, 2.0);

    assert!(engine.beats.idle(), "beat schedule must disarm at rate 0");
}

#[test]
fn test_etco2_update_holds_until_breath_boundary() {
    let mut engine = running_engine();
    advance_seconds(&mut engine, 0.5);

    let mut set = *engine.requested_parameters();
    set.etco2.etco2_mmhg = 60.0;
    set.etco2.resp_rate = 24.0;
    engine.set_parameters(set).unwrap();

    // Sample `current` every frame until the boundary: it must hold the old
    // values the whole way, then adopt the new ones in one jump
    let old = (38.0, 14.0);
    let boundary_before = engine.breaths.last_event();
    let mut crossed = false;
    for _ in 0..(10.0 / FRAME) as usize {
        engine.advance(FRAME);
        let etco2 = engine.current_parameters().etco2;
        if engine.breaths.last_event() != boundary_before {
            crossed = true;
            assert_eq!((etco2.etco2_mmhg, etco2.resp_rate), (60.0, 24.0));
            break;
        }
        assert_eq!((etco2.etco2_mmhg, etco2.resp_rate), old, "changed mid-cycle");
    }
    assert!(crossed, "breath boundary never arrived");

    // The next breath interval derives from the new rate
    assert!((engine.breaths.current_interval() - 2.5).abs() < 1e-9);
}

#[test]
fn test_pleth_shape_applies_at_beat_boundary() {
    let mut engine = running_engine();
    advance_seconds(&mut engine, 0.3);

    let mut set = *engine.requested_parameters();
    set.spo2.shape = PlethVariant::Damped;
    engine.set_parameters(set).unwrap();
    assert_eq!(engine.current_parameters().spo2.shape, PlethVariant::Normal);

    advance_seconds(&mut engine, 1.0);
    assert_eq!(engine.current_parameters().spo2.shape, PlethVariant::Damped);
}

#[test]
fn test_asystole_forces_companions_immediately() {
    let mut engine = running_engine();
    advance_seconds(&mut engine, 1.0);

    let mut set = *engine.requested_parameters();
    set.ecg.rhythm = RhythmId::Asystole;
    engine.set_parameters(set).unwrap();

    // Snapped, not interpolated: checked before any further advance
    let current = engine.current_parameters();
    assert_eq!(current.spo2.saturation, 0.0);
    assert_eq!(current.spo2.shape, PlethVariant::NoSignal);
    assert_eq!(current.abp.systolic, 0.0);
    assert_eq!(current.abp.shape, PressureVariant::Flat);
    assert_eq!(current.etco2.etco2_mmhg, 0.0);
    assert_eq!(current.etco2.shape, CapnoVariant::Disconnect);
    assert_eq!(current.ecg.heart_rate, 0.0);

    // And the pin holds against interpolation
    advance_seconds(&mut engine, 2.0);
    assert_eq!(engine.current_parameters().spo2.saturation, 0.0);
}

#[test]
fn test_recovery_from_asystole_ramps_back() {
    let mut engine = running_engine();
    let mut set = *engine.requested_parameters();
    set.ecg.rhythm = RhythmId::Asystole;
    engine.set_parameters(set).unwrap();
    advance_seconds(&mut engine, 1.0);

    let mut set = *engine.requested_parameters();
    set.ecg.rhythm = RhythmId::NormalSinus;
    set.spo2.saturation = 97.0;
    engine.set_parameters(set).unwrap();

    // Saturation climbs back gradually rather than jumping
    engine.advance(FRAME);
    let early = engine.current_parameters().spo2.saturation;
    assert!(early < 97.0 && early >= 0.0);
    advance_seconds(&mut engine, 15.0);
    assert_eq!(engine.current_parameters().spo2.saturation, 97.0);
}

#[test]
fn test_shock_from_vfib_resumes_sinus() {
    let mut engine = running_engine();
    let mut set = *engine.requested_parameters();
    set.ecg.rhythm = RhythmId::VentricularFibrillation;
    set.ecg.heart_rate = 80.0;
    engine.set_parameters(set).unwrap();
    advance_seconds(&mut engine, 3.0);
    assert!(matches!(engine.generator, GeneratorState::Chaotic(_)));

    engine.shock(RhythmId::NormalSinus).unwrap();

    // The burst landed in the buffer as a fixed-length run of samples
    let burst = engine.config.shock_burst_samples as usize;
    let len = engine.ecg_sweep().len();
    let cursor = engine.ecg_sweep().cursor();
    let mut non_null = 0;
    for i in 1..=burst {
        let idx = (cursor + len - i) % len;
        if engine.ecg_sweep().samples()[idx].is_some() {
            non_null += 1;
        }
    }
    assert_eq!(non_null, burst, "burst must be exactly {} samples", burst);

    // No residual chaotic state; sinus complexes resume at 80 bpm spacing
    assert!(matches!(engine.generator, GeneratorState::Sinus));
    assert_eq!(engine.active_rhythm(), RhythmId::NormalSinus);
    advance_seconds(&mut engine, 1.0);
    assert!((engine.beats.current_interval() - 0.75).abs() < 1e-9);

    advance_seconds(&mut engine, 5.0);
    let peaks = engine
        .ecg_sweep()
        .samples()
        .iter()
        .filter_map(|s| *s)
        .filter(|v| *v > 0.6)
        .count();
    assert!(peaks >= 4, "sinus complexes should be back, saw {}", peaks);
}

#[test]
fn test_shock_to_unknown_rhythm_is_refused() {
    let catalog_json = RhythmCatalog::standard().to_json().unwrap();
    let mut value: serde_json::Value = serde_json::from_str(&catalog_json).unwrap();
    value["definitions"]
        .as_object_mut()
        .unwrap()
        .remove("ventricular_tachycardia");
    let catalog = RhythmCatalog::from_json(&value.to_string()).unwrap();

    let mut engine = MonitorEngine::with_seed(EngineConfig::default(), catalog, 7).unwrap();
    engine.activate();
    advance_seconds(&mut engine, 0.5);

    let result = engine.shock(RhythmId::VentricularTachycardia);
    assert!(matches!(result, Err(EngineError::UnknownRhythm(_))));
    assert_eq!(engine.active_rhythm(), RhythmId::NormalSinus);
}

#[test]
fn test_unknown_rhythm_request_keeps_previous() {
    let catalog_json = RhythmCatalog::standard().to_json().unwrap();
    let mut value: serde_json::Value = serde_json::from_str(&catalog_json).unwrap();
    value["definitions"].as_object_mut().unwrap().remove("asystole");
    let catalog = RhythmCatalog::from_json(&value.to_string()).unwrap();

    let mut engine = MonitorEngine::with_seed(EngineConfig::default(), catalog, 7).unwrap();
    engine.activate();
    advance_seconds(&mut engine, 0.5);

    let mut set = *engine.requested_parameters();
    set.ecg.rhythm = RhythmId::Asystole;
    set.ecg.heart_rate = 55.0;
    let result = engine.set_parameters(set);
    assert!(matches!(result, Err(EngineError::UnknownRhythm(_))));
    // The whole set was refused; previous rhythm and targets keep rendering
    assert_eq!(engine.active_rhythm(), RhythmId::NormalSinus);
    assert_eq!(engine.requested_parameters().ecg.heart_rate, 80.0);
}

#[test]
fn test_cpr_rides_compression_schedule() {
    let mut engine = running_engine();
    let mut set = *engine.requested_parameters();
    set.ecg.rhythm = RhythmId::CprCompressions;
    set.ecg.heart_rate = 110.0;
    engine.set_parameters(set).unwrap();
    advance_seconds(&mut engine, 4.0);

    assert!(!engine.compressions.idle());
    assert!((engine.compressions.current_interval() - 60.0 / 110.0).abs() < 1e-9);

    // Compression spikes deflect well below baseline noise
    let min = engine
        .ecg_sweep()
        .samples()
        .iter()
        .filter_map(|s| *s)
        .fold(f32::MAX, f32::min);
    assert!(min < -0.8, "expected compression spikes, min {}", min);

    // Forced CPR companions: damped pressure pulses, modest ETCO2
    let current = engine.current_parameters();
    assert_eq!(current.abp.shape, PressureVariant::Damped);
    assert_eq!(current.etco2.etco2_mmhg, 13.0);
}

#[test]
fn test_deactivate_resets_everything() {
    let mut engine = running_engine();
    advance_seconds(&mut engine, 2.0);
    assert!(engine.ecg_sweep().filled() > 0);

    engine.deactivate();
    assert!(!engine.is_active());
    assert_eq!(engine.sim_time(), 0.0);
    assert_eq!(engine.ecg_sweep().filled(), 0);
    assert_eq!(engine.capno_sweep().filled(), 0);
    assert!(engine.beats.idle());
    assert!(!engine.controller.pending_etco2.is_pending());

    // A fresh activate starts clean
    engine.activate();
    advance_seconds(&mut engine, 1.0);
    assert!(engine.ecg_sweep().filled() > 0);
}

#[test]
fn test_catchup_clamp_bounds_replay() {
    let mut engine = running_engine();
    // Simulate a tab suspension: one enormous elapsed report
    engine.advance(3600.0);

    let max_steps = engine.config.max_catchup_steps as f64;
    let expected_max = max_steps * engine.config.sample_period();
    assert!(
        engine.sim_time() <= expected_max + 1e-9,
        "sim time {} ran ahead of clamp {}",
        engine.sim_time(),
        expected_max
    );
    // The backlog was discarded, not carried
    assert_eq!(engine.accumulator, 0.0);
}

#[test]
fn test_fractional_steps_carry_over() {
    let mut engine = running_engine();
    // 250 Hz -> 4 ms steps; 3 ms callbacks alternate 0 and 1 steps
    engine.advance(0.003);
    let after_first = engine.sim_time();
    engine.advance(0.003);
    let after_second = engine.sim_time();
    assert_eq!(after_first, 0.0);
    assert!((after_second - 0.004).abs() < 1e-12);
}

#[test]
fn test_command_queue_drives_engine() {
    let mut engine = engine();
    let handle = engine.command_handle();

    handle.send(EngineCommand::Activate);
    let mut set = ParameterSet::default();
    set.ecg.heart_rate = 60.0;
    handle.send(EngineCommand::SetParameters(set));
    engine.advance(FRAME);

    assert!(engine.is_active());
    assert_eq!(engine.requested_parameters().ecg.heart_rate, 60.0);

    handle.send(EngineCommand::Deactivate);
    engine.advance(FRAME);
    assert!(!engine.is_active());
}

#[test]
fn test_nibp_displays_verbatim() {
    let mut engine = running_engine();
    let reading = NibpReading {
        systolic: 143.0,
        diastolic: 91.0,
        mean: 108.0,
        timestamp_ms: 1_723_000_000_000,
    };
    let handle = engine.command_handle();
    handle.send(EngineCommand::Nibp(reading));
    engine.advance(FRAME);

    assert_eq!(engine.last_nibp(), Some(reading));
    // The waveform path is untouched by NIBP
    assert_eq!(engine.current_parameters().abp.systolic, 120.0);
}

#[test]
fn test_vitals_snapshot_tracks_current() {
    let mut engine = running_engine();
    let vitals = engine.vitals_handle();
    advance_seconds(&mut engine, 1.0);
    assert_eq!(vitals.read().heart_rate, 80.0);

    let mut set = *engine.requested_parameters();
    set.ecg.rhythm = RhythmId::Asystole;
    engine.set_parameters(set).unwrap();
    engine.advance(FRAME);
    assert_eq!(vitals.read().heart_rate, 0.0);
    assert_eq!(vitals.read().spo2, 0.0);
}

#[test]
fn test_hidden_channel_renders_null() {
    let mut engine = running_engine();
    let mut set = *engine.requested_parameters();
    set.abp.visible = false;
    engine.set_parameters(set).unwrap();
    advance_seconds(&mut engine, 1.0);

    assert_eq!(engine.pressure_sweep().filled(), 0);
    assert!(engine.ecg_sweep().filled() > 0);
}

#[test]
fn test_non_finite_request_is_sanitized() {
    let mut engine = running_engine();
    let mut set = *engine.requested_parameters();
    set.ecg.heart_rate = f32::NAN;
    set.spo2.saturation = f32::INFINITY;
    set.abp.systolic = -50.0;
    engine.set_parameters(set).unwrap();

    let requested = engine.requested_parameters();
    assert_eq!(requested.ecg.heart_rate, 80.0, "NaN falls back to previous");
    assert_eq!(requested.spo2.saturation, 98.0, "infinity falls back to previous");
    assert_eq!(requested.abp.systolic, 0.0, "negative clamps to zero");

    // Rendering continues unharmed
    advance_seconds(&mut engine, 1.0);
    assert!(engine.ecg_sweep().filled() > 0);
}

#[test]
fn test_wenckebach_runs_through_engine() {
    let mut engine = running_engine();
    let mut set = *engine.requested_parameters();
    set.ecg.rhythm = RhythmId::WenckebachBlock;
    set.ecg.heart_rate = 60.0;
    engine.set_parameters(set).unwrap();
    advance_seconds(&mut engine, 20.0);

    let GeneratorState::AvBlock(ref state) = engine.generator else {
        panic!("expected AV-block generator");
    };
    assert!(state.atrial_count >= 18);
    assert!(state.dropped_count() >= 3);
    assert!(state.conducted_count > state.dropped_count());
}
