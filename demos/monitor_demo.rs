//! Walkthrough: drive the engine the way a host rendering loop would and
//! print the numeric vitals as the scenario unfolds.
//!
//! Run with: cargo run --example monitor_demo

use vitalsim_core::catalog::{RhythmCatalog, RhythmId};
use vitalsim_core::config::EngineConfig;
use vitalsim_core::engine::{EngineCommand, MonitorEngine};

fn drive(engine: &mut MonitorEngine, seconds: f64) {
    let frame = 1.0 / 60.0;
    let frames = (seconds / frame) as usize;
    for _ in 0..frames {
        engine.advance(frame);
    }
}

fn print_vitals(engine: &MonitorEngine, label: &str) {
    let vitals = engine.vitals_handle();
    let v = vitals.read();
    println!(
        "{label:<28} HR {:>3.0}  SpO2 {:>3.0}%  ABP {:>3.0}/{:<3.0}  ETCO2 {:>2.0}  RR {:>2.0}",
        v.heart_rate, v.spo2, v.systolic, v.diastolic, v.etco2, v.resp_rate
    );
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = MonitorEngine::new(EngineConfig::demo(), RhythmCatalog::standard())?;
    let handle = engine.command_handle();

    handle.send(EngineCommand::Activate);
    drive(&mut engine, 3.0);
    print_vitals(&engine, "normal sinus");

    // Tachycardia: the readout ramps while beat spacing changes at once
    let mut set = *engine.requested_parameters();
    set.ecg.rhythm = RhythmId::SinusTachycardia;
    set.ecg.heart_rate = 140.0;
    handle.send(EngineCommand::SetParameters(set));
    drive(&mut engine, 0.2);
    print_vitals(&engine, "tachycardia (ramping)");
    drive(&mut engine, 5.0);
    print_vitals(&engine, "tachycardia (settled)");

    // Arrest: companion channels snap to the pulseless state immediately
    let mut set = *engine.requested_parameters();
    set.ecg.rhythm = RhythmId::VentricularFibrillation;
    handle.send(EngineCommand::SetParameters(set));
    drive(&mut engine, 2.0);
    print_vitals(&engine, "ventricular fibrillation");

    // Shock back to sinus
    handle.send(EngineCommand::Shock {
        rhythm: RhythmId::NormalSinus,
    });
    drive(&mut engine, 6.0);
    print_vitals(&engine, "post-shock sinus");

    let ecg = engine.ecg_sweep();
    println!(
        "\nECG sweep: {} samples, {} filled, cursor at {}",
        ecg.len(),
        ecg.filled(),
        ecg.cursor()
    );

    Ok(())
}
