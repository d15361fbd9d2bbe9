//! VitalSim-Core: real-time physiological waveform simulation for monitor training
//!
//! This library is the simulation core of a multi-parameter patient-monitor
//! trainer. It synthesizes continuous ECG, plethysmography (SpO2), arterial
//! blood pressure, and capnography waveforms from clinician-adjustable target
//! values and exposes them as scrolling sweep buffers plus derived numeric
//! vitals. It features:
//!
//! - A fixed-step simulation clock driven by the host rendering loop
//! - Independent beat / breath / chest-compression schedulers
//! - Rhythm generator state machines, including AV-block conduction logic
//! - Pure waveform shape functions shared across rhythm families
//! - A three-snapshot parameter controller (smooth numeric ramps, atomic
//!   categorical switches at cycle boundaries)
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use vitalsim_core::config::EngineConfig;
//! use vitalsim_core::catalog::RhythmCatalog;
//! use vitalsim_core::engine::MonitorEngine;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EngineConfig::default();
//!     let mut engine = MonitorEngine::new(config, RhythmCatalog::standard())?;
//!     engine.activate();
//!
//!     // Host rendering loop: report elapsed wall-clock time each frame.
//!     for _ in 0..60 {
//!         engine.advance(1.0 / 60.0);
//!     }
//!
//!     let vitals = engine.vitals_handle();
//!     println!("HR: {:.0}", vitals.read().heart_rate);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod params;
pub mod rhythm;
pub mod shapes;
pub mod utils;

// Re-export commonly used types for convenience
pub use catalog::{RhythmCatalog, RhythmDefinition, RhythmId};
pub use config::EngineConfig;
pub use engine::{CommandHandle, EngineCommand, MonitorEngine, SweepBuffer};
pub use error::{EngineError, SimResult};
pub use params::{ParameterSet, VitalsSnapshot};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn version_info() -> VersionInfo {
    VersionInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: "Real-time physiological waveform simulation core".to_string(),
        features: vec![
            "Fixed-step simulation clock".to_string(),
            "Beat/breath/compression scheduling".to_string(),
            "Rhythm generator state machines".to_string(),
            "Pure waveform shape library".to_string(),
            "Three-snapshot parameter controller".to_string(),
        ],
    }
}

/// Library version information
#[derive(Debug, Clone)]
pub struct VersionInfo {
    /// Library name
    pub name: String,
    /// Version string
    pub version: String,
    /// Description
    pub description: String,
    /// List of features
    pub features: Vec<String>,
}
