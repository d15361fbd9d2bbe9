// src/catalog/mod.rs
//! Static rhythm catalog
//!
//! Maps each [`RhythmId`] to an immutable [`RhythmDefinition`]: the generator
//! family, per-wave morphology factors, conduction/pacing specifics, clinical
//! flags, and the companion values the rhythm pins other channels to. The
//! engine treats the catalog as read-only configuration and never mutates it.

use crate::params::{CapnoVariant, PlethVariant, PressureVariant};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Rhythm identifiers known to the standard catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RhythmId {
    /// Normal sinus rhythm
    NormalSinus,
    /// Sinus bradycardia
    SinusBradycardia,
    /// Sinus tachycardia
    SinusTachycardia,
    /// Atrial fibrillation: no P waves, irregularly irregular
    AtrialFibrillation,
    /// Monomorphic ventricular tachycardia
    VentricularTachycardia,
    /// Coarse ventricular fibrillation
    VentricularFibrillation,
    /// Asystole
    Asystole,
    /// Ventricular paced rhythm
    Paced,
    /// First-degree AV block: fixed prolonged PR
    FirstDegreeBlock,
    /// Second-degree AV block, Mobitz type I (Wenckebach)
    WenckebachBlock,
    /// Second-degree AV block, Mobitz type II
    MobitzTwoBlock,
    /// Third-degree (complete) AV block
    CompleteBlock,
    /// Chest-compression artifact during CPR
    CprCompressions,
}

impl RhythmId {
    /// Human-readable display label.
    pub fn label(&self) -> &'static str {
        match self {
            RhythmId::NormalSinus => "Normal sinus rhythm",
            RhythmId::SinusBradycardia => "Sinus bradycardia",
            RhythmId::SinusTachycardia => "Sinus tachycardia",
            RhythmId::AtrialFibrillation => "Atrial fibrillation",
            RhythmId::VentricularTachycardia => "Ventricular tachycardia",
            RhythmId::VentricularFibrillation => "Ventricular fibrillation",
            RhythmId::Asystole => "Asystole",
            RhythmId::Paced => "Paced rhythm",
            RhythmId::FirstDegreeBlock => "First-degree AV block",
            RhythmId::WenckebachBlock => "Second-degree AV block (Wenckebach)",
            RhythmId::MobitzTwoBlock => "Second-degree AV block (Mobitz II)",
            RhythmId::CompleteBlock => "Third-degree AV block",
            RhythmId::CprCompressions => "CPR compressions",
        }
    }
}

impl std::fmt::Display for RhythmId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Generator family behind a rhythm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratorFamily {
    /// Native PQRST complexes at the scheduled beat rate
    Sinus,
    /// Pacing spike followed by a captured complex
    Paced,
    /// Atrioventricular conduction state machine
    AvBlock,
    /// Random-walk fibrillation waveform
    Chaotic,
    /// Baseline noise only
    Flatline,
    /// Chest-compression artifact
    Compression,
}

/// Per-wave morphology factors for the cardiac complex
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct WaveFactors {
    /// P-wave amplitude in mV (0 disables the P wave)
    pub p_amplitude: f32,
    /// P-wave duration in seconds
    pub p_duration: f64,
    /// P onset to QRS onset, in seconds
    pub pr_interval: f64,
    /// Overall QRS amplitude in mV
    pub qrs_amplitude: f32,
    /// QRS width in seconds
    pub qrs_width: f64,
    /// Q-wave amplitude factor (negative)
    pub q_factor: f32,
    /// R-wave amplitude factor (positive dominant)
    pub r_factor: f32,
    /// S-wave amplitude factor (negative)
    pub s_factor: f32,
    /// T-wave amplitude in mV; sign selects upright or inverted
    pub t_amplitude: f32,
    /// T-wave duration in seconds
    pub t_duration: f64,
    /// ST-segment offset in mV: positive elevation decays toward the T wave,
    /// negative depression holds flat
    pub st_offset: f32,
}

impl Default for WaveFactors {
    fn default() -> Self {
        Self {
            p_amplitude: 0.15,
            p_duration: 0.09,
            pr_interval: 0.16,
            qrs_amplitude: 1.1,
            qrs_width: 0.09,
            q_factor: -0.18,
            r_factor: 1.0,
            s_factor: -0.28,
            t_amplitude: 0.3,
            t_duration: 0.18,
            st_offset: 0.0,
        }
    }
}

/// Conduction behavior for AV-block rhythms
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum BlockSpec {
    /// Progressive-delay block: conduct every beat except the last of each
    /// cycle, lengthening PR by `pr_increment` per conducted beat
    Wenckebach {
        /// Atrial events per cycle; the final one is dropped
        cycle_length: u32,
        /// PR interval of the first conducted beat in a cycle, seconds
        base_pr: f64,
        /// PR lengthening per conducted beat, seconds
        pr_increment: f64,
    },
    /// Fixed-delay probabilistic block (Mobitz II)
    Intermittent {
        /// Probability that an atrial event conducts
        conduction_probability: f64,
        /// Fixed PR interval for conducted beats, seconds
        pr: f64,
        /// Ventricular escape rate in beats/min; 0 disables the escape
        escape_rate: f32,
    },
    /// Complete dissociation: independent idioventricular escape rhythm
    Complete {
        /// Ventricular escape rate in beats/min
        escape_rate: f32,
    },
}

/// Pacing spike geometry for paced rhythms
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct PacingSpec {
    /// Spike amplitude in mV
    pub spike_amplitude: f32,
    /// Spike width in seconds
    pub spike_width: f64,
    /// Delay from spike onset to the captured QRS onset, seconds
    pub capture_delay: f64,
}

/// Clinical classification flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct RhythmFlags {
    /// Produces no effective cardiac output
    pub is_pulseless: bool,
    /// Uses the chaotic random-walk generator
    pub is_chaotic: bool,
    /// Renders baseline only
    pub is_flat: bool,
    /// Compression artifact, not an intrinsic rhythm
    pub is_artifact: bool,
}

/// Companion-channel values a rhythm pins while active.
///
/// `None` leaves the channel under operator control. Present values are
/// snapped immediately on rhythm entry and clamped every tick, suspending
/// interpolation, so the operator sees an unambiguous state change.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
pub struct CompanionDefaults {
    /// Forced saturation percentage
    pub saturation: Option<f32>,
    /// Forced pleth variant
    pub pleth_shape: Option<PlethVariant>,
    /// Forced systolic/diastolic pressure
    pub pressure: Option<(f32, f32)>,
    /// Forced pressure variant
    pub pressure_shape: Option<PressureVariant>,
    /// Forced end-tidal CO2
    pub etco2: Option<f32>,
    /// Forced respiratory rate
    pub resp_rate: Option<f32>,
    /// Forced capnogram variant
    pub capno_shape: Option<CapnoVariant>,
}

impl CompanionDefaults {
    fn pulseless() -> Self {
        Self {
            saturation: Some(0.0),
            pleth_shape: Some(PlethVariant::NoSignal),
            pressure: Some((0.0, 0.0)),
            pressure_shape: Some(PressureVariant::Flat),
            etco2: Some(0.0),
            resp_rate: Some(0.0),
            capno_shape: Some(CapnoVariant::Disconnect),
        }
    }

    fn cpr() -> Self {
        Self {
            saturation: Some(0.0),
            pleth_shape: Some(PlethVariant::NoSignal),
            pressure: Some((45.0, 12.0)),
            pressure_shape: Some(PressureVariant::Damped),
            // Exhaled CO2 under compressions tracks CPR quality; a modest
            // fixed value reads as "compressions are perfusing"
            etco2: Some(13.0),
            resp_rate: Some(10.0),
            capno_shape: Some(CapnoVariant::Normal),
        }
    }
}

/// Immutable definition of one rhythm
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RhythmDefinition {
    /// Catalog key
    pub id: RhythmId,
    /// Generator family handling this rhythm
    pub family: GeneratorFamily,
    /// Baseline heart rate (compressions/min for the CPR artifact)
    pub default_heart_rate: f32,
    /// Cardiac complex morphology
    pub wave: WaveFactors,
    /// Bounded uniform jitter on the beat interval; 0 renders regular
    pub irregularity: f64,
    /// Conduction behavior, AV-block family only
    pub block: Option<BlockSpec>,
    /// Pacing spike geometry, paced family only
    pub pacing: Option<PacingSpec>,
    /// Clinical flags
    pub flags: RhythmFlags,
    /// Channels this rhythm pins to fixed values
    pub companions: CompanionDefaults,
}

impl RhythmDefinition {
    /// Whether this rhythm pins companion channels (pulseless and artifact
    /// rhythms do; perfusing rhythms leave them under operator control).
    pub fn forces_companions(&self) -> bool {
        self.flags.is_pulseless || self.flags.is_artifact
    }
}

/// The catalog: a read-only `RhythmId` → `RhythmDefinition` table
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RhythmCatalog {
    definitions: HashMap<RhythmId, RhythmDefinition>,
}

impl RhythmCatalog {
    /// Standard training catalog with all thirteen rhythms.
    pub fn standard() -> Self {
        let mut definitions = HashMap::new();
        for def in [
            Self::normal_sinus(),
            Self::sinus_bradycardia(),
            Self::sinus_tachycardia(),
            Self::atrial_fibrillation(),
            Self::ventricular_tachycardia(),
            Self::ventricular_fibrillation(),
            Self::asystole(),
            Self::paced(),
            Self::first_degree_block(),
            Self::wenckebach_block(),
            Self::mobitz_two_block(),
            Self::complete_block(),
            Self::cpr_compressions(),
        ] {
            definitions.insert(def.id, def);
        }
        Self { definitions }
    }

    /// Look up a definition.
    pub fn get(&self, id: RhythmId) -> Option<&RhythmDefinition> {
        self.definitions.get(&id)
    }

    /// Whether the catalog knows this identifier.
    pub fn contains(&self, id: RhythmId) -> bool {
        self.definitions.contains_key(&id)
    }

    /// All identifiers present in the catalog.
    pub fn ids(&self) -> Vec<RhythmId> {
        self.definitions.keys().copied().collect()
    }

    /// Number of definitions.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Serialize the catalog to JSON, for host-side editing or transfer.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Build a catalog from JSON produced by [`Self::to_json`].
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    fn normal_sinus() -> RhythmDefinition {
        RhythmDefinition {
            id: RhythmId::NormalSinus,
            family: GeneratorFamily::Sinus,
            default_heart_rate: 80.0,
            wave: WaveFactors::default(),
            irregularity: 0.0,
            block: None,
            pacing: None,
            flags: RhythmFlags::default(),
            companions: CompanionDefaults::default(),
        }
    }

    fn sinus_bradycardia() -> RhythmDefinition {
        RhythmDefinition {
            id: RhythmId::SinusBradycardia,
            default_heart_rate: 45.0,
            wave: WaveFactors {
                t_duration: 0.22,
                ..WaveFactors::default()
            },
            ..Self::normal_sinus()
        }
    }

    fn sinus_tachycardia() -> RhythmDefinition {
        RhythmDefinition {
            id: RhythmId::SinusTachycardia,
            default_heart_rate: 130.0,
            wave: WaveFactors {
                p_duration: 0.07,
                pr_interval: 0.13,
                t_duration: 0.14,
                ..WaveFactors::default()
            },
            ..Self::normal_sinus()
        }
    }

    fn atrial_fibrillation() -> RhythmDefinition {
        RhythmDefinition {
            id: RhythmId::AtrialFibrillation,
            default_heart_rate: 110.0,
            wave: WaveFactors {
                p_amplitude: 0.0,
                ..WaveFactors::default()
            },
            irregularity: 0.18,
            ..Self::normal_sinus()
        }
    }

    fn ventricular_tachycardia() -> RhythmDefinition {
        RhythmDefinition {
            id: RhythmId::VentricularTachycardia,
            default_heart_rate: 180.0,
            wave: WaveFactors {
                p_amplitude: 0.0,
                qrs_amplitude: 1.5,
                qrs_width: 0.16,
                q_factor: -0.05,
                r_factor: 1.0,
                s_factor: -0.6,
                t_amplitude: -0.4,
                t_duration: 0.12,
                ..WaveFactors::default()
            },
            ..Self::normal_sinus()
        }
    }

    fn ventricular_fibrillation() -> RhythmDefinition {
        RhythmDefinition {
            id: RhythmId::VentricularFibrillation,
            family: GeneratorFamily::Chaotic,
            default_heart_rate: 0.0,
            wave: WaveFactors {
                p_amplitude: 0.0,
                qrs_amplitude: 0.9,
                t_amplitude: 0.0,
                ..WaveFactors::default()
            },
            irregularity: 0.0,
            block: None,
            pacing: None,
            flags: RhythmFlags {
                is_pulseless: true,
                is_chaotic: true,
                ..RhythmFlags::default()
            },
            companions: CompanionDefaults::pulseless(),
        }
    }

    fn asystole() -> RhythmDefinition {
        RhythmDefinition {
            id: RhythmId::Asystole,
            family: GeneratorFamily::Flatline,
            default_heart_rate: 0.0,
            wave: WaveFactors {
                p_amplitude: 0.0,
                qrs_amplitude: 0.0,
                t_amplitude: 0.0,
                ..WaveFactors::default()
            },
            irregularity: 0.0,
            block: None,
            pacing: None,
            flags: RhythmFlags {
                is_pulseless: true,
                is_flat: true,
                ..RhythmFlags::default()
            },
            companions: CompanionDefaults::pulseless(),
        }
    }

    fn paced() -> RhythmDefinition {
        RhythmDefinition {
            id: RhythmId::Paced,
            family: GeneratorFamily::Paced,
            default_heart_rate: 70.0,
            wave: WaveFactors {
                p_amplitude: 0.0,
                qrs_amplitude: 1.2,
                qrs_width: 0.14,
                t_amplitude: -0.25,
                ..WaveFactors::default()
            },
            irregularity: 0.0,
            block: None,
            pacing: Some(PacingSpec {
                spike_amplitude: 1.8,
                spike_width: 0.02,
                capture_delay: 0.04,
            }),
            flags: RhythmFlags::default(),
            companions: CompanionDefaults::default(),
        }
    }

    fn first_degree_block() -> RhythmDefinition {
        RhythmDefinition {
            id: RhythmId::FirstDegreeBlock,
            default_heart_rate: 70.0,
            wave: WaveFactors {
                pr_interval: 0.28,
                ..WaveFactors::default()
            },
            ..Self::normal_sinus()
        }
    }

    fn wenckebach_block() -> RhythmDefinition {
        RhythmDefinition {
            id: RhythmId::WenckebachBlock,
            family: GeneratorFamily::AvBlock,
            default_heart_rate: 60.0,
            wave: WaveFactors::default(),
            irregularity: 0.0,
            block: Some(BlockSpec::Wenckebach {
                cycle_length: 4,
                base_pr: 0.16,
                pr_increment: 0.08,
            }),
            pacing: None,
            flags: RhythmFlags::default(),
            companions: CompanionDefaults::default(),
        }
    }

    fn mobitz_two_block() -> RhythmDefinition {
        RhythmDefinition {
            id: RhythmId::MobitzTwoBlock,
            block: Some(BlockSpec::Intermittent {
                conduction_probability: 0.65,
                pr: 0.16,
                escape_rate: 30.0,
            }),
            default_heart_rate: 70.0,
            ..Self::wenckebach_block()
        }
    }

    fn complete_block() -> RhythmDefinition {
        RhythmDefinition {
            id: RhythmId::CompleteBlock,
            block: Some(BlockSpec::Complete { escape_rate: 35.0 }),
            default_heart_rate: 75.0,
            ..Self::wenckebach_block()
        }
    }

    fn cpr_compressions() -> RhythmDefinition {
        RhythmDefinition {
            id: RhythmId::CprCompressions,
            family: GeneratorFamily::Compression,
            default_heart_rate: 110.0,
            wave: WaveFactors {
                p_amplitude: 0.0,
                qrs_amplitude: 0.0,
                t_amplitude: 0.0,
                ..WaveFactors::default()
            },
            irregularity: 0.0,
            block: None,
            pacing: None,
            flags: RhythmFlags {
                is_artifact: true,
                is_pulseless: true,
                ..RhythmFlags::default()
            },
            companions: CompanionDefaults::cpr(),
        }
    }
}

impl Default for RhythmCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
