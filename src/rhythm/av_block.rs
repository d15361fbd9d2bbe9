// src/rhythm/av_block.rs
//! Atrioventricular block conduction state machine
//!
//! The generator runs two coupled schedules on absolute simulation time: an
//! atrial schedule at the target atrial rate, and a ventricular schedule fed
//! by conduction decisions (or by an independent escape pacemaker). Each
//! atrial event either conducts after a block-type-specific delay or is
//! dropped; every fired ventricular event is tagged conducted or escape so the
//! rendering path widens escape complexes and keeps the correct PR bookkeeping
//! for the currently active QRS-T.

use crate::catalog::{BlockSpec, RhythmDefinition, WaveFactors};
use crate::engine::scheduler::interval_from_rate;
use crate::shapes::cardiac::{complex_duration, p_wave, qrs_t, ESCAPE_WIDTH_FACTOR};
use crate::utils::numeric::{finite_or, jitter_factor};
use rand::rngs::SmallRng;
use rand::Rng;

/// Uniform jitter spread on escape-beat scheduling
const ESCAPE_JITTER: f64 = 0.08;
/// Initial scatter of the first escape beat after a reset, seconds
const INITIAL_ESCAPE_SCATTER: f64 = 0.25;
/// Escape complexes render at reduced amplitude as well as increased width
const ESCAPE_AMPLITUDE_FACTOR: f32 = 0.85;

/// Fallback conduction behavior when an AV-block rhythm definition carries no
/// block spec; complete dissociation is the safe degenerate reading.
const FALLBACK_BLOCK: BlockSpec = BlockSpec::Complete { escape_rate: 40.0 };

/// A ventricular event that has been decided but not yet fired
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledVentricular {
    /// Absolute firing time
    pub at: f64,
    /// Conduction delay that produced it
    pub pr: f64,
}

/// Mutable state owned by the AV-block generator.
///
/// Created empty, initialized on first invocation, discarded wholesale on any
/// rhythm change, manual reset, or shock.
#[derive(Debug, Clone)]
pub struct AvBlockState {
    /// Time of the most recent atrial event
    pub last_atrial: f64,
    /// Time of the next scheduled atrial event
    pub next_atrial: f64,
    /// Time of the most recent ventricular event
    pub last_ventricular: f64,
    /// Conducted ventricular event awaiting its firing time
    pub scheduled: Option<ScheduledVentricular>,
    /// Beat position within the current Wenckebach cycle
    pub beats_in_cycle: u32,
    /// Accumulated Wenckebach conduction delay beyond the base PR
    pub conduction_delay: f64,
    /// Conducted P-wave count
    pub conducted_count: u32,
    /// Total P-wave count
    pub atrial_count: u32,
    /// Next permissible escape-beat time
    pub next_escape: f64,
    /// Whether the most recent ventricular event was an escape beat
    pub last_was_escape: bool,
    /// PR interval carried by the currently rendering complex (0 for escape)
    pub render_pr: f64,
    initialized: bool,
}

impl Default for AvBlockState {
    fn default() -> Self {
        Self {
            last_atrial: f64::NEG_INFINITY,
            next_atrial: f64::INFINITY,
            last_ventricular: f64::NEG_INFINITY,
            scheduled: None,
            beats_in_cycle: 0,
            conduction_delay: 0.0,
            conducted_count: 0,
            atrial_count: 0,
            next_escape: f64::INFINITY,
            last_was_escape: false,
            render_pr: 0.0,
            initialized: false,
        }
    }
}

impl AvBlockState {
    /// P waves that failed to conduct.
    pub fn dropped_count(&self) -> u32 {
        self.atrial_count.saturating_sub(self.conducted_count)
    }

    fn initialize(&mut self, now: f64, spec: &BlockSpec, rng: &mut SmallRng) {
        self.next_atrial = now;
        match spec {
            BlockSpec::Complete { .. } => {
                self.next_escape = now + rng.gen_range(0.0..INITIAL_ESCAPE_SCATTER);
            }
            BlockSpec::Intermittent { escape_rate, .. } if *escape_rate > 0.0 => {
                self.next_escape =
                    now + interval_from_rate(*escape_rate) * jitter_factor(rng, ESCAPE_JITTER);
            }
            _ => {}
        }
        self.initialized = true;
    }

    fn fire_ventricular(&mut self, at: f64, pr: Option<f64>) {
        self.last_ventricular = at;
        self.last_was_escape = pr.is_none();
        self.render_pr = pr.unwrap_or(0.0);
    }
}

fn escape_wave(wave: &WaveFactors) -> WaveFactors {
    WaveFactors {
        qrs_width: wave.qrs_width * ESCAPE_WIDTH_FACTOR,
        qrs_amplitude: wave.qrs_amplitude * ESCAPE_AMPLITUDE_FACTOR,
        ..*wave
    }
}

fn handle_atrial_event(state: &mut AvBlockState, spec: &BlockSpec, rng: &mut SmallRng) {
    state.atrial_count += 1;
    match spec {
        BlockSpec::Wenckebach {
            cycle_length,
            base_pr,
            pr_increment,
        } => {
            state.beats_in_cycle += 1;
            if *cycle_length > 0 && state.beats_in_cycle >= *cycle_length {
                // Dropped beat ends the cycle; delay starts over
                state.beats_in_cycle = 0;
                state.conduction_delay = 0.0;
            } else {
                let pr = base_pr + state.conduction_delay;
                state.scheduled = Some(ScheduledVentricular {
                    at: state.last_atrial + pr,
                    pr,
                });
                state.conducted_count += 1;
                state.conduction_delay += pr_increment.max(0.0);
            }
        }
        BlockSpec::Intermittent {
            conduction_probability,
            pr,
            ..
        } => {
            if rng.gen::<f64>() < *conduction_probability {
                state.scheduled = Some(ScheduledVentricular {
                    at: state.last_atrial + pr,
                    pr: *pr,
                });
                state.conducted_count += 1;
            }
        }
        BlockSpec::Complete { .. } => {}
    }
}

fn run_schedules(
    state: &mut AvBlockState,
    now: f64,
    atrial_rate: f32,
    spec: &BlockSpec,
    rng: &mut SmallRng,
) {
    let atrial_interval = interval_from_rate(atrial_rate);

    // Restart an idled atrial schedule once the rate becomes positive again
    if !state.next_atrial.is_finite() && atrial_interval.is_finite() {
        state.next_atrial = now;
    }

    if state.next_atrial.is_finite() && now >= state.next_atrial {
        state.last_atrial = state.next_atrial;
        state.next_atrial = state.last_atrial + atrial_interval;
        handle_atrial_event(state, spec, rng);
    }

    // Conducted ventricular events fire after their delay
    if let Some(scheduled) = state.scheduled {
        if now >= scheduled.at {
            state.fire_ventricular(scheduled.at, Some(scheduled.pr));
            state.scheduled = None;
            // A conducted beat resets the escape pacemaker
            if let BlockSpec::Intermittent { escape_rate, .. } = spec {
                if *escape_rate > 0.0 {
                    state.next_escape = scheduled.at
                        + interval_from_rate(*escape_rate) * jitter_factor(rng, ESCAPE_JITTER);
                }
            }
        }
    }

    // Escape pacemaker
    match spec {
        BlockSpec::Complete { escape_rate } => {
            if state.next_escape.is_finite() && now >= state.next_escape {
                let at = state.next_escape;
                state.fire_ventricular(at, None);
                state.next_escape =
                    at + interval_from_rate(*escape_rate) * jitter_factor(rng, ESCAPE_JITTER);
            }
        }
        BlockSpec::Intermittent { escape_rate, .. } if *escape_rate > 0.0 => {
            if state.scheduled.is_none() && state.next_escape.is_finite() && now >= state.next_escape
            {
                state.fire_ventricular(now, None);
                state.next_escape =
                    now + interval_from_rate(*escape_rate) * jitter_factor(rng, ESCAPE_JITTER);
            }
        }
        _ => {}
    }
}

/// One ECG sample at absolute simulation time `now`.
pub fn generate(
    state: &mut AvBlockState,
    now: f64,
    atrial_rate: f32,
    def: &RhythmDefinition,
    rng: &mut SmallRng,
) -> f32 {
    let spec = def.block.unwrap_or(FALLBACK_BLOCK);
    if !state.initialized {
        state.initialize(now, &spec, rng);
    }

    run_schedules(state, now, atrial_rate, &spec, rng);

    let wave = &def.wave;
    let mut out = p_wave(now - state.last_atrial, wave);

    let v_rel = now - state.last_ventricular;
    if v_rel >= 0.0 && v_rel.is_finite() {
        if state.last_was_escape {
            let widened = escape_wave(wave);
            if v_rel <= complex_duration(&widened) {
                out += qrs_t(v_rel, &widened, 0.0);
            }
        } else if v_rel <= complex_duration(wave) {
            out += qrs_t(v_rel, wave, 0.0);
        }
    }

    finite_or(out, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{RhythmCatalog, RhythmId};
    use rand::SeedableRng;

    const STEP: f64 = 1.0 / 250.0;

    fn run_for(
        id: RhythmId,
        atrial_rate: f32,
        seconds: f64,
        seed: u64,
    ) -> (AvBlockState, Vec<f32>) {
        let catalog = RhythmCatalog::standard();
        let def = catalog.get(id).unwrap().clone();
        let mut state = AvBlockState::default();
        let mut rng = SmallRng::seed_from_u64(seed);
        let steps = (seconds / STEP) as usize;
        let mut samples = Vec::with_capacity(steps);
        for i in 0..steps {
            samples.push(generate(&mut state, i as f64 * STEP, atrial_rate, &def, &mut rng));
        }
        (state, samples)
    }

    #[test]
    fn test_wenckebach_drops_one_in_four() {
        let (state, _) = run_for(RhythmId::WenckebachBlock, 60.0, 40.0, 11);
        // 40 s at 60/min -> 40 atrial events, 10 full cycles of 4
        assert!(state.atrial_count >= 36, "got {} atrial", state.atrial_count);
        let complete_cycles = state.atrial_count / 4;
        let dropped = state.dropped_count();
        assert!(
            dropped == complete_cycles || dropped == complete_cycles + 1,
            "expected ~{} drops, got {} over {} P waves",
            complete_cycles,
            dropped,
            state.atrial_count
        );
    }

    #[test]
    fn test_wenckebach_delay_grows_then_resets() {
        let catalog = RhythmCatalog::standard();
        let def = catalog.get(RhythmId::WenckebachBlock).unwrap().clone();
        let (cycle_length, base_pr, pr_increment) = match def.block.unwrap() {
            BlockSpec::Wenckebach {
                cycle_length,
                base_pr,
                pr_increment,
            } => (cycle_length, base_pr, pr_increment),
            other => panic!("unexpected spec {:?}", other),
        };
        assert_eq!(cycle_length, 4);

        let mut state = AvBlockState::default();
        let mut rng = SmallRng::seed_from_u64(5);
        let mut observed_prs = Vec::new();
        let mut last_conducted = 0;
        for i in 0..(12.0 / STEP) as usize {
            generate(&mut state, i as f64 * STEP, 60.0, &def, &mut rng);
            if state.conducted_count > last_conducted {
                last_conducted = state.conducted_count;
                observed_prs.push(state.scheduled.map(|s| s.pr));
            }
        }
        let prs: Vec<f64> = observed_prs.into_iter().flatten().collect();
        assert!(prs.len() >= 6, "need two cycles, got {:?}", prs);
        // Within a cycle: base, base+inc, base+2*inc; then reset
        assert!((prs[0] - base_pr).abs() < 1e-9);
        assert!((prs[1] - (base_pr + pr_increment)).abs() < 1e-9);
        assert!((prs[2] - (base_pr + 2.0 * pr_increment)).abs() < 1e-9);
        assert!((prs[3] - base_pr).abs() < 1e-9, "delay must reset after drop");
        assert!(prs[1] > prs[0] && prs[2] > prs[1]);
    }

    #[test]
    fn test_complete_block_ventricular_rate_is_escape_rate() {
        let catalog = RhythmCatalog::standard();
        let def = catalog.get(RhythmId::CompleteBlock).unwrap().clone();
        let escape_rate = match def.block.unwrap() {
            BlockSpec::Complete { escape_rate } => escape_rate,
            other => panic!("unexpected spec {:?}", other),
        };

        let mut state = AvBlockState::default();
        let mut rng = SmallRng::seed_from_u64(9);
        let mut vent_times = Vec::new();
        let mut last_vent = f64::NEG_INFINITY;
        for i in 0..(60.0 / STEP) as usize {
            generate(&mut state, i as f64 * STEP, 75.0, &def, &mut rng);
            if state.last_ventricular != last_vent {
                last_vent = state.last_ventricular;
                vent_times.push(last_vent);
            }
        }
        // Escape beats never conduct
        assert_eq!(state.conducted_count, 0);
        assert!(state.atrial_count > 60);
        let expected = 60.0 / escape_rate as f64;
        let intervals: Vec<f64> = vent_times.windows(2).map(|w| w[1] - w[0]).collect();
        assert!(!intervals.is_empty());
        for interval in &intervals {
            assert!(
                (interval / expected - 1.0).abs() <= ESCAPE_JITTER + 0.02,
                "escape interval {} strays from {}",
                interval,
                expected
            );
        }
    }

    #[test]
    fn test_complete_block_escape_beats_are_wide() {
        let (state, _) = run_for(RhythmId::CompleteBlock, 75.0, 10.0, 3);
        assert!(state.last_was_escape);
        assert_eq!(state.render_pr, 0.0);
    }

    #[test]
    fn test_mobitz_two_conducts_probabilistically() {
        let (state, _) = run_for(RhythmId::MobitzTwoBlock, 70.0, 60.0, 21);
        // conduction_probability 0.65 over ~70 P waves
        assert!(state.atrial_count >= 60);
        let ratio = state.conducted_count as f64 / state.atrial_count as f64;
        assert!(
            ratio > 0.45 && ratio < 0.85,
            "conduction ratio {} implausible for p=0.65",
            ratio
        );
        // The escape mechanism keeps ventricular pauses bounded
        assert!(state.last_ventricular.is_finite());
    }

    #[test]
    fn test_conducted_beats_carry_pr() {
        let catalog = RhythmCatalog::standard();
        let def = catalog.get(RhythmId::WenckebachBlock).unwrap().clone();
        let mut state = AvBlockState::default();
        let mut rng = SmallRng::seed_from_u64(2);
        for i in 0..(3.0 / STEP) as usize {
            generate(&mut state, i as f64 * STEP, 60.0, &def, &mut rng);
        }
        assert!(!state.last_was_escape);
        assert!(state.render_pr > 0.0);
    }

    #[test]
    fn test_zero_atrial_rate_stops_p_waves() {
        let catalog = RhythmCatalog::standard();
        let def = catalog.get(RhythmId::CompleteBlock).unwrap().clone();
        let mut state = AvBlockState::default();
        let mut rng = SmallRng::seed_from_u64(4);
        // Prime with a positive rate, then drop to zero. An event already
        // scheduled under the old rate may still fire once at the boundary.
        for i in 0..(5.0 / STEP) as usize {
            generate(&mut state, i as f64 * STEP, 75.0, &def, &mut rng);
        }
        for i in (5.0 / STEP) as usize..(6.0 / STEP) as usize {
            generate(&mut state, i as f64 * STEP, 0.0, &def, &mut rng);
        }
        let p_count = state.atrial_count;
        for i in (6.0 / STEP) as usize..(15.0 / STEP) as usize {
            generate(&mut state, i as f64 * STEP, 0.0, &def, &mut rng);
        }
        assert_eq!(state.atrial_count, p_count, "no further P waves at rate 0");
        // The escape pacemaker keeps running regardless
        assert!(state.last_ventricular > 5.0);
    }
}
