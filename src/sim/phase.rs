//! Phase scheduler
//!
//! A single progress scalar in [0, 1] drives one transition run. The range is
//! split into contiguous phases, each with its own easing curve and camera
//! recipe. Dependents get the phase-local eased time, never raw progress.

use serde::{Deserialize, Serialize};

use super::clock::AnimationClock;
use super::easing::Easing;
use super::rig::MotionRecipe;
use crate::consts::{PHASE_BOUND_EPSILON, PROGRESS_EPSILON};
use crate::error::{ConfigError, Result};

/// One sub-interval of the progress range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    pub id: String,
    pub lower: f32,
    pub upper: f32,
    #[serde(default)]
    pub easing: Easing,
    pub recipe: MotionRecipe,
}

impl Phase {
    pub fn new(id: impl Into<String>, lower: f32, upper: f32, easing: Easing, recipe: MotionRecipe) -> Self {
        Self {
            id: id.into(),
            lower,
            upper,
            easing,
            recipe,
        }
    }

    /// Phase-local time for a global progress value, clamped to [0, 1]
    pub fn local_t(&self, progress: f32) -> f32 {
        ((progress - self.lower) / (self.upper - self.lower)).clamp(0.0, 1.0)
    }
}

/// Ordered phases that partition [0, 1] with no gaps or overlaps
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseSchedule {
    phases: Vec<Phase>,
}

impl PhaseSchedule {
    pub fn new(mut phases: Vec<Phase>) -> Result<Self> {
        let Some(first) = phases.first() else {
            return Err(ConfigError::NoPhases);
        };
        if first.lower.abs() > PHASE_BOUND_EPSILON || !first.lower.is_finite() {
            return Err(ConfigError::FirstPhaseStart(first.lower));
        }
        let last = &phases[phases.len() - 1];
        if (last.upper - 1.0).abs() > PHASE_BOUND_EPSILON || !last.upper.is_finite() {
            return Err(ConfigError::LastPhaseEnd(last.upper));
        }
        for phase in &phases {
            if !(phase.lower.is_finite() && phase.upper.is_finite()) || phase.upper <= phase.lower {
                return Err(ConfigError::DegeneratePhase {
                    id: phase.id.clone(),
                    lower: phase.lower,
                    upper: phase.upper,
                });
            }
        }
        if let Some(phase) = phases.iter().find(|p| !p.easing.is_bounded()) {
            return Err(ConfigError::UnboundedEasing {
                id: phase.id.clone(),
                easing: format!("{:?}", phase.easing),
            });
        }
        for pair in phases.windows(2) {
            if (pair[0].upper - pair[1].lower).abs() > PHASE_BOUND_EPSILON {
                return Err(ConfigError::PhaseDiscontinuity {
                    prev: pair[0].id.clone(),
                    next: pair[1].id.clone(),
                    upper: pair[0].upper,
                    lower: pair[1].lower,
                });
            }
        }

        // Snap bounds so neighbours share the exact same float
        let count = phases.len();
        phases[0].lower = 0.0;
        phases[count - 1].upper = 1.0;
        for i in 1..count {
            phases[i].lower = phases[i - 1].upper;
        }

        Ok(Self { phases })
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    /// Index of the phase containing `progress` (half-open, last phase owns 1.0)
    pub fn locate(&self, progress: f32) -> usize {
        let progress = progress.clamp(0.0, 1.0);
        self.phases
            .iter()
            .position(|p| progress >= p.lower && progress < p.upper)
            .unwrap_or(self.phases.len() - 1)
    }
}

/// Run state owned by the scheduler
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitionState {
    pub active: bool,
    pub progress: f32,
    pub current_phase: usize,
    pub completed: bool,
}

/// What one `advance` produced, handed to the camera rig and particle fades
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseSample {
    pub phase_index: usize,
    pub progress: f32,
    /// Phase-local linear time
    pub local_t: f32,
    /// `local_t` after the phase's easing
    pub eased_t: f32,
    /// Seconds since `start`
    pub elapsed: f32,
    /// Delta applied this frame
    pub delta: f32,
    pub phase_changed: bool,
    /// True only on the frame progress first reached 1.0
    pub just_completed: bool,
}

/// Drives one transition instance through its phases
pub struct PhaseScheduler {
    schedule: PhaseSchedule,
    rate: f32,
    clock: AnimationClock,
    state: TransitionState,
    on_complete: Option<Box<dyn FnMut()>>,
}

impl std::fmt::Debug for PhaseScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhaseScheduler")
            .field("schedule", &self.schedule)
            .field("rate", &self.rate)
            .field("clock", &self.clock)
            .field("state", &self.state)
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

impl PhaseScheduler {
    /// `rate` is progress per second
    pub fn new(schedule: PhaseSchedule, rate: f32) -> Result<Self> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(ConfigError::InvalidRate(rate));
        }
        Ok(Self {
            schedule,
            rate,
            clock: AnimationClock::new(),
            state: TransitionState::default(),
            on_complete: None,
        })
    }

    /// Callback fired once per `start`, on the completing frame
    pub fn set_on_complete(&mut self, callback: Box<dyn FnMut()>) {
        self.on_complete = Some(callback);
    }

    /// Begin a run. A run that is still in flight is left alone.
    pub fn start(&mut self) {
        if self.state.active && !self.state.completed {
            log::debug!("Transition already running, start ignored");
            return;
        }
        self.restart();
    }

    /// Begin a fresh run unconditionally
    pub fn restart(&mut self) {
        self.state = TransitionState {
            active: true,
            progress: 0.0,
            current_phase: 0,
            completed: false,
        };
        self.clock.start();
    }

    pub fn stop(&mut self) {
        self.state.active = false;
        self.clock.stop();
    }

    /// Advance by one frame. Returns `None` when idle or already completed.
    pub fn advance(&mut self, frame_delta: f32) -> Option<PhaseSample> {
        if !self.state.active || self.state.completed {
            return None;
        }

        let delta = self.clock.tick(frame_delta);
        let mut progress = (self.state.progress + delta * self.rate).clamp(0.0, 1.0);
        if 1.0 - progress < PROGRESS_EPSILON {
            progress = 1.0;
        }
        self.state.progress = progress;

        let index = self.schedule.locate(progress);
        let phase_changed = index != self.state.current_phase;
        if phase_changed {
            log::debug!(
                "Transition phase {} -> {} at progress {:.3}",
                self.schedule.phases[self.state.current_phase].id,
                self.schedule.phases[index].id,
                progress
            );
        }
        self.state.current_phase = index;

        let mut just_completed = false;
        if progress >= 1.0 {
            self.state.completed = true;
            self.clock.stop();
            just_completed = true;
            if let Some(callback) = self.on_complete.as_mut() {
                callback();
            }
        }

        let phase = &self.schedule.phases[index];
        let local_t = phase.local_t(progress);
        Some(PhaseSample {
            phase_index: index,
            progress,
            local_t,
            eased_t: phase.easing.apply(local_t),
            elapsed: self.clock.elapsed(),
            delta,
            phase_changed,
            just_completed,
        })
    }

    pub fn state(&self) -> &TransitionState {
        &self.state
    }

    pub fn progress(&self) -> f32 {
        self.state.progress
    }

    pub fn is_completed(&self) -> bool {
        self.state.completed
    }

    pub fn schedule(&self) -> &PhaseSchedule {
        &self.schedule
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::TransitionTuning;
    use proptest::prelude::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn schedule() -> PhaseSchedule {
        PhaseSchedule::new(TransitionTuning::default().phases).expect("default phases are valid")
    }

    fn phase(id: &str, lower: f32, upper: f32) -> Phase {
        Phase::new(id, lower, upper, Easing::Linear, MotionRecipe::default())
    }

    #[test]
    fn test_schedule_rejects_bad_bounds() {
        assert!(matches!(PhaseSchedule::new(vec![]), Err(ConfigError::NoPhases)));
        assert!(matches!(
            PhaseSchedule::new(vec![phase("a", 0.1, 1.0)]),
            Err(ConfigError::FirstPhaseStart(_))
        ));
        assert!(matches!(
            PhaseSchedule::new(vec![phase("a", 0.0, 0.9)]),
            Err(ConfigError::LastPhaseEnd(_))
        ));
        assert!(matches!(
            PhaseSchedule::new(vec![phase("a", 0.0, 0.4), phase("b", 0.5, 1.0)]),
            Err(ConfigError::PhaseDiscontinuity { .. })
        ));
        assert!(matches!(
            PhaseSchedule::new(vec![phase("a", 0.0, 0.6), phase("b", 0.5, 1.0)]),
            Err(ConfigError::PhaseDiscontinuity { .. })
        ));
        assert!(matches!(
            PhaseSchedule::new(vec![phase("a", 0.0, 0.0), phase("b", 0.0, 1.0)]),
            Err(ConfigError::DegeneratePhase { .. })
        ));
    }

    #[test]
    fn test_schedule_rejects_unbounded_easing() {
        let mut wobbly = phase("a", 0.0, 1.0);
        wobbly.easing = Easing::Wobble {
            cycles: 2.0,
            amplitude: 0.5,
        };
        assert!(matches!(
            PhaseSchedule::new(vec![wobbly]),
            Err(ConfigError::UnboundedEasing { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_rate() {
        assert!(PhaseScheduler::new(schedule(), 0.0).is_err());
        assert!(PhaseScheduler::new(schedule(), f32::NAN).is_err());
        assert!(PhaseScheduler::new(schedule(), -1.0).is_err());
    }

    #[test]
    fn test_advance_is_noop_until_started() {
        let mut scheduler = PhaseScheduler::new(schedule(), 0.5).unwrap();
        assert!(scheduler.advance(0.1).is_none());
        assert_eq!(scheduler.progress(), 0.0);
    }

    #[test]
    fn test_scenario_two_seconds_at_half_rate() {
        let fired = Rc::new(Cell::new(0));
        let mut scheduler = PhaseScheduler::new(schedule(), 0.5).unwrap();
        let counter = fired.clone();
        scheduler.set_on_complete(Box::new(move || counter.set(counter.get() + 1)));
        scheduler.start();

        let mut frames = 0;
        let mut simulated = 0.0;
        while !scheduler.is_completed() && frames < 100 {
            scheduler.advance(0.1);
            frames += 1;
            simulated += 0.1;
        }
        assert!((simulated - 2.0f32).abs() <= 0.1 + 1e-4, "took {simulated}s");
        assert_eq!(scheduler.progress(), 1.0);

        for _ in 0..50 {
            assert!(scheduler.advance(0.1).is_none());
        }
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn test_completion_fires_once_per_start() {
        let fired = Rc::new(Cell::new(0));
        let mut scheduler = PhaseScheduler::new(schedule(), 2.0).unwrap();
        let counter = fired.clone();
        scheduler.set_on_complete(Box::new(move || counter.set(counter.get() + 1)));

        for run in 1..=3 {
            scheduler.start();
            let mut completions = 0;
            for _ in 0..40 {
                if scheduler.advance(0.05).is_some_and(|s| s.just_completed) {
                    completions += 1;
                }
            }
            assert_eq!(completions, 1);
            assert_eq!(fired.get(), run);
        }
    }

    #[test]
    fn test_long_frames_advance_in_full() {
        let mut scheduler = PhaseScheduler::new(schedule(), 1.0).unwrap();
        scheduler.start();
        for _ in 0..4 {
            scheduler.advance(0.25);
        }
        assert_eq!(scheduler.progress(), 1.0);
        assert!(scheduler.is_completed());

        let mut scheduler = PhaseScheduler::new(schedule(), 0.25).unwrap();
        scheduler.start();
        let sample = scheduler.advance(1.5).unwrap();
        assert_eq!(sample.delta, 1.5);
        assert!((scheduler.progress() - 0.375).abs() < 1e-6);
    }

    #[test]
    fn test_start_while_running_is_ignored() {
        let mut scheduler = PhaseScheduler::new(schedule(), 0.5).unwrap();
        scheduler.start();
        scheduler.advance(0.1);
        let before = scheduler.progress();
        scheduler.start();
        assert_eq!(scheduler.progress(), before);

        scheduler.restart();
        assert_eq!(scheduler.progress(), 0.0);
        assert!(!scheduler.is_completed());
    }

    #[test]
    fn test_phase_changes_reported() {
        let mut scheduler = PhaseScheduler::new(schedule(), 1.0).unwrap();
        scheduler.start();
        let mut seen = vec![0];
        while let Some(sample) = scheduler.advance(1.0 / 60.0) {
            if sample.phase_changed {
                seen.push(sample.phase_index);
            }
        }
        let expected: Vec<usize> = (0..scheduler.schedule().len()).collect();
        assert_eq!(seen, expected);
    }

    proptest! {
        #[test]
        fn prop_progress_monotonic_and_bounded(
            deltas in proptest::collection::vec(0.0f32..0.2, 1..200),
            rate in 0.05f32..5.0,
        ) {
            let mut scheduler = PhaseScheduler::new(schedule(), rate).unwrap();
            scheduler.start();
            let mut last = 0.0;
            for delta in deltas {
                scheduler.advance(delta);
                let progress = scheduler.progress();
                prop_assert!(progress >= last);
                prop_assert!((0.0..=1.0).contains(&progress));
                last = progress;
            }
        }

        #[test]
        fn prop_progress_tracks_accumulated_time(
            deltas in proptest::collection::vec(0.0f32..1.0, 1..60),
            rate in 0.05f32..2.0,
        ) {
            let mut scheduler = PhaseScheduler::new(schedule(), rate).unwrap();
            scheduler.start();
            let mut total = 0.0f64;
            for delta in deltas {
                scheduler.advance(delta);
                total += delta as f64 * rate as f64;
                let expected = total.min(1.0);
                prop_assert!(
                    (scheduler.progress() as f64 - expected).abs() < 1e-4,
                    "progress {} vs expected {}", scheduler.progress(), expected
                );
            }
            if total > 1.0 + 1e-4 {
                prop_assert!(scheduler.is_completed());
            }
            if total < 1.0 - 1e-4 {
                prop_assert!(!scheduler.is_completed());
            }
        }

        #[test]
        fn prop_exactly_one_phase_selected(progress in 0.0f32..=1.0) {
            let schedule = schedule();
            let containing = schedule
                .phases()
                .iter()
                .enumerate()
                .filter(|(i, p)| {
                    progress >= p.lower && (progress < p.upper || (*i == schedule.len() - 1 && progress <= p.upper))
                })
                .count();
            prop_assert_eq!(containing, 1);

            let index = schedule.locate(progress);
            let t = schedule.phases()[index].local_t(progress);
            prop_assert!((0.0..=1.0).contains(&t));
        }
    }
}
