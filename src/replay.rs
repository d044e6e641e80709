//! Plays back random pick and place cycles from the library

use std::sync::Arc;
use std::thread;
use std::time::Duration;
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use tracing::info;
use crate::error::LibraryError;
use crate::plan_store::PlanStore;
use crate::telemetry::TelemetrySink;
use crate::trajectory::MotionPlan;
use crate::utils::joint_distance;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReplaySummary {
    pub cycles: usize,
    /// Sum of the durations of all played plans, seconds.
    pub total_duration: f64,
    /// Largest joint space distance between the end of a plan and the start of the next.
    pub max_discontinuity: f64,
}

/// Chains plans from the store: from the current place target a random pick target
/// with a plan is drawn, then a random place target reachable from that pick target.
pub struct Replayer<'a> {
    store: &'a PlanStore,
    sink: Arc<dyn TelemetrySink>,
    rng: StdRng,
    pick_count: u32,
    place_count: u32,
    /// Draws per leg before the replay gives up.
    pub max_tries: usize,
    /// Sleep for the duration of the played plans.
    pub pacing: bool,
    place: Option<u32>,
    previous_end: Option<Vec<f64>>,
}

impl<'a> Replayer<'a> {
    pub fn new(store: &'a PlanStore, sink: Arc<dyn TelemetrySink>) -> Self {
        Replayer {
            store,
            sink,
            rng: StdRng::seed_from_u64(0),
            pick_count: store.pick_target_count(),
            place_count: store.place_target_count(),
            max_tries: 10_000,
            pacing: true,
            place: None,
            previous_end: None,
        }
    }

    pub fn with_seed(self, seed: u64) -> Self {
        Replayer {
            rng: StdRng::seed_from_u64(seed),
            ..self
        }
    }

    /// Place target the robot stands at, once the replay has started.
    pub fn place(&self) -> Option<u32> {
        self.place
    }

    /// Draws and plays the next pick and place plan.
    pub fn next_cycle(&mut self) -> Result<(&'a MotionPlan, &'a MotionPlan), LibraryError> {
        if self.pick_count == 0 || self.place_count == 0 {
            return Err(LibraryError::NoContinuation {
                leg: "pick",
                from: 0,
                tries: 0,
            });
        }
        let store = self.store;
        let place = match self.place {
            Some(place) => place,
            None => self.rng.gen_range(0..self.place_count),
        };

        let (pick, pick_plan, tries) = self.draw(self.pick_count, |m| store.pick_plan(place, m))
            .ok_or(LibraryError::NoContinuation {
                leg: "pick",
                from: place,
                tries: self.max_tries,
            })?;
        info!("Found pick trajectory from place {} to pick {} after {} tries", place, pick, tries);
        self.report_start(pick_plan);
        self.previous_end = Some(pick_plan.end_state.position.clone());

        let (next_place, place_plan, tries) = self.draw(self.place_count, |n| store.place_plan(pick, n))
            .ok_or(LibraryError::NoContinuation {
                leg: "place",
                from: pick,
                tries: self.max_tries,
            })?;
        info!("Found place trajectory from pick {} to place {} after {} tries", pick, next_place, tries);
        self.report_start(place_plan);
        self.previous_end = Some(place_plan.end_state.position.clone());

        self.sink.publish_scene(&pick_plan.start_state);
        self.sink.publish_trajectories(
            &pick_plan.start_state,
            &[&pick_plan.trajectory, &place_plan.trajectory],
        );
        self.place = Some(next_place);
        Ok((pick_plan, place_plan))
    }

    /// Random indices until `find` returns a plan, at most `max_tries` draws.
    fn draw<F>(&mut self, count: u32, find: F) -> Option<(u32, &'a MotionPlan, usize)>
    where
        F: Fn(u32) -> Option<&'a MotionPlan>,
    {
        for tries in 1..=self.max_tries {
            let index = self.rng.gen_range(0..count);
            if let Some(plan) = find(index) {
                return Some((index, plan, tries));
            }
        }
        None
    }

    fn report_start(&self, plan: &MotionPlan) {
        if let Some(previous) = &self.previous_end {
            let distance = joint_distance(&plan.start_state.joints(), &to_joints(previous));
            info!("Start state is {:.6} from previous end state", distance);
        }
        info!(
            "Trajectory has {} nodes and takes {:.3} seconds",
            plan.waypoint_count(),
            plan.duration()
        );
    }

    /// Plays `cycles` cycles, or until an error if `None`.
    pub fn run(&mut self, cycles: Option<usize>) -> Result<ReplaySummary, LibraryError> {
        let mut summary = ReplaySummary::default();
        while cycles.is_none_or(|limit| summary.cycles < limit) {
            let before = self.previous_end.clone();
            let (pick_plan, place_plan) = self.next_cycle()?;
            if let Some(previous) = before {
                let gap = joint_distance(&pick_plan.start_state.joints(), &to_joints(&previous));
                summary.max_discontinuity = summary.max_discontinuity.max(gap);
            }
            let duration = pick_plan.duration() + place_plan.duration();
            summary.total_duration += duration;
            summary.cycles += 1;
            if self.pacing && duration.is_finite() && duration > 0.0 {
                thread::sleep(Duration::from_secs_f64(duration));
            }
        }
        Ok(summary)
    }
}

fn to_joints(values: &[f64]) -> [f64; 6] {
    std::array::from_fn(|i| values.get(i).copied().unwrap_or(0.0))
}
