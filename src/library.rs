//! Builds the library of pick and place plans over all pairs of targets

use std::sync::Arc;
use tracing::{error, info, warn};
use crate::collisions_traits::StateValidity;
use crate::error::PlanningError;
use crate::goal::{goal_from_joints, goal_from_pose, GoalTolerances};
use crate::grid::{grid_linspace, RectGrid, SamplingSettings, TargetVolume};
use crate::kinematic_traits::{IkSolver, Joints, Kinematics};
use crate::plan_pipeline::PlanningPipeline;
use crate::plan_store::PlanStore;
use crate::robot::RobotModel;
use crate::telemetry::TelemetrySink;
use crate::trajectory::{Header, JointState, Leg, MotionPlan, PlanGroup};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildSettings {
    pub sampling: SamplingSettings,

    pub tolerances: GoalTolerances,

    /// If the return leg fails, move the scene back to the place target before the
    /// next pick target is tried. Without it the next pick leg starts where the failed
    /// pair left the robot (at the pick target).
    pub restore_place_state_on_return_failure: bool,
}

impl Default for BuildSettings {
    fn default() -> Self {
        BuildSettings {
            sampling: SamplingSettings::default(),
            tolerances: GoalTolerances::default(),
            restore_place_state_on_return_failure: false,
        }
    }
}

/// Where the builder stands between two planning calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPhase {
    AtPlace,
    PickInProgress,
    AtPick,
    PlaceInProgress,
}

/// Outcome of a build. Partial libraries are normal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Pairs for which both legs were planned.
    pub successes: usize,
    /// Pairs for which the pick leg was attempted.
    pub attempted: usize,
    /// Number of pick targets times number of place targets.
    pub theoretical_max: usize,
    pub pick_failures: usize,
    pub place_failures: usize,
}

/// Owns the current state of the planning scene and threads it through the planning
/// calls. The environment itself is shared and never changes during the build.
pub struct TrajectoryLibrary {
    robot: Arc<RobotModel>,
    scene: Arc<dyn StateValidity>,
    ik: Arc<dyn IkSolver>,
    pipeline: PlanningPipeline,
    sink: Arc<dyn TelemetrySink>,
    pub settings: BuildSettings,

    pick_targets: Option<TargetVolume>,
    place_targets: Option<TargetVolume>,
    pick_plans: PlanGroup,
    place_plans: PlanGroup,

    phase: BuildPhase,
    current: Joints,
}

impl TrajectoryLibrary {
    pub fn new(
        robot: Arc<RobotModel>,
        scene: Arc<dyn StateValidity>,
        ik: Arc<dyn IkSolver>,
        pipeline: PlanningPipeline,
        sink: Arc<dyn TelemetrySink>,
        settings: BuildSettings,
    ) -> Self {
        TrajectoryLibrary {
            robot,
            scene,
            ik,
            pipeline,
            sink,
            settings,
            pick_targets: None,
            place_targets: None,
            pick_plans: PlanGroup::new(Leg::Pick),
            place_plans: PlanGroup::new(Leg::Place),
            phase: BuildPhase::AtPlace,
            current: [0.0; 6],
        }
    }

    /// Solves the configurations of both grids.
    pub fn generate_targets(&mut self, pick_grid: &RectGrid, place_grid: &RectGrid) -> (usize, usize) {
        let picks = self.sample(pick_grid, "pick");
        let places = self.sample(place_grid, "place");
        let counts = (picks.target_count(), places.target_count());
        self.pick_targets = Some(picks);
        self.place_targets = Some(places);
        counts
    }

    fn sample(&self, grid: &RectGrid, what: &str) -> TargetVolume {
        let joints = grid_linspace(grid, self.ik.as_ref(), self.scene.as_ref(), &self.settings.sampling);
        info!("Generated {} of {} possible {} targets", joints.len(), grid.sample_count(), what);
        TargetVolume { grid: *grid, joints }
    }

    /// Uses already known targets instead of sampling grids.
    pub fn set_targets(&mut self, picks: TargetVolume, places: TargetVolume) {
        self.pick_targets = Some(picks);
        self.place_targets = Some(places);
    }

    pub fn pick_targets(&self) -> Option<&TargetVolume> {
        self.pick_targets.as_ref()
    }

    pub fn place_targets(&self) -> Option<&TargetVolume> {
        self.place_targets.as_ref()
    }

    pub fn phase(&self) -> BuildPhase {
        self.phase
    }

    /// Current state of the planning scene.
    pub fn current_state(&self) -> &Joints {
        &self.current
    }

    pub fn pick_plans(&self) -> &PlanGroup {
        &self.pick_plans
    }

    pub fn place_plans(&self) -> &PlanGroup {
        &self.place_plans
    }

    fn state(&self, joints: &Joints) -> JointState {
        JointState::new(Header::new(&self.robot.frame_id), &self.robot.joint_names, joints)
    }

    fn set_current_state(&mut self, joints: &Joints, phase: BuildPhase) {
        self.current = *joints;
        self.phase = phase;
        self.sink.publish_scene(&self.state(joints));
    }

    /// The target in joint space, or the tool pose it reaches as the alternative.
    fn plan_leg(&self, target: &Joints) -> Result<MotionPlan, PlanningError> {
        let tolerances = &self.settings.tolerances;
        let goals = [
            goal_from_joints(target, &self.robot.bounds, tolerances.joint),
            goal_from_pose(
                &self.robot.frame_id,
                &self.robot.end_effector_link,
                &self.robot.kinematics.forward(target),
                tolerances,
            ),
        ];
        self.pipeline.plan(self.scene.as_ref(), &self.current, &goals)
    }

    /// Plans both legs for every pair of place and pick targets. For each place target
    /// the scene is set to it, then for each pick target the pick leg (place to pick)
    /// and the place leg (pick back to place) are planned. Pairs where a leg fails are
    /// skipped; the build itself never fails.
    pub fn build(&mut self) -> BuildReport {
        let picks = self.pick_targets.as_ref().map(|t| t.joints.clone()).unwrap_or_default();
        let places = self.place_targets.as_ref().map(|t| t.joints.clone()).unwrap_or_default();
        let mut report = BuildReport {
            theoretical_max: picks.len() * places.len(),
            ..BuildReport::default()
        };
        if picks.is_empty() || places.is_empty() {
            error!(
                "Nothing to build: {} pick and {} place targets",
                picks.len(),
                places.len()
            );
            return report;
        }

        for (n, place) in places.iter().enumerate() {
            self.set_current_state(place, BuildPhase::AtPlace);

            for (m, pick) in picks.iter().enumerate() {
                report.attempted += 1;
                let resting = self.phase;
                self.phase = BuildPhase::PickInProgress;
                let mut pick_plan = match self.plan_leg(pick) {
                    Ok(plan) => plan,
                    Err(err) => {
                        warn!("No pick plan from place {} to pick {}: {}", n, m, err);
                        report.pick_failures += 1;
                        self.phase = resting;
                        continue;
                    }
                };
                let pick_end = pick_plan.end_state.joints();
                self.set_current_state(&pick_end, BuildPhase::AtPick);

                self.phase = BuildPhase::PlaceInProgress;
                let mut place_plan = match self.plan_leg(place) {
                    Ok(plan) => plan,
                    Err(err) => {
                        warn!("No place plan from pick {} back to place {}: {}", m, n, err);
                        report.place_failures += 1;
                        if self.settings.restore_place_state_on_return_failure {
                            self.set_current_state(place, BuildPhase::AtPlace);
                        } else {
                            self.phase = BuildPhase::AtPick;
                        }
                        continue;
                    }
                };

                pick_plan.pick_index = m as u32;
                pick_plan.place_index = n as u32;
                place_plan.pick_index = m as u32;
                place_plan.place_index = n as u32;
                self.sink.publish_trajectories(
                    &pick_plan.start_state,
                    &[&pick_plan.trajectory, &place_plan.trajectory],
                );
                self.pick_plans.push(pick_plan);
                self.place_plans.push(place_plan);

                self.set_current_state(place, BuildPhase::AtPlace);
                report.successes += 1;
            }
        }

        info!(
            "Generated {} trajectories out of a theoretical {}",
            report.successes, report.theoretical_max
        );
        report
    }

    /// Hands the built plans over to the store.
    pub fn into_store(self) -> PlanStore {
        PlanStore {
            pick: self.pick_plans,
            place: self.place_plans,
        }
    }
}
