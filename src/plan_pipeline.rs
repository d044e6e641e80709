//! Single plan with bounded retries: plan, optimize, validate

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use crate::collisions_traits::StateValidity;
use crate::error::PlanningError;
use crate::goal::GoalConstraint;
use crate::grid::SamplingSettings;
use crate::kinematic_traits::{Joints, Kinematics};
use crate::planner::{MotionPlanner, PlanRequest, WorkspaceBounds};
use crate::shortcut::TrajectoryOptimizer;
use crate::trajectory::{Header, JointState, JointTrajectory, MotionPlan};

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub group_name: String,
    pub frame_id: String,
    pub joint_names: Vec<String>,
    pub workspace: WorkspaceBounds,
    pub planning_time: Duration,
    /// Attempts before the plan is reported as failed.
    pub attempts: usize,
    pub ik_limits: SamplingSettings,
}

impl PipelineSettings {
    pub fn new(group_name: &str, frame_id: &str, joint_names: Vec<String>) -> Self {
        PipelineSettings {
            group_name: group_name.to_string(),
            frame_id: frame_id.to_string(),
            joint_names,
            workspace: WorkspaceBounds::default(),
            planning_time: Duration::from_secs(5),
            attempts: 3,
            ik_limits: SamplingSettings::default(),
        }
    }
}

/// Plans a single motion from the given start state to the goals.
pub struct PlanningPipeline {
    planner: Box<dyn MotionPlanner>,
    optimizer: TrajectoryOptimizer,
    /// Checks that the end of the trajectory satisfies a goal.
    kinematics: Arc<dyn Kinematics>,
    pub settings: PipelineSettings,
}

impl PlanningPipeline {
    pub fn new(
        planner: Box<dyn MotionPlanner>,
        optimizer: TrajectoryOptimizer,
        kinematics: Arc<dyn Kinematics>,
        settings: PipelineSettings,
    ) -> Self {
        PlanningPipeline {
            planner,
            optimizer,
            kinematics,
            settings,
        }
    }

    /// Every attempt plans the same request again. The optimized trajectory of the first
    /// attempt that passes full path validation and ends at one of the goals becomes the plan. Index tags of the
    /// returned plan are zero, the caller sets them.
    pub fn plan(
        &self,
        scene: &dyn StateValidity,
        start: &Joints,
        goals: &[GoalConstraint],
    ) -> Result<MotionPlan, PlanningError> {
        let request = PlanRequest {
            group_name: self.settings.group_name.clone(),
            start: *start,
            goals: goals.to_vec(),
            workspace: self.settings.workspace,
            time_budget: self.settings.planning_time,
            ik_limits: self.settings.ik_limits,
        };

        let mut last = PlanningError::PlannerFailure("no planning attempts".to_string());
        for attempt in 1..=self.settings.attempts {
            match self.attempt(scene, &request) {
                Ok(plan) => {
                    info!(
                        "Planned {} waypoints, duration = {:.3} s (attempt {})",
                        plan.waypoint_count(),
                        plan.duration(),
                        attempt
                    );
                    return Ok(plan);
                }
                Err(err) => {
                    warn!("Planning attempt {} of {} failed: {}", attempt, self.settings.attempts, err);
                    last = err;
                }
            }
        }
        Err(PlanningError::RetriesExhausted {
            attempts: self.settings.attempts,
            last: Box::new(last),
        })
    }

    fn attempt(&self, scene: &dyn StateValidity, request: &PlanRequest) -> Result<MotionPlan, PlanningError> {
        let path = self.planner.plan(scene, request)?;
        if path.is_empty() {
            return Err(PlanningError::GoalNotReached);
        }
        let raw = JointTrajectory::from_path(
            Header::new(&self.settings.frame_id),
            self.settings.joint_names.clone(),
            &path,
        );
        let trajectory = self.optimizer.optimize(&raw, scene);
        if !scene.is_path_valid(&request.start, &trajectory) {
            return Err(PlanningError::PathInvalid);
        }
        let Some(end) = trajectory.last().copied() else {
            return Err(PlanningError::GoalNotReached);
        };
        if !request.goals.iter().any(|goal| goal.is_satisfied_by(&end, self.kinematics.as_ref())) {
            return Err(PlanningError::GoalNotReached);
        }

        Ok(MotionPlan {
            start_state: JointState::new(Header::new(&self.settings.frame_id), &self.settings.joint_names, &request.start),
            end_state: JointState::new(Header::new(&self.settings.frame_id), &self.settings.joint_names, &end),
            trajectory,
            pick_index: 0,
            place_index: 0,
        })
    }
}
