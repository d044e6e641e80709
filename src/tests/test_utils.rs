//! Collaborators with fully predictable behavior for the scenario tests.

use std::f64::consts::PI;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use crate::collisions_traits::StateValidity;
use crate::constraints::JointBounds;
use crate::error::PlanningError;
use crate::goal::GoalConstraint;
use crate::grid::{AxisRange, RectGrid};
use crate::kinematic_traits::{IkSolver, Joints, Pose};
use crate::library::{BuildSettings, TrajectoryLibrary};
use crate::parameters::Parameters;
use crate::plan_pipeline::{PipelineSettings, PlanningPipeline};
use crate::planner::{MotionPlanner, PlanRequest};
use crate::robot::{default_joint_names, RobotModel};
use crate::shortcut::TrajectoryOptimizer;
use crate::telemetry::NullSink;
use crate::time_parameterization::TrapezoidalTimeParameterization;
use crate::utils::{interpolate_joints, joint_distance};

pub(crate) struct FreeSpace;

impl StateValidity for FreeSpace {
    fn is_state_valid(&self, _joints: &Joints, _verbose: bool) -> bool {
        true
    }
}

/// Everything where the given joint exceeds the limit is occupied.
pub(crate) struct BlockedAbove {
    pub joint: usize,
    pub limit: f64,
}

impl StateValidity for BlockedAbove {
    fn is_state_valid(&self, joints: &Joints, _verbose: bool) -> bool {
        joints[self.joint] <= self.limit
    }
}

/// Puts the target translation into the first three joints.
pub(crate) struct LinearIk;

impl IkSolver for LinearIk {
    fn solve(
        &self,
        target: &Pose,
        max_attempts: usize,
        _timeout: Duration,
        is_valid: &dyn Fn(&Joints) -> bool,
    ) -> Result<Joints, PlanningError> {
        let t = target.translation.vector;
        let joints = [t.x, t.y, t.z, 0.0, 0.0, 0.0];
        if is_valid(&joints) {
            Ok(joints)
        } else {
            Err(PlanningError::IkFailure { attempts: max_attempts })
        }
    }
}

pub(crate) fn same(a: &Joints, b: &Joints) -> bool {
    joint_distance(a, b) < 1e-9
}

/// Plans straight lines with a few intermediate waypoints and records every request
/// as (start, goal) along with all its goals. Refuses the listed (start, goal) pairs.
pub(crate) struct ScriptedPlanner {
    pub refused: Vec<(Joints, Joints)>,
    pub calls: Arc<Mutex<Vec<(Joints, Joints)>>>,
    pub goals: Arc<Mutex<Vec<Vec<GoalConstraint>>>>,
}

impl ScriptedPlanner {
    pub fn new(refused: Vec<(Joints, Joints)>) -> Self {
        ScriptedPlanner {
            refused,
            calls: Arc::new(Mutex::new(Vec::new())),
            goals: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl MotionPlanner for ScriptedPlanner {
    fn plan(&self, _scene: &dyn StateValidity, request: &PlanRequest) -> Result<Vec<Joints>, PlanningError> {
        let goal = request
            .goals
            .iter()
            .find_map(|g| g.joint_target().copied())
            .ok_or_else(|| PlanningError::PlannerFailure("no joint goal".to_string()))?;
        self.calls.lock().expect("calls").push((request.start, goal));
        self.goals.lock().expect("goals").push(request.goals.clone());

        if self.refused.iter().any(|(s, g)| same(s, &request.start) && same(g, &goal)) {
            return Err(PlanningError::PlannerFailure("refused".to_string()));
        }
        Ok((0..=4).map(|s| interpolate_joints(&request.start, &goal, s as f64 / 4.0)).collect())
    }
}

pub(crate) fn test_robot() -> Arc<RobotModel> {
    Arc::new(RobotModel::new(
        Parameters::irb2400_10(),
        JointBounds::new([-PI; 6], [PI; 6]),
        None,
        None,
    ))
}

/// Two pick targets at y = -0.3 and two place targets at y = 0.3, x in {0.2, 0.4}.
pub(crate) fn pick_grid() -> RectGrid {
    RectGrid {
        x: AxisRange::new(0.2, 0.4, 2),
        y: AxisRange::new(-0.3, -0.3, 1),
        z: AxisRange::new(0.5, 0.5, 1),
        orientation: nalgebra::UnitQuaternion::identity(),
    }
}

pub(crate) fn place_grid() -> RectGrid {
    RectGrid {
        y: AxisRange::new(0.3, 0.3, 1),
        ..pick_grid()
    }
}

pub(crate) fn pick_target(m: usize) -> Joints {
    [0.2 + 0.2 * m as f64, -0.3, 0.5, 0.0, 0.0, 0.0]
}

pub(crate) fn place_target(n: usize) -> Joints {
    [0.2 + 0.2 * n as f64, 0.3, 0.5, 0.0, 0.0, 0.0]
}

pub(crate) fn test_library(
    scene: Arc<dyn StateValidity>,
    planner: ScriptedPlanner,
    settings: BuildSettings,
) -> TrajectoryLibrary {
    let robot = test_robot();
    let timing = Arc::new(TrapezoidalTimeParameterization::new(robot.max_velocity, robot.max_acceleration));
    let pipeline = PlanningPipeline::new(
        Box::new(planner),
        TrajectoryOptimizer::new(timing),
        robot.kinematics.clone(),
        PipelineSettings::new("manipulator", "world", default_joint_names()),
    );
    TrajectoryLibrary::new(robot, scene, Arc::new(LinearIk), pipeline, Arc::new(NullSink), settings)
}
