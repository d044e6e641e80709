//! Motion planners behind a common interface, chosen by configuration

use std::sync::Arc;
use std::time::Duration;
use nalgebra::Vector3;
use crate::collisions_traits::StateValidity;
use crate::error::PlanningError;
use crate::goal::GoalConstraint;
use crate::grid::SamplingSettings;
use crate::kinematic_traits::{IkSolver, Joints};
use crate::utils::interpolate_joints;

/// Axis aligned box the tool must stay within while planning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkspaceBounds {
    pub min: Vector3<f64>,
    pub max: Vector3<f64>,
}

impl Default for WorkspaceBounds {
    fn default() -> Self {
        WorkspaceBounds {
            min: Vector3::new(-1.0, -1.0, 0.25),
            max: Vector3::new(1.0, 1.0, 0.7),
        }
    }
}

impl WorkspaceBounds {
    pub fn contains(&self, point: &Vector3<f64>) -> bool {
        (0..3).all(|i| point[i] >= self.min[i] && point[i] <= self.max[i])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanRequest {
    pub group_name: String,
    /// Start state of the plan, normally the current state of the scene.
    pub start: Joints,
    /// Alternative goals, the first one that resolves to a valid configuration is used.
    pub goals: Vec<GoalConstraint>,
    pub workspace: WorkspaceBounds,
    pub time_budget: Duration,
    /// IK limits when resolving pose goals.
    pub ik_limits: SamplingSettings,
}

/// Finds a collision free path from the start of the request to one of its goals.
/// The returned path begins with the start and ends at the goal configuration.
pub trait MotionPlanner: Send + Sync {
    fn plan(&self, scene: &dyn StateValidity, request: &PlanRequest) -> Result<Vec<Joints>, PlanningError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerKind {
    RrtConnect,
    Direct,
}

impl PlannerKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "rrt_connect" | "RRTConnect" => Some(PlannerKind::RrtConnect),
            "direct" => Some(PlannerKind::Direct),
            _ => None,
        }
    }
}

/// Goal of the request as joint configuration. Pose goals need the IK solver; the
/// solution must be a valid state of the scene.
pub fn resolve_goal(
    scene: &dyn StateValidity,
    request: &PlanRequest,
    ik: Option<&dyn IkSolver>,
) -> Result<Joints, PlanningError> {
    let is_valid = |qs: &Joints| scene.is_state_valid(qs, false);
    for goal in &request.goals {
        match goal {
            GoalConstraint::Joint { positions, .. } => {
                if scene.is_state_valid(positions, true) {
                    return Ok(*positions);
                }
            }
            GoalConstraint::Pose { pose, .. } => {
                if let Some(ik) = ik {
                    let limits = &request.ik_limits;
                    if let Ok(qs) = ik.solve(pose, limits.ik_attempts, limits.ik_timeout, &is_valid) {
                        return Ok(qs);
                    }
                }
            }
        }
    }
    Err(PlanningError::PlannerFailure("no goal resolves to a valid state".to_string()))
}

/// Moves along the straight line in joint space, checking every step.
pub struct DirectPlanner {
    /// Largest joint change between the checked steps, radians.
    pub step: f64,
    pub ik: Option<Arc<dyn IkSolver>>,
}

impl Default for DirectPlanner {
    fn default() -> Self {
        DirectPlanner {
            step: 3_f64.to_radians(),
            ik: None,
        }
    }
}

impl MotionPlanner for DirectPlanner {
    fn plan(&self, scene: &dyn StateValidity, request: &PlanRequest) -> Result<Vec<Joints>, PlanningError> {
        let goal = resolve_goal(scene, request, self.ik.as_deref())?;
        let start = request.start;
        let largest = (0..start.len()).fold(0.0_f64, |a, i| a.max((goal[i] - start[i]).abs()));
        let steps = if self.step > 0.0 { (largest / self.step).ceil().max(1.0) as usize } else { 1 };

        let mut path = Vec::with_capacity(steps + 1);
        path.push(start);
        for s in 1..=steps {
            let qs = interpolate_joints(&start, &goal, s as f64 / steps as f64);
            if !scene.is_state_valid(&qs, false) {
                return Err(PlanningError::PlannerFailure(format!(
                    "straight line blocked at step {} of {}",
                    s, steps
                )));
            }
            path.push(qs);
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::JointBounds;
    use crate::goal::goal_from_joints;

    /// Rejects configurations with the first joint between 0.4 and 0.6.
    struct Barrier;

    impl StateValidity for Barrier {
        fn is_state_valid(&self, joints: &Joints, _verbose: bool) -> bool {
            !(joints[0] > 0.4 && joints[0] < 0.6)
        }
    }

    fn request(goal: Joints) -> PlanRequest {
        let bounds = JointBounds::new([-3.0; 6], [3.0; 6]);
        PlanRequest {
            group_name: "manipulator".to_string(),
            start: [0.0; 6],
            goals: vec![goal_from_joints(&goal, &bounds, 0.01)],
            workspace: WorkspaceBounds::default(),
            time_budget: Duration::from_secs(1),
            ik_limits: SamplingSettings::default(),
        }
    }

    #[test]
    fn test_direct_path() {
        let planner = DirectPlanner::default();
        let path = planner
            .plan(&Barrier, &request([0.3, 0.2, 0.0, 0.0, 0.0, -0.1]))
            .expect("nothing in the way");
        assert_eq!(path[0], [0.0; 6]);
        assert_eq!(path[path.len() - 1], [0.3, 0.2, 0.0, 0.0, 0.0, -0.1]);
        assert!(path.len() > 2);
    }

    #[test]
    fn test_direct_blocked() {
        let planner = DirectPlanner::default();
        let result = planner.plan(&Barrier, &request([1.0, 0.0, 0.0, 0.0, 0.0, 0.0]));
        assert!(matches!(result, Err(PlanningError::PlannerFailure(_))));
    }

    #[test]
    fn test_invalid_goal_rejected() {
        let planner = DirectPlanner::default();
        let result = planner.plan(&Barrier, &request([0.5, 0.0, 0.0, 0.0, 0.0, 0.0]));
        assert!(result.is_err());
    }

    /// Records the limits it was called with and answers with a fixed configuration.
    struct RecordingIk {
        limits: std::sync::Mutex<Option<(usize, Duration)>>,
    }

    impl IkSolver for RecordingIk {
        fn solve(
            &self,
            _target: &crate::kinematic_traits::Pose,
            max_attempts: usize,
            timeout: Duration,
            _is_valid: &dyn Fn(&Joints) -> bool,
        ) -> Result<Joints, PlanningError> {
            *self.limits.lock().unwrap() = Some((max_attempts, timeout));
            Ok([0.2; 6])
        }
    }

    #[test]
    fn test_pose_goal_uses_request_ik_limits() {
        let ik = RecordingIk { limits: std::sync::Mutex::new(None) };
        let mut request = request([0.0; 6]);
        request.goals = vec![GoalConstraint::Pose {
            frame_id: "world".to_string(),
            link_name: "ee_link".to_string(),
            pose: crate::kinematic_traits::Pose::identity(),
            position_tolerance: [0.01; 3],
            orientation_tolerance: [0.01; 3],
        }];
        request.ik_limits = SamplingSettings { ik_attempts: 4, ik_timeout: Duration::from_millis(250) };

        let goal = resolve_goal(&Barrier, &request, Some(&ik)).expect("solver answers");
        assert_eq!(goal, [0.2; 6]);
        assert_eq!(*ik.limits.lock().unwrap(), Some((4, Duration::from_millis(250))));
    }

    #[test]
    fn test_workspace_contains() {
        let workspace = WorkspaceBounds::default();
        assert!(workspace.contains(&Vector3::new(0.5, -0.5, 0.5)));
        assert!(!workspace.contains(&Vector3::new(0.5, -0.5, 0.8)));
        assert_eq!(PlannerKind::from_name("RRTConnect"), Some(PlannerKind::RrtConnect));
        assert_eq!(PlannerKind::from_name("prm"), None);
    }
}
