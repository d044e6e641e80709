use std::sync::{Arc, Mutex};
use std::time::Instant;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, warn};
use crate::collisions_traits::StateValidity;
use crate::error::PlanningError;
use crate::kinematic_traits::{IkSolver, Joints};
use crate::planner::{resolve_goal, MotionPlanner, PlanRequest};
use crate::robot::RobotModel;
use crate::rrt_to::dual_rrt_connect;

/// Samples drawn in a row outside the workspace before the sample is taken anyway.
const MAX_REJECTED_SAMPLES: usize = 100;

/// Defines the RRT planner that relocates the robot between the two positions in a
/// collision free way.
pub struct RrtConnectPlanner {
    robot: Arc<RobotModel>,

    /// Step size in the joint space (value in Radians). This should be small
    /// enough to prevent robot colliding with something while moving
    /// in possibly less predictable way between the joints.
    pub step_size_joint_space: f64,

    /// The "max try" parameter of RRT algorithm, reasonable values
    /// are in order 1000 ... 4000
    pub max_try: usize,

    /// Solves pose goals, if any.
    pub ik: Option<Arc<dyn IkSolver>>,

    rng: Mutex<StdRng>,
}

impl RrtConnectPlanner {
    pub fn new(robot: Arc<RobotModel>) -> Self {
        RrtConnectPlanner {
            robot,
            step_size_joint_space: 3_f64.to_radians(),
            max_try: 2000,
            ik: None,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Sampling becomes reproducible.
    pub fn with_rng_seed(self, seed: u64) -> Self {
        RrtConnectPlanner {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    pub fn with_ik(self, ik: Arc<dyn IkSolver>) -> Self {
        RrtConnectPlanner { ik: Some(ik), ..self }
    }

    /// Random configuration within joint bounds, with the tool inside the workspace
    /// box where such can be found quickly.
    fn sample(&self, request: &PlanRequest) -> Vec<f64> {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut qs = self.robot.bounds.random_joints(&mut *rng);
        for _ in 0..MAX_REJECTED_SAMPLES {
            let tool = self.robot.kinematics.forward(&qs).translation.vector;
            if request.workspace.contains(&tool) {
                break;
            }
            qs = self.robot.bounds.random_joints(&mut *rng);
        }
        qs.to_vec()
    }
}

impl MotionPlanner for RrtConnectPlanner {
    fn plan(&self, scene: &dyn StateValidity, request: &PlanRequest) -> Result<Vec<Joints>, PlanningError> {
        let goal = resolve_goal(scene, request, self.ik.as_deref())?;
        let started = Instant::now();
        let deadline = started + request.time_budget;

        let collision_free = |joint_angles: &[f64]| -> bool {
            match <Joints>::try_from(joint_angles) {
                Ok(joints) => scene.is_state_valid(&joints, false),
                Err(_) => false,
            }
        };

        let path = dual_rrt_connect(
            &request.start,
            &goal,
            collision_free,
            || self.sample(request),
            self.step_size_joint_space,
            self.max_try,
            deadline,
        )
        .map_err(|reason| {
            warn!("RRT for group {} failed: {}", request.group_name, reason);
            PlanningError::PlannerFailure(reason)
        })?;
        debug!("RRT took {:?}, {} waypoints", started.elapsed(), path.len());

        path.into_iter()
            .map(|vec| {
                <Joints>::try_from(vec.as_slice()).map_err(|_| {
                    PlanningError::PlannerFailure("waypoint does not have 6 joint values".to_string())
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use crate::constraints::JointBounds;
    use crate::goal::goal_from_joints;
    use crate::kinematics_impl::OpwKinematics;
    use crate::parameters::Parameters;
    use crate::planner::WorkspaceBounds;

    /// Wall in joint space: the first joint cannot pass 0.5 unless the second is above 1.
    struct JointWall;

    impl StateValidity for JointWall {
        fn is_state_valid(&self, joints: &Joints, _verbose: bool) -> bool {
            !((joints[0] - 0.5).abs() < 0.1 && joints[1] < 1.0)
        }
    }

    #[test]
    fn test_plans_around_wall() {
        let bounds = JointBounds::new([-2.0; 6], [2.0; 6]);
        let robot = Arc::new(RobotModel::with_kinematics(
            Arc::new(OpwKinematics::new(Parameters::irb2400_10())), bounds));
        let planner = RrtConnectPlanner::new(robot).with_rng_seed(42);
        let goal = [1.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let request = PlanRequest {
            group_name: "manipulator".to_string(),
            start: [0.0; 6],
            goals: vec![goal_from_joints(&goal, &bounds, 0.01)],
            // Everything reachable, so sampling is never biased
            workspace: WorkspaceBounds {
                min: nalgebra::Vector3::new(-5.0, -5.0, -5.0),
                max: nalgebra::Vector3::new(5.0, 5.0, 5.0),
            },
            time_budget: Duration::from_secs(20),
            ik_limits: crate::grid::SamplingSettings::default(),
        };

        let path = planner.plan(&JointWall, &request).expect("path over the wall exists");
        assert_eq!(path[0], [0.0; 6]);
        assert_eq!(path[path.len() - 1], goal);
        assert!(path.iter().all(|qs| JointWall.is_state_valid(qs, false)));
    }
}
