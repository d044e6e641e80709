//! Goal constraints of a motion plan

use tracing::error;
use crate::constraints::JointBounds;
use crate::kinematic_traits::{Joints, Kinematics, Pose, DOF};

/// Tolerances of the generated goals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoalTolerances {
    /// Per joint tolerance of joint goals, radians.
    pub joint: f64,
    /// Per axis position tolerance of pose goals, meters.
    pub position: f64,
    /// Per axis orientation tolerance of pose goals, radians.
    pub orientation: f64,
}

impl Default for GoalTolerances {
    fn default() -> Self {
        GoalTolerances {
            joint: 0.01,
            position: 0.01,
            orientation: 0.01,
        }
    }
}

/// Acceptable end configurations of a plan.
#[derive(Debug, Clone, PartialEq)]
pub enum GoalConstraint {
    /// Every joint within `tolerance` of the given position.
    Joint { positions: Joints, tolerance: f64 },

    /// Pose of `link_name` expressed in `frame_id`, with per axis tolerances.
    Pose {
        frame_id: String,
        link_name: String,
        pose: Pose,
        position_tolerance: [f64; 3],
        orientation_tolerance: [f64; 3],
    },
}

/// Goal for the end effector pose.
pub fn goal_from_pose(frame_id: &str, link_name: &str, pose: &Pose, tolerances: &GoalTolerances) -> GoalConstraint {
    GoalConstraint::Pose {
        frame_id: frame_id.to_string(),
        link_name: link_name.to_string(),
        pose: *pose,
        position_tolerance: [tolerances.position; 3],
        orientation_tolerance: [tolerances.orientation; 3],
    }
}

/// Goal for the joint configuration. Values outside `bounds` are reported but the goal
/// is still built with them; rejecting it is up to the planner.
pub fn goal_from_joints(positions: &Joints, bounds: &JointBounds, tolerance: f64) -> GoalConstraint {
    if let Some(violation) = bounds.check(positions) {
        error!("Joint goal is not within bounds: {}", violation);
    }
    GoalConstraint::Joint {
        positions: *positions,
        tolerance,
    }
}

impl GoalConstraint {
    pub fn is_satisfied_by(&self, joints: &Joints, kinematics: &dyn Kinematics) -> bool {
        match self {
            GoalConstraint::Joint { positions, tolerance } => {
                (0..DOF).all(|i| (joints[i] - positions[i]).abs() <= *tolerance)
            }
            GoalConstraint::Pose {
                pose,
                position_tolerance,
                orientation_tolerance,
                ..
            } => {
                let reached = kinematics.forward(joints);
                let offset = reached.translation.vector - pose.translation.vector;
                let rotation = (pose.rotation.inverse() * reached.rotation).scaled_axis();
                (0..3).all(|i| {
                    offset[i].abs() <= position_tolerance[i]
                        && rotation[i].abs() <= orientation_tolerance[i]
                })
            }
        }
    }

    /// Joint target if the goal is given in joint space.
    pub fn joint_target(&self) -> Option<&Joints> {
        match self {
            GoalConstraint::Joint { positions, .. } => Some(positions),
            GoalConstraint::Pose { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinematics_impl::OpwKinematics;
    use crate::parameters::Parameters;

    #[test]
    fn test_out_of_bounds_goal_still_built() {
        let bounds = JointBounds::new([-1.0; 6], [1.0; 6]);
        let target = [2.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let goal = goal_from_joints(&target, &bounds, 0.01);
        assert_eq!(goal.joint_target(), Some(&target));
    }

    #[test]
    fn test_joint_goal_tolerance() {
        let robot = OpwKinematics::new(Parameters::irb2400_10());
        let bounds = JointBounds::new([-3.0; 6], [3.0; 6]);
        let goal = goal_from_joints(&[0.5; 6], &bounds, 0.01);
        assert!(goal.is_satisfied_by(&[0.505; 6], &robot));
        assert!(!goal.is_satisfied_by(&[0.52, 0.5, 0.5, 0.5, 0.5, 0.5], &robot));
    }

    #[test]
    fn test_pose_goal_tolerance() {
        let robot = OpwKinematics::new(Parameters::irb2400_10());
        let joints = [0.1, 0.2, 0.3, 0.0, 0.4, 0.0];
        let pose = robot.forward(&joints);
        let goal = goal_from_pose("world", "ee_link", &pose, &GoalTolerances::default());
        assert!(goal.is_satisfied_by(&joints, &robot));
        assert!(!goal.is_satisfied_by(&[0.2, 0.2, 0.3, 0.0, 0.4, 0.0], &robot));
        assert!(goal.joint_target().is_none());
    }
}
