//! Core types and the kinematic collaborator traits

extern crate nalgebra as na;

use std::time::Duration;
use na::{Isometry3, Point3};
use crate::error::PlanningError;

/// Pose is used a pose of the robot tcp. It contains both Cartesian position and rotation quaternion
/// ```
/// extern crate nalgebra as na;
/// use na::{Isometry3, Translation3, UnitQuaternion, Vector3};
///
/// type Pose = Isometry3<f64>;
///
/// let translation = Translation3::new(1.0, 0.0, 0.5);
/// // The quaternion should be normalized to represent a valid rotation.
/// let rotation = UnitQuaternion::from_quaternion(na::Quaternion::new(1.0, 0.0, 0.0, 1.0).normalize());
/// let transform = Pose::from_parts(translation, rotation);
/// ```
pub type Pose = Isometry3<f64>;

/// Joint positions of the actuated group, in radians. The group is a 6 axis arm,
/// so every configuration, stored or computed, has exactly 6 values.
pub type Joints = [f64; 6];

/// Number of the joints in the actuated group.
pub const DOF: usize = 6;

/// For providing the seed of IK when nothing better is known.
pub const JOINTS_AT_ZERO: Joints = [0.0; 6];

/// Points along the kinematic chain: base, shoulder (J2 axis), elbow (J3 axis),
/// wrist center and the tool point.
pub type LinkPoints = [Point3<f64>; 5];

pub const P_BASE: usize = 0;
pub const P_SHOULDER: usize = 1;
pub const P_ELBOW: usize = 2;
pub const P_WRIST: usize = 3;
pub const P_TOOL: usize = 4;

pub trait Kinematics: Send + Sync {
    /// Find the pose of the tool for the given joint positions.
    fn forward(&self, qs: &Joints) -> Pose;

    /// Positions of the characteristic points of the arm, used to build the collision
    /// shapes of the links.
    fn link_points(&self, qs: &Joints) -> LinkPoints;
}

/// Inverse kinematics collaborator. Implementations may be iterative and are allowed
/// to fail; the caller decides what a failure means.
pub trait IkSolver: Send + Sync {
    /// Solve for the given pose of the tool.
    ///
    /// * `max_attempts` - number of restarts before giving up.
    /// * `timeout` - time budget of a single attempt.
    /// * `is_valid` - predicate the returned solution must pass (normally rejects
    ///   self-colliding configurations).
    fn solve(
        &self,
        target: &Pose,
        max_attempts: usize,
        timeout: Duration,
        is_valid: &dyn Fn(&Joints) -> bool,
    ) -> Result<Joints, PlanningError>;
}
