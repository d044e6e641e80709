extern crate nalgebra as na;
use na::{Matrix6, Vector6};
use crate::kinematic_traits::{Joints, Kinematics, Pose};

/// Struct representing the Jacobian matrix
pub struct Jacobian {
    /// A 6x6 matrix representing the Jacobian
    ///
    /// The Jacobian matrix maps the joint velocities to the end-effector velocities.
    /// Each column corresponds to a joint, and each row corresponds to a degree of freedom
    /// of the end-effector (linear and angular velocities).
    matrix: Matrix6<f64>,
}

impl Jacobian {
    /// Constructs a new Jacobian struct by computing the Jacobian matrix for the given robot and joint configuration
    ///
    /// # Arguments
    ///
    /// * `robot` - A reference to the robot implementing the Kinematics trait
    /// * `qs` - A reference to the joint configuration
    /// * `epsilon` - A small value used for numerical differentiation
    pub fn new(robot: &dyn Kinematics, qs: &Joints, epsilon: f64) -> Self {
        Self {
            matrix: compute_jacobian(robot, qs, epsilon),
        }
    }

    /// Damped least squares step: joint change that moves the end effector by `error`
    /// (linear and angular components), `dq = Jᵀ(JJᵀ + λ²I)⁻¹ e`. Stays defined near
    /// singularities where the plain inverse does not exist.
    pub fn damped_step(&self, error: &Vector6<f64>, lambda: f64) -> Option<Joints> {
        let jt = self.matrix.transpose();
        let damped = self.matrix * jt + Matrix6::identity() * (lambda * lambda);
        let solved = damped.try_inverse()? * error;
        let dq = jt * solved;
        Some(vector6_to_joints(dq))
    }
}

/// Difference between two poses as a 6D vector: translation first, then the rotation
/// taking `current` into `target` as a scaled axis.
pub fn pose_error(current: &Pose, target: &Pose) -> Vector6<f64> {
    let linear = target.translation.vector - current.translation.vector;
    let angular = (target.rotation * current.rotation.inverse()).scaled_axis();
    Vector6::new(linear.x, linear.y, linear.z, angular.x, angular.y, angular.z)
}

/// Function to compute the Jacobian matrix for a given robot and joint configuration
///
/// # Arguments
///
/// * `robot` - A reference to the robot implementing the Kinematics trait
/// * `qs` - A reference to the joint configuration
/// * `epsilon` - A small value used for numerical differentiation
pub fn compute_jacobian(robot: &dyn Kinematics, joints: &Joints, epsilon: f64) -> Matrix6<f64> {
    let mut jacobian = Matrix6::zeros();
    let current_pose = robot.forward(joints);
    let current_position = current_pose.translation.vector;
    let current_orientation = current_pose.rotation;

    for i in 0..6 {
        let mut perturbed_qs = *joints;
        perturbed_qs[i] += epsilon;
        let perturbed_pose = robot.forward(&perturbed_qs);

        let delta_position = (perturbed_pose.translation.vector - current_position) / epsilon;
        let delta_orientation =
            (perturbed_pose.rotation * current_orientation.inverse()).scaled_axis() / epsilon;

        jacobian.fixed_view_mut::<3, 1>(0, i).copy_from(&delta_position);
        jacobian.fixed_view_mut::<3, 1>(3, i).copy_from(&delta_orientation);
    }

    jacobian
}

fn vector6_to_joints(v: Vector6<f64>) -> Joints {
    [v[0], v[1], v[2], v[3], v[4], v[5]]
}
