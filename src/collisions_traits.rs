use crate::kinematic_traits::Joints;
use crate::trajectory::JointTrajectory;

/// Validity checks against the planning scene: bounds, self collision and collision
/// with the environment.
pub trait StateValidity: Send + Sync {
    /// Checks the configuration of the actuated group. If `verbose`, the reason of the
    /// rejection is logged.
    fn is_state_valid(&self, joints: &Joints, verbose: bool) -> bool;

    /// Checks the start state and every waypoint of the trajectory.
    fn is_path_valid(&self, start: &Joints, trajectory: &JointTrajectory) -> bool {
        self.is_state_valid(start, false)
            && trajectory
                .points
                .iter()
                .all(|point| self.is_state_valid(&point.positions, false))
    }
}
