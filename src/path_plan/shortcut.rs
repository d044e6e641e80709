//! Shortcut simplification of planned trajectories

use std::sync::Arc;
use tracing::debug;
use crate::collisions_traits::StateValidity;
use crate::time_parameterization::TimeParameterization;
use crate::trajectory::JointTrajectory;
use crate::utils::interpolate_joints;

/// Removes waypoints that a straight joint space move can skip, then times the
/// result and slows it down.
///
/// For every waypoint `i`, the furthest waypoint `j` reachable from it by a collision
/// free straight move is searched backwards from the end. Straight moves are checked
/// at `resolution` seconds of the current timing. Later shortcuts are searched on the
/// already shortened trajectory.
pub struct TrajectoryOptimizer {
    pub timing: Arc<dyn TimeParameterization>,

    /// Time between the checked states of a shortcut, seconds.
    pub resolution: f64,

    /// Factor applied to all durations after the final timing.
    pub slowdown: f64,
}

impl TrajectoryOptimizer {
    pub fn new(timing: Arc<dyn TimeParameterization>) -> Self {
        TrajectoryOptimizer {
            timing,
            resolution: 0.05,
            slowdown: 3.0,
        }
    }

    /// Optimizes a copy of the trajectory. First and last waypoints are kept.
    pub fn optimize(&self, trajectory: &JointTrajectory, scene: &dyn StateValidity) -> JointTrajectory {
        let mut optimized = trajectory.clone();
        let original_len = optimized.len();

        let mut i = 0;
        while i < optimized.len() {
            self.timing.compute_time_stamps(&mut optimized);
            for j in (i + 1..optimized.len()).rev() {
                if self.shortcut_free(&optimized, i, j, scene) {
                    if j > i + 1 {
                        debug!("Shortcut from waypoint {} to {}", i, j);
                        optimized.remove_between(i, j);
                    }
                    break;
                }
            }
            i += 1;
        }

        self.timing.compute_time_stamps(&mut optimized);
        optimized.time_warp(self.slowdown);
        debug!("Optimized trajectory from {} to {} waypoints", original_len, optimized.len());
        optimized
    }

    /// Checks the intermediate states of the straight move from waypoint `i` to `j`.
    /// The end points are not checked, they are already part of the trajectory.
    fn shortcut_free(&self, trajectory: &JointTrajectory, i: usize, j: usize, scene: &dyn StateValidity) -> bool {
        let from = &trajectory.points[i];
        let to = &trajectory.points[j];
        let duration = to.time_from_start - from.time_from_start;
        let steps = if self.resolution > 0.0 && duration.is_finite() && duration > 0.0 {
            (duration / self.resolution).floor() as usize
        } else {
            0
        };
        (1..steps).all(|s| {
            let fraction = s as f64 / steps as f64;
            scene.is_state_valid(&interpolate_joints(&from.positions, &to.positions, fraction), false)
        })
    }
}
