//! Timing of the waypoint trajectories

use crate::kinematic_traits::{Joints, DOF};
use crate::trajectory::JointTrajectory;

/// Assigns `time_from_start` to every waypoint of the trajectory.
pub trait TimeParameterization: Send + Sync {
    fn compute_time_stamps(&self, trajectory: &mut JointTrajectory);
}

/// Each segment is a rest-to-rest move limited by per joint velocity and acceleration.
/// The segment takes as long as its slowest joint needs, following a trapezoidal
/// velocity profile (triangular if the joint never reaches full speed).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrapezoidalTimeParameterization {
    pub max_velocity: Joints,
    pub max_acceleration: Joints,
}

impl TrapezoidalTimeParameterization {
    pub fn new(max_velocity: Joints, max_acceleration: Joints) -> Self {
        TrapezoidalTimeParameterization {
            max_velocity,
            max_acceleration,
        }
    }

    /// Time for a single joint to travel `distance` from rest to rest.
    fn joint_time(distance: f64, velocity: f64, acceleration: f64) -> f64 {
        if distance <= 0.0 || velocity <= 0.0 || acceleration <= 0.0 {
            return 0.0;
        }
        if distance <= velocity * velocity / acceleration {
            2.0 * (distance / acceleration).sqrt()
        } else {
            distance / velocity + velocity / acceleration
        }
    }

    pub fn segment_time(&self, from: &Joints, to: &Joints) -> f64 {
        (0..DOF)
            .map(|i| {
                Self::joint_time(
                    (to[i] - from[i]).abs(),
                    self.max_velocity[i],
                    self.max_acceleration[i],
                )
            })
            .fold(0.0, f64::max)
    }
}

impl TimeParameterization for TrapezoidalTimeParameterization {
    fn compute_time_stamps(&self, trajectory: &mut JointTrajectory) {
        let mut elapsed = 0.0;
        let mut previous: Option<Joints> = None;
        for point in &mut trajectory.points {
            if let Some(previous) = previous {
                elapsed += self.segment_time(&previous, &point.positions);
            }
            point.time_from_start = elapsed;
            previous = Some(point.positions);
        }
    }
}
