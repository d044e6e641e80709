//! Numeric inverse kinematics with random restarts

use std::f64::consts::PI;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;
use crate::error::PlanningError;
use crate::jakobian::{pose_error, Jacobian};
use crate::kinematic_traits::{IkSolver, Joints, Pose, JOINTS_AT_ZERO};
use crate::robot::RobotModel;

/// Damped least squares solver over the numeric Jacobian of the robot. The first
/// attempt starts from `seed`, every following attempt from a random configuration
/// within the joint bounds. Solutions are always within bounds.
pub struct JacobianIkSolver {
    robot: Arc<RobotModel>,

    /// Starting configuration of the first attempt.
    pub seed: Joints,

    /// Accepted distance to the target position, meters.
    pub position_tolerance: f64,

    /// Accepted rotation angle to the target orientation, radians.
    pub orientation_tolerance: f64,

    /// Damping factor of the least squares step.
    pub lambda: f64,

    /// Largest change of any joint in one iteration, radians.
    pub max_step: f64,

    /// Iteration limit of a single attempt (the attempt also ends on timeout).
    pub max_iterations: usize,

    rng: Mutex<StdRng>,
}

impl JacobianIkSolver {
    pub fn new(robot: Arc<RobotModel>) -> Self {
        JacobianIkSolver {
            robot,
            seed: JOINTS_AT_ZERO,
            position_tolerance: 1e-4,
            orientation_tolerance: 1e-3,
            lambda: 0.05,
            max_step: 0.2,
            max_iterations: 300,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Random restarts become reproducible.
    pub fn with_rng_seed(self, seed: u64) -> Self {
        JacobianIkSolver {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    pub fn with_seed(self, seed: Joints) -> Self {
        JacobianIkSolver { seed, ..self }
    }

    fn random_start(&self) -> Joints {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        self.robot.bounds.random_joints(&mut *rng)
    }

    /// Brings each joint into bounds by full turns where possible, then clamps.
    fn into_bounds(&self, qs: &Joints) -> Joints {
        let bounds = &self.robot.bounds;
        let wrapped: Joints = std::array::from_fn(|i| {
            let mut q = qs[i];
            while q > bounds.to[i] && q - 2.0 * PI >= bounds.from[i] {
                q -= 2.0 * PI;
            }
            while q < bounds.from[i] && q + 2.0 * PI <= bounds.to[i] {
                q += 2.0 * PI;
            }
            q
        });
        bounds.clamp(&wrapped)
    }

    /// Single attempt, returns the converged configuration if any.
    fn converge(&self, target: &Pose, start: Joints, deadline: Instant) -> Option<Joints> {
        let kinematics = self.robot.kinematics.as_ref();
        let mut qs = self.into_bounds(&start);

        for _ in 0..self.max_iterations {
            let error = pose_error(&kinematics.forward(&qs), target);
            if error.fixed_rows::<3>(0).norm() < self.position_tolerance
                && error.fixed_rows::<3>(3).norm() < self.orientation_tolerance
            {
                return Some(qs);
            }
            if Instant::now() > deadline {
                return None;
            }

            let step = Jacobian::new(kinematics, &qs, 1e-6).damped_step(&error, self.lambda)?;
            let largest = step.iter().fold(0.0_f64, |a, b| a.max(b.abs()));
            if !largest.is_finite() {
                return None;
            }
            let scale = if largest > self.max_step { self.max_step / largest } else { 1.0 };
            let next: Joints = std::array::from_fn(|i| qs[i] + step[i] * scale);
            qs = self.into_bounds(&next);
        }
        None
    }
}

impl IkSolver for JacobianIkSolver {
    fn solve(
        &self,
        target: &Pose,
        max_attempts: usize,
        timeout: Duration,
        is_valid: &dyn Fn(&Joints) -> bool,
    ) -> Result<Joints, PlanningError> {
        for attempt in 0..max_attempts {
            let start = if attempt == 0 { self.seed } else { self.random_start() };
            let deadline = Instant::now() + timeout;
            match self.converge(target, start, deadline) {
                Some(qs) if self.robot.bounds.satisfies(&qs) && is_valid(&qs) => return Ok(qs),
                Some(_) => debug!("IK attempt {} converged to a rejected configuration", attempt),
                None => debug!("IK attempt {} did not converge", attempt),
            }
        }
        Err(PlanningError::IkFailure {
            attempts: max_attempts,
        })
    }
}
