//! Rectangular Cartesian grids and their joint space targets

use std::time::Duration;
use nalgebra::{Translation3, UnitQuaternion, Vector3};
use tracing::{debug, warn};
use crate::collisions_traits::StateValidity;
use crate::kinematic_traits::{IkSolver, Joints, Pose};
use crate::utils::format_joints;

/// Sampling range along one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisRange {
    pub low: f64,
    pub high: f64,
    /// Number of samples, at least 1.
    pub resolution: usize,
}

impl AxisRange {
    pub fn new(low: f64, high: f64, resolution: usize) -> Self {
        AxisRange {
            low,
            high,
            resolution: resolution.max(1),
        }
    }

    /// Distance between two samples, 0 if there is a single sample.
    pub fn spacing(&self) -> f64 {
        if self.resolution <= 1 {
            0.0
        } else {
            (self.high - self.low) / (self.resolution - 1) as f64
        }
    }

    pub fn value(&self, index: usize) -> f64 {
        self.low + index as f64 * self.spacing()
    }
}

/// Axis aligned sampling volume with one tool orientation for all samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectGrid {
    pub x: AxisRange,
    pub y: AxisRange,
    pub z: AxisRange,
    pub orientation: UnitQuaternion<f64>,
}

impl RectGrid {
    pub fn sample_count(&self) -> usize {
        self.x.resolution * self.y.resolution * self.z.resolution
    }

    /// Sample points, x outermost and z innermost.
    pub fn sample_points(&self) -> Vec<Vector3<f64>> {
        let mut points = Vec::with_capacity(self.sample_count());
        for i in 0..self.x.resolution {
            for j in 0..self.y.resolution {
                for k in 0..self.z.resolution {
                    points.push(Vector3::new(self.x.value(i), self.y.value(j), self.z.value(k)));
                }
            }
        }
        points
    }

    /// Tool poses of all samples, in the order of `sample_points`.
    pub fn sample_poses(&self) -> Vec<Pose> {
        self.sample_points()
            .into_iter()
            .map(|p| Pose::from_parts(Translation3::from(p), self.orientation))
            .collect()
    }
}

/// Grid together with the configurations solved for it.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetVolume {
    pub grid: RectGrid,
    pub joints: Vec<Joints>,
}

impl TargetVolume {
    pub fn target_count(&self) -> usize {
        self.joints.len()
    }
}

/// IK limits used while sampling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingSettings {
    pub ik_attempts: usize,
    pub ik_timeout: Duration,
}

impl Default for SamplingSettings {
    fn default() -> Self {
        SamplingSettings {
            ik_attempts: 10,
            ik_timeout: Duration::from_millis(100),
        }
    }
}

/// Solves IK at every sample point. Samples without a valid solution are skipped,
/// the rest keep the order of the sweep.
pub fn grid_linspace(
    grid: &RectGrid,
    ik: &dyn IkSolver,
    scene: &dyn StateValidity,
    settings: &SamplingSettings,
) -> Vec<Joints> {
    let is_valid = |qs: &Joints| scene.is_state_valid(qs, false);
    let mut solved = Vec::with_capacity(grid.sample_count());
    for pose in grid.sample_poses() {
        let point = pose.translation.vector;
        match ik.solve(&pose, settings.ik_attempts, settings.ik_timeout, &is_valid) {
            Ok(joints) => {
                debug!("Target ({:.3}, {:.3}, {:.3}): {}", point.x, point.y, point.z, format_joints(&joints));
                solved.push(joints);
            }
            Err(err) => {
                warn!("Skipping target ({:.3}, {:.3}, {:.3}): {}", point.x, point.y, point.z, err);
            }
        }
    }
    solved
}
