//! Helper functions

use crate::kinematic_traits::{Joints, DOF};

/// Checks if all elements in the array are finite
pub fn is_finite(qs: &Joints) -> bool {
    qs.iter().all(|&q| q.is_finite())
}

/// Joint values in degrees, formatted for log records.
pub fn format_joints(joints: &Joints) -> String {
    let mut row_str = String::new();
    for joint_idx in 0..DOF {
        row_str.push_str(&format!("{:5.2} ", joints[joint_idx].to_degrees()));
    }
    format!("[{}]", row_str.trim_end())
}

/// Euclidean distance between two configurations in joint space.
pub fn joint_distance(a: &Joints, b: &Joints) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Straight line interpolation in joint space, `fraction` 0 gives `from`, 1 gives `to`.
pub fn interpolate_joints(from: &Joints, to: &Joints, fraction: f64) -> Joints {
    std::array::from_fn(|i| from[i] + (to[i] - from[i]) * fraction)
}
