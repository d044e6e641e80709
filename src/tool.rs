//! Provides tool and base for the robot.
//! Both Tool and Base take arbitrary implementation of Kinematics and are such
//! implementations themselves. Hence, they can be cascaded, like base, having the robot,
//! that robot having a gripper:
//! ```
//! use std::sync::Arc;
//! use nalgebra::Isometry3;
//! use rs_trajectory_library::kinematic_traits::{Joints, Kinematics, Pose};
//! use rs_trajectory_library::kinematics_impl::OpwKinematics;
//! use rs_trajectory_library::parameters::Parameters;
//! use rs_trajectory_library::tool::{Base, Tool};
//!
//! let robot_alone = OpwKinematics::new(Parameters::irb2400_10());
//!
//! // Half meter high pedestal
//! let robot_with_base = Base {
//!   robot: Arc::new(robot_alone),
//!   base: Isometry3::translation(0.0, 0.0, 0.5),
//! };
//!
//! // Gripper extends 15 cm in the Z direction of the flange
//! let robot_complete = Tool {
//!   robot: Arc::new(robot_with_base),
//!   tool: Isometry3::translation(0.0, 0.0, 0.15),
//! };
//!
//! let joints: Joints = [0.0, 0.1, 0.2, 0.3, 0.4, 0.5];
//! let tcp_pose: Pose = robot_complete.forward(&joints);
//! println!("The gripper fingers are at: {:?}", tcp_pose);
//! ```

use std::sync::Arc;
use nalgebra::{Isometry3, Point3};
use crate::kinematic_traits::{Joints, Kinematics, LinkPoints, Pose, P_TOOL};

/// Fixed tool (gripper) attached to the flange. The tool point reported by
/// `link_points` moves to the tool center point, so the last link capsule
/// covers the tool.
#[derive(Clone)]
pub struct Tool {
    pub robot: Arc<dyn Kinematics>,

    /// Transformation from the flange to the tool center point.
    pub tool: Isometry3<f64>,
}

/// Fixed base (pedestal) holding the robot, placing it into the cell.
#[derive(Clone)]
pub struct Base {
    pub robot: Arc<dyn Kinematics>,

    /// Transformation from the world origin to the robot base.
    pub base: Isometry3<f64>,
}

impl Kinematics for Tool {
    fn forward(&self, qs: &Joints) -> Pose {
        self.robot.forward(qs) * self.tool
    }

    fn link_points(&self, qs: &Joints) -> LinkPoints {
        let mut points = self.robot.link_points(qs);
        points[P_TOOL] = Point3::from(self.forward(qs).translation.vector);
        points
    }
}

impl Kinematics for Base {
    fn forward(&self, qs: &Joints) -> Pose {
        self.base * self.robot.forward(qs)
    }

    fn link_points(&self, qs: &Joints) -> LinkPoints {
        self.robot
            .link_points(qs)
            .map(|point| self.base.transform_point(&point))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinematic_traits::{P_BASE, P_WRIST};
    use crate::kinematics_impl::OpwKinematics;
    use crate::parameters::Parameters;

    #[test]
    fn test_base_and_tool_cascade() {
        let robot = Arc::new(OpwKinematics::new(Parameters::staubli_rx160()));
        let on_base = Arc::new(Base {
            robot: robot.clone(),
            base: Isometry3::translation(0.0, 0.0, 0.5),
        });
        let complete = Tool {
            robot: on_base,
            tool: Isometry3::translation(0.0, 0.0, 0.2),
        };
        let joints = [0.0; 6];

        let bare = robot.forward(&joints).translation.vector;
        let full = complete.forward(&joints).translation.vector;
        // Straight up: pedestal and tool both add to z
        assert!((full.z - (bare.z + 0.7)).abs() < 1e-9);

        let points = complete.link_points(&joints);
        assert!((points[P_BASE].z - 0.5).abs() < 1e-9);
        assert!((points[P_TOOL].coords - full).norm() < 1e-9);
        assert!((points[P_TOOL] - points[P_WRIST]).norm() > robot.parameters().c4);
    }
}
