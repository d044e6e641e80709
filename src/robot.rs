use std::sync::Arc;
use nalgebra::Isometry3;
use crate::constraints::JointBounds;
use crate::kinematic_traits::{Joints, Kinematics, DOF};
use crate::kinematics_impl::OpwKinematics;
use crate::parameters::Parameters;
use crate::tool::{Base, Tool};

/// Struct that combines the kinematic model of the arm with everything the planning
/// needs to know about the actuated group: joint bounds, joint names, the frame
/// where poses are expressed and the dynamic limits used for timing.
#[derive(Clone)]
pub struct RobotModel {
    /// The kinematic model of the robot, possibly with base and tool attached.
    pub kinematics: Arc<dyn Kinematics>,

    /// Position bounds of the actuated group.
    pub bounds: JointBounds,

    /// Names of the six joints, in the order of the values in `Joints`.
    pub joint_names: Vec<String>,

    /// Name of the actuated group (like "manipulator").
    pub group_name: String,

    /// Frame of the poses (like "world").
    pub frame_id: String,

    /// Name of the link whose pose is constrained by the pose goals.
    pub end_effector_link: String,

    /// Per joint velocity limit, rad/s
    pub max_velocity: Joints,

    /// Per joint acceleration limit, rad/s²
    pub max_acceleration: Joints,

    /// Radius of the capsules approximating the links in collision checks, meters.
    pub link_radius: f64,
}

impl RobotModel {
    /// Constructs the model of an OPW arm with optional base and tool transforms.
    /// The rest of the fields get reasonable defaults that can be overwritten
    /// with struct update syntax.
    pub fn new(
        parameters: Parameters,
        bounds: JointBounds,
        base: Option<Isometry3<f64>>,
        tool: Option<Isometry3<f64>>,
    ) -> Self {
        let mut kinematics: Arc<dyn Kinematics> = Arc::new(OpwKinematics::new(parameters));
        if let Some(base) = base {
            kinematics = Arc::new(Base {
                robot: kinematics,
                base,
            });
        }
        if let Some(tool) = tool {
            kinematics = Arc::new(Tool {
                robot: kinematics,
                tool,
            });
        }
        Self::with_kinematics(kinematics, bounds)
    }

    /// Wraps arbitrary kinematics (used by tests with simplified arms).
    pub fn with_kinematics(kinematics: Arc<dyn Kinematics>, bounds: JointBounds) -> Self {
        RobotModel {
            kinematics,
            bounds,
            joint_names: default_joint_names(),
            group_name: "manipulator".to_string(),
            frame_id: "world".to_string(),
            end_effector_link: "ee_link".to_string(),
            max_velocity: [1.0; DOF],
            max_acceleration: [2.0; DOF],
            link_radius: 0.05,
        }
    }
}

pub fn default_joint_names() -> Vec<String> {
    (1..=DOF).map(|i| format!("joint_{}", i)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinematic_traits::JOINTS_AT_ZERO;

    #[test]
    fn test_base_and_tool_applied() {
        let bounds = JointBounds::new([-3.0; 6], [3.0; 6]);
        let bare = RobotModel::new(Parameters::staubli_rx160(), bounds, None, None);
        let full = RobotModel::new(
            Parameters::staubli_rx160(),
            bounds,
            Some(Isometry3::translation(0.0, 0.0, 0.3)),
            Some(Isometry3::translation(0.0, 0.0, 0.1)),
        );
        let z_bare = bare.kinematics.forward(&JOINTS_AT_ZERO).translation.z;
        let z_full = full.kinematics.forward(&JOINTS_AT_ZERO).translation.z;
        assert!((z_full - z_bare - 0.4).abs() < 1e-9);
        assert_eq!(full.joint_names.len(), DOF);
        assert_eq!(full.joint_names[0], "joint_1");
    }
}
