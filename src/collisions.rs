//! Implements collision detection

use std::sync::Arc;
use nalgebra::{Isometry3, Point3, Vector3};
use parry3d::shape::{Capsule, Shape, SharedShape};
use rayon::prelude::{IntoParallelRefIterator, ParallelIterator};
use tracing::{info, warn};
use crate::collisions_traits::StateValidity;
use crate::kinematic_traits::Joints;
use crate::robot::RobotModel;
use crate::trajectory::JointTrajectory;
use crate::utils::{format_joints, is_finite};

/// Names of the link capsules, in the order of the link points they connect.
pub const LINK_NAMES: [&str; 4] = ["base", "upper_arm", "forearm", "wrist"];

/// Pairs of links checked for self collision. Adjacent links share a point
/// and always touch, so they are not checked.
const SELF_PAIRS: [(usize, usize); 3] = [(0, 2), (0, 3), (1, 3)];

pub const GROUND: &str = "ground";

/// Static object against that we check the robot does not collide.
/// It has the global transform allowing to place it where desired.
#[derive(Clone)]
pub struct CollisionObject {
    pub name: String,
    pub shape: SharedShape,
    /// Global transform of this collision object.
    pub pose: Isometry3<f32>,
}

impl CollisionObject {
    /// Horizontal plane, everything below `z` is occupied.
    pub fn ground(z: f32) -> Self {
        CollisionObject {
            name: GROUND.to_string(),
            shape: SharedShape::halfspace(Vector3::z_axis()),
            pose: Isometry3::translation(0.0, 0.0, z),
        }
    }

    pub fn sphere(name: &str, center: Point3<f32>, radius: f32) -> Self {
        CollisionObject {
            name: name.to_string(),
            shape: SharedShape::ball(radius),
            pose: Isometry3::translation(center.x, center.y, center.z),
        }
    }

    /// Axis aligned box given by its center and half extents.
    pub fn cuboid(name: &str, center: Point3<f32>, half_extents: Vector3<f32>) -> Self {
        CollisionObject {
            name: name.to_string(),
            shape: SharedShape::cuboid(half_extents.x, half_extents.y, half_extents.z),
            pose: Isometry3::translation(center.x, center.y, center.z),
        }
    }
}

/// The planning scene: robot links approximated by capsules between the link points,
/// and the static environment. Immutable while planning, so path checks may run
/// in parallel.
pub struct CollisionScene {
    robot: Arc<RobotModel>,
    environment: Vec<CollisionObject>,
    /// Link index and object name pairs that are never checked.
    allowed: Vec<(usize, String)>,
}

impl CollisionScene {
    pub fn new(robot: Arc<RobotModel>) -> Self {
        CollisionScene {
            robot,
            environment: Vec::new(),
            allowed: Vec::new(),
        }
    }

    pub fn robot(&self) -> &Arc<RobotModel> {
        &self.robot
    }

    pub fn environment(&self) -> &[CollisionObject] {
        &self.environment
    }

    pub fn add_object(&mut self, object: CollisionObject) {
        self.environment.push(object);
    }

    /// Adds the ground plane. The base link stands on it, so that pair is allowed.
    pub fn add_ground(&mut self, z: f32) {
        self.add_object(CollisionObject::ground(z));
        self.allow(0, GROUND);
    }

    pub fn allow(&mut self, link: usize, object: &str) {
        self.allowed.push((link, object.to_string()));
    }

    fn is_allowed(&self, link: usize, object: &str) -> bool {
        self.allowed.iter().any(|(l, o)| *l == link && o == object)
    }

    fn link_capsules(&self, joints: &Joints) -> [Capsule; 4] {
        let points = self.robot.kinematics.link_points(joints);
        let radius = self.robot.link_radius as f32;
        std::array::from_fn(|i| Capsule::new(points[i].cast::<f32>(), points[i + 1].cast::<f32>(), radius))
    }

    /// Names of the first colliding pair, if any.
    pub fn first_collision(&self, joints: &Joints) -> Option<(String, String)> {
        let capsules = self.link_capsules(joints);
        let at_origin = Isometry3::identity();

        for (i, j) in SELF_PAIRS {
            if intersects(&at_origin, &capsules[i], &at_origin, &capsules[j]) {
                return Some((LINK_NAMES[i].to_string(), LINK_NAMES[j].to_string()));
            }
        }

        for (i, capsule) in capsules.iter().enumerate() {
            for object in &self.environment {
                if self.is_allowed(i, &object.name) {
                    continue;
                }
                if intersects(&at_origin, capsule, &object.pose, &*object.shape) {
                    return Some((LINK_NAMES[i].to_string(), object.name.clone()));
                }
            }
        }
        None
    }

    pub fn collides(&self, joints: &Joints) -> bool {
        self.first_collision(joints).is_some()
    }
}

fn intersects(pos1: &Isometry3<f32>, shape1: &dyn Shape, pos2: &Isometry3<f32>, shape2: &dyn Shape) -> bool {
    match parry3d::query::intersection_test(pos1, shape1, pos2, shape2) {
        Ok(hit) => hit,
        Err(_) => {
            warn!("Intersection test not supported for this shape pair, assuming collision");
            true
        }
    }
}

impl StateValidity for CollisionScene {
    fn is_state_valid(&self, joints: &Joints, verbose: bool) -> bool {
        if !is_finite(joints) {
            return false;
        }
        if let Some(violation) = self.robot.bounds.check(joints) {
            if verbose {
                info!("State {} rejected: {}", format_joints(joints), violation);
            }
            return false;
        }
        match self.first_collision(joints) {
            Some((a, b)) => {
                if verbose {
                    info!("State {} rejected: {} collides with {}", format_joints(joints), a, b);
                }
                false
            }
            None => true,
        }
    }

    fn is_path_valid(&self, start: &Joints, trajectory: &JointTrajectory) -> bool {
        self.is_state_valid(start, false)
            && trajectory
                .points
                .par_iter()
                .all(|point| self.is_state_valid(&point.positions, false))
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;
    use super::*;
    use crate::constraints::JointBounds;
    use crate::parameters::Parameters;
    use crate::trajectory::Waypoint;

    fn scene() -> CollisionScene {
        let bounds = JointBounds::new([-4.0; 6], [4.0; 6]);
        let robot = RobotModel::new(Parameters::staubli_rx160(), bounds, None, None);
        let mut scene = CollisionScene::new(Arc::new(robot));
        scene.add_ground(0.0);
        scene
    }

    #[test]
    fn test_upright_is_free() {
        let scene = scene();
        assert!(scene.is_state_valid(&[0.0; 6], true));
    }

    #[test]
    fn test_out_of_bounds_rejected() {
        let scene = scene();
        assert!(!scene.is_state_valid(&[5.0, 0.0, 0.0, 0.0, 0.0, 0.0], true));
    }

    #[test]
    fn test_ground_collision() {
        let scene = scene();
        // Upper arm tilted far forward, the elbow goes below the floor
        let collision = scene.first_collision(&[0.0, 2.5, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(collision.map(|(_, object)| object), Some(GROUND.to_string()));
    }

    #[test]
    fn test_self_collision() {
        let scene = scene();
        // Forearm folded down over the base column, the flange hits the base link
        let collision = scene.first_collision(&[0.0, 0.0, PI, 0.0, 0.0, 0.0]);
        assert_eq!(collision, Some(("base".to_string(), "wrist".to_string())));
    }

    #[test]
    fn test_obstacle_at_tool() {
        let mut scene = scene();
        let p = Parameters::staubli_rx160();
        let top = (p.c1 + p.c2 + p.c3 + p.c4) as f32;
        scene.add_object(CollisionObject::sphere("ball", Point3::new(p.a1 as f32, 0.0, top), 0.05));
        assert!(scene.collides(&[0.0; 6]));
        assert!(!scene.collides(&[1.0, 0.0, 0.0, 0.0, 0.0, 0.0]));
    }

    #[test]
    fn test_path_checks_every_waypoint() {
        let mut scene = scene();
        scene.add_object(CollisionObject::cuboid(
            "wall", Point3::new(1.0, 0.0, 1.0), Vector3::new(0.05, 2.0, 2.0)));
        let mut trajectory = JointTrajectory::default();
        trajectory.points.push(Waypoint::new([0.0; 6]));
        assert!(scene.is_path_valid(&[0.0; 6], &trajectory));

        // Leaning forward into the wall
        trajectory.points.push(Waypoint::new([0.0, 1.0, 0.0, 0.0, 0.0, 0.0]));
        assert!(!scene.is_path_valid(&[0.0; 6], &trajectory));
    }
}
