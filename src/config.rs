//! Reading the library configuration from YAML (optional)
//!
//! ```yaml
//! robot:
//!   preset: irb2400_10          # or parameters: { a1: 0.1, a2: -0.135, ... }
//!   joint_names: [joint_1, joint_2, joint_3, joint_4, joint_5, joint_6]
//!   bounds:
//!     from: [deg(-180), -1.7, -1.0, -3.5, -2.1, -6.3]
//!     to: [deg(180), 1.7, 3.1, 3.5, 2.1, 6.3]
//!   max_velocity: [1.0, 1.0, 1.0, 2.0, 2.0, 2.0]
//!   max_acceleration: [2.0, 2.0, 2.0, 4.0, 4.0, 4.0]
//! world:
//!   ground: 0.0
//!   obstacles:
//!     - { name: post, sphere: { center: [0.5, 0.5, 0.4], radius: 0.1 } }
//! pick_grid: { x: [0.4, 0.6, 2], y: [-0.3, -0.3, 1], z: [0.4, 0.4, 1], orientation: [0.0, 0.0, 1.0, 0.0] }
//! place_grid: { x: [0.4, 0.6, 2], y: [0.3, 0.3, 1], z: [0.4, 0.4, 1], orientation: [0.0, 0.0, 1.0, 0.0] }
//! build:
//!   planner: rrt_connect
//!   planning_attempts: 3
//!   planning_time: 5.0
//! ```
//! Everything except the grids is optional. Angles are in radians unless written as
//! `deg(angle)`, lengths in meters, times in seconds, orientations are quaternions
//! `[w, x, y, z]`.

use std::f64::consts::PI;
use std::path::Path;
use std::time::Duration;
use nalgebra::{Isometry3, Quaternion, UnitQuaternion, Vector3};
use serde::Deserialize;
use serde_saphyr::Options;
use crate::constraints::JointBounds;
use crate::error::LibraryError;
use crate::goal::GoalTolerances;
use crate::grid::{AxisRange, RectGrid, SamplingSettings};
use crate::kinematic_traits::{Joints, DOF};
use crate::library::BuildSettings;
use crate::parameters::Parameters;
use crate::planner::{PlannerKind, WorkspaceBounds};
use crate::robot::{default_joint_names, RobotModel};

#[derive(Debug, Clone, PartialEq)]
pub struct RobotConfig {
    pub parameters: Parameters,
    pub group_name: String,
    pub frame_id: String,
    /// Link constrained by the pose goals.
    pub end_effector_link: String,
    pub joint_names: Vec<String>,
    pub bounds: JointBounds,
    /// Translation of the robot base in the world.
    pub base: Option<Vector3<f64>>,
    /// Translation of the tool center point from the flange.
    pub tool: Option<Vector3<f64>>,
    pub max_velocity: Joints,
    pub max_acceleration: Joints,
    pub link_radius: f64,
}

impl RobotConfig {
    pub fn robot_model(&self) -> RobotModel {
        let base = self.base.map(|t| Isometry3::translation(t.x, t.y, t.z));
        let tool = self.tool.map(|t| Isometry3::translation(t.x, t.y, t.z));
        RobotModel {
            joint_names: self.joint_names.clone(),
            group_name: self.group_name.clone(),
            frame_id: self.frame_id.clone(),
            end_effector_link: self.end_effector_link.clone(),
            max_velocity: self.max_velocity,
            max_acceleration: self.max_acceleration,
            link_radius: self.link_radius,
            ..RobotModel::new(self.parameters, self.bounds, base, tool)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObstacleShape {
    Sphere { center: Vector3<f64>, radius: f64 },
    Box { center: Vector3<f64>, half_extents: Vector3<f64> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObstacleConfig {
    pub name: String,
    pub shape: ObstacleShape,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorldConfig {
    /// Height of the ground plane, if there is one.
    pub ground: Option<f64>,
    pub obstacles: Vec<ObstacleConfig>,
}

#[cfg(feature = "collisions")]
impl WorldConfig {
    /// Adds the ground and the obstacles to the scene.
    pub fn populate(&self, scene: &mut crate::collisions::CollisionScene) {
        use crate::collisions::CollisionObject;
        use nalgebra::Point3;

        if let Some(z) = self.ground {
            scene.add_ground(z as f32);
        }
        for obstacle in &self.obstacles {
            let object = match &obstacle.shape {
                ObstacleShape::Sphere { center, radius } => CollisionObject::sphere(
                    &obstacle.name,
                    Point3::from(center.cast::<f32>()),
                    *radius as f32,
                ),
                ObstacleShape::Box { center, half_extents } => CollisionObject::cuboid(
                    &obstacle.name,
                    Point3::from(center.cast::<f32>()),
                    half_extents.cast::<f32>(),
                ),
            };
            scene.add_object(object);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuildConfig {
    pub planner: PlannerKind,
    pub planning_attempts: usize,
    pub planning_time: Duration,
    pub workspace: WorkspaceBounds,
    pub shortcut_resolution: f64,
    pub slowdown: f64,
    /// IK limits of grid sampling and of pose goals.
    pub sampling: SamplingSettings,
    pub tolerances: GoalTolerances,
    pub restore_place_state_on_return_failure: bool,
    pub rrt_step: f64,
    pub rrt_max_try: usize,
    /// Seed of all random number generators, random if not given.
    pub seed: Option<u64>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            planner: PlannerKind::RrtConnect,
            planning_attempts: 3,
            planning_time: Duration::from_secs(5),
            workspace: WorkspaceBounds::default(),
            shortcut_resolution: 0.05,
            slowdown: 3.0,
            sampling: SamplingSettings::default(),
            tolerances: GoalTolerances::default(),
            restore_place_state_on_return_failure: false,
            rrt_step: 3_f64.to_radians(),
            rrt_max_try: 2000,
            seed: None,
        }
    }
}

impl BuildConfig {
    pub fn build_settings(&self) -> BuildSettings {
        BuildSettings {
            sampling: self.sampling,
            tolerances: self.tolerances,
            restore_place_state_on_return_failure: self.restore_place_state_on_return_failure,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LibraryConfig {
    pub robot: RobotConfig,
    pub world: WorldConfig,
    pub pick_grid: RectGrid,
    pub place_grid: RectGrid,
    pub build: BuildConfig,
}

fn default_offsets() -> [f64; DOF] { [0.0; DOF] }
fn default_sign_corrections() -> [i8; DOF] { [1; DOF] }

#[derive(Deserialize)]
struct ParametersYaml {
    a1: f64,
    a2: f64,
    b: f64,
    c1: f64,
    c2: f64,
    c3: f64,
    c4: f64,
    #[serde(default = "default_offsets")]
    offsets: [f64; DOF],
    #[serde(default = "default_sign_corrections")]
    sign_corrections: [i8; DOF],
}

#[derive(Deserialize)]
struct BoundsYaml {
    from: [f64; DOF],
    to: [f64; DOF],
}

#[derive(Deserialize)]
#[serde(default)]
struct RobotYaml {
    preset: Option<String>,
    parameters: Option<ParametersYaml>,
    group_name: String,
    frame_id: String,
    end_effector_link: String,
    joint_names: Option<Vec<String>>,
    bounds: Option<BoundsYaml>,
    base: Option<[f64; 3]>,
    tool: Option<[f64; 3]>,
    max_velocity: [f64; DOF],
    max_acceleration: [f64; DOF],
    link_radius: f64,
}

impl Default for RobotYaml {
    fn default() -> Self {
        RobotYaml {
            preset: None,
            parameters: None,
            group_name: "manipulator".to_string(),
            frame_id: "world".to_string(),
            end_effector_link: "ee_link".to_string(),
            joint_names: None,
            bounds: None,
            base: None,
            tool: None,
            max_velocity: [1.0; DOF],
            max_acceleration: [2.0; DOF],
            link_radius: 0.05,
        }
    }
}

#[derive(Deserialize)]
struct SphereYaml {
    center: [f64; 3],
    radius: f64,
}

#[derive(Deserialize)]
struct BoxYaml {
    center: [f64; 3],
    half_extents: [f64; 3],
}

#[derive(Deserialize)]
struct ObstacleYaml {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    sphere: Option<SphereYaml>,
    #[serde(default, rename = "box")]
    cuboid: Option<BoxYaml>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct WorldYaml {
    ground: Option<f64>,
    obstacles: Vec<ObstacleYaml>,
}

/// Per axis `[low, high, resolution]`.
#[derive(Deserialize)]
struct GridYaml {
    x: [f64; 3],
    y: [f64; 3],
    z: [f64; 3],
    #[serde(default)]
    orientation: Option<[f64; 4]>,
}

#[derive(Deserialize)]
struct WorkspaceYaml {
    min: [f64; 3],
    max: [f64; 3],
}

#[derive(Deserialize)]
#[serde(default)]
struct BuildYaml {
    planner: String,
    planning_attempts: usize,
    planning_time: f64,
    workspace: Option<WorkspaceYaml>,
    shortcut_resolution: f64,
    slowdown: f64,
    ik_attempts: usize,
    ik_timeout: f64,
    joint_tolerance: f64,
    position_tolerance: f64,
    orientation_tolerance: f64,
    restore_place_state_on_return_failure: bool,
    rrt_step: f64,
    rrt_max_try: usize,
    seed: Option<u64>,
}

impl Default for BuildYaml {
    fn default() -> Self {
        let defaults = BuildConfig::default();
        BuildYaml {
            planner: "rrt_connect".to_string(),
            planning_attempts: defaults.planning_attempts,
            planning_time: defaults.planning_time.as_secs_f64(),
            workspace: None,
            shortcut_resolution: defaults.shortcut_resolution,
            slowdown: defaults.slowdown,
            ik_attempts: defaults.sampling.ik_attempts,
            ik_timeout: defaults.sampling.ik_timeout.as_secs_f64(),
            joint_tolerance: defaults.tolerances.joint,
            position_tolerance: defaults.tolerances.position,
            orientation_tolerance: defaults.tolerances.orientation,
            restore_place_state_on_return_failure: defaults.restore_place_state_on_return_failure,
            rrt_step: defaults.rrt_step,
            rrt_max_try: defaults.rrt_max_try,
            seed: None,
        }
    }
}

#[derive(Deserialize)]
struct Root {
    #[serde(default)]
    robot: RobotYaml,
    #[serde(default)]
    world: WorldYaml,
    pick_grid: GridYaml,
    place_grid: GridYaml,
    #[serde(default)]
    build: BuildYaml,
}

impl LibraryConfig {
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, LibraryError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| LibraryError::io(path, e))?;
        Self::from_yaml_str(&contents)
    }

    /// Parses the configuration. The `deg(angle)` YAML extension is supported.
    pub fn from_yaml_str(contents: &str) -> Result<Self, LibraryError> {
        let root: Root = serde_saphyr::from_str_with_options(
            contents,
            Options { angle_conversions: true, ..Default::default() },
        )
        .map_err(|e| LibraryError::Config(format!("{}", e)))?;

        Ok(LibraryConfig {
            robot: robot_config(root.robot)?,
            world: world_config(root.world)?,
            pick_grid: rect_grid(&root.pick_grid, "pick_grid")?,
            place_grid: rect_grid(&root.place_grid, "place_grid")?,
            build: build_config(root.build)?,
        })
    }
}

fn robot_config(robot: RobotYaml) -> Result<RobotConfig, LibraryError> {
    let parameters = match (robot.preset, robot.parameters) {
        (Some(_), Some(_)) => {
            return Err(LibraryError::Config("robot has both preset and parameters".to_string()));
        }
        (Some(name), None) => Parameters::preset(&name)
            .ok_or_else(|| LibraryError::Config(format!("unknown robot preset {}", name)))?,
        (None, Some(p)) => {
            let parameters = Parameters {
                a1: p.a1,
                a2: p.a2,
                b: p.b,
                c1: p.c1,
                c2: p.c2,
                c3: p.c3,
                c4: p.c4,
                offsets: p.offsets,
                sign_corrections: p.sign_corrections,
            };
            if !parameters.is_valid() {
                return Err(LibraryError::Config(
                    "robot parameters must be finite and sign corrections must be 1 or -1".to_string(),
                ));
            }
            parameters
        }
        (None, None) => Parameters::irb2400_10(),
    };

    let joint_names = match robot.joint_names {
        Some(names) if names.len() != DOF => {
            return Err(LibraryError::Config(format!("{} joint names, expected {}", names.len(), DOF)));
        }
        Some(names) => names,
        None => default_joint_names(),
    };

    let bounds = match robot.bounds {
        Some(b) => JointBounds::new(b.from, b.to),
        None => JointBounds::new([-PI; DOF], [PI; DOF]),
    };

    Ok(RobotConfig {
        parameters,
        group_name: robot.group_name,
        frame_id: robot.frame_id,
        end_effector_link: robot.end_effector_link,
        joint_names,
        bounds,
        base: robot.base.map(Vector3::from),
        tool: robot.tool.map(Vector3::from),
        max_velocity: robot.max_velocity,
        max_acceleration: robot.max_acceleration,
        link_radius: robot.link_radius,
    })
}

fn world_config(world: WorldYaml) -> Result<WorldConfig, LibraryError> {
    let mut obstacles = Vec::with_capacity(world.obstacles.len());
    for (i, item) in world.obstacles.into_iter().enumerate() {
        let name = item.name.unwrap_or_else(|| format!("obstacle_{}", i));
        let shape = match (item.sphere, item.cuboid) {
            (Some(sphere), None) => ObstacleShape::Sphere {
                center: Vector3::from(sphere.center),
                radius: sphere.radius,
            },
            (None, Some(cuboid)) => ObstacleShape::Box {
                center: Vector3::from(cuboid.center),
                half_extents: Vector3::from(cuboid.half_extents),
            },
            _ => {
                return Err(LibraryError::Config(format!(
                    "obstacle {} must be either a sphere or a box",
                    name
                )));
            }
        };
        obstacles.push(ObstacleConfig { name, shape });
    }
    Ok(WorldConfig {
        ground: world.ground,
        obstacles,
    })
}

fn rect_grid(grid: &GridYaml, what: &str) -> Result<RectGrid, LibraryError> {
    let axis = |[low, high, resolution]: [f64; 3], key: &str| -> Result<AxisRange, LibraryError> {
        if resolution < 1.0 || resolution.fract() != 0.0 {
            return Err(LibraryError::Config(format!(
                "{}.{} resolution must be a positive integer, got {}",
                what, key, resolution
            )));
        }
        Ok(AxisRange::new(low, high, resolution as usize))
    };
    let orientation = match grid.orientation {
        Some([w, i, j, k]) => {
            let quaternion = Quaternion::new(w, i, j, k);
            if quaternion.norm() < 1e-9 {
                return Err(LibraryError::Config(format!("{}.orientation is a zero quaternion", what)));
            }
            UnitQuaternion::from_quaternion(quaternion)
        }
        None => UnitQuaternion::identity(),
    };
    Ok(RectGrid {
        x: axis(grid.x, "x")?,
        y: axis(grid.y, "y")?,
        z: axis(grid.z, "z")?,
        orientation,
    })
}

fn seconds(value: f64, key: &str) -> Result<Duration, LibraryError> {
    Duration::try_from_secs_f64(value)
        .map_err(|_| LibraryError::Config(format!("build.{} must be a non-negative time, got {}", key, value)))
}

fn build_config(build: BuildYaml) -> Result<BuildConfig, LibraryError> {
    let planner = PlannerKind::from_name(&build.planner)
        .ok_or_else(|| LibraryError::Config(format!("unknown planner {}", build.planner)))?;
    let workspace = match build.workspace {
        Some(w) => WorkspaceBounds {
            min: Vector3::from(w.min),
            max: Vector3::from(w.max),
        },
        None => WorkspaceBounds::default(),
    };

    Ok(BuildConfig {
        planner,
        planning_attempts: build.planning_attempts,
        planning_time: seconds(build.planning_time, "planning_time")?,
        workspace,
        shortcut_resolution: build.shortcut_resolution,
        slowdown: build.slowdown,
        sampling: SamplingSettings {
            ik_attempts: build.ik_attempts,
            ik_timeout: seconds(build.ik_timeout, "ik_timeout")?,
        },
        tolerances: GoalTolerances {
            joint: build.joint_tolerance,
            position: build.position_tolerance,
            orientation: build.orientation_tolerance,
        },
        restore_place_state_on_return_failure: build.restore_place_state_on_return_failure,
        rrt_step: build.rrt_step,
        rrt_max_try: build.rrt_max_try,
        seed: build.seed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = "
pick_grid: { x: [0.4, 0.6, 2], y: [-0.3, -0.3, 1], z: [0.4, 0.4, 1] }
place_grid: { x: [0.4, 0.4, 1], y: [0.3, 0.3, 1], z: [0.5, 0.5, 1], orientation: [0.0, 0.0, 1.0, 0.0] }
";

    #[test]
    fn test_defaults() {
        let config = LibraryConfig::from_yaml_str(MINIMAL).expect("valid configuration");
        assert_eq!(config.robot.parameters, Parameters::irb2400_10());
        assert_eq!(config.robot.joint_names.len(), 6);
        assert_eq!(config.robot.end_effector_link, "ee_link");
        assert_eq!(config.pick_grid.x.resolution, 2);
        assert!((config.pick_grid.x.spacing() - 0.2).abs() < 1e-12);
        assert_eq!(config.build, BuildConfig::default());
        assert_eq!(config.build.planning_attempts, 3);
        assert_eq!(config.build.sampling.ik_attempts, 10);
        assert!(config.world.obstacles.is_empty());
        assert!((config.place_grid.orientation.j - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_full_configuration() {
        let yaml = format!("{}
robot:
  parameters: {{ a1: 0.15, a2: 0.0, b: 0.0, c1: 0.55, c2: 0.825, c3: 0.625, c4: 0.11 }}
  group_name: arm
  end_effector_link: gripper
  bounds:
    from: [deg(-90.0), -1.0, -1.0, -1.0, -1.0, -1.0]
    to: [deg(90.0), 1.0, 1.0, 1.0, 1.0, 1.0]
  tool: [0.0, 0.0, 0.1]
  link_radius: 0.04
world:
  ground: 0.0
  obstacles:
    - {{ name: post, sphere: {{ center: [0.5, 0.5, 0.4], radius: 0.1 }} }}
    - {{ box: {{ center: [0.0, -0.6, 0.3], half_extents: [0.2, 0.05, 0.3] }} }}
build:
  planner: direct
  planning_attempts: 5
  planning_time: 2.0
  ik_attempts: 4
  ik_timeout: 0.25
  position_tolerance: 0.002
  orientation_tolerance: 0.02
  restore_place_state_on_return_failure: true
  seed: 7
", MINIMAL);
        let config = LibraryConfig::from_yaml_str(&yaml).expect("valid configuration");
        assert_eq!(config.robot.parameters, Parameters::staubli_rx160());
        assert_eq!(config.robot.group_name, "arm");
        assert_eq!(config.robot.end_effector_link, "gripper");
        assert!((config.robot.bounds.to[0] - PI / 2.0).abs() < 1e-9);
        assert_eq!(config.robot.tool, Some(Vector3::new(0.0, 0.0, 0.1)));
        assert_eq!(config.world.ground, Some(0.0));
        assert_eq!(config.world.obstacles.len(), 2);
        assert_eq!(config.world.obstacles[1].name, "obstacle_1");
        assert_eq!(config.build.planner, PlannerKind::Direct);
        assert_eq!(config.build.planning_attempts, 5);
        assert_eq!(config.build.planning_time, Duration::from_secs(2));
        assert_eq!(config.build.sampling.ik_attempts, 4);
        assert_eq!(config.build.sampling.ik_timeout, Duration::from_millis(250));
        assert!(config.build.restore_place_state_on_return_failure);
        assert_eq!(config.build.seed, Some(7));

        let settings = config.build.build_settings();
        assert_eq!(settings.tolerances.position, 0.002);
        assert_eq!(settings.tolerances.orientation, 0.02);
        assert_eq!(settings.sampling.ik_attempts, 4);

        let model = config.robot.robot_model();
        assert_eq!(model.link_radius, 0.04);
        assert_eq!(model.group_name, "arm");
        assert_eq!(model.end_effector_link, "gripper");

        #[cfg(feature = "collisions")]
        {
            let mut scene = crate::collisions::CollisionScene::new(std::sync::Arc::new(model));
            config.world.populate(&mut scene);
            assert_eq!(scene.environment().len(), 3);
        }
    }

    #[test]
    fn test_errors() {
        assert!(matches!(LibraryConfig::from_yaml_str("robot: {}"), Err(LibraryError::Config(_))));
        let bad_resolution = MINIMAL.replace("[0.4, 0.6, 2]", "[0.4, 0.6, 0]");
        assert!(LibraryConfig::from_yaml_str(&bad_resolution).is_err());
        let bad_preset = format!("{}\nrobot: {{ preset: ur5 }}\n", MINIMAL);
        assert!(LibraryConfig::from_yaml_str(&bad_preset).is_err());
        let bad_planner = format!("{}\nbuild: {{ planner: prm }}\n", MINIMAL);
        assert!(LibraryConfig::from_yaml_str(&bad_planner).is_err());
        let both_shapes = format!(
            "{}\nworld: {{ obstacles: [ {{ sphere: {{ center: [0.0, 0.0, 0.0], radius: 0.1 }}, box: {{ center: [0.0, 0.0, 0.0], half_extents: [0.1, 0.1, 0.1] }} }} ] }}\n",
            MINIMAL
        );
        assert!(LibraryConfig::from_yaml_str(&both_shapes).is_err());
        let short_names = format!("{}\nrobot: {{ joint_names: [a, b] }}\n", MINIMAL);
        assert!(LibraryConfig::from_yaml_str(&short_names).is_err());
    }
}
