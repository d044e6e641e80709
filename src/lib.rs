//! Builds, stores and replays a library of pick and place trajectories for a six-axis
//! industrial robot.
//!
//! Two rectangular grids of tool poses (the pick volume and the place volume) are
//! sampled with inverse kinematics into joint targets. For every pair of a place target
//! and a pick target, two collision free motions are planned: the pick leg from the place
//! target to the pick target, and the place leg back. Each motion goes through the same
//! pipeline: a planner (RRT-Connect by default) produces a joint path, the path is
//! shortened by removing waypoints that can be skipped without collision, time stamps
//! are computed and the result is validated against the planning scene. Failed pairs
//! are skipped; a partial library is a normal outcome.
//!
//! The finished plans are written to two binary files, one per leg, and can be read back,
//! queried by target indices or chained into an endless random pick and place replay.
//!
//! # Features
//!
//! - Robot kinematics from the seven OPW parameters, with optional tool and base.
//! - Damped least squares inverse kinematics with random restarts and a time budget.
//! - Collision checking of link capsules against self and against the world (`collisions`).
//! - Bidirectional RRT planning in joint space (`rrt_planning`).
//! - YAML configuration and the `trajectory-library` command line tool (`allow_filesystem`).
//!
//! ## Example
//!
//! ```
//! use rs_trajectory_library::grid::{AxisRange, RectGrid};
//! use nalgebra::UnitQuaternion;
//!
//! let grid = RectGrid {
//!     x: AxisRange::new(0.4, 0.6, 3),
//!     y: AxisRange::new(-0.2, 0.2, 2),
//!     z: AxisRange::new(0.5, 0.5, 1),
//!     orientation: UnitQuaternion::identity(),
//! };
//! assert_eq!(grid.sample_count(), 6);
//! ```

pub mod error;

pub mod parameters;

pub mod kinematic_traits;
pub mod kinematics_impl;

pub mod tool;

pub mod constraints;

pub mod robot;

pub mod jakobian;

pub mod ik;

#[path = "utils/utils.rs"]
pub mod utils;

pub mod trajectory;

pub mod collisions_traits;

#[cfg(feature = "collisions")]
pub mod collisions;

pub mod goal;

pub mod time_parameterization;

pub mod planner;

#[cfg(feature = "rrt_planning")]
#[path = "path_plan/rrt.rs"]
pub mod rrt;

#[cfg(feature = "rrt_planning")]
#[path = "path_plan/rrt_to.rs"]
mod rrt_to;

#[path = "path_plan/shortcut.rs"]
pub mod shortcut;

pub mod plan_pipeline;

pub mod grid;

pub mod telemetry;

pub mod plan_store;

pub mod library;

pub mod replay;

#[cfg(feature = "allow_filesystem")]
pub mod config;

#[cfg(test)]
mod tests;
