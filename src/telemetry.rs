//! Logging setup and the fire-and-forget publishing of scene states and trajectories

use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use crate::trajectory::{JointState, JointTrajectory};
use crate::utils::format_joints;

/// Initialize the tracing subscriber with the given log level.
///
/// Priority: `RUST_LOG` env var > `log_level` parameter.
/// Calling it again after a subscriber is installed does nothing.
pub fn init_logging(log_level: &str) {
    let default_filter = format!("{},rs_trajectory_library={}", log_level, log_level);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false))
        .try_init()
        .ok();
}

/// Receiver of what the builder and the replay want to show. Nothing is acknowledged
/// and failures of the receiver are never reported back.
pub trait TelemetrySink: Send + Sync {
    /// The current state of the planning scene changed.
    fn publish_scene(&self, state: &JointState);

    /// Trajectories to display one after another, starting from `start`.
    fn publish_trajectories(&self, start: &JointState, trajectories: &[&JointTrajectory]);
}

/// Writes what is published as debug log records.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TelemetrySink for TracingSink {
    fn publish_scene(&self, state: &JointState) {
        debug!(frame = %state.header.frame_id, "Scene state {}", format_joints(&state.joints()));
    }

    fn publish_trajectories(&self, start: &JointState, trajectories: &[&JointTrajectory]) {
        for (i, trajectory) in trajectories.iter().enumerate() {
            debug!(
                "Trajectory {} from {}: {} waypoints, {:.3} s",
                i,
                format_joints(&start.joints()),
                trajectory.len(),
                trajectory.duration()
            );
        }
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl TelemetrySink for NullSink {
    fn publish_scene(&self, _state: &JointState) {}

    fn publish_trajectories(&self, _start: &JointState, _trajectories: &[&JointTrajectory]) {}
}
