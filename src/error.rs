//! Error types of the library builder and the plan store

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures while producing a joint target or a motion plan. None of these is fatal:
/// the grid sampler skips the sample, the planning pipeline retries and the library
/// builder moves on to the next pair.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanningError {
    /// Inverse kinematics did not converge to a valid configuration.
    #[error("no valid IK solution after {attempts} attempts")]
    IkFailure { attempts: usize },

    /// The planner did not return a trajectory.
    #[error("planner failed: {0}")]
    PlannerFailure(String),

    /// The planner returned a trajectory that does not pass validation against the scene.
    #[error("path invalid")]
    PathInvalid,

    /// The trajectory is empty or its last waypoint satisfies none of the goals.
    #[error("trajectory does not reach the goal")]
    GoalNotReached,

    /// All planning attempts failed.
    #[error("planning failed after {attempts} attempts, last error: {last}")]
    RetriesExhausted {
        attempts: usize,
        last: Box<PlanningError>,
    },
}

/// Joint value outside the position bounds of the actuated group. This is advisory:
/// it is reported and logged but the value is still used.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("joint {joint} value {value:.4} outside bounds [{from:.4}, {to:.4}]")]
pub struct BoundsViolation {
    pub joint: usize,
    pub value: f64,
    pub from: f64,
    pub to: f64,
}

/// Errors of reading and writing the plan library, and of reading configuration.
#[derive(Debug, Error)]
pub enum LibraryError {
    /// File cannot be opened or created.
    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Read or write failed in the middle of the stream (includes truncated files).
    #[error("I/O error: {0}")]
    Stream(#[from] io::Error),

    #[error("not a plan library file, magic {0:?}")]
    BadMagic([u8; 4]),

    #[error("unsupported plan library version {0}")]
    UnsupportedVersion(u32),

    /// The records after the file header cannot be serialized or deserialized.
    #[error("plan library encoding: {0}")]
    Encoding(String),

    /// The record cannot be represented in, or was not correctly read from, the file.
    #[error("corrupt plan record: {0}")]
    Corrupt(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    /// Replay found no plan leaving the target it stands at.
    #[error("no {leg} plan from target {from} after {tries} draws")]
    NoContinuation {
        leg: &'static str,
        from: u32,
        tries: usize,
    },
}

impl LibraryError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        LibraryError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn corrupt(reason: impl Into<String>) -> Self {
        LibraryError::Corrupt(reason.into())
    }
}

impl From<bincode::Error> for LibraryError {
    /// I/O failures inside bincode stay stream errors.
    fn from(err: bincode::Error) -> Self {
        match *err {
            bincode::ErrorKind::Io(source) => LibraryError::Stream(source),
            other => LibraryError::Encoding(other.to_string()),
        }
    }
}
