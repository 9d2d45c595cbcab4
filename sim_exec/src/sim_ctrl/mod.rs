//! # Simulation control module
//!
//! Moves the simulated robot along straight line trajectories towards the
//! commanded targets, one waypoint per cycle. [`SimCtrl`] holds the robot
//! state and the active trajectory, [`ControlLoop`] runs it at a fixed rate
//! against the shared command queue and telemetry mailbox.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod control_loop;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use control_loop::*;
pub use params::*;
pub use state::*;

use crate::robot::{KinematicsError, RobotConfigError};
use comms_if::tc::Command;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during SimCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum SimCtrlError {
    #[error("SimCtrl has not been initialised")]
    NotInit,

    #[error("Invalid robot configuration: {0}")]
    InvalidRobotConfig(RobotConfigError),

    #[error("Invalid SimCtrl parameters: {0}")]
    InvalidParams(ParamsError),

    #[error("The initial joint position has no forward solution: {0}")]
    InvalidInitialPosition(KinematicsError),

    #[error("Received a new command while a trajectory is still being tracked: {0:?}")]
    CommandWhileTracking(Command),
}
