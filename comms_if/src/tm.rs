//! # Telemetry

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::pos::{CartesianPosition, JointPosition};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Snapshot of the robot state, copied out of the loop once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    /// Current motor angles
    pub joint_position: JointPosition,

    /// Current tool centre point position
    pub cartesian_position_m: CartesianPosition,

    /// Whether the pen is down
    pub drawing: bool,
}
