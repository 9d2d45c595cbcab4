//! # Simulation Executable Parameters
//!
//! This module provides the parameters loaded by the simulation executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::{
    robot::{BranchPolicy, RobotConfig},
    sim_ctrl::{self, InitData},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimExecParams {
    /// Geometry and initial pose of the simulated robot
    pub robot: RobotConfig,

    /// Roots used by the kinematics
    #[serde(default)]
    pub branches: BranchPolicy,

    /// Control loop parameters
    pub sim_ctrl: sim_ctrl::Params,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimExecParams {
    /// The data needed to start a simulation with these parameters.
    pub fn init_data(&self) -> InitData {
        InitData {
            robot: self.robot,
            branches: self.branches,
            params: self.sim_ctrl,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
