//! # Simulation library.
//!
//! This library allows other crates in the workspace to access items defined inside the
//! simulation crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Drawing loader - fits a CSV drawing into the robot's workspace
pub mod drawing;

/// Executable parameters
pub mod params;

/// Rate control - fixed period timing of the control loop
pub mod rate;

/// Robot module - geometry, kinematics and state of the five-bar linkage
pub mod robot;

/// Simulation control module - steps the robot along commanded trajectories
pub mod sim_ctrl;

/// Simulation - runs the control loop on its own thread
pub mod simulation;

/// Trajectory module - constant velocity straight line trajectories
pub mod traj;
