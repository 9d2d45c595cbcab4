//! # Robot module
//!
//! Geometry, kinematics and state of the five-bar linkage.
//!
//! The linkage is made of two motors a fixed distance apart. Each motor
//! drives a base arm which ends at an elbow, and both elbows are joined to
//! the tool point by a pair of passive link arms.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod config;
mod kinematics;
mod state;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use config::*;
pub use kinematics::*;
pub use state::*;
