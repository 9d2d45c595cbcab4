//! # Position types
//!
//! Positions of the robot expressed either in the joint space of the two
//! motors or in the Cartesian base frame of the robot.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// TYPES
// ------------------------------------------------------------------------------------------------

/// Position of the tool centre point in the robot's base frame.
///
/// The origin is at the left motor's axis and the x axis points toward the
/// right motor.
///
/// Units: meters
pub type CartesianPosition = Vector2<f64>;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Angles of the two motors.
///
/// The range is unconstrained, the kinematic equations are periodic.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointPosition {
    /// Angle of the left motor (theta 1).
    ///
    /// Units: radians
    pub theta_1_rad: f64,

    /// Angle of the right motor (theta 4).
    ///
    /// Units: radians
    pub theta_4_rad: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl JointPosition {
    pub fn new(theta_1_rad: f64, theta_4_rad: f64) -> Self {
        Self {
            theta_1_rad,
            theta_4_rad,
        }
    }

    /// True if both angles are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.theta_1_rad.is_finite() && self.theta_4_rad.is_finite()
    }
}

impl From<[f64; 2]> for JointPosition {
    fn from(a: [f64; 2]) -> Self {
        Self::new(a[0], a[1])
    }
}

impl From<JointPosition> for [f64; 2] {
    fn from(j: JointPosition) -> Self {
        [j.theta_1_rad, j.theta_4_rad]
    }
}
