//! Robot configuration structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use comms_if::pos::{CartesianPosition, JointPosition};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Geometry and initial pose of the robot.
///
/// Created once at startup and never modified for the lifetime of a
/// simulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RobotConfig {
    // ---- GEOMETRY ----
    /// Distance between the two motor axes (lc).
    ///
    /// Units: meters
    pub motor_distance_m: f64,

    /// Length of the arms driven by the motors (la).
    ///
    /// Units: meters
    pub base_arm_length_m: f64,

    /// Length of the passive arms joining the elbows to the tool point (lb).
    ///
    /// Units: meters
    pub link_arm_length_m: f64,

    /// Offset of the tool centre point from the point where the link arms
    /// meet.
    ///
    /// Units: meters
    #[serde(default)]
    pub tcp_offset_m: [f64; 2],

    // ---- INITIAL STATE ----
    /// Motor angles the robot starts from, theta 1 then theta 4.
    ///
    /// Units: radians
    #[serde(default = "default_initial_joint_position")]
    pub initial_joint_position_rad: [f64; 2],
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors raised when validating a robot configuration.
#[derive(Debug, thiserror::Error)]
pub enum RobotConfigError {
    #[error("The {0} must be a positive length, found {1}")]
    InvalidLength(&'static str, f64),

    #[error("The {0} must be finite")]
    NotFinite(&'static str),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RobotConfig {
    /// Create a new configuration with no tool offset, starting with both
    /// base arms pointing straight up.
    pub fn new(motor_distance_m: f64, base_arm_length_m: f64, link_arm_length_m: f64) -> Self {
        Self {
            motor_distance_m,
            base_arm_length_m,
            link_arm_length_m,
            tcp_offset_m: [0.0, 0.0],
            initial_joint_position_rad: default_initial_joint_position(),
        }
    }

    /// Check that the configuration describes a physical robot.
    pub fn validate(&self) -> Result<(), RobotConfigError> {
        for (name, length) in [
            ("motor distance", self.motor_distance_m),
            ("base arm length", self.base_arm_length_m),
            ("link arm length", self.link_arm_length_m),
        ] {
            if !(length.is_finite() && length > 0.0) {
                return Err(RobotConfigError::InvalidLength(name, length));
            }
        }

        if !self.tcp_offset_m.iter().all(|v| v.is_finite()) {
            return Err(RobotConfigError::NotFinite("TCP offset"));
        }

        if !self.initial_joint_position().is_finite() {
            return Err(RobotConfigError::NotFinite("initial joint position"));
        }

        Ok(())
    }

    /// The tool centre point offset as a vector.
    pub fn tcp_offset(&self) -> CartesianPosition {
        CartesianPosition::new(self.tcp_offset_m[0], self.tcp_offset_m[1])
    }

    pub fn initial_joint_position(&self) -> JointPosition {
        JointPosition::from(self.initial_joint_position_rad)
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn default_initial_joint_position() -> [f64; 2] {
    [std::f64::consts::FRAC_PI_2, std::f64::consts::FRAC_PI_2]
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(RobotConfig::new(0.08, 0.08, 0.12).validate().is_ok());

        assert!(matches!(
            RobotConfig::new(0.08, 0.0, 0.12).validate(),
            Err(RobotConfigError::InvalidLength("base arm length", _))
        ));
        assert!(matches!(
            RobotConfig::new(-0.08, 0.08, 0.12).validate(),
            Err(RobotConfigError::InvalidLength("motor distance", _))
        ));

        let mut config = RobotConfig::new(0.08, 0.08, 0.12);
        config.tcp_offset_m = [f64::NAN, 0.0];
        assert!(matches!(
            config.validate(),
            Err(RobotConfigError::NotFinite(_))
        ));
    }

    #[test]
    fn test_deserialise_defaults() {
        let config: RobotConfig = util::params::from_str(
            "motor_distance_m = 0.08\nbase_arm_length_m = 0.08\nlink_arm_length_m = 0.12",
        )
        .unwrap();

        assert_eq!(config, RobotConfig::new(0.08, 0.08, 0.12));
        assert_eq!(config.tcp_offset(), CartesianPosition::zeros());
    }
}
