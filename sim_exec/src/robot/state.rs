//! Robot state
//!
//! The joint and cartesian positions are stored together and only ever
//! changed together, each mutator computes the other representation first
//! and then swaps both in.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
use super::{Kinematics, KinematicsError};
use comms_if::{
    pos::{CartesianPosition, JointPosition},
    tm::Telemetry,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Current pose of the robot.
#[derive(Debug, Clone)]
pub struct RobotState {
    kinematics: Kinematics,

    joint_position: JointPosition,

    cartesian_position_m: CartesianPosition,

    /// True while the pen is down
    drawing: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RobotState {
    /// Create the state at the configured initial joint position.
    ///
    /// Fails if the initial joint position has no forward solution.
    pub fn new(kinematics: Kinematics) -> Result<Self, KinematicsError> {
        let joint_position = kinematics.config().initial_joint_position();
        let cartesian_position_m = kinematics.forward(&joint_position)?;

        Ok(Self {
            kinematics,
            joint_position,
            cartesian_position_m,
            drawing: false,
        })
    }

    /// Move the robot to the given motor angles.
    ///
    /// On error the state is left unchanged.
    pub fn set_joint_position(&mut self, joint_position: JointPosition) -> Result<(), KinematicsError> {
        let cartesian_position_m = self.kinematics.forward(&joint_position)?;

        self.joint_position = joint_position;
        self.cartesian_position_m = cartesian_position_m;

        Ok(())
    }

    /// Move the robot's tool point to the given position.
    ///
    /// On error the state is left unchanged.
    pub fn set_cartesian_position(
        &mut self,
        cartesian_position_m: CartesianPosition,
    ) -> Result<(), KinematicsError> {
        let joint_position = self.kinematics.inverse(&cartesian_position_m)?;

        self.joint_position = joint_position;
        self.cartesian_position_m = cartesian_position_m;

        Ok(())
    }

    pub fn set_drawing(&mut self, drawing: bool) {
        self.drawing = drawing;
    }

    pub fn joint_position(&self) -> JointPosition {
        self.joint_position
    }

    pub fn cartesian_position(&self) -> CartesianPosition {
        self.cartesian_position_m
    }

    pub fn drawing(&self) -> bool {
        self.drawing
    }

    pub fn kinematics(&self) -> &Kinematics {
        &self.kinematics
    }

    /// Snapshot the state for publishing.
    pub fn telemetry(&self) -> Telemetry {
        Telemetry {
            joint_position: self.joint_position,
            cartesian_position_m: self.cartesian_position_m,
            drawing: self.drawing,
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::robot::RobotConfig;

    fn state() -> RobotState {
        RobotState::new(Kinematics::new(RobotConfig::new(0.08, 0.08, 0.12))).unwrap()
    }

    #[test]
    fn test_initial_state() {
        let state = state();

        assert_eq!(
            state.joint_position(),
            JointPosition::new(std::f64::consts::FRAC_PI_2, std::f64::consts::FRAC_PI_2)
        );
        assert!((state.cartesian_position().x - 0.04).abs() < 1e-12);
        assert!(state.cartesian_position().y > 0.19);
        assert!(!state.drawing());
    }

    #[test]
    fn test_set_positions_stay_consistent() {
        let mut state = state();
        let kin = *state.kinematics();

        let target = CartesianPosition::new(0.02, 0.15);
        state.set_cartesian_position(target).unwrap();
        assert_eq!(state.cartesian_position(), target);
        assert!((kin.forward(&state.joint_position()).unwrap() - target).norm() < 1e-9);

        let joints = JointPosition::new(2.0, 1.0);
        state.set_joint_position(joints).unwrap();
        assert_eq!(state.joint_position(), joints);
        assert_eq!(
            state.cartesian_position(),
            kin.forward(&joints).unwrap()
        );
    }

    #[test]
    fn test_failed_update_leaves_state() {
        let mut state = state();
        let before = state.telemetry();

        assert!(state
            .set_cartesian_position(CartesianPosition::new(0.04, 0.5))
            .is_err());
        assert_eq!(state.telemetry(), before);
    }

    #[test]
    fn test_telemetry() {
        let mut state = state();
        state.set_drawing(true);

        let tm = state.telemetry();
        assert!(tm.drawing);
        assert_eq!(tm.joint_position, state.joint_position());
        assert_eq!(tm.cartesian_position_m, state.cartesian_position());
    }
}
