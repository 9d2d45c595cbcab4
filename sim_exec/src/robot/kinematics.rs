//! Five-bar kinematics calculations
//!
//! Both directions reduce to equations of the form
//!
//! ```text
//! E cos(a) + F sin(a) + G = 0
//! ```
//!
//! which are solved in closed form with the tangent half-angle substitution
//! `t = tan(a / 2)`, giving the two roots
//!
//! ```text
//! t = (-F +/- sqrt(E^2 + F^2 - G^2)) / (G - E)
//! ```
//!
//! Which root is used for each angle is fixed by a [`BranchPolicy`]. No
//! attempt is made to follow the robot through an elbow flip, the workspace
//! check keeps the loop away from the configurations where that matters.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use super::RobotConfig;
use comms_if::pos::{CartesianPosition, JointPosition};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Closed form kinematics of a five-bar linkage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kinematics {
    config: RobotConfig,
    branches: BranchPolicy,
}

/// Selects which of the two roots is used for each solved angle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchPolicy {
    /// Root used for the link arm angle in the forward solution
    pub tcp: Branch,

    /// Root used for the left motor angle in the inverse solution
    pub theta_1: Branch,

    /// Root used for the right motor angle in the inverse solution
    pub theta_4: Branch,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// One of the two roots of the half-angle quadratic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Branch {
    /// `+sqrt` root
    Positive,

    /// `-sqrt` root
    Negative,
}

/// The angle being solved for, used in error reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolvedAngle {
    /// Angle of the right link arm in the forward solution
    Tcp,
    Theta1,
    Theta4,
}

/// Possible errors that can occur during kinematics calculations.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum KinematicsError {
    #[error("No solution for {0:?}, the arm circles do not intersect (discriminant {1:e})")]
    Unreachable(SolvedAngle, f64),

    #[error("The solution for {0:?} is undefined at this position")]
    Singular(SolvedAngle),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for BranchPolicy {
    fn default() -> Self {
        Self {
            tcp: Branch::Negative,
            theta_1: Branch::Positive,
            theta_4: Branch::Negative,
        }
    }
}

impl Branch {
    fn sign(self) -> f64 {
        match self {
            Branch::Positive => 1.0,
            Branch::Negative => -1.0,
        }
    }
}

impl Kinematics {
    /// Create the kinematics for the given geometry with the default branch
    /// policy.
    pub fn new(config: RobotConfig) -> Self {
        Self::with_branches(config, BranchPolicy::default())
    }

    pub fn with_branches(config: RobotConfig, branches: BranchPolicy) -> Self {
        Self { config, branches }
    }

    pub fn config(&self) -> &RobotConfig {
        &self.config
    }

    pub fn branches(&self) -> &BranchPolicy {
        &self.branches
    }

    /// Compute the position of the tool centre point for the given motor
    /// angles.
    ///
    /// The tool point is the intersection of the two circles of radius lb
    /// centred on the elbows.
    pub fn forward(&self, joints: &JointPosition) -> Result<CartesianPosition, KinematicsError> {
        let (la, lb, lc) = self.lengths();
        let (t1, t4) = (joints.theta_1_rad, joints.theta_4_rad);

        let e = 2.0 * lb * (lc + la * (t4.cos() - t1.cos()));
        let f = 2.0 * la * lb * (t4.sin() - t1.sin());
        let g = lc.powi(2) + 2.0 * la.powi(2) + 2.0 * lc * la * t4.cos()
            - 2.0 * lc * la * t1.cos()
            - 2.0 * la.powi(2) * (t4 - t1).cos();

        let link_rad = half_angle_root(e, f, g, self.branches.tcp, SolvedAngle::Tcp)?;

        let position = CartesianPosition::new(
            lc + la * t4.cos() + lb * link_rad.cos(),
            la * t4.sin() + lb * link_rad.sin(),
        ) + self.config.tcp_offset();

        Ok(position)
    }

    /// Compute the motor angles which put the tool centre point at the given
    /// position.
    ///
    /// Each motor angle comes from intersecting the circle of radius la
    /// centred on that motor with the circle of radius lb centred on the tool
    /// point.
    pub fn inverse(&self, position_m: &CartesianPosition) -> Result<JointPosition, KinematicsError> {
        let (la, lb, lc) = self.lengths();
        let p = position_m - self.config.tcp_offset();
        let (x, y) = (p.x, p.y);

        let e1 = -2.0 * la * x;
        let f1 = -2.0 * la * y;
        let g1 = la.powi(2) - lb.powi(2) + x.powi(2) + y.powi(2);

        let e4 = 2.0 * la * (lc - x);
        let f4 = -2.0 * la * y;
        let g4 = lc.powi(2) + la.powi(2) - lb.powi(2) + x.powi(2) + y.powi(2) - 2.0 * lc * x;

        Ok(JointPosition::new(
            half_angle_root(e1, f1, g1, self.branches.theta_1, SolvedAngle::Theta1)?,
            half_angle_root(e4, f4, g4, self.branches.theta_4, SolvedAngle::Theta4)?,
        ))
    }

    /// Determine if the given position is inside the robot's workspace.
    ///
    /// The tool point must lie in the annulus between radii |la - lb| and
    /// la + lb around both motors. Points on the boundary are inside.
    pub fn in_workspace(&self, position_m: &CartesianPosition) -> bool {
        let (la, lb, lc) = self.lengths();
        let p = position_m - self.config.tcp_offset();

        let min_sq = (la - lb).powi(2);
        let max_sq = (la + lb).powi(2);

        let left_sq = p.x.powi(2) + p.y.powi(2);
        let right_sq = (p.x - lc).powi(2) + p.y.powi(2);

        left_sq >= min_sq && right_sq >= min_sq && left_sq <= max_sq && right_sq <= max_sq
    }

    fn lengths(&self) -> (f64, f64, f64) {
        (
            self.config.base_arm_length_m,
            self.config.link_arm_length_m,
            self.config.motor_distance_m,
        )
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Solve `e cos(a) + f sin(a) + g = 0` for the root on the given branch.
///
/// The root `(-f + s) / (g - e)` can also be written `(g + e) / (-f - s)`.
/// Whichever form has the larger denominator is used, so that the root stays
/// defined when `g - e` vanishes (a motor angle of exactly pi).
fn half_angle_root(
    e: f64,
    f: f64,
    g: f64,
    branch: Branch,
    angle: SolvedAngle,
) -> Result<f64, KinematicsError> {
    let disc = e.powi(2) + f.powi(2) - g.powi(2);

    if disc < 0.0 {
        return Err(KinematicsError::Unreachable(angle, disc));
    }

    let s = branch.sign() * disc.sqrt();

    let (num, den) = if (g - e).abs() >= (-f - s).abs() {
        (-f + s, g - e)
    } else {
        (g + e, -f - s)
    };

    let a = 2.0 * (num / den).atan();

    match a.is_finite() {
        true => Ok(a),
        false => Err(KinematicsError::Singular(angle)),
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
