//! # Trajectory module
//!
//! Time sampled straight line trajectories between two cartesian points.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod planner;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use comms_if::pos::CartesianPosition;
pub use planner::*;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A sequence of waypoints, one per sampling period.
///
/// The start point is not included, the first waypoint is where the tool
/// should be after one period. Waypoints are computed on access, so the
/// length of a trajectory costs nothing in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    start_m: CartesianPosition,

    /// Units: meters/second
    velocity_ms: CartesianPosition,

    /// Units: seconds
    period_s: f64,

    len: usize,

    /// Final waypoint, the target itself if the trajectory was clamped
    last_m: CartesianPosition,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// How the last waypoint of a trajectory is placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArrivalPolicy {
    /// The last waypoint is replaced by the exact target.
    ClampToTarget,

    /// The last waypoint is left where the constant velocity profile puts
    /// it, which may fall short of the target by up to one period of travel.
    Unclamped,
}

/// Errors that can occur while planning a trajectory.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum TrajError {
    #[error("The maximum velocity must be positive and finite, found {0}")]
    InvalidVelocity(f64),

    #[error("The sampling period must be positive and finite, found {0}")]
    InvalidPeriod(f64),

    #[error("The trajectory end points must be finite, found {0:?} to {1:?}")]
    NonFiniteEndPoint([f64; 2], [f64; 2]),

    #[error("The trajectory would need {0:e} waypoints, more than can be indexed")]
    TooManyWaypoints(f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for ArrivalPolicy {
    fn default() -> Self {
        ArrivalPolicy::ClampToTarget
    }
}

impl Trajectory {
    /// Trajectory made of the end point alone.
    pub(crate) fn single(end_m: CartesianPosition) -> Self {
        Self {
            start_m: end_m,
            velocity_ms: CartesianPosition::zeros(),
            period_s: 0.0,
            len: 1,
            last_m: end_m,
        }
    }

    /// The waypoint reached after `index + 1` periods.
    pub fn get(&self, index: usize) -> Option<CartesianPosition> {
        if index >= self.len {
            None
        } else if index == self.len - 1 {
            Some(self.last_m)
        } else {
            Some(self.start_m + self.velocity_ms * ((index + 1) as f64 * self.period_s))
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = CartesianPosition> + '_ {
        (0..self.len).filter_map(move |i| self.get(i))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The last waypoint of the trajectory.
    pub fn end(&self) -> Option<CartesianPosition> {
        self.len.checked_sub(1).and_then(|i| self.get(i))
    }
}
