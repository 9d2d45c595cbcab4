//! Parameters structure for SimCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Standard
use std::time::Duration;

// External
use serde::{Deserialize, Serialize};

// Internal
use crate::traj::ArrivalPolicy;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the simulation control loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Params {
    // ---- TIMING ----
    /// Period of one loop cycle.
    ///
    /// Units: seconds
    pub sampling_period_s: f64,

    // ---- MOTION ----
    /// Speed of the fastest moving axis during a move.
    ///
    /// Units: meters/second
    pub max_velocity_ms: f64,

    /// How the last waypoint of each move is placed.
    #[serde(default)]
    pub arrival_policy: ArrivalPolicy,

    // ---- COMMANDS ----
    /// Maximum number of commands waiting for the loop.
    pub command_queue_capacity: usize,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors raised when validating the loop parameters.
#[derive(Debug, thiserror::Error)]
pub enum ParamsError {
    #[error("The sampling period must be positive and finite, found {0} s")]
    InvalidSamplingPeriod(f64),

    #[error("The maximum velocity must be positive and finite, found {0} m/s")]
    InvalidMaxVelocity(f64),

    #[error("The command queue must hold at least one command")]
    ZeroQueueCapacity,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            sampling_period_s: 0.001,
            max_velocity_ms: 0.1,
            arrival_policy: ArrivalPolicy::default(),
            command_queue_capacity: 64,
        }
    }
}

impl Params {
    pub fn validate(&self) -> Result<(), ParamsError> {
        if !(self.sampling_period_s.is_finite() && self.sampling_period_s > 0.0) {
            return Err(ParamsError::InvalidSamplingPeriod(self.sampling_period_s));
        }
        if !(self.max_velocity_ms.is_finite() && self.max_velocity_ms > 0.0) {
            return Err(ParamsError::InvalidMaxVelocity(self.max_velocity_ms));
        }
        if self.command_queue_capacity == 0 {
            return Err(ParamsError::ZeroQueueCapacity);
        }

        Ok(())
    }

    /// The sampling period as a duration.
    ///
    /// Only meaningful once the parameters have been validated.
    pub fn sampling_period(&self) -> Duration {
        util::time::seconds_to_duration(self.sampling_period_s).unwrap_or(Duration::ZERO)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
