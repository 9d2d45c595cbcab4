//! # Telecommand module
//!
//! This module provides the command which external producers submit to the
//! simulation loop.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Internal
use crate::pos::CartesianPosition;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A move command, i.e. an instruction to drive the tool centre point to a
/// new position.
///
/// Each command is consumed at most once by the loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Command {
    /// The target position of the tool centre point
    pub target_m: CartesianPosition,

    /// Whether the pen should be down during the move
    #[serde(default)]
    pub drawing: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum CommandParseError {
    #[error("Command contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),

    #[error("Command target ({0}, {1}) is not a finite position")]
    NonFiniteTarget(f64, f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Command {
    pub fn new(x_m: f64, y_m: f64, drawing: bool) -> Self {
        Self {
            target_m: CartesianPosition::new(x_m, y_m),
            drawing,
        }
    }

    /// Parse a new command from a JSON packet, for example
    /// `{"target_m": [0.0, 0.12], "drawing": true}`.
    pub fn from_json(json_str: &str) -> Result<Self, CommandParseError> {
        let cmd: Command = serde_json::from_str(json_str).map_err(CommandParseError::InvalidJson)?;

        if !(cmd.target_m.x.is_finite() && cmd.target_m.y.is_finite()) {
            return Err(CommandParseError::NonFiniteTarget(
                cmd.target_m.x,
                cmd.target_m.y,
            ));
        }

        Ok(cmd)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_from_json() {
        let cmd = Command::from_json(r#"{"target_m": [0.0, 0.12], "drawing": true}"#).unwrap();
        assert_eq!(cmd, Command::new(0.0, 0.12, true));

        // Drawing is optional and defaults to pen up
        let cmd = Command::from_json(r#"{"target_m": [0.05, 0.1]}"#).unwrap();
        assert!(!cmd.drawing);

        assert!(matches!(
            Command::from_json(r#"{"target": 1}"#),
            Err(CommandParseError::InvalidJson(_))
        ));
    }
}
