//! # Interactive prompt commands
//!
//! Parses the lines typed at the simulation executable's prompt.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use structopt::{clap::AppSettings, StructOpt};

use comms_if::tc::{Command, CommandParseError};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A command typed at the prompt.
#[derive(Debug, PartialEq, StructOpt)]
#[structopt(
    name = "fivebar",
    setting = AppSettings::NoBinaryName,
    setting = AppSettings::VersionlessSubcommands
)]
pub enum PromptCmd {
    /// Move the tool point to the given position.
    #[structopt(name = "move", setting = AppSettings::AllowNegativeNumbers)]
    Move {
        /// Target x coordinate in meters.
        x_m: f64,

        /// Target y coordinate in meters.
        y_m: f64,

        /// Put the pen down for the move.
        #[structopt(short, long)]
        draw: bool,
    },

    /// Print the latest telemetry.
    #[structopt(name = "tm")]
    Tm,

    /// Print the number of commands waiting to be executed.
    #[structopt(name = "pending")]
    Pending,

    /// Print the status of the control loop.
    #[structopt(name = "status")]
    Status,

    /// Stop the simulation and exit.
    #[structopt(name = "quit")]
    Quit,
}

/// A line entered at the prompt.
#[derive(Debug, PartialEq)]
pub enum PromptLine {
    Empty,

    /// A JSON command, entered as `json <command>`
    Json(Command),

    Cmd(PromptCmd),
}

#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("{0}")]
    InvalidJson(CommandParseError),

    #[error("{0}")]
    InvalidArgs(structopt::clap::Error),
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Parse a line entered at the prompt.
///
/// `json` lines are handled before argument parsing since the command may
/// contain anything.
pub fn parse_line(line: &str) -> Result<PromptLine, PromptError> {
    let line = line.trim();

    if line.is_empty() {
        return Ok(PromptLine::Empty);
    }

    if let Some(json) = line.strip_prefix("json") {
        if json.is_empty() || json.starts_with(char::is_whitespace) {
            return Command::from_json(json.trim())
                .map(PromptLine::Json)
                .map_err(PromptError::InvalidJson);
        }
    }

    PromptCmd::from_iter_safe(line.split_whitespace())
        .map(PromptLine::Cmd)
        .map_err(PromptError::InvalidArgs)
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
