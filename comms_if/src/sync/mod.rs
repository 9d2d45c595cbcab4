//! # Synchronisation primitives
//!
//! The loop and its clients never share mutable state directly. Instead they
//! are handed a [`TelemetryMailbox`] and a [`CommandQueue`], constructed once
//! at startup, through which values are passed by copy.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod mailbox;
mod queue;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use mailbox::*;
pub use queue::*;
