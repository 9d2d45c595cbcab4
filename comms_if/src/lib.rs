//! # Communications interface crate.
//!
//! Provides the interfaces through which other threads of control talk to
//! the simulation loop: the position types, the [`tc::Command`] telecommand,
//! the [`tm::Telemetry`] snapshot, and the primitives used to pass them across
//! threads.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Joint and Cartesian position types
pub mod pos;

/// Synchronisation primitives shared between the loop and its clients
pub mod sync;

pub mod tc;

/// Telemetry snapshot published by the loop
pub mod tm;
