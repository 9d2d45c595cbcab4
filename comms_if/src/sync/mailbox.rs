//! # Telemetry mailbox

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::tm::Telemetry;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Single slot holding the latest published telemetry.
///
/// This is not a queue: publishing overwrites whatever is in the slot, so a
/// slow reader only ever sees the freshest state and silently misses the
/// intermediate ones.
#[derive(Debug, Default)]
pub struct TelemetryMailbox {
    slot: Mutex<Option<Telemetry>>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TelemetryMailbox {
    /// Create a new empty mailbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish new telemetry, replacing the previous value.
    pub fn publish(&self, telemetry: Telemetry) {
        *self.lock() = Some(telemetry);
    }

    /// Read a copy of the most recently published telemetry, or `None` if
    /// nothing has been published yet.
    pub fn read(&self) -> Option<Telemetry> {
        *self.lock()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Telemetry>> {
        // The slot is only ever swapped whole, a poisoned lock still holds a
        // valid value.
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::pos::{CartesianPosition, JointPosition};
    use std::{sync::Arc, thread};

    fn tm(x: f64) -> Telemetry {
        Telemetry {
            joint_position: JointPosition::new(x, -x),
            cartesian_position_m: CartesianPosition::new(x, 0.1),
            drawing: false,
        }
    }

    #[test]
    fn test_empty_until_published() {
        let mb = TelemetryMailbox::new();
        assert_eq!(mb.read(), None);

        mb.publish(tm(0.01));
        assert_eq!(mb.read(), Some(tm(0.01)));

        // Reading does not consume
        assert_eq!(mb.read(), Some(tm(0.01)));
    }

    #[test]
    fn test_latest_wins() {
        let mb = TelemetryMailbox::new();

        mb.publish(tm(0.01));
        mb.publish(tm(0.02));

        assert_eq!(mb.read(), Some(tm(0.02)));
    }

    #[test]
    fn test_cross_thread() {
        let mb = Arc::new(TelemetryMailbox::new());

        let writer = {
            let mb = mb.clone();
            thread::spawn(move || {
                for i in 0..1000 {
                    mb.publish(tm(i as f64));
                }
            })
        };

        // Readers only ever see whole values
        for _ in 0..1000 {
            if let Some(t) = mb.read() {
                assert_eq!(t.joint_position.theta_1_rad, -t.joint_position.theta_4_rad);
            }
        }

        writer.join().unwrap();
        assert_eq!(mb.read(), Some(tm(999.0)));
    }
}
