//! # Command queue

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    collections::VecDeque,
    sync::{Mutex, MutexGuard, PoisonError},
};

use log::trace;

use crate::tc::Command;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Bounded FIFO of commands waiting for the loop.
///
/// Neither end ever blocks: a full queue rejects new commands and an empty
/// queue returns `None`. What to do with a rejected command is up to the
/// producer.
#[derive(Debug)]
pub struct CommandQueue {
    capacity: usize,
    cmds: Mutex<VecDeque<Command>>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    #[error("A command queue must hold at least one command")]
    ZeroCapacity,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CommandQueue {
    /// Create a new queue holding at most `capacity` commands.
    pub fn new(capacity: usize) -> Result<Self, QueueError> {
        if capacity == 0 {
            return Err(QueueError::ZeroCapacity);
        }

        Ok(Self {
            capacity,
            cmds: Mutex::new(VecDeque::with_capacity(capacity)),
        })
    }

    /// Add a command to the back of the queue.
    ///
    /// Returns `false` if the queue is full, in which case the command is
    /// dropped.
    pub fn enqueue(&self, cmd: Command) -> bool {
        let mut cmds = self.lock();

        if cmds.len() >= self.capacity {
            trace!("CommandQueue full ({}), rejecting {:?}", self.capacity, cmd);
            return false;
        }

        cmds.push_back(cmd);
        true
    }

    /// Take the command at the front of the queue, or `None` if it is empty.
    pub fn dequeue(&self) -> Option<Command> {
        self.lock().pop_front()
    }

    /// Number of commands currently waiting.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Command>> {
        self.cmds.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
