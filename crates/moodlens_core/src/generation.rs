//! Batch generation tagging.
//!
//! Every drop or selection starts a new generation. Work that finishes after
//! its generation has been superseded must not touch the results container.

use std::cell::Cell;
use std::rc::Rc;

/// Shared generation counter. Clones observe the same counter.
#[derive(Debug, Clone, Default)]
pub struct BatchTracker {
    current: Rc<Cell<u64>>,
}

impl BatchTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new generation, superseding every outstanding ticket.
    pub fn begin(&self) -> BatchTicket {
        let generation = self.current.get().wrapping_add(1);
        self.current.set(generation);
        BatchTicket {
            generation,
            current: Rc::clone(&self.current),
        }
    }

    /// The most recently started generation (0 before the first batch).
    pub fn current(&self) -> u64 {
        self.current.get()
    }
}

/// Handle held by one running batch.
#[derive(Debug, Clone)]
pub struct BatchTicket {
    generation: u64,
    current: Rc<Cell<u64>>,
}

impl BatchTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether no newer batch has started since this one.
    pub fn is_current(&self) -> bool {
        self.current.get() == self.generation
    }
}
