// Startup barrier for cores sharing one queue controller.
//
// Cores must not send before their peers have registered a context; this
// replaces the fixed nop delay the bare-metal tests used for that purpose.

use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering::{AcqRel, Acquire, Relaxed, Release};

use crossbeam_utils::CachePadded;

use super::futex::{futex_wait, futex_wake};
use crate::error::{LnicError, Result};

/// Reusable barrier for a fixed number of parties.
pub struct CoreBarrier {
    parties: u32,
    /// Parties arrived in the current generation.
    arrived: CachePadded<AtomicU32>,
    /// Bumped by the last arriving party; waiters park on it.
    generation: CachePadded<AtomicU32>,
}

impl CoreBarrier {
    pub fn new(parties: u32) -> Result<Self> {
        if parties == 0 {
            return Err(LnicError::InvalidConfig(
                "barrier needs at least one party".to_string(),
            ));
        }
        Ok(Self {
            parties,
            arrived: CachePadded::new(AtomicU32::new(0)),
            generation: CachePadded::new(AtomicU32::new(0)),
        })
    }

    pub fn parties(&self) -> u32 {
        self.parties
    }

    /// Block until all parties have arrived.
    ///
    /// Returns `true` for exactly one party per generation (the one that
    /// released the others).
    pub fn wait(&self) -> bool {
        let generation = self.generation.load(Acquire);

        if self.arrived.fetch_add(1, AcqRel) + 1 == self.parties {
            // arrived must be reset before the generation moves on
            self.arrived.store(0, Relaxed);
            self.generation.fetch_add(1, Release);
            futex_wake(&self.generation, i32::MAX);
            tracing::trace!(generation, parties = self.parties, "barrier released");
            return true;
        }

        while self.generation.load(Acquire) == generation {
            futex_wait(&self.generation, generation);
        }
        false
    }
}
