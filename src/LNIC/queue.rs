// Capability traits over the queue controller.
//
// Production code talks to the register-mapped controller through
// `Core::registers::MmioQueue`; tests use the simulated controllers in `Sim`.

use crossbeam_utils::Backoff;

use super::context::Context;
use crate::error::{LnicError, Result};

/// The four word-level primitives plus the observation points the protocol needs.
pub trait QueueInterface {
    /// Single poll of the readiness indicator.
    fn ready(&self) -> bool;

    /// Busy-poll until a message is available.
    ///
    /// There is no timeout: if nothing ever arrives this never returns.
    fn wait(&mut self) {
        let backoff = Backoff::new();
        while !self.ready() {
            backoff.snooze();
        }
    }

    /// Pop the next word from the receive queue.
    fn read(&mut self) -> Result<u64>;

    /// Push a word to the transmit queue.
    fn write(&mut self, word: u64);

    /// Mark the end of the current message.
    fn done(&mut self);

    /// Number of receive-queue words not yet read.
    fn rx_pending(&self) -> u64;

    /// Monotonic cycle counter.
    fn cycles(&self) -> u64;
}

/// Registration side of the controller.
pub trait ContextController {
    fn register_context(&mut self, context: Context) -> Result<()>;
}

/// How a role waits for the next message.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum WaitPolicy {
    /// Spin forever, as the hardware primitive does.
    #[default]
    Unbounded,
    /// Give up with `LnicError::Hang` after `max_polls` empty polls.
    Bounded { max_polls: u64 },
}

/// Wait for the next message under `policy`.
pub fn await_message<Q: QueueInterface + ?Sized>(queue: &mut Q, policy: WaitPolicy) -> Result<()> {
    match policy {
        WaitPolicy::Unbounded => {
            queue.wait();
            Ok(())
        }
        WaitPolicy::Bounded { max_polls } => {
            let backoff = Backoff::new();
            for _ in 0..max_polls {
                if queue.ready() {
                    return Ok(());
                }
                backoff.snooze();
            }
            if queue.ready() {
                return Ok(());
            }
            Err(LnicError::Hang { polls: max_polls })
        }
    }
}

impl<Q: QueueInterface + ?Sized> QueueInterface for &mut Q {
    fn ready(&self) -> bool {
        (**self).ready()
    }

    fn wait(&mut self) {
        (**self).wait()
    }

    fn read(&mut self) -> Result<u64> {
        (**self).read()
    }

    fn write(&mut self, word: u64) {
        (**self).write(word)
    }

    fn done(&mut self) {
        (**self).done()
    }

    fn rx_pending(&self) -> u64 {
        (**self).rx_pending()
    }

    fn cycles(&self) -> u64 {
        (**self).cycles()
    }
}

impl<C: ContextController + ?Sized> ContextController for &mut C {
    fn register_context(&mut self, context: Context) -> Result<()> {
        (**self).register_context(context)
    }
}
