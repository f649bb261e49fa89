// Register-mapped view of the hardware queue controller.

use std::ptr::{self, NonNull};

use crate::error::{LnicError, Result};
use crate::LNIC::context::Context;
use crate::LNIC::queue::{ContextController, QueueInterface};

pub const REG_MSGS_READY: usize = 0x00;
pub const REG_RX_PENDING: usize = 0x08;
pub const REG_RX_WORD: usize = 0x10;
pub const REG_TX_WORD: usize = 0x18;
pub const REG_MSG_DONE: usize = 0x20;
pub const REG_CONTEXT_ID: usize = 0x28;
pub const REG_CONTEXT_PRIORITY: usize = 0x30;
pub const REG_CONTEXT_COMMIT: usize = 0x38;
pub const REG_CYCLE_COUNTER: usize = 0x40;

/// Register block exposed by the queue controller.
///
/// It is marked `#[repr(C)]` so the field offsets match the `REG_*` constants.
/// Reads of `rx_word` pop the receive queue and writes of `tx_word` push the
/// transmit queue, so every access must be volatile.
#[repr(C, align(64))]
#[derive(Debug, Default)]
pub struct LnicRegisters {
    /// Non-zero while at least one message is ready for this core.
    pub msgs_ready: u64,
    /// Receive-queue words not yet read.
    pub rx_pending: u64,
    pub rx_word: u64,
    pub tx_word: u64,
    /// Any write marks the end of the current message.
    pub msg_done: u64,
    pub context_id: u64,
    pub context_priority: u64,
    /// Writing 1 registers `context_id` with `context_priority`.
    pub context_commit: u64,
    pub cycle_counter: u64,
}

/// Hardware backend: volatile accesses into a mapped `LnicRegisters` block.
///
/// This struct does not own the registers; it is a view that the surrounding
/// runtime hands to exactly one core.
pub struct MmioQueue {
    pub(crate) regs: NonNull<LnicRegisters>,
}

unsafe impl Send for MmioQueue {}

impl MmioQueue {
    /// Create a queue view over a mapped register block.
    ///
    /// # Safety
    /// `regs` must point to a valid, mapped register block that stays mapped
    /// for the lifetime of the view and is not used by another core.
    pub unsafe fn new(regs: *mut LnicRegisters) -> Option<Self> {
        NonNull::new(regs).map(|regs| Self { regs })
    }

    pub fn base(&self) -> *const LnicRegisters {
        self.regs.as_ptr()
    }

    #[inline]
    fn load(&self, offset: usize) -> u64 {
        // Safety: offset is one of the REG_* constants inside the block.
        unsafe { ptr::read_volatile(self.regs.as_ptr().cast::<u8>().add(offset).cast::<u64>()) }
    }

    #[inline]
    fn store(&mut self, offset: usize, value: u64) {
        unsafe {
            ptr::write_volatile(
                self.regs.as_ptr().cast::<u8>().add(offset).cast::<u64>(),
                value,
            )
        }
    }
}

impl QueueInterface for MmioQueue {
    #[inline]
    fn ready(&self) -> bool {
        self.load(REG_MSGS_READY) != 0
    }

    fn wait(&mut self) {
        while !self.ready() {
            std::hint::spin_loop();
        }
    }

    fn read(&mut self) -> Result<u64> {
        if self.load(REG_RX_PENDING) == 0 {
            return Err(LnicError::QueueEmpty);
        }
        Ok(self.load(REG_RX_WORD))
    }

    #[inline]
    fn write(&mut self, word: u64) {
        self.store(REG_TX_WORD, word);
    }

    fn done(&mut self) {
        self.store(REG_MSG_DONE, 1);
    }

    fn rx_pending(&self) -> u64 {
        self.load(REG_RX_PENDING)
    }

    fn cycles(&self) -> u64 {
        self.load(REG_CYCLE_COUNTER)
    }
}

impl ContextController for MmioQueue {
    fn register_context(&mut self, context: Context) -> Result<()> {
        self.store(REG_CONTEXT_ID, context.id());
        self.store(REG_CONTEXT_PRIORITY, context.priority());
        self.store(REG_CONTEXT_COMMIT, 1);
        Ok(())
    }
}
