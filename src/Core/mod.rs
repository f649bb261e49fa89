pub mod barrier;
pub mod clock;
pub mod futex;
pub mod registers;

pub use barrier::CoreBarrier;
pub use registers::{LnicRegisters, MmioQueue};
