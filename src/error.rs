//! Error types for the L-NIC protocol core.

use thiserror::Error;

/// Every failure the protocol core can surface.
///
/// All variants are fatal to the current run: the role stops at the first
/// error and reports it, there is no retry.
#[derive(Debug, Error)]
pub enum LnicError {
    /// A message length does not fit the 16-bit header field.
    #[error("message length {length} exceeds the 16-bit header field")]
    LengthOverflow { length: usize },

    /// Declared length differs from the one the run expects.
    #[error("length mismatch: expected {expected} bytes, received {declared} bytes")]
    LengthMismatch { expected: u16, declared: u16 },

    /// Response came from a different address or context than the request went to.
    #[error(
        "unexpected source: expected {expected_address:#x}/{expected_context}, \
         received {address:#x}/{context}"
    )]
    UnexpectedSource {
        expected_address: u32,
        expected_context: u16,
        address: u32,
        context: u16,
    },

    /// Receive queue still holds words after the declared message count.
    #[error("RX queue is not empty after processing all msgs ({pending} words pending)")]
    QueueNotDrained { pending: u64 },

    /// No message arrived within a bounded wait.
    #[error("no message arrived after {polls} polls")]
    Hang { polls: u64 },

    /// `read()` was called with nothing in the receive queue.
    #[error("read from an empty RX queue")]
    QueueEmpty,

    /// The same context id was registered twice on one core.
    #[error("context {0} is already registered")]
    ContextAlreadyRegistered(u64),

    /// A role was started (or a context used) before registration.
    #[error("context {0} is not registered")]
    ContextNotRegistered(u64),

    /// Context id does not fit the 16-bit header context field.
    #[error("context id {0} does not fit the 16-bit header context field")]
    ContextOutOfRange(u64),

    /// Role configuration rejected by the builder.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// OS-level failure (barrier syscalls and the like).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LnicError {
    /// Stable non-zero code handed back to harnesses through the C ABI.
    pub fn code(&self) -> i32 {
        match self {
            LnicError::LengthOverflow { .. } => -2,
            LnicError::LengthMismatch { .. } => -3,
            LnicError::UnexpectedSource { .. } => -4,
            LnicError::QueueNotDrained { .. } => -5,
            LnicError::Hang { .. } => -6,
            LnicError::QueueEmpty => -7,
            LnicError::ContextAlreadyRegistered(_) => -8,
            LnicError::ContextNotRegistered(_) => -9,
            LnicError::ContextOutOfRange(_) => -10,
            LnicError::InvalidConfig(_) => -11,
            LnicError::Io(_) => -12,
        }
    }
}

/// Result type alias using LnicError.
pub type Result<T> = std::result::Result<T, LnicError>;
