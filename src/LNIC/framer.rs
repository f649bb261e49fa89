// Payload mirroring: RX words copied straight to TX.

use super::header::word_count;
use super::queue::QueueInterface;
use crate::error::{LnicError, Result};

/// Which message lengths a role accepts.
///
/// Chosen once at role startup.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum LengthMode {
    /// Only messages of exactly this many bytes.
    Fixed(u16),
    /// Any length the header can express.
    #[default]
    Variable,
}

impl LengthMode {
    /// Check a declared length against the mode. Pure.
    pub fn validate(self, declared: u16) -> Result<()> {
        match self {
            LengthMode::Fixed(expected) if declared != expected => {
                Err(LnicError::LengthMismatch { expected, declared })
            }
            _ => Ok(()),
        }
    }
}

/// Copy a `declared_length`-byte payload from RX to TX, then `done()`.
///
/// The length is checked before anything is read, so a rejected message leaves
/// the queue untouched. Returns the number of words copied.
pub fn frame_passthrough<Q: QueueInterface + ?Sized>(
    queue: &mut Q,
    declared_length: u16,
    mode: LengthMode,
) -> Result<usize> {
    if let Err(e) = mode.validate(declared_length) {
        tracing::error!(declared = declared_length, ?mode, "application only supports fixed length msgs");
        return Err(e);
    }

    let words = word_count(declared_length as usize);
    for _ in 0..words {
        let word = queue.read()?;
        queue.write(word);
    }
    queue.done();

    tracing::trace!(words, "payload mirrored");
    Ok(words)
}
