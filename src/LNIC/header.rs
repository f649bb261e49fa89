// 64-bit application header that precedes every L-NIC message.
//
// Layout (one queue word):
//   bits 32..64  address  (destination on TX, source on RX)
//   bits 16..32  context
//   bits  0..16  message length in bytes

use crate::error::{LnicError, Result};

/// Transfer granularity of the queue, in bytes.
pub const WORD_SIZE: usize = 8;

pub const ADDRESS_MASK: u64 = 0xffff_ffff_0000_0000;
pub const CONTEXT_MASK: u64 = 0x0000_0000_ffff_0000;
pub const LENGTH_MASK: u64 = 0x0000_0000_0000_ffff;

const ADDRESS_SHIFT: u32 = 32;
const CONTEXT_SHIFT: u32 = 16;

/// Largest length the header can carry.
pub const MAX_MESSAGE_LEN: usize = u16::MAX as usize;

/// Decoded application header.
///
/// Constructed per message and thrown away once the word is on the queue.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct AppHeader {
    pub address: u32,
    pub context: u16,
    pub length: u16,
}

impl AppHeader {
    pub fn new(address: u32, context: u16, length: u16) -> Self {
        Self {
            address,
            context,
            length,
        }
    }

    /// Build a header from an unchecked byte length.
    pub fn try_new(address: u32, context: u16, length_bytes: usize) -> Result<Self> {
        let length = u16::try_from(length_bytes)
            .map_err(|_| LnicError::LengthOverflow { length: length_bytes })?;
        Ok(Self::new(address, context, length))
    }

    #[inline]
    pub fn encode(self) -> u64 {
        ((self.address as u64) << ADDRESS_SHIFT)
            | ((self.context as u64) << CONTEXT_SHIFT)
            | self.length as u64
    }

    /// Every bit pattern decodes; there is no invalid header word.
    #[inline]
    pub fn decode(word: u64) -> Self {
        Self {
            address: ((word & ADDRESS_MASK) >> ADDRESS_SHIFT) as u32,
            context: ((word & CONTEXT_MASK) >> CONTEXT_SHIFT) as u16,
            length: (word & LENGTH_MASK) as u16,
        }
    }

    /// Number of payload words following this header.
    #[inline]
    pub fn word_count(self) -> usize {
        word_count(self.length as usize)
    }
}

/// Pack `(address, context, length_bytes)` into one header word.
pub fn encode(address: u32, context: u16, length_bytes: usize) -> Result<u64> {
    AppHeader::try_new(address, context, length_bytes).map(AppHeader::encode)
}

/// Unpack a header word into `(address, context, length_bytes)`.
pub fn decode(word: u64) -> (u32, u16, u16) {
    let header = AppHeader::decode(word);
    (header.address, header.context, header.length)
}

/// `ceil(length_bytes / WORD_SIZE)`.
#[inline]
pub fn word_count(length_bytes: usize) -> usize {
    length_bytes.div_ceil(WORD_SIZE)
}
