//! Burst DMA between the scratchpad and external memory.
//!
//! A burst moves up to [`DMA_MAX_WORDS`] 64-bit words between consecutive
//! external addresses and scratchpad entries `0..length`. Each word takes two
//! phases on the single memory port:
//!
//! ```text
//!            ┌──────────────────────────────────────────┐
//!            ▼                                          │ more words
//!   ┌─────────────────┐  request   ┌──────────────────┐  │
//!   │  Issue          ├───────────►│  Commit          ├──┘
//!   │  addr=base+i*8  │            │  wait mem ready  │
//!   │  pending=1      │            │  load: sp[i]=rd  │
//!   └─────────────────┘            │  pending=0, i++  │
//!                                  └────────┬─────────┘
//!                                           │ i == length
//!                                           ▼
//!                                         Done
//! ```
//!
//! The descriptor lives in the controller's register file; the
//! [`DmaSequencer`] only computes the next phase from it.

pub mod engine;

pub use engine::{DmaSequencer, DmaStep};

use super::registers::SCRATCHPAD_WORDS;

/// Largest burst accepted, in words (the scratchpad capacity).
pub const DMA_MAX_WORDS: u32 = SCRATCHPAD_WORDS as u32;

/// Bytes per transferred word.
pub const DMA_WORD_BYTES: u32 = 8;

/// Result value reported for a completed burst.
pub const DMA_SUCCESS: u32 = 0;

/// Direction of a burst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DmaDirection {
    /// External memory → scratchpad.
    #[default]
    Load,
    /// Scratchpad → external memory.
    Store,
}

/// Burst transfer descriptor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DmaDescriptor {
    /// External base address.
    pub base_addr: u32,
    /// Words to move.
    pub length: u32,
    /// Next word to move.
    pub index: u32,
    /// Transfer direction.
    pub direction: DmaDirection,
    /// A request for word `index` has been issued and not yet committed.
    pub pending: bool,
}

impl DmaDescriptor {
    /// Latch a new burst. Index and pending flag start cleared.
    pub fn start(base_addr: u32, length: u32, direction: DmaDirection) -> Self {
        Self {
            base_addr,
            length,
            index: 0,
            direction,
            pending: false,
        }
    }

    /// External address of the current word.
    #[inline]
    pub fn current_address(&self) -> u32 {
        self.base_addr
            .wrapping_add(self.index.wrapping_mul(DMA_WORD_BYTES))
    }

    /// True when every word has been committed.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.index >= self.length
    }

    /// Words still to move.
    pub fn remaining(&self) -> u32 {
        self.length.saturating_sub(self.index)
    }
}

/// Check a requested burst length against scratchpad capacity.
#[inline]
pub fn length_fits(length: u32) -> bool {
    length <= DMA_MAX_WORDS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_start() {
        let d = DmaDescriptor::start(0x2000, 8, DmaDirection::Store);
        assert_eq!(d.base_addr, 0x2000);
        assert_eq!(d.length, 8);
        assert_eq!(d.index, 0);
        assert!(!d.pending);
        assert_eq!(d.remaining(), 8);
        assert!(!d.is_exhausted());
    }

    #[test]
    fn test_descriptor_address() {
        let mut d = DmaDescriptor::start(0x4000, 16, DmaDirection::Load);
        assert_eq!(d.current_address(), 0x4000);
        d.index = 3;
        assert_eq!(d.current_address(), 0x4018);
    }

    #[test]
    fn test_length_fits() {
        assert!(length_fits(0));
        assert!(length_fits(256));
        assert!(!length_fits(257));
        assert!(!length_fits(u32::MAX));
    }

    #[test]
    fn test_empty_burst_is_exhausted() {
        let d = DmaDescriptor::start(0, 0, DmaDirection::Load);
        assert!(d.is_exhausted());
    }
}
