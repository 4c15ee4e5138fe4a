//! Coprocessor register file.
//!
//! The coprocessor carries a small amount of architectural state:
//!
//! - **CAR**: 64-bit cellular automaton register (the live automaton state)
//! - **Scratchpad**: 256 × 64-bit words, DMA-accessible
//! - **History**: 8-deep circular buffer of CAR snapshots for `undo`
//! - **Rule**: 8-bit Wolfram rule latched by `ca_step`
//! - **Step counter**: 16-bit countdown for the evolution in flight
//! - **DMA descriptor**: see [`crate::device::dma::DmaDescriptor`]
//!
//! All of it is owned by the controller. Nothing in here decides *when* a
//! register changes; these types only enforce the wrap/cap rules.

use std::fmt;

use crate::device::dma::DmaDescriptor;

/// Number of scratchpad words.
pub const SCRATCHPAD_WORDS: usize = 256;

/// Depth of the undo history.
pub const HISTORY_DEPTH: usize = 8;

/// Scratchpad index mask (indices wrap at 256).
const SCRATCHPAD_MASK: u32 = (SCRATCHPAD_WORDS - 1) as u32;

/// 256 × 64-bit scratchpad.
#[derive(Clone)]
pub struct Scratchpad {
    words: [u64; SCRATCHPAD_WORDS],
}

impl Default for Scratchpad {
    fn default() -> Self {
        Self::new()
    }
}

impl Scratchpad {
    /// Create a zeroed scratchpad.
    pub const fn new() -> Self {
        Self {
            words: [0; SCRATCHPAD_WORDS],
        }
    }

    /// Read a word. The index is reduced modulo 256.
    #[inline]
    pub fn read(&self, index: u32) -> u64 {
        self.words[(index & SCRATCHPAD_MASK) as usize]
    }

    /// Write a word. The index is reduced modulo 256.
    #[inline]
    pub fn write(&mut self, index: u32, value: u64) {
        self.words[(index & SCRATCHPAD_MASK) as usize] = value;
    }

    /// All words (for debugging/display).
    pub fn as_slice(&self) -> &[u64; SCRATCHPAD_WORDS] {
        &self.words
    }
}

impl fmt::Debug for Scratchpad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let used = self.words.iter().filter(|w| **w != 0).count();
        write!(f, "Scratchpad {{ {} of {} non-zero }}", used, SCRATCHPAD_WORDS)
    }
}

/// Circular undo history.
///
/// `push` overwrites the oldest snapshot once the buffer is full, so at most
/// [`HISTORY_DEPTH`] evolutions can be undone.
#[derive(Debug, Clone, Default)]
pub struct History {
    slots: [u64; HISTORY_DEPTH],
    /// Next slot to write (mod 8).
    ptr: usize,
    /// Valid snapshots, capped at 8.
    count: usize,
}

impl History {
    /// Create an empty history.
    pub const fn new() -> Self {
        Self {
            slots: [0; HISTORY_DEPTH],
            ptr: 0,
            count: 0,
        }
    }

    /// Record a snapshot.
    pub fn push(&mut self, value: u64) {
        self.slots[self.ptr] = value;
        self.ptr = (self.ptr + 1) % HISTORY_DEPTH;
        self.count = (self.count + 1).min(HISTORY_DEPTH);
    }

    /// Remove and return the most recent snapshot, if any.
    pub fn pop(&mut self) -> Option<u64> {
        if self.count == 0 {
            return None;
        }
        self.ptr = (self.ptr + HISTORY_DEPTH - 1) % HISTORY_DEPTH;
        self.count -= 1;
        Some(self.slots[self.ptr])
    }

    /// Forget every snapshot (pointer and count back to zero).
    pub fn clear(&mut self) {
        self.ptr = 0;
        self.count = 0;
    }

    /// Number of snapshots available to `undo`.
    pub fn len(&self) -> usize {
        self.count
    }

    /// True when `undo` would be a no-op.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Current write pointer.
    pub fn pointer(&self) -> usize {
        self.ptr
    }
}

/// Complete register file of the coprocessor.
#[derive(Clone, Default)]
pub struct RegisterFile {
    /// Cellular automaton register.
    pub car: u64,
    /// Scratchpad buffer.
    pub scratchpad: Scratchpad,
    /// Undo history.
    pub history: History,
    /// Latched Wolfram rule.
    pub rule: u8,
    /// Remaining evolution passes.
    pub steps: u16,
    /// Burst transfer descriptor.
    pub dma: DmaDescriptor,
}

impl RegisterFile {
    /// Create a register file with every register zeroed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Low 32 bits of CAR.
    #[inline]
    pub fn car_low(&self) -> u32 {
        self.car as u32
    }

    /// High 32 bits of CAR.
    #[inline]
    pub fn car_high(&self) -> u32 {
        (self.car >> 32) as u32
    }

    /// Replace only the high half of CAR.
    #[inline]
    pub fn set_car_high(&mut self, value: u32) {
        self.car = (self.car & 0xFFFF_FFFF) | ((value as u64) << 32);
    }
}

impl fmt::Debug for RegisterFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterFile")
            .field("car", &format_args!("0x{:016X}", self.car))
            .field("rule", &self.rule)
            .field("steps", &self.steps)
            .field("history", &self.history.len())
            .field("scratchpad", &self.scratchpad)
            .field("dma", &self.dma)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scratchpad_index_wraps() {
        let mut sp = Scratchpad::new();
        sp.write(0x105, 0xAAAA);
        assert_eq!(sp.read(5), 0xAAAA);
        assert_eq!(sp.read(0xFFFF_FF05), 0xAAAA);
    }

    #[test]
    fn test_history_lifo() {
        let mut h = History::new();
        h.push(1);
        h.push(2);
        h.push(3);
        assert_eq!(h.len(), 3);
        assert_eq!(h.pop(), Some(3));
        assert_eq!(h.pop(), Some(2));
        assert_eq!(h.pop(), Some(1));
        assert_eq!(h.pop(), None);
        assert!(h.is_empty());
    }

    #[test]
    fn test_history_overwrites_oldest() {
        let mut h = History::new();
        for v in 0..10u64 {
            h.push(v);
        }
        assert_eq!(h.len(), HISTORY_DEPTH);
        assert_eq!(h.pointer(), 10 % HISTORY_DEPTH);

        let popped: Vec<u64> = std::iter::from_fn(|| h.pop()).collect();
        assert_eq!(popped, vec![9, 8, 7, 6, 5, 4, 3, 2]);
    }

    #[test]
    fn test_history_clear() {
        let mut h = History::new();
        h.push(7);
        h.push(8);
        h.clear();
        assert_eq!(h.len(), 0);
        assert_eq!(h.pointer(), 0);
        assert_eq!(h.pop(), None);
    }

    #[test]
    fn test_car_halves() {
        let mut regs = RegisterFile::new();
        regs.car = 0x1234_5678_9ABC_DEF0;
        assert_eq!(regs.car_low(), 0x9ABC_DEF0);
        assert_eq!(regs.car_high(), 0x1234_5678);

        regs.set_car_high(0xCAFE_BABE);
        assert_eq!(regs.car, 0xCAFE_BABE_9ABC_DEF0);
    }
}
