//! Core traits and handshake types for the coprocessor model.
//!
//! The controller talks to the outside world through a single memory port.
//! The port contract is deliberately small:
//!
//! - The controller presents at most one [`MemRequest`] at a time and holds it
//!   until the port answers.
//! - The port answers with a [`MemResponse`] whose `ready` flag pulses for
//!   exactly one cycle when the read data is valid or the write is committed.
//!
//! Anything implementing [`MemoryPort`] can sit behind the controller, which
//! keeps tests free to use zero-latency memory while the CLI models DRAM.

use thiserror::Error;

use crate::interpreter::core::ControllerState;

/// Kind of memory access requested by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemAccess {
    /// Read one 64-bit word.
    Read,
    /// Write one 64-bit word.
    Write(u64),
}

/// A single outstanding memory request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemRequest {
    /// Byte address of the word.
    pub addr: u32,
    /// Read or write (with data).
    pub access: MemAccess,
}

impl MemRequest {
    /// Create a read request.
    pub fn read(addr: u32) -> Self {
        Self { addr, access: MemAccess::Read }
    }

    /// Create a write request.
    pub fn write(addr: u32, data: u64) -> Self {
        Self { addr, access: MemAccess::Write(data) }
    }

    /// True for write requests.
    pub fn is_write(&self) -> bool {
        matches!(self.access, MemAccess::Write(_))
    }
}

/// Port answer for one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemResponse {
    /// The outstanding request completed this cycle.
    pub ready: bool,
    /// Read data (meaningful only for a completing read).
    pub rdata: u64,
}

impl MemResponse {
    /// Nothing completed this cycle.
    pub const IDLE: MemResponse = MemResponse { ready: false, rdata: 0 };

    /// A completion carrying `rdata`.
    pub fn complete(rdata: u64) -> Self {
        Self { ready: true, rdata }
    }
}

/// External memory as seen through the request/ready handshake.
pub trait MemoryPort {
    /// Advance the port by one cycle.
    ///
    /// `request` is whatever the controller is presenting this cycle. A
    /// request that stays presented across cycles is the *same* request and
    /// must be serviced once.
    fn respond(&mut self, request: Option<&MemRequest>) -> MemResponse;

    /// Drop any in-flight transaction (model reset). Stored data survives.
    fn reset(&mut self);
}

/// Errors that can occur while decoding a raw instruction word.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The word does not use the coprocessor's custom opcode.
    #[error("opcode 0x{opcode:02X} is not the custom-0 opcode (word 0x{word:08X})")]
    WrongOpcode {
        /// The 7-bit opcode found.
        opcode: u8,
        /// The full instruction word.
        word: u32,
    },
}

/// Errors raised when an instruction is presented at the wrong time.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum IssueError {
    /// The controller is still executing a multi-cycle instruction.
    #[error("controller busy in state {state:?}; instructions are only accepted in Idle")]
    Busy {
        /// State the controller was in.
        state: ControllerState,
    },
}
