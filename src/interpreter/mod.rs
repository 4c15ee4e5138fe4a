//! CA coprocessor interpreter.
//!
//! The coprocessor extends a RISC-V core through the custom-0 opcode. The
//! host issues one instruction at a time; the coprocessor either answers in
//! the dispatch cycle or occupies itself for several cycles and raises a
//! one-cycle ready pulse with the result.
//!
//! # Architecture
//!
//! - [`traits`]: memory handshake contract and host-side error types
//! - [`decode`]: instruction word and `funct3`/`funct7` decoding
//! - [`execute`]: rule engine, Life engine, pattern matcher, popcount
//! - [`core`]: the controller state machine
//! - [`engine`]: cycle driver pairing the controller with a memory port
//!
//! # Example
//!
//! ```
//! use ca_coproc::interpreter::{CoprocessorEngine, Instruction};
//!
//! let mut engine = CoprocessorEngine::with_latency(10);
//! engine.set_car(1).unwrap();
//! engine.execute(Instruction::step(30, 10)).unwrap();
//! engine.execute(Instruction::undo()).unwrap();
//! assert_eq!(engine.get_car().unwrap(), 1);
//! ```

pub mod traits;
pub mod decode;
pub mod execute;
pub mod core;
pub mod engine;

// Re-export key types for convenience
pub use traits::{DecodeError, IssueError, MemAccess, MemRequest, MemResponse, MemoryPort};

pub use decode::{Instruction, InstructionWord, Operation};

pub use core::{Controller, ControllerState, Signals};

pub use engine::{Completion, CoprocessorEngine, EngineError, EngineStats};
