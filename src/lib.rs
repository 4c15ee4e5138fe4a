//! ca-coproc library
//!
//! Cycle-level model of a RISC-V cellular-automaton coprocessor.

pub mod config;
pub mod device;
pub mod interpreter;
pub mod parser;
pub mod testing;
