//! Cycle driver implementation.
//!
//! The engine pairs the controller with a memory port and supplies the
//! clock: each cycle the memory answers the request the controller is
//! presenting, then the controller advances once with that answer.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::config::{Config, DEFAULT_TIMEOUT_CYCLES};
use crate::device::LatencyMemory;
use crate::interpreter::core::{Controller, ControllerState, Signals};
use crate::interpreter::decode::{Instruction, InstructionWord};
use crate::interpreter::traits::{DecodeError, IssueError, MemoryPort};

/// Errors reported by the driver.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The controller refused the instruction.
    #[error(transparent)]
    Issue(#[from] IssueError),

    /// The raw instruction word could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The instruction did not complete within the cycle budget.
    #[error("instruction did not complete within {cycles} cycles")]
    Timeout {
        /// Cycles spent before giving up.
        cycles: u64,
    },
}

/// Outcome of a completed instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    /// Result register at the ready pulse.
    pub result: u32,
    /// Cycles after the dispatch cycle (0 for single-cycle operations).
    pub cycles: u64,
}

/// Driver statistics.
#[derive(Debug, Clone, Default)]
pub struct EngineStats {
    /// Instructions that reached their ready pulse.
    pub instructions: u64,
    /// Clock cycles, dispatch cycles included.
    pub cycles: u64,
    /// Retired instructions by mnemonic.
    pub per_operation: BTreeMap<&'static str, u64>,
    /// Instructions abandoned on timeout.
    pub timeouts: u64,
}

impl EngineStats {
    /// Count for one mnemonic.
    pub fn count(&self, mnemonic: &str) -> u64 {
        self.per_operation.get(mnemonic).copied().unwrap_or(0)
    }
}

/// Cycle-level driver for the coprocessor.
///
/// # Example
///
/// ```
/// use ca_coproc::interpreter::engine::CoprocessorEngine;
/// use ca_coproc::interpreter::decode::Instruction;
///
/// let mut engine = CoprocessorEngine::with_latency(2);
/// engine.set_car(0xDEADBEEF).unwrap();
///
/// let done = engine.execute(Instruction::find(0xDEADBEEF)).unwrap();
/// assert_eq!(done.result, 0);
/// assert_eq!(done.cycles, 0);
/// ```
pub struct CoprocessorEngine<M: MemoryPort = LatencyMemory> {
    controller: Controller,
    memory: M,
    /// Cycle budget per instruction.
    timeout_cycles: u64,
    stats: EngineStats,
}

impl CoprocessorEngine<LatencyMemory> {
    /// Engine over empty memory with the given latency.
    pub fn with_latency(latency: u32) -> Self {
        Self::new(LatencyMemory::new(latency))
    }

    /// Engine configured from `config`.
    pub fn from_config(config: &Config) -> Self {
        let mut engine = Self::with_latency(config.memory_latency());
        engine.timeout_cycles = config.timeout_cycles();
        engine.controller.set_trace_evolution(config.trace_evolution());
        log::info!(
            "engine: memory latency {} cycles, timeout {} cycles",
            config.memory_latency(),
            engine.timeout_cycles
        );
        engine
    }
}

impl<M: MemoryPort> CoprocessorEngine<M> {
    /// Create an engine around a memory port.
    pub fn new(memory: M) -> Self {
        Self {
            controller: Controller::new(),
            memory,
            timeout_cycles: DEFAULT_TIMEOUT_CYCLES,
            stats: EngineStats::default(),
        }
    }

    /// Override the cycle budget per instruction.
    pub fn with_timeout(mut self, cycles: u64) -> Self {
        self.timeout_cycles = cycles;
        self
    }

    /// The controller (read-only).
    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// The memory port.
    pub fn memory(&self) -> &M {
        &self.memory
    }

    /// The memory port (mutable, for preloading data).
    pub fn memory_mut(&mut self) -> &mut M {
        &mut self.memory
    }

    /// Driver statistics.
    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    /// Controller state.
    pub fn state(&self) -> ControllerState {
        self.controller.state()
    }

    /// Advance one clock cycle.
    pub fn step(&mut self) -> Signals {
        let response = self.memory.respond(self.controller.mem_request());
        let signals = self.controller.advance(response);
        self.stats.cycles += 1;
        if signals.ready {
            self.retire();
        }
        signals
    }

    /// Present an instruction (the dispatch cycle) without waiting for it.
    pub fn issue(&mut self, insn: Instruction) -> Result<Signals, EngineError> {
        let signals = self.controller.issue(insn)?;
        self.stats.cycles += 1;
        if signals.ready {
            self.retire();
        }
        Ok(signals)
    }

    /// Issue an instruction and clock the controller until it completes.
    pub fn execute(&mut self, insn: Instruction) -> Result<Completion, EngineError> {
        let mut signals = self.issue(insn)?;
        let mut cycles = 0u64;

        while !signals.ready {
            if cycles >= self.timeout_cycles {
                log::warn!(
                    "{} timed out after {} cycles in {:?}",
                    insn.operation(),
                    cycles,
                    self.controller.state()
                );
                self.stats.timeouts += 1;
                return Err(EngineError::Timeout { cycles });
            }
            signals = self.step();
            cycles += 1;
        }

        Ok(Completion {
            result: signals.result,
            cycles,
        })
    }

    /// Decode a raw instruction word and execute it with the given
    /// register values.
    pub fn execute_word(
        &mut self,
        word: u32,
        rs1_value: u32,
        rs2_value: u32,
    ) -> Result<Completion, EngineError> {
        let decoded = InstructionWord::decode(word)?;
        self.execute(decoded.with_operands(rs1_value, rs2_value))
    }

    /// Load all 64 bits of CAR (lower half first, then upper).
    pub fn set_car(&mut self, value: u64) -> Result<(), EngineError> {
        self.execute(Instruction::set_low(value as u32))?;
        self.execute(Instruction::set_high((value >> 32) as u32))?;
        Ok(())
    }

    /// Read all 64 bits of CAR through two gets.
    pub fn get_car(&mut self) -> Result<u64, EngineError> {
        let lo = self.execute(Instruction::get_low())?.result;
        let hi = self.execute(Instruction::get_high())?.result;
        Ok(((hi as u64) << 32) | lo as u64)
    }

    /// Reset the controller and the memory handshake.
    ///
    /// Memory contents and statistics survive.
    pub fn reset(&mut self) {
        self.controller.reset();
        self.memory.reset();
    }

    fn retire(&mut self) {
        self.stats.instructions += 1;
        if let Some(op) = self.controller.current_operation() {
            *self.stats.per_operation.entry(op.mnemonic()).or_insert(0) += 1;
        }
    }
}
