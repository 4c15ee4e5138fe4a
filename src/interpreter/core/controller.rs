//! Instruction-execution state machine.

use crate::device::dma::{self, DmaDescriptor, DmaDirection, DmaSequencer, DmaStep, DMA_SUCCESS};
use crate::device::registers::RegisterFile;
use crate::interpreter::decode::{Instruction, Operation};
use crate::interpreter::execute::{find_result, population, EvolutionKind};
use crate::interpreter::traits::{IssueError, MemRequest, MemResponse};

/// Result value reported by operations without an architectural result.
pub const STATUS_OK: u32 = 0;

/// Result value reported when a DMA burst exceeds scratchpad capacity.
pub const DMA_REJECTED: u32 = 0xFFFF_FFFF;

/// Controller states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControllerState {
    /// Accepting a new instruction.
    #[default]
    Idle,
    /// Applying the rule engine once per activation.
    Evolve,
    /// Applying the Life engine once per activation.
    LifeEvolve,
    /// Waiting for a single memory load/store.
    MemOp,
    /// Running a burst transfer.
    DmaXfer,
}

/// Outputs of the controller for one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Signals {
    /// The instruction completed this cycle.
    pub ready: bool,
    /// Result register; meaningful only while `ready` is set.
    pub result: u32,
}

impl Signals {
    /// Still working (or idle).
    pub const BUSY: Signals = Signals { ready: false, result: 0 };

    fn done(result: u32) -> Self {
        Self { ready: true, result }
    }
}

/// Counters kept by the controller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerStats {
    /// Engine passes applied (both engines).
    pub evolution_passes: u64,
    /// Snapshots pushed to history.
    pub history_pushes: u64,
    /// `undo` instructions that restored a snapshot.
    pub undos_applied: u64,
    /// `undo` instructions issued with an empty history.
    pub undos_empty: u64,
    /// Words moved by completed DMA bursts.
    pub dma_words: u64,
    /// DMA requests refused for exceeding capacity.
    pub dma_rejected: u64,
}

/// The coprocessor controller.
///
/// Owns the register file and is the only thing that mutates it. Work is
/// driven from outside: [`issue`](Self::issue) presents an instruction in
/// `Idle` (the dispatch cycle), and every later [`advance`](Self::advance)
/// performs exactly one unit of work for the instruction in flight.
///
/// # Example
///
/// ```
/// use ca_coproc::interpreter::core::Controller;
/// use ca_coproc::interpreter::decode::Instruction;
/// use ca_coproc::interpreter::traits::MemResponse;
///
/// let mut ctrl = Controller::new();
/// ctrl.issue(Instruction::set_low(1)).unwrap();
///
/// // Two passes of rule 30: dispatch, then one advance per pass.
/// assert!(!ctrl.issue(Instruction::step(30, 2)).unwrap().ready);
/// assert!(!ctrl.advance(MemResponse::IDLE).ready);
/// assert!(ctrl.advance(MemResponse::IDLE).ready);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Controller {
    regs: RegisterFile,
    state: ControllerState,
    /// Request currently presented on the memory port.
    mem_request: Option<MemRequest>,
    /// Operation in flight (or last completed).
    current: Option<Operation>,
    /// Output register.
    result: u32,
    ready: bool,
    /// Log every intermediate CAR value during evolutions.
    trace_evolution: bool,
    stats: ControllerStats,
}

impl Controller {
    /// Create a controller with every register zeroed, in `Idle`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable per-pass logging of CAR during evolutions.
    pub fn set_trace_evolution(&mut self, enabled: bool) {
        self.trace_evolution = enabled;
    }

    /// Model reset: zero all registers and return to `Idle`.
    ///
    /// This is the only way to abandon an instruction in flight.
    pub fn reset(&mut self) {
        log::debug!("controller reset (was {:?})", self.state);
        let trace_evolution = self.trace_evolution;
        *self = Self::default();
        self.trace_evolution = trace_evolution;
    }

    /// Current state.
    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// True when a new instruction may be issued.
    pub fn is_idle(&self) -> bool {
        self.state == ControllerState::Idle
    }

    /// Register file (read-only).
    pub fn registers(&self) -> &RegisterFile {
        &self.regs
    }

    /// Cellular automaton register.
    pub fn car(&self) -> u64 {
        self.regs.car
    }

    /// Request currently presented on the memory port.
    pub fn mem_request(&self) -> Option<&MemRequest> {
        self.mem_request.as_ref()
    }

    /// Ready signal of the most recent cycle.
    pub fn ready(&self) -> bool {
        self.ready
    }

    /// Output register.
    pub fn result(&self) -> u32 {
        self.result
    }

    /// Operation in flight, or the last one completed.
    pub fn current_operation(&self) -> Option<Operation> {
        self.current
    }

    /// Controller counters.
    pub fn stats(&self) -> &ControllerStats {
        &self.stats
    }

    /// Present an instruction (the dispatch cycle).
    ///
    /// Single-cycle operations complete here and return `ready`. Multi-cycle
    /// operations move the controller out of `Idle`; drive them with
    /// [`advance`](Self::advance). An instruction presented outside `Idle` is
    /// refused and changes nothing.
    pub fn issue(&mut self, insn: Instruction) -> Result<Signals, IssueError> {
        if !self.is_idle() {
            log::warn!("refusing {} while in {:?}", insn.operation(), self.state);
            return Err(IssueError::Busy { state: self.state });
        }

        self.ready = false;
        let op = insn.operation();
        self.current = Some(op);
        log::debug!("dispatch {}", insn);

        let signals = match op {
            Operation::Load => {
                self.mem_request = Some(MemRequest::read(insn.rs1));
                self.transition(ControllerState::MemOp)
            }
            Operation::Store => {
                self.mem_request = Some(MemRequest::write(insn.rs1, self.regs.car));
                self.transition(ControllerState::MemOp)
            }
            Operation::Get { upper } => {
                let half = if upper { self.regs.car_high() } else { self.regs.car_low() };
                self.complete(half)
            }
            Operation::Set { upper: true } => {
                self.regs.set_car_high(insn.rs1);
                self.complete(STATUS_OK)
            }
            Operation::Set { upper: false } => {
                self.regs.car = insn.rs1 as u64;
                self.regs.history.clear();
                self.complete(STATUS_OK)
            }
            Operation::ScratchpadToCar => {
                self.regs.car = self.regs.scratchpad.read(insn.rs1);
                self.complete(STATUS_OK)
            }
            Operation::CarToScratchpad => {
                self.regs.scratchpad.write(insn.rs1, self.regs.car);
                self.complete(STATUS_OK)
            }
            Operation::Step => {
                self.regs.rule = insn.rs1 as u8;
                self.begin_evolution(insn.rs2 as u16, ControllerState::Evolve)
            }
            Operation::Life => self.begin_evolution(insn.rs2 as u16, ControllerState::LifeEvolve),
            Operation::Find => self.complete(find_result(self.regs.car, insn.rs1)),
            Operation::Count => self.complete(population(self.regs.car)),
            Operation::Undo => {
                match self.regs.history.pop() {
                    Some(snapshot) => {
                        self.regs.car = snapshot;
                        self.stats.undos_applied += 1;
                    }
                    None => {
                        log::debug!("undo with empty history ignored");
                        self.stats.undos_empty += 1;
                    }
                }
                self.complete(STATUS_OK)
            }
            Operation::DmaLoad => self.begin_dma(insn.rs1, insn.rs2, DmaDirection::Load),
            Operation::DmaStore => self.begin_dma(insn.rs1, insn.rs2, DmaDirection::Store),
        };

        Ok(signals)
    }

    /// Perform one unit of work in the current state.
    ///
    /// `response` is the memory port's answer for this cycle. In `Idle` this
    /// does nothing.
    pub fn advance(&mut self, response: MemResponse) -> Signals {
        self.ready = false;

        match self.state {
            ControllerState::Idle => Signals::BUSY,
            ControllerState::Evolve => self.evolve_once(EvolutionKind::Rule),
            ControllerState::LifeEvolve => self.evolve_once(EvolutionKind::Life),
            ControllerState::MemOp => self.memory_op(response),
            ControllerState::DmaXfer => self.dma_transfer(response),
        }
    }

    fn transition(&mut self, next: ControllerState) -> Signals {
        log::trace!("{:?} -> {:?}", self.state, next);
        self.state = next;
        Signals::BUSY
    }

    fn complete(&mut self, result: u32) -> Signals {
        if self.state != ControllerState::Idle {
            log::trace!("{:?} -> Idle", self.state);
        }
        self.state = ControllerState::Idle;
        self.result = result;
        self.ready = true;
        Signals::done(result)
    }

    fn begin_evolution(&mut self, steps: u16, state: ControllerState) -> Signals {
        self.regs.steps = steps;
        if steps == 0 {
            return self.complete(STATUS_OK);
        }
        self.regs.history.push(self.regs.car);
        self.stats.history_pushes += 1;
        self.transition(state)
    }

    fn evolve_once(&mut self, kind: EvolutionKind) -> Signals {
        self.regs.car = kind.apply(self.regs.car, self.regs.rule);
        self.regs.steps -= 1;
        self.stats.evolution_passes += 1;
        if self.trace_evolution {
            log::trace!(
                "{:?} pass, {} remaining: 0x{:016x}",
                kind,
                self.regs.steps,
                self.regs.car
            );
        }

        if self.regs.steps == 0 {
            self.complete(STATUS_OK)
        } else {
            Signals::BUSY
        }
    }

    fn memory_op(&mut self, response: MemResponse) -> Signals {
        if !response.ready {
            return Signals::BUSY;
        }

        if let Some(request) = self.mem_request.take() {
            if !request.is_write() {
                self.regs.car = response.rdata;
            }
        }
        self.complete(STATUS_OK)
    }

    fn begin_dma(&mut self, addr: u32, length: u32, direction: DmaDirection) -> Signals {
        if !dma::length_fits(length) {
            log::warn!(
                "DMA {:?} of {} words exceeds scratchpad capacity of {}",
                direction,
                length,
                dma::DMA_MAX_WORDS
            );
            self.stats.dma_rejected += 1;
            return self.complete(DMA_REJECTED);
        }

        self.regs.dma = DmaDescriptor::start(addr, length, direction);
        self.transition(ControllerState::DmaXfer)
    }

    fn dma_transfer(&mut self, response: MemResponse) -> Signals {
        let step = DmaSequencer::advance(&mut self.regs.dma, &mut self.regs.scratchpad, response);

        match step {
            DmaStep::Issued(request) => {
                self.mem_request = Some(request);
                Signals::BUSY
            }
            DmaStep::Waiting => Signals::BUSY,
            DmaStep::Committed { done } => {
                self.mem_request = None;
                if done {
                    self.finish_dma()
                } else {
                    Signals::BUSY
                }
            }
            DmaStep::Done => self.finish_dma(),
        }
    }

    fn finish_dma(&mut self) -> Signals {
        let dma = self.regs.dma;
        self.stats.dma_words += dma.length as u64;
        log::debug!(
            "DMA {:?} complete: {} words at 0x{:08x}",
            dma.direction,
            dma.length,
            dma.base_addr
        );
        self.complete(DMA_SUCCESS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::HISTORY_DEPTH;
    use crate::interpreter::execute::{life_step, rule_step, NOT_FOUND};
    use crate::interpreter::traits::MemAccess;

    /// Issue and advance with an idle port until ready; returns (result, advances).
    fn run(ctrl: &mut Controller, insn: Instruction) -> (u32, u32) {
        let mut signals = ctrl.issue(insn).unwrap();
        let mut advances = 0;
        while !signals.ready {
            signals = ctrl.advance(MemResponse::IDLE);
            advances += 1;
            assert!(advances < 1_000_000, "instruction never completed");
        }
        (signals.result, advances)
    }

    fn set_car(ctrl: &mut Controller, value: u64) {
        run(ctrl, Instruction::set_low(value as u32));
        run(ctrl, Instruction::set_high((value >> 32) as u32));
    }

    fn get_car(ctrl: &mut Controller) -> u64 {
        let (lo, _) = run(ctrl, Instruction::get_low());
        let (hi, _) = run(ctrl, Instruction::get_high());
        ((hi as u64) << 32) | lo as u64
    }

    #[test]
    fn test_reset_state() {
        let ctrl = Controller::new();
        assert_eq!(ctrl.state(), ControllerState::Idle);
        assert_eq!(ctrl.car(), 0);
        assert!(ctrl.mem_request().is_none());
        assert!(ctrl.registers().history.is_empty());
    }

    #[test]
    fn test_set_get_round_trip() {
        let mut ctrl = Controller::new();
        for v in [0u64, 1, 0x1234_5678_9ABC_DEF0, u64::MAX, 0xFFFF_FFFF_0000_0000] {
            set_car(&mut ctrl, v);
            assert_eq!(get_car(&mut ctrl), v);
        }
    }

    #[test]
    fn test_single_cycle_ops_ready_at_dispatch() {
        let mut ctrl = Controller::new();
        for insn in [
            Instruction::set_low(5),
            Instruction::set_high(5),
            Instruction::get_low(),
            Instruction::get_high(),
            Instruction::find(5),
            Instruction::count(),
            Instruction::undo(),
            Instruction::sp_load(1),
            Instruction::sp_store(1),
            Instruction::step(30, 0),
            Instruction::life(0),
        ] {
            let signals = ctrl.issue(insn).unwrap();
            assert!(signals.ready, "{} should complete at dispatch", insn);
            assert!(ctrl.is_idle());
        }
    }

    #[test]
    fn test_set_high_keeps_low_and_history() {
        let mut ctrl = Controller::new();
        run(&mut ctrl, Instruction::set_low(0xAAAA_5555));
        run(&mut ctrl, Instruction::step(30, 1));
        let before = ctrl.car();
        run(&mut ctrl, Instruction::set_high(0x0102_0304));
        assert_eq!(ctrl.car(), 0x0102_0304_0000_0000 | (before & 0xFFFF_FFFF));
        assert_eq!(ctrl.registers().history.len(), 1);
    }

    #[test]
    fn test_set_low_zero_extends_and_clears_history() {
        let mut ctrl = Controller::new();
        set_car(&mut ctrl, u64::MAX);
        run(&mut ctrl, Instruction::step(30, 3));
        run(&mut ctrl, Instruction::step(110, 3));
        assert_eq!(ctrl.registers().history.len(), 2);

        run(&mut ctrl, Instruction::set_low(0x42));
        assert_eq!(ctrl.car(), 0x42);
        assert!(ctrl.registers().history.is_empty());
        assert_eq!(ctrl.registers().history.pointer(), 0);

        // Nothing to undo past the new baseline.
        run(&mut ctrl, Instruction::undo());
        assert_eq!(ctrl.car(), 0x42);
    }

    #[test]
    fn test_step_takes_one_advance_per_pass() {
        let mut ctrl = Controller::new();
        run(&mut ctrl, Instruction::set_low(1));
        let (result, advances) = run(&mut ctrl, Instruction::step(30, 10));
        assert_eq!(result, STATUS_OK);
        assert_eq!(advances, 10);

        let mut expected = 1u64;
        for _ in 0..10 {
            expected = rule_step(expected, 30);
        }
        assert_eq!(ctrl.car(), expected);
        assert_eq!(ctrl.registers().rule, 30);
        assert_eq!(ctrl.registers().steps, 0);
        assert_eq!(ctrl.stats().evolution_passes, 10);
    }

    #[test]
    fn test_intermediate_progress_visible() {
        let mut ctrl = Controller::new();
        run(&mut ctrl, Instruction::set_low(1));
        ctrl.issue(Instruction::step(90, 3)).unwrap();
        assert_eq!(ctrl.state(), ControllerState::Evolve);
        assert_eq!(ctrl.car(), 1);

        ctrl.advance(MemResponse::IDLE);
        assert_eq!(ctrl.car(), rule_step(1, 90));
        assert_eq!(ctrl.registers().steps, 2);
    }

    #[test]
    fn test_step_uses_low_operand_bits() {
        let mut ctrl = Controller::new();
        run(&mut ctrl, Instruction::set_low(1));
        // rule 0x11E -> 0x1E (30); steps 0x1_0002 -> 2
        let (_, advances) = run(&mut ctrl, Instruction::new(4, 0, 0x11E, 0x1_0002));
        assert_eq!(advances, 2);
        assert_eq!(ctrl.registers().rule, 30);
        assert_eq!(ctrl.car(), rule_step(rule_step(1, 30), 30));
    }

    #[test]
    fn test_zero_steps_is_noop() {
        let mut ctrl = Controller::new();
        run(&mut ctrl, Instruction::set_low(0xF0));
        let (_, advances) = run(&mut ctrl, Instruction::step(30, 0));
        assert_eq!(advances, 0);
        assert_eq!(ctrl.car(), 0xF0);
        assert!(ctrl.registers().history.is_empty());

        run(&mut ctrl, Instruction::life(0));
        assert_eq!(ctrl.car(), 0xF0);
        assert!(ctrl.registers().history.is_empty());
    }

    #[test]
    fn test_life_still_block() {
        let mut ctrl = Controller::new();
        let block = (1u64 << 27) | (1 << 28) | (1 << 35) | (1 << 36);
        set_car(&mut ctrl, block);
        let (_, advances) = run(&mut ctrl, Instruction::life(1));
        assert_eq!(advances, 1);
        assert_eq!(ctrl.car(), block);
    }

    #[test]
    fn test_life_glider_matches_engine() {
        let mut ctrl = Controller::new();
        let glider = (1u64 << 1) | (1 << 10) | (1 << 16) | (1 << 17) | (1 << 18);
        set_car(&mut ctrl, glider);
        run(&mut ctrl, Instruction::life(4));

        let mut expected = glider;
        for _ in 0..4 {
            expected = life_step(expected);
        }
        assert_eq!(get_car(&mut ctrl), expected);
    }

    #[test]
    fn test_undo_restores_pre_evolution_value() {
        let mut ctrl = Controller::new();
        run(&mut ctrl, Instruction::set_low(1));
        run(&mut ctrl, Instruction::step(30, 10));
        assert_ne!(ctrl.car(), 1);
        run(&mut ctrl, Instruction::undo());
        assert_eq!(ctrl.car(), 1);
        assert_eq!(ctrl.stats().undos_applied, 1);
    }

    #[test]
    fn test_undo_depth_limit() {
        let mut ctrl = Controller::new();
        run(&mut ctrl, Instruction::set_low(1));

        let mut values = vec![ctrl.car()];
        for _ in 0..9 {
            run(&mut ctrl, Instruction::step(30, 1));
            values.push(ctrl.car());
        }

        // Eight undos walk back to the value before the 2nd evolution.
        for k in 1..=HISTORY_DEPTH {
            run(&mut ctrl, Instruction::undo());
            assert_eq!(ctrl.car(), values[9 - k]);
        }
        assert_eq!(ctrl.car(), values[1]);

        // The value before the first evolution is gone.
        run(&mut ctrl, Instruction::undo());
        assert_eq!(ctrl.car(), values[1]);
        assert_eq!(ctrl.stats().undos_empty, 1);
    }

    #[test]
    fn test_undo_mixes_engines() {
        let mut ctrl = Controller::new();
        let v0 = 0x0000_0018_1800_0000u64;
        set_car(&mut ctrl, v0);
        run(&mut ctrl, Instruction::life(2));
        let v1 = ctrl.car();
        run(&mut ctrl, Instruction::step(110, 5));
        run(&mut ctrl, Instruction::undo());
        assert_eq!(ctrl.car(), v1);
        run(&mut ctrl, Instruction::undo());
        assert_eq!(ctrl.car(), v0);
    }

    #[test]
    fn test_find_and_count() {
        let mut ctrl = Controller::new();
        set_car(&mut ctrl, 0x12345678_DEADBEEF);
        assert_eq!(run(&mut ctrl, Instruction::find(0xDEADBEEF)).0, 0);
        assert_eq!(run(&mut ctrl, Instruction::find(0x12345678)).0, 32);
        assert_eq!(run(&mut ctrl, Instruction::find(0xFFFF_FFFF)).0, NOT_FOUND);

        for (value, expected) in [(0u64, 0u32), (1 << 63, 1), (0xFFFF_FFFF, 32), (u64::MAX, 64)] {
            set_car(&mut ctrl, value);
            assert_eq!(run(&mut ctrl, Instruction::count()).0, expected);
        }
    }

    #[test]
    fn test_scratchpad_transfers_wrap_index() {
        let mut ctrl = Controller::new();
        set_car(&mut ctrl, 0xFEED_FACE_0000_0001);
        run(&mut ctrl, Instruction::sp_store(0x1FF));
        assert_eq!(ctrl.registers().scratchpad.read(0xFF), 0xFEED_FACE_0000_0001);

        set_car(&mut ctrl, 0);
        run(&mut ctrl, Instruction::sp_load(0xFF));
        assert_eq!(ctrl.car(), 0xFEED_FACE_0000_0001);
    }

    #[test]
    fn test_load_waits_for_memory() {
        let mut ctrl = Controller::new();
        let signals = ctrl.issue(Instruction::load(0x7000)).unwrap();
        assert!(!signals.ready);
        assert_eq!(ctrl.state(), ControllerState::MemOp);
        assert_eq!(ctrl.mem_request(), Some(&MemRequest::read(0x7000)));

        // Request stays presented while memory is busy.
        for _ in 0..5 {
            assert!(!ctrl.advance(MemResponse::IDLE).ready);
            assert!(ctrl.mem_request().is_some());
        }

        let signals = ctrl.advance(MemResponse::complete(0xFEEDFACE_DEADBEEF));
        assert!(signals.ready);
        assert_eq!(signals.result, STATUS_OK);
        assert_eq!(ctrl.car(), 0xFEEDFACE_DEADBEEF);
        assert!(ctrl.mem_request().is_none());
        assert!(ctrl.is_idle());
    }

    #[test]
    fn test_store_presents_car() {
        let mut ctrl = Controller::new();
        set_car(&mut ctrl, 0xABCD);
        ctrl.issue(Instruction::store(0x100)).unwrap();
        let req = *ctrl.mem_request().unwrap();
        assert_eq!(req.addr, 0x100);
        assert_eq!(req.access, MemAccess::Write(0xABCD));

        // Read data on a write completion is ignored.
        assert!(ctrl.advance(MemResponse::complete(0x9999)).ready);
        assert_eq!(ctrl.car(), 0xABCD);
    }

    #[test]
    fn test_dma_over_capacity_rejected() {
        let mut ctrl = Controller::new();
        for insn in [Instruction::dma_load(0x1000, 257), Instruction::dma_store(0x1000, 1000)] {
            let signals = ctrl.issue(insn).unwrap();
            assert!(signals.ready);
            assert_eq!(signals.result, DMA_REJECTED);
            assert!(ctrl.is_idle());
            assert!(ctrl.mem_request().is_none());
            assert_eq!(ctrl.registers().dma, DmaDescriptor::default());
        }
        assert_eq!(ctrl.stats().dma_rejected, 2);
    }

    #[test]
    fn test_dma_load_handshake() {
        let mut ctrl = Controller::new();
        let signals = ctrl.issue(Instruction::dma_load(0x2000, 2)).unwrap();
        assert!(!signals.ready);
        assert_eq!(ctrl.state(), ControllerState::DmaXfer);

        // Issue word 0.
        ctrl.advance(MemResponse::IDLE);
        assert_eq!(ctrl.mem_request(), Some(&MemRequest::read(0x2000)));
        assert!(ctrl.registers().dma.pending);

        // Commit word 0.
        assert!(!ctrl.advance(MemResponse::complete(11)).ready);
        assert!(ctrl.mem_request().is_none());

        // Issue and commit word 1; burst completes on the last commit.
        ctrl.advance(MemResponse::IDLE);
        assert_eq!(ctrl.mem_request(), Some(&MemRequest::read(0x2008)));
        let signals = ctrl.advance(MemResponse::complete(22));
        assert!(signals.ready);
        assert_eq!(signals.result, DMA_SUCCESS);

        assert_eq!(ctrl.registers().scratchpad.read(0), 11);
        assert_eq!(ctrl.registers().scratchpad.read(1), 22);
        assert_eq!(ctrl.stats().dma_words, 2);
    }

    #[test]
    fn test_dma_zero_length() {
        let mut ctrl = Controller::new();
        assert!(!ctrl.issue(Instruction::dma_store(0x2000, 0)).unwrap().ready);
        let signals = ctrl.advance(MemResponse::IDLE);
        assert!(signals.ready);
        assert_eq!(signals.result, DMA_SUCCESS);
    }

    #[test]
    fn test_issue_while_busy_refused() {
        let mut ctrl = Controller::new();
        run(&mut ctrl, Instruction::set_low(1));
        ctrl.issue(Instruction::step(30, 5)).unwrap();

        let err = ctrl.issue(Instruction::set_low(0)).unwrap_err();
        assert_eq!(err, IssueError::Busy { state: ControllerState::Evolve });
        assert_eq!(ctrl.car(), 1);
        assert_eq!(ctrl.registers().steps, 5);
    }

    #[test]
    fn test_advance_in_idle_does_nothing() {
        let mut ctrl = Controller::new();
        run(&mut ctrl, Instruction::set_low(7));
        let signals = ctrl.advance(MemResponse::complete(99));
        assert!(!signals.ready);
        assert_eq!(ctrl.car(), 7);
    }

    #[test]
    fn test_reset_abandons_work() {
        let mut ctrl = Controller::new();
        run(&mut ctrl, Instruction::set_low(3));
        run(&mut ctrl, Instruction::sp_store(4));
        ctrl.issue(Instruction::dma_load(0, 10)).unwrap();
        ctrl.advance(MemResponse::IDLE);

        ctrl.reset();
        assert!(ctrl.is_idle());
        assert_eq!(ctrl.car(), 0);
        assert_eq!(ctrl.registers().scratchpad.read(4), 0);
        assert!(ctrl.mem_request().is_none());
        assert_eq!(ctrl.registers().dma, DmaDescriptor::default());
    }
}
