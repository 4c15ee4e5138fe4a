//! Operation decode and instruction construction.
//!
//! # Decode priority
//!
//! The alt and transfer bits mean different things for different classes, so
//! an instruction is classified by the first matching rule:
//!
//! 1. LIFE + alt → `undo`
//! 2. GET + transfer → scratchpad → CAR
//! 3. SET + transfer → CAR → scratchpad
//! 4. LOAD + alt → DMA load
//! 5. STORE + alt → DMA store
//! 6. the base operation of the class
//!
//! For `get`, the upper half is selected by either the upper bit or the alt
//! bit: the `ca_get_u` macro encodes modifier value 1 while `ca_set_u`
//! encodes value 2, and both encodings must keep working.

use super::{class, extract_field, modifier, Operation, CUSTOM0_OPCODE};
use crate::interpreter::traits::DecodeError;

/// Classify an instruction from its class and modifier fields.
///
/// Only the low 3 bits of `funct3` and the low 3 bits of `funct7` are
/// significant; everything else is ignored.
pub fn decode_operation(funct3: u8, funct7: u8) -> Operation {
    let selector = funct3 & 0x7;
    let alt = funct7 & modifier::ALT != 0;
    let upper = funct7 & modifier::UPPER != 0;
    let transfer = funct7 & modifier::TRANSFER != 0;

    match selector {
        class::LIFE if alt => Operation::Undo,
        class::GET if transfer => Operation::ScratchpadToCar,
        class::SET if transfer => Operation::CarToScratchpad,
        class::LOAD if alt => Operation::DmaLoad,
        class::STORE if alt => Operation::DmaStore,
        class::LOAD => Operation::Load,
        class::STORE => Operation::Store,
        class::GET => Operation::Get { upper: upper || alt },
        class::SET => Operation::Set { upper },
        class::STEP => Operation::Step,
        class::FIND => Operation::Find,
        class::COUNT => Operation::Count,
        _ => Operation::Life,
    }
}

/// An instruction as presented to the controller: the decoded fields plus
/// the values of the two source registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Instruction {
    /// Operation class.
    pub funct3: u8,
    /// Modifier bits.
    pub funct7: u8,
    /// Value of the first source register.
    pub rs1: u32,
    /// Value of the second source register.
    pub rs2: u32,
}

impl Instruction {
    /// Build an instruction from raw fields.
    pub fn new(funct3: u8, funct7: u8, rs1: u32, rs2: u32) -> Self {
        Self { funct3, funct7, rs1, rs2 }
    }

    /// The operation this instruction decodes to.
    pub fn operation(&self) -> Operation {
        decode_operation(self.funct3, self.funct7)
    }

    /// `ca_load`: CAR := mem[addr].
    pub fn load(addr: u32) -> Self {
        Self::new(class::LOAD, 0, addr, 0)
    }

    /// `ca_store`: mem[addr] := CAR.
    pub fn store(addr: u32) -> Self {
        Self::new(class::STORE, 0, addr, 0)
    }

    /// `ca_get`: low half of CAR.
    pub fn get_low() -> Self {
        Self::new(class::GET, 0, 0, 0)
    }

    /// `ca_get_u`: high half of CAR.
    pub fn get_high() -> Self {
        Self::new(class::GET, modifier::ALT, 0, 0)
    }

    /// `ca_set`: CAR := value (zero-extended), history cleared.
    pub fn set_low(value: u32) -> Self {
        Self::new(class::SET, 0, value, 0)
    }

    /// `ca_set_u`: replace the high half of CAR.
    pub fn set_high(value: u32) -> Self {
        Self::new(class::SET, modifier::UPPER, value, 0)
    }

    /// `ca_sp_load`: CAR := scratchpad[index].
    pub fn sp_load(index: u32) -> Self {
        Self::new(class::GET, modifier::TRANSFER, index, 0)
    }

    /// `ca_sp_store`: scratchpad[index] := CAR.
    pub fn sp_store(index: u32) -> Self {
        Self::new(class::SET, modifier::TRANSFER, index, 0)
    }

    /// `ca_step`: evolve `steps` times under `rule`.
    pub fn step(rule: u8, steps: u16) -> Self {
        Self::new(class::STEP, 0, rule as u32, steps as u32)
    }

    /// `ca_find`: search CAR for `pattern`.
    pub fn find(pattern: u32) -> Self {
        Self::new(class::FIND, 0, pattern, 0)
    }

    /// `ca_count`: population count of CAR.
    pub fn count() -> Self {
        Self::new(class::COUNT, 0, 0, 0)
    }

    /// `ca_life`: evolve the 8×8 Life grid `steps` times.
    pub fn life(steps: u16) -> Self {
        Self::new(class::LIFE, 0, 0, steps as u32)
    }

    /// `ca_undo`: restore the previous CAR snapshot.
    pub fn undo() -> Self {
        Self::new(class::LIFE, modifier::ALT, 0, 0)
    }

    /// `ca_dma_load`: burst `len` words from `addr` into the scratchpad.
    pub fn dma_load(addr: u32, len: u32) -> Self {
        Self::new(class::LOAD, modifier::ALT, addr, len)
    }

    /// `ca_dma_store`: burst `len` scratchpad words to `addr`.
    pub fn dma_store(addr: u32, len: u32) -> Self {
        Self::new(class::STORE, modifier::ALT, addr, len)
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} rs1=0x{:08x} rs2=0x{:08x}",
            self.operation(),
            self.rs1,
            self.rs2
        )
    }
}

/// Fields of a raw 32-bit R-type instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstructionWord {
    pub funct7: u8,
    pub rs2: u8,
    pub rs1: u8,
    pub funct3: u8,
    pub rd: u8,
}

impl InstructionWord {
    /// Split a word into fields, rejecting anything not on custom-0.
    pub fn decode(word: u32) -> Result<Self, DecodeError> {
        let opcode = extract_field(word, 0, 7) as u8;
        if opcode != CUSTOM0_OPCODE {
            return Err(DecodeError::WrongOpcode { opcode, word });
        }

        Ok(Self {
            rd: extract_field(word, 7, 5) as u8,
            funct3: extract_field(word, 12, 3) as u8,
            rs1: extract_field(word, 15, 5) as u8,
            rs2: extract_field(word, 20, 5) as u8,
            funct7: extract_field(word, 25, 7) as u8,
        })
    }

    /// The operation this word decodes to.
    pub fn operation(&self) -> Operation {
        decode_operation(self.funct3, self.funct7)
    }

    /// Bind source register values to form a presentable instruction.
    pub fn with_operands(&self, rs1_value: u32, rs2_value: u32) -> Instruction {
        Instruction::new(self.funct3, self.funct7, rs1_value, rs2_value)
    }
}
