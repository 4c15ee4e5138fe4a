//! Instruction decoder for the CA coprocessor.
//!
//! Coprocessor instructions are RISC-V R-type words on the custom-0 opcode:
//!
//! ```text
//!  31      25 24  20 19  15 14  12 11   7 6      0
//! ┌──────────┬──────┬──────┬──────┬──────┬────────┐
//! │  funct7  │ rs2  │ rs1  │funct3│  rd  │0001011 │
//! └──────────┴──────┴──────┴──────┴──────┴────────┘
//! ```
//!
//! `funct3` selects the operation class and three bits of `funct7` modify it:
//!
//! | Bit | Name | Meaning |
//! |-----|------|---------|
//! | 0 | alt | DMA for LOAD/STORE, undo for LIFE |
//! | 1 | upper | high 32-bit half for GET/SET |
//! | 2 | transfer | scratchpad ↔ CAR for GET/SET |
//!
//! Because the bits overlap, decode follows a fixed priority; see
//! [`decode_operation`].

mod decoder;

pub use decoder::{decode_operation, Instruction, InstructionWord};

/// Custom-0 major opcode used by every coprocessor instruction.
pub const CUSTOM0_OPCODE: u8 = 0x0B;

/// Operation classes (`funct3`).
pub mod class {
    pub const LOAD: u8 = 0b000;
    pub const STORE: u8 = 0b001;
    pub const GET: u8 = 0b010;
    pub const SET: u8 = 0b011;
    pub const STEP: u8 = 0b100;
    pub const FIND: u8 = 0b101;
    pub const COUNT: u8 = 0b110;
    pub const LIFE: u8 = 0b111;
}

/// Modifier bits (`funct7`).
pub mod modifier {
    /// DMA / undo selector.
    pub const ALT: u8 = 1 << 0;
    /// High-half selector.
    pub const UPPER: u8 = 1 << 1;
    /// Scratchpad transfer selector.
    pub const TRANSFER: u8 = 1 << 2;
}

/// Decoded operation identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// CAR := mem[rs1].
    Load,
    /// mem[rs1] := CAR.
    Store,
    /// Return one half of CAR.
    Get {
        /// High half when set.
        upper: bool,
    },
    /// Replace one half of CAR (lower half also clears history).
    Set {
        /// High half when set.
        upper: bool,
    },
    /// CAR := scratchpad[rs1].
    ScratchpadToCar,
    /// scratchpad[rs1] := CAR.
    CarToScratchpad,
    /// 1-D evolution, rule rs1[7:0], steps rs2[15:0].
    Step,
    /// Pattern search for rs1.
    Find,
    /// Population count of CAR.
    Count,
    /// 2-D Life evolution, steps rs2[15:0].
    Life,
    /// Restore the most recent history snapshot.
    Undo,
    /// Burst memory → scratchpad.
    DmaLoad,
    /// Burst scratchpad → memory.
    DmaStore,
}

impl Operation {
    /// Assembly mnemonic for this operation.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Operation::Load => "ca_load",
            Operation::Store => "ca_store",
            Operation::Get { upper: false } => "ca_get",
            Operation::Get { upper: true } => "ca_get_u",
            Operation::Set { upper: false } => "ca_set",
            Operation::Set { upper: true } => "ca_set_u",
            Operation::ScratchpadToCar => "ca_sp_load",
            Operation::CarToScratchpad => "ca_sp_store",
            Operation::Step => "ca_step",
            Operation::Find => "ca_find",
            Operation::Count => "ca_count",
            Operation::Life => "ca_life",
            Operation::Undo => "ca_undo",
            Operation::DmaLoad => "ca_dma_load",
            Operation::DmaStore => "ca_dma_store",
        }
    }

    /// True for operations that may occupy the controller beyond the
    /// dispatch cycle.
    pub fn is_multi_cycle(self) -> bool {
        matches!(
            self,
            Operation::Load
                | Operation::Store
                | Operation::Step
                | Operation::Life
                | Operation::DmaLoad
                | Operation::DmaStore
        )
    }

    /// True when the result register carries an architecturally meaningful
    /// value for this operation.
    pub fn returns_value(self) -> bool {
        matches!(
            self,
            Operation::Get { .. }
                | Operation::Find
                | Operation::Count
                | Operation::DmaLoad
                | Operation::DmaStore
        )
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Extract a bit field from an instruction word.
#[inline]
pub fn extract_field(word: u32, shift: u8, bits: u8) -> u32 {
    (word >> shift) & ((1u32 << bits) - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_field() {
        let word = 0x1234_5678;
        assert_eq!(extract_field(word, 0, 4), 0x8);
        assert_eq!(extract_field(word, 4, 8), 0x67);
        assert_eq!(extract_field(word, 25, 7), 0x1234_5678 >> 25);
    }

    #[test]
    fn test_mnemonics_unique() {
        let ops = [
            Operation::Load,
            Operation::Store,
            Operation::Get { upper: false },
            Operation::Get { upper: true },
            Operation::Set { upper: false },
            Operation::Set { upper: true },
            Operation::ScratchpadToCar,
            Operation::CarToScratchpad,
            Operation::Step,
            Operation::Find,
            Operation::Count,
            Operation::Life,
            Operation::Undo,
            Operation::DmaLoad,
            Operation::DmaStore,
        ];
        let mut names: Vec<_> = ops.iter().map(|op| op.mnemonic()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ops.len());
    }

    #[test]
    fn test_multi_cycle_classification() {
        assert!(Operation::Step.is_multi_cycle());
        assert!(Operation::DmaStore.is_multi_cycle());
        assert!(!Operation::Undo.is_multi_cycle());
        assert!(!Operation::Get { upper: true }.is_multi_cycle());
    }

    #[test]
    fn test_value_returning_operations() {
        assert!(Operation::Get { upper: false }.returns_value());
        assert!(Operation::Find.returns_value());
        assert!(Operation::Count.returns_value());
        assert!(Operation::DmaLoad.returns_value());
        assert!(!Operation::Set { upper: true }.returns_value());
        assert!(!Operation::Step.returns_value());
        assert!(!Operation::Load.returns_value());
        assert!(!Operation::Undo.returns_value());
    }
}
