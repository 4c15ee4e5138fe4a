//! Text program format.
//!
//! One statement per line. Instructions use the assembly mnemonics with
//! their register operands given as literal values; a few directives
//! preload memory and check results.
//!
//! ```text
//! # seed a single cell and run rule 30
//! ca_set 0x1
//! ca_step 30 10
//! ca_count
//! expect 11                     // checks the previous result
//!
//! mem 0x2000 0xCAFEBABE00000000 // preload one 64-bit word
//! ca_dma_load 0x2000 1
//! ca_sp_load 0
//! expect_car 0xCAFEBABE00000000
//! ```
//!
//! Numbers are decimal or `0x` hex, with optional `_` separators. Comments
//! start with `#` or `//`.
//!
//! # Example
//!
//! ```
//! use ca_coproc::parser::Program;
//! use ca_coproc::interpreter::CoprocessorEngine;
//!
//! let program = Program::parse("ca_set 0xFF\nca_count\nexpect 8\n")?;
//! let mut engine = CoprocessorEngine::with_latency(10);
//! let trace = program.run(&mut engine)?;
//! assert_eq!(trace.last().unwrap().completion.result, 8);
//! # Ok::<(), anyhow::Error>(())
//! ```

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};

use crate::interpreter::engine::{Completion, CoprocessorEngine};
use crate::interpreter::Instruction;

/// A parsed statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statement {
    /// Issue an instruction and wait for it.
    Execute(Instruction),
    /// Preload a memory word.
    Mem {
        /// Byte address (aligned down to 8).
        addr: u32,
        /// Word value.
        value: u64,
    },
    /// Check the result of the previous instruction.
    Expect(u32),
    /// Check the full CAR value.
    ExpectCar(u64),
}

/// A statement with its source line number (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    pub number: usize,
    pub statement: Statement,
}

/// One executed instruction.
#[derive(Debug, Clone, Copy)]
pub struct Executed {
    /// Source line.
    pub line: usize,
    pub instruction: Instruction,
    pub completion: Completion,
}

/// A parsed program.
#[derive(Debug, Clone, Default)]
pub struct Program {
    lines: Vec<Line>,
}

impl Program {
    /// Parse program text.
    pub fn parse(source: &str) -> Result<Self> {
        let mut lines = Vec::new();
        for (idx, raw) in source.lines().enumerate() {
            let number = idx + 1;
            if let Some(statement) =
                parse_line(raw).with_context(|| format!("line {}: '{}'", number, raw.trim()))?
            {
                lines.push(Line { number, statement });
            }
        }
        Ok(Self { lines })
    }

    /// Read and parse a program file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&source).with_context(|| format!("in {}", path.display()))
    }

    /// Parsed statements.
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Number of instructions (directives excluded).
    pub fn instruction_count(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| matches!(l.statement, Statement::Execute(_)))
            .count()
    }

    /// Run every statement on `engine`, stopping at the first failed check.
    pub fn run(&self, engine: &mut CoprocessorEngine) -> Result<Vec<Executed>> {
        let mut trace: Vec<Executed> = Vec::new();

        for line in &self.lines {
            match line.statement {
                Statement::Execute(instruction) => {
                    let completion = engine
                        .execute(instruction)
                        .with_context(|| format!("line {}: {}", line.number, instruction))?;
                    log::debug!(
                        "line {}: {} -> 0x{:08x} in {} cycles",
                        line.number,
                        instruction,
                        completion.result,
                        completion.cycles
                    );
                    trace.push(Executed {
                        line: line.number,
                        instruction,
                        completion,
                    });
                }
                Statement::Mem { addr, value } => {
                    engine.memory_mut().memory_mut().write_word(addr as u64, value);
                }
                Statement::Expect(expected) => {
                    let last = trace
                        .last()
                        .ok_or_else(|| anyhow!("line {}: expect before any instruction", line.number))?;
                    if last.completion.result != expected {
                        bail!(
                            "line {}: expected 0x{:08x}, {} returned 0x{:08x}",
                            line.number,
                            expected,
                            last.instruction,
                            last.completion.result
                        );
                    }
                }
                Statement::ExpectCar(expected) => {
                    let car = engine.controller().car();
                    if car != expected {
                        bail!(
                            "line {}: expected CAR 0x{:016x}, found 0x{:016x}",
                            line.number,
                            expected,
                            car
                        );
                    }
                }
            }
        }

        Ok(trace)
    }
}

/// Parse a number: decimal or `0x` hex.
pub fn parse_number(token: &str) -> Result<u64> {
    let cleaned = token.replace('_', "");
    let parsed = match cleaned.strip_prefix("0x").or_else(|| cleaned.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => cleaned.parse(),
    };
    parsed.map_err(|_| anyhow!("invalid number '{}'", token))
}

fn strip_comment(line: &str) -> &str {
    let end = [line.find('#'), line.find("//")]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(line.len());
    &line[..end]
}

fn parse_line(raw: &str) -> Result<Option<Statement>> {
    let mut tokens = strip_comment(raw).split_whitespace();
    let Some(head) = tokens.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = tokens.collect();
    let mnemonic = head.to_ascii_lowercase();

    let statement = match mnemonic.as_str() {
        "mem" => {
            let [addr, value] = operands::<2>(&mnemonic, &args)?;
            Statement::Mem {
                addr: narrow(addr, "address")?,
                value,
            }
        }
        "expect" => {
            let [value] = operands::<1>(&mnemonic, &args)?;
            Statement::Expect(narrow(value, "result")?)
        }
        "expect_car" => {
            let [value] = operands::<1>(&mnemonic, &args)?;
            Statement::ExpectCar(value)
        }
        _ => Statement::Execute(parse_instruction(&mnemonic, &args)?),
    };

    Ok(Some(statement))
}

fn parse_instruction(mnemonic: &str, args: &[&str]) -> Result<Instruction> {
    let insn = match mnemonic {
        "ca_load" => Instruction::load(single(mnemonic, args)?),
        "ca_store" => Instruction::store(single(mnemonic, args)?),
        "ca_get" => none(mnemonic, args, Instruction::get_low())?,
        "ca_get_u" => none(mnemonic, args, Instruction::get_high())?,
        "ca_set" => Instruction::set_low(single(mnemonic, args)?),
        "ca_set_u" => Instruction::set_high(single(mnemonic, args)?),
        "ca_sp_load" => Instruction::sp_load(single(mnemonic, args)?),
        "ca_sp_store" => Instruction::sp_store(single(mnemonic, args)?),
        "ca_step" => {
            let [rule, steps] = operands::<2>(mnemonic, args)?;
            Instruction::step(narrow(rule, "rule")?, narrow(steps, "step count")?)
        }
        "ca_find" => Instruction::find(single(mnemonic, args)?),
        "ca_count" => none(mnemonic, args, Instruction::count())?,
        "ca_life" => {
            let [steps] = operands::<1>(mnemonic, args)?;
            Instruction::life(narrow(steps, "step count")?)
        }
        "ca_undo" => none(mnemonic, args, Instruction::undo())?,
        "ca_dma_load" | "ca_dma_store" => {
            let [addr, len] = operands::<2>(mnemonic, args)?;
            let addr = narrow(addr, "address")?;
            let len = narrow(len, "length")?;
            if mnemonic == "ca_dma_load" {
                Instruction::dma_load(addr, len)
            } else {
                Instruction::dma_store(addr, len)
            }
        }
        other => bail!("unknown mnemonic '{}'", other),
    };
    Ok(insn)
}

fn operands<const N: usize>(mnemonic: &str, args: &[&str]) -> Result<[u64; N]> {
    if args.len() != N {
        bail!("{} takes {} operand(s), found {}", mnemonic, N, args.len());
    }
    let mut values = [0u64; N];
    for (slot, token) in values.iter_mut().zip(args) {
        *slot = parse_number(token)?;
    }
    Ok(values)
}

fn single(mnemonic: &str, args: &[&str]) -> Result<u32> {
    let [value] = operands::<1>(mnemonic, args)?;
    narrow(value, "operand")
}

fn none(mnemonic: &str, args: &[&str], insn: Instruction) -> Result<Instruction> {
    operands::<0>(mnemonic, args)?;
    Ok(insn)
}

fn narrow<T: TryFrom<u64>>(value: u64, what: &str) -> Result<T> {
    T::try_from(value).map_err(|_| anyhow!("{} 0x{:x} out of range", what, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::Operation;

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("42").unwrap(), 42);
        assert_eq!(parse_number("0xFF").unwrap(), 255);
        assert_eq!(parse_number("0xDEAD_BEEF").unwrap(), 0xDEADBEEF);
        assert!(parse_number("0xZZ").is_err());
        assert!(parse_number("ten").is_err());
    }

    #[test]
    fn test_comments_and_blank_lines() {
        let program = Program::parse("# header\n\n  // note\nca_count # trailing\n").unwrap();
        assert_eq!(program.lines().len(), 1);
        assert_eq!(program.lines()[0].number, 4);
    }

    #[test]
    fn test_every_mnemonic() {
        let source = "ca_load 0x100\nca_store 0x108\nca_get\nca_get_u\nca_set 1\nca_set_u 2\n\
                      ca_sp_load 3\nca_sp_store 4\nca_step 30 10\nca_find 0xF\nca_count\n\
                      ca_life 4\nca_undo\nca_dma_load 0x2000 8\nca_dma_store 0x3000 8\n";
        let program = Program::parse(source).unwrap();
        let ops: Vec<Operation> = program
            .lines()
            .iter()
            .map(|l| match l.statement {
                Statement::Execute(insn) => insn.operation(),
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        let names: Vec<&str> = ops.iter().map(|op| op.mnemonic()).collect();
        assert_eq!(
            names,
            source.lines().map(|l| l.split_whitespace().next().unwrap()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_operand_errors_report_line() {
        let err = Program::parse("ca_count\nca_step 300 1\n").unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"));

        let err = Program::parse("ca_set\n").unwrap_err();
        assert!(format!("{:#}", err).contains("takes 1 operand"));

        let err = Program::parse("ca_jump 4\n").unwrap_err();
        assert!(format!("{:#}", err).contains("unknown mnemonic"));
    }

    #[test]
    fn test_run_with_expectations() {
        let source = "\
            mem 0x2000 0xCAFEBABE00000000\n\
            ca_dma_load 0x2000 1\n\
            expect 0\n\
            ca_sp_load 0\n\
            expect_car 0xCAFEBABE00000000\n\
            ca_get_u\n\
            expect 0xCAFEBABE\n";
        let program = Program::parse(source).unwrap();
        assert_eq!(program.instruction_count(), 3);

        let mut engine = CoprocessorEngine::with_latency(4);
        let trace = program.run(&mut engine).unwrap();
        assert_eq!(trace.len(), 3);
        assert_eq!(trace[0].completion.cycles, 6);
        assert_eq!(trace[2].line, 6);
    }

    #[test]
    fn test_failed_expectation() {
        let program = Program::parse("ca_set 3\nca_count\nexpect 5\n").unwrap();
        let mut engine = CoprocessorEngine::with_latency(0);
        let err = program.run(&mut engine).unwrap_err();
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_expect_without_instruction() {
        let program = Program::parse("expect 0\n").unwrap();
        let mut engine = CoprocessorEngine::with_latency(0);
        assert!(program.run(&mut engine).is_err());
    }

    #[test]
    fn test_module_example_program_passes() {
        let source = "\
            # seed a single cell and run rule 30\n\
            ca_set 0x1\n\
            ca_step 30 10\n\
            ca_count\n\
            expect 11                     // checks the previous result\n\
            \n\
            mem 0x2000 0xCAFEBABE00000000 // preload one 64-bit word\n\
            ca_dma_load 0x2000 1\n\
            ca_sp_load 0\n\
            expect_car 0xCAFEBABE00000000\n";
        let program = Program::parse(source).unwrap();
        let mut engine = CoprocessorEngine::with_latency(10);
        let trace = program.run(&mut engine).unwrap();
        assert_eq!(trace[2].completion.result, 11);
    }
}
