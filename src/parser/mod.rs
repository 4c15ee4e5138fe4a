//! Text program parser.
//!
//! - [`script`] - line-oriented programs of coprocessor instructions

pub mod script;

pub use script::{parse_number, Executed, Line, Program, Statement};
