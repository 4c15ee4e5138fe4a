//! Execution units of the CA coprocessor.
//!
//! Every unit here is a pure function of CAR (and its operands); the
//! controller owns all state and decides when a unit runs.
//!
//! | Unit | Operations | Latency |
//! |------|------------|---------|
//! | Rule engine | `ca_step` | one pass per activation |
//! | Life engine | `ca_life` | one pass per activation |
//! | Pattern matcher | `ca_find` | dispatch cycle |
//! | Population counter | `ca_count` | dispatch cycle |
//!
//! # Example
//!
//! ```
//! use ca_coproc::interpreter::execute::{rule_step, find_result, population, NOT_FOUND};
//!
//! let next = rule_step(1, 30);
//! assert_eq!(population(next), 3);
//! assert_eq!(find_result(0xF, 0xF), 0);
//! assert_eq!(find_result(0, 1), NOT_FOUND);
//! ```

mod evolve;
mod search;

pub use evolve::{life_step, neighbor_count, rule_step, EvolutionKind, CA_WIDTH, GRID_SIDE};
pub use search::{find_pattern, find_result, population, LAST_WINDOW_START, NOT_FOUND};
