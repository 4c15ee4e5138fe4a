//! Multi-cycle driver.
//!
//! [`CoprocessorEngine`] plays the role of the host core and the clock: it
//! issues instructions, clocks the controller against a memory port until the
//! ready pulse, and reports each completion with its cycle count.
//!
//! # Cycle accounting
//!
//! | Operation | Cycles after dispatch |
//! |-----------|-----------------------|
//! | single-cycle ops, rejected DMA, zero-step evolutions | 0 |
//! | `ca_step` / `ca_life` with `n` steps | `n` |
//! | `ca_load` / `ca_store` | `latency + 1` |
//! | `ca_dma_*` of `n` words | `n * (latency + 2)`, or 1 when `n = 0` |

mod coordinator;

pub use coordinator::{Completion, CoprocessorEngine, EngineError, EngineStats};
