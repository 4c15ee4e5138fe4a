//! Coprocessor controller.
//!
//! The controller is a five-state machine. `Idle` decodes and dispatches;
//! every other state performs one unit of work per activation and returns
//! to `Idle` when the instruction completes.
//!
//! ```text
//!              ┌──────────── ca_step (steps > 0) ──────────► Evolve ─────┐
//!              ├──────────── ca_life (steps > 0) ──────────► LifeEvolve ─┤
//!   Idle ──────┼──────────── ca_load / ca_store ───────────► MemOp ──────┤
//!    ▲         └──────────── ca_dma_* (len ≤ 256) ─────────► DmaXfer ────┤
//!    └───────────────────────────── ready ───────────────────────────────┘
//! ```
//!
//! All other operations complete in the dispatch cycle.

mod controller;

pub use controller::{
    Controller, ControllerState, ControllerStats, Signals, DMA_REJECTED, STATUS_OK,
};
