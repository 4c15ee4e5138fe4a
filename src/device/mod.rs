//! Storage and memory-side models of the CA coprocessor.
//!
//! This module provides:
//! - The register file (CAR, scratchpad, undo history, rule, step counter)
//! - The burst DMA descriptor and its two-phase sequencer
//! - Simulated external memory and a fixed-latency memory port
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────────────── coprocessor ────────────────────────┐
//!   │                                                             │
//!   │   CAR (64b) ◄──► History (8 × 64b)                          │
//!   │     ▲  │                                                    │
//!   │     │  ▼                                                    │
//!   │   Scratchpad (256 × 64b) ◄──► DMA sequencer ──┐             │
//!   │                                               │ one port    │
//!   └───────────────────────────────────────────────┼─────────────┘
//!                                                   ▼
//!                                           External memory
//! ```

pub mod registers;
pub mod host_memory;
pub mod dma;

pub use registers::{History, RegisterFile, Scratchpad, HISTORY_DEPTH, SCRATCHPAD_WORDS};
pub use host_memory::{HostMemory, LatencyMemory};
pub use dma::{DmaDescriptor, DmaDirection, DMA_MAX_WORDS};
