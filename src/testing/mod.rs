//! Software reference models and benchmark workloads.
//!
//! - [`oracle`]: bit-loop golden models for both automata
//! - [`workloads`]: parameter sweep, time-series capture and DMA bandwidth
//!
//! # Usage
//!
//! ```bash
//! ca-coproc sweep
//! ca-coproc capture
//! ca-coproc bandwidth
//! ```

pub mod oracle;
pub mod workloads;

pub use oracle::{ca_step_sw, life_step_sw};
pub use workloads::{
    dma_bandwidth, parameter_sweep, time_series_capture, BandwidthReport, BandwidthSample,
    CaptureParams, CaptureReport, SweepParams, SweepReport, BANDWIDTH_SIZES,
};
