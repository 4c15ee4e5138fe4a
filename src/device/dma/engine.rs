//! Two-phase DMA sequencer.
//!
//! The sequencer is stateless: every call inspects the descriptor, performs
//! at most one phase, and reports what the controller must do with the
//! memory port.
//!
//! # Usage
//!
//! ```
//! use ca_coproc::device::dma::{DmaDescriptor, DmaDirection, DmaSequencer, DmaStep};
//! use ca_coproc::device::Scratchpad;
//! use ca_coproc::interpreter::traits::MemResponse;
//!
//! let mut desc = DmaDescriptor::start(0x1000, 1, DmaDirection::Load);
//! let mut sp = Scratchpad::new();
//!
//! // Phase 1: issue the read.
//! let step = DmaSequencer::advance(&mut desc, &mut sp, MemResponse::IDLE);
//! assert!(matches!(step, DmaStep::Issued(_)));
//!
//! // Phase 2: memory answers, the word lands in the scratchpad.
//! let step = DmaSequencer::advance(&mut desc, &mut sp, MemResponse::complete(42));
//! assert_eq!(step, DmaStep::Committed { done: true });
//! assert_eq!(sp.read(0), 42);
//! ```

use super::{DmaDescriptor, DmaDirection};
use crate::device::registers::Scratchpad;
use crate::interpreter::traits::{MemRequest, MemResponse};

/// Outcome of one sequencer activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmaStep {
    /// A request for the current word was issued; present it until ready.
    Issued(MemRequest),
    /// The issued request has not completed yet.
    Waiting,
    /// The current word completed. `done` is set when it was the last one.
    Committed {
        /// No words remain.
        done: bool,
    },
    /// Nothing left to move (zero-length burst).
    Done,
}

/// Drives a [`DmaDescriptor`] one phase at a time.
pub struct DmaSequencer;

impl DmaSequencer {
    /// Perform one activation.
    ///
    /// `response` is the memory port's answer for this cycle. It is only
    /// consulted while a request is pending.
    pub fn advance(
        desc: &mut DmaDescriptor,
        scratchpad: &mut Scratchpad,
        response: MemResponse,
    ) -> DmaStep {
        if desc.pending {
            return Self::commit(desc, scratchpad, response);
        }

        if desc.is_exhausted() {
            return DmaStep::Done;
        }

        let request = Self::request_for(desc, scratchpad);
        desc.pending = true;
        log::trace!(
            "DMA issue word {}/{} at 0x{:08x} ({:?})",
            desc.index + 1,
            desc.length,
            request.addr,
            desc.direction
        );
        DmaStep::Issued(request)
    }

    /// The request the current word needs.
    pub fn request_for(desc: &DmaDescriptor, scratchpad: &Scratchpad) -> MemRequest {
        let addr = desc.current_address();
        match desc.direction {
            DmaDirection::Load => MemRequest::read(addr),
            DmaDirection::Store => MemRequest::write(addr, scratchpad.read(desc.index)),
        }
    }

    fn commit(
        desc: &mut DmaDescriptor,
        scratchpad: &mut Scratchpad,
        response: MemResponse,
    ) -> DmaStep {
        if !response.ready {
            return DmaStep::Waiting;
        }

        if desc.direction == DmaDirection::Load {
            scratchpad.write(desc.index, response.rdata);
        }

        desc.pending = false;
        desc.index += 1;
        DmaStep::Committed {
            done: desc.is_exhausted(),
        }
    }
}
