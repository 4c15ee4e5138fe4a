//! Simulated external memory behind the coprocessor's memory port.
//!
//! The coprocessor sees memory only through the request/ready handshake
//! (see [`MemoryPort`]). This module provides the storage behind that port
//! plus a fixed-latency port model of a DRAM-like device:
//!
//! ```text
//!   Controller                    LatencyMemory
//!   ──────────                    ─────────────
//!   present MemRequest ──────────► latch, count down `latency` cycles
//!   hold request                   ...
//!   see ready (1 cycle) ◄───────── perform access, pulse ready + rdata
//!   drop request
//! ```
//!
//! # Usage
//!
//! ```
//! use ca_coproc::device::HostMemory;
//!
//! let mut mem = HostMemory::new();
//! mem.write_word(0x2000, 0xCAFE_BABE_0000_0001);
//! assert_eq!(mem.read_word(0x2004), 0xCAFE_BABE_0000_0001); // aligned down
//! ```

use std::collections::BTreeMap;

use crate::interpreter::traits::{MemAccess, MemRequest, MemResponse, MemoryPort};

/// Sparse byte-addressed memory with 64-bit word accessors.
///
/// Pages are allocated on first write; unwritten memory reads as zero.
pub struct HostMemory {
    /// page_address -> page_data
    pages: BTreeMap<u64, Box<[u8; Self::PAGE_SIZE]>>,

    total_bytes_written: u64,
    total_bytes_read: u64,
}

impl HostMemory {
    /// Page size for sparse storage.
    pub const PAGE_SIZE: usize = 4096;

    const PAGE_MASK: u64 = !(Self::PAGE_SIZE as u64 - 1);

    /// Word accesses ignore the low three address bits.
    pub const WORD_ALIGN_MASK: u64 = !0x7;

    /// Create a new empty memory.
    pub fn new() -> Self {
        Self {
            pages: BTreeMap::new(),
            total_bytes_written: 0,
            total_bytes_read: 0,
        }
    }

    fn get_or_create_page(&mut self, addr: u64) -> &mut [u8; Self::PAGE_SIZE] {
        let page_addr = addr & Self::PAGE_MASK;
        self.pages
            .entry(page_addr)
            .or_insert_with(|| Box::new([0u8; Self::PAGE_SIZE]))
    }

    fn get_page(&self, addr: u64) -> Option<&[u8; Self::PAGE_SIZE]> {
        let page_addr = addr & Self::PAGE_MASK;
        self.pages.get(&page_addr).map(|b| b.as_ref())
    }

    /// Write a 64-bit word (little-endian) at `addr & !7`.
    #[inline]
    pub fn write_word(&mut self, addr: u64, value: u64) {
        self.write_bytes(addr & Self::WORD_ALIGN_MASK, &value.to_le_bytes());
    }

    /// Read a 64-bit word (little-endian) from `addr & !7`.
    #[inline]
    pub fn read_word(&mut self, addr: u64) -> u64 {
        let mut buf = [0u8; 8];
        self.read_bytes(addr & Self::WORD_ALIGN_MASK, &mut buf);
        self.total_bytes_read += buf.len() as u64;
        u64::from_le_bytes(buf)
    }

    /// Read a 64-bit word without touching statistics.
    #[inline]
    pub fn peek_word(&self, addr: u64) -> u64 {
        let mut buf = [0u8; 8];
        self.read_bytes(addr & Self::WORD_ALIGN_MASK, &mut buf);
        u64::from_le_bytes(buf)
    }

    /// Write consecutive words starting at `addr`.
    pub fn write_words(&mut self, addr: u64, words: &[u64]) {
        for (i, word) in words.iter().enumerate() {
            self.write_word(addr + (i as u64) * 8, *word);
        }
    }

    /// Read `count` consecutive words starting at `addr`.
    pub fn read_words(&self, addr: u64, count: usize) -> Vec<u64> {
        (0..count)
            .map(|i| self.peek_word(addr + (i as u64) * 8))
            .collect()
    }

    /// Write a byte slice to memory.
    pub fn write_bytes(&mut self, addr: u64, data: &[u8]) {
        let mut current_addr = addr;
        let mut remaining = data;

        while !remaining.is_empty() {
            let page = self.get_or_create_page(current_addr);
            let offset = (current_addr & (Self::PAGE_SIZE as u64 - 1)) as usize;
            let to_write = remaining.len().min(Self::PAGE_SIZE - offset);

            page[offset..offset + to_write].copy_from_slice(&remaining[..to_write]);

            current_addr += to_write as u64;
            remaining = &remaining[to_write..];
        }

        self.total_bytes_written += data.len() as u64;
    }

    /// Read bytes from memory into a buffer.
    pub fn read_bytes(&self, addr: u64, buf: &mut [u8]) {
        let mut current_addr = addr;
        let mut offset_in_buf = 0;

        while offset_in_buf < buf.len() {
            let page_offset = (current_addr & (Self::PAGE_SIZE as u64 - 1)) as usize;
            let to_read = (buf.len() - offset_in_buf).min(Self::PAGE_SIZE - page_offset);

            if let Some(page) = self.get_page(current_addr) {
                buf[offset_in_buf..offset_in_buf + to_read]
                    .copy_from_slice(&page[page_offset..page_offset + to_read]);
            } else {
                buf[offset_in_buf..offset_in_buf + to_read].fill(0);
            }

            current_addr += to_read as u64;
            offset_in_buf += to_read;
        }
    }

    /// Total bytes written.
    pub fn total_bytes_written(&self) -> u64 {
        self.total_bytes_written
    }

    /// Total bytes read through [`read_word`](Self::read_word).
    pub fn total_bytes_read(&self) -> u64 {
        self.total_bytes_read
    }

    /// Number of allocated pages.
    pub fn allocated_pages(&self) -> usize {
        self.pages.len()
    }

    /// Clear all memory.
    pub fn clear(&mut self) {
        self.pages.clear();
        self.total_bytes_written = 0;
        self.total_bytes_read = 0;
    }

    /// Dump `count` words starting at `addr`, one per line.
    pub fn word_dump(&self, addr: u64, count: usize) -> String {
        let base = addr & Self::WORD_ALIGN_MASK;
        self.read_words(base, count)
            .iter()
            .enumerate()
            .map(|(i, w)| format!("{:08x}: {:016x}\n", base + (i as u64) * 8, w))
            .collect()
    }
}

impl Default for HostMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HostMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostMemory")
            .field("allocated_pages", &self.pages.len())
            .field("total_bytes_written", &self.total_bytes_written)
            .field("total_bytes_read", &self.total_bytes_read)
            .finish()
    }
}

/// Transaction latched by [`LatencyMemory`].
#[derive(Debug, Clone, Copy)]
struct InFlight {
    request: MemRequest,
    remaining: u32,
}

/// Fixed-latency memory port.
///
/// A request seen for the first time is latched and completes `latency`
/// cycles later (a latency of zero completes in the same cycle). While a
/// transaction is in flight the presented request is ignored; after the
/// completion pulse the port is free for the next request.
#[derive(Debug)]
pub struct LatencyMemory {
    memory: HostMemory,
    latency: u32,
    in_flight: Option<InFlight>,
    reads: u64,
    writes: u64,
}

impl LatencyMemory {
    /// Create a port over empty memory.
    pub fn new(latency: u32) -> Self {
        Self::with_memory(HostMemory::new(), latency)
    }

    /// Create a port over existing memory contents.
    pub fn with_memory(memory: HostMemory, latency: u32) -> Self {
        Self {
            memory,
            latency,
            in_flight: None,
            reads: 0,
            writes: 0,
        }
    }

    /// Configured latency in cycles.
    pub fn latency(&self) -> u32 {
        self.latency
    }

    /// Backing storage.
    pub fn memory(&self) -> &HostMemory {
        &self.memory
    }

    /// Backing storage (mutable, for loading test data).
    pub fn memory_mut(&mut self) -> &mut HostMemory {
        &mut self.memory
    }

    /// True while a transaction is counting down.
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Completed (reads, writes).
    pub fn stats(&self) -> (u64, u64) {
        (self.reads, self.writes)
    }

    fn perform(&mut self, request: &MemRequest) -> MemResponse {
        let addr = request.addr as u64;
        match request.access {
            MemAccess::Read => {
                self.reads += 1;
                let data = self.memory.read_word(addr);
                log::trace!("mem read  0x{:08x} -> 0x{:016x}", addr, data);
                MemResponse::complete(data)
            }
            MemAccess::Write(data) => {
                self.writes += 1;
                self.memory.write_word(addr, data);
                log::trace!("mem write 0x{:08x} <- 0x{:016x}", addr, data);
                MemResponse::complete(0)
            }
        }
    }
}

impl MemoryPort for LatencyMemory {
    fn respond(&mut self, request: Option<&MemRequest>) -> MemResponse {
        match self.in_flight.take() {
            Some(InFlight { request, remaining: 0 }) => self.perform(&request),
            Some(InFlight { request, remaining }) => {
                self.in_flight = Some(InFlight { request, remaining: remaining - 1 });
                MemResponse::IDLE
            }
            None => match request {
                Some(req) if self.latency == 0 => self.perform(req),
                Some(req) => {
                    self.in_flight = Some(InFlight {
                        request: *req,
                        remaining: self.latency - 1,
                    });
                    MemResponse::IDLE
                }
                None => MemResponse::IDLE,
            },
        }
    }

    fn reset(&mut self) {
        self.in_flight = None;
    }
}
