//! Reference workloads.
//!
//! Two scenarios that show when the scratchpad and DMA pay off:
//!
//! - **Parameter sweep**: every seed is evolved under every rule. Reloading
//!   each seed from memory costs a full memory round trip per evolution;
//!   one DMA burst followed by scratchpad reads pays that cost once.
//! - **Time-series capture**: snapshots accumulate in the scratchpad while
//!   the automaton runs, then leave in a single DMA store.
//! - **DMA bandwidth**: burst load and store cycle counts across sizes.
//!
//! Every workload verifies what it moved or computed.

use anyhow::{bail, ensure, Result};

use crate::device::SCRATCHPAD_WORDS;
use crate::interpreter::engine::{Completion, CoprocessorEngine};
use crate::interpreter::Instruction;
use crate::testing::oracle::ca_step_sw;

/// Cycles an instruction occupied, dispatch cycle included.
fn cost(done: Completion) -> u64 {
    done.cycles + 1
}

/// Parameter sweep settings.
#[derive(Debug, Clone)]
pub struct SweepParams {
    /// Initial states.
    pub seeds: Vec<u64>,
    /// Rules applied to every seed.
    pub rules: Vec<u8>,
    /// Generations per evolution.
    pub steps: u16,
    /// Where the seeds live in memory.
    pub base_addr: u32,
}

impl Default for SweepParams {
    fn default() -> Self {
        Self {
            seeds: (0..16).map(|i| 1u64 << i).collect(),
            rules: vec![30, 110, 90, 150],
            steps: 100,
            base_addr: 0x4000,
        }
    }
}

/// Parameter sweep outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepReport {
    /// Evolutions per method.
    pub evolutions: usize,
    /// Cycles when every seed is reloaded with `ca_load`.
    pub cycles_reload: u64,
    /// Cycles for the bulk DMA load alone.
    pub cycles_dma_load: u64,
    /// Cycles when seeds come from the scratchpad (DMA load included).
    pub cycles_scratchpad: u64,
}

impl SweepReport {
    /// How many times faster the scratchpad method ran.
    pub fn speedup(&self) -> f64 {
        if self.cycles_scratchpad == 0 {
            return 0.0;
        }
        self.cycles_reload as f64 / self.cycles_scratchpad as f64
    }

    /// Cycles saved by the scratchpad method.
    pub fn cycles_saved(&self) -> i64 {
        self.cycles_reload as i64 - self.cycles_scratchpad as i64
    }
}

impl std::fmt::Display for SweepReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Parameter sweep: {} evolutions per method", self.evolutions)?;
        writeln!(f, "  reload every seed:   {:>8} cycles", self.cycles_reload)?;
        writeln!(
            f,
            "  DMA once + reuse:    {:>8} cycles ({} for the burst)",
            self.cycles_scratchpad, self.cycles_dma_load
        )?;
        write!(
            f,
            "  speedup {:.2}x, {} cycles saved",
            self.speedup(),
            self.cycles_saved()
        )
    }
}

/// Run the parameter sweep both ways and compare.
pub fn parameter_sweep(engine: &mut CoprocessorEngine, params: &SweepParams) -> Result<SweepReport> {
    let count = params.seeds.len();
    ensure!(
        count <= SCRATCHPAD_WORDS,
        "{} seeds do not fit in the {}-word scratchpad",
        count,
        SCRATCHPAD_WORDS
    );

    engine
        .memory_mut()
        .memory_mut()
        .write_words(params.base_addr as u64, &params.seeds);

    log::info!(
        "parameter sweep: {} seeds x {} rules, {} steps, memory latency {}",
        count,
        params.rules.len(),
        params.steps,
        engine.memory().latency()
    );

    let mut cycles_reload = 0;
    for &rule in &params.rules {
        for (i, &seed) in params.seeds.iter().enumerate() {
            let addr = params.base_addr.wrapping_add(i as u32 * 8);
            cycles_reload += cost(engine.execute(Instruction::load(addr))?);
            cycles_reload += cost(engine.execute(Instruction::step(rule, params.steps))?);
            check_evolution(engine, seed, rule, params.steps)?;
        }
    }

    let burst = engine.execute(Instruction::dma_load(params.base_addr, count as u32))?;
    ensure!(burst.result == 0, "DMA load returned 0x{:08x}", burst.result);
    let cycles_dma_load = cost(burst);

    let mut cycles_scratchpad = cycles_dma_load;
    for &rule in &params.rules {
        for (i, &seed) in params.seeds.iter().enumerate() {
            cycles_scratchpad += cost(engine.execute(Instruction::sp_load(i as u32))?);
            cycles_scratchpad += cost(engine.execute(Instruction::step(rule, params.steps))?);
            check_evolution(engine, seed, rule, params.steps)?;
        }
    }

    Ok(SweepReport {
        evolutions: count * params.rules.len(),
        cycles_reload,
        cycles_dma_load,
        cycles_scratchpad,
    })
}

fn check_evolution(engine: &CoprocessorEngine, seed: u64, rule: u8, steps: u16) -> Result<()> {
    let expected = ca_step_sw(seed, rule, steps as u32);
    let actual = engine.controller().car();
    if actual != expected {
        bail!(
            "rule {} from 0x{:016x}: got 0x{:016x}, expected 0x{:016x}",
            rule,
            seed,
            actual,
            expected
        );
    }
    Ok(())
}

/// Time-series capture settings.
#[derive(Debug, Clone)]
pub struct CaptureParams {
    /// Starting CAR.
    pub initial: u64,
    /// Rule driving the evolution.
    pub rule: u8,
    /// Number of snapshots (at most the scratchpad size).
    pub snapshots: u32,
    /// Generations between snapshots.
    pub interval: u16,
    /// Destination of the DMA store.
    pub dest_addr: u32,
}

impl Default for CaptureParams {
    fn default() -> Self {
        Self {
            initial: 1,
            rule: 30,
            snapshots: 32,
            interval: 10,
            dest_addr: 0x6000,
        }
    }
}

/// Time-series capture outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureReport {
    /// Cycles spent evolving and copying CAR into the scratchpad.
    pub cycles_capture: u64,
    /// Cycles for the final DMA store.
    pub cycles_dma_store: u64,
    /// Snapshots as read back from memory.
    pub snapshots: Vec<u64>,
}

impl CaptureReport {
    /// Total cycles.
    pub fn total_cycles(&self) -> u64 {
        self.cycles_capture + self.cycles_dma_store
    }
}

impl std::fmt::Display for CaptureReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Time-series capture: {} snapshots", self.snapshots.len())?;
        writeln!(f, "  evolve + capture: {:>8} cycles", self.cycles_capture)?;
        writeln!(f, "  DMA store:        {:>8} cycles", self.cycles_dma_store)?;
        write!(f, "  total:            {:>8} cycles", self.total_cycles())
    }
}

/// Evolve, snapshot into the scratchpad, store the burst and verify it.
pub fn time_series_capture(
    engine: &mut CoprocessorEngine,
    params: &CaptureParams,
) -> Result<CaptureReport> {
    ensure!(
        params.snapshots as usize <= SCRATCHPAD_WORDS,
        "{} snapshots do not fit in the {}-word scratchpad",
        params.snapshots,
        SCRATCHPAD_WORDS
    );

    engine.set_car(params.initial)?;

    let mut cycles_capture = 0;
    for i in 0..params.snapshots {
        cycles_capture += cost(engine.execute(Instruction::step(params.rule, params.interval))?);
        cycles_capture += cost(engine.execute(Instruction::sp_store(i))?);
    }

    let store = engine.execute(Instruction::dma_store(params.dest_addr, params.snapshots))?;
    ensure!(store.result == 0, "DMA store returned 0x{:08x}", store.result);

    let snapshots = engine
        .memory()
        .memory()
        .read_words(params.dest_addr as u64, params.snapshots as usize);

    let mut expected = params.initial;
    for (i, &stored) in snapshots.iter().enumerate() {
        expected = ca_step_sw(expected, params.rule, params.interval as u32);
        if stored != expected {
            bail!(
                "snapshot {} mismatch: stored 0x{:016x}, expected 0x{:016x}",
                i,
                stored,
                expected
            );
        }
    }

    Ok(CaptureReport {
        cycles_capture,
        cycles_dma_store: cost(store),
        snapshots,
    })
}

/// Burst sizes measured by default.
pub const BANDWIDTH_SIZES: [u32; 6] = [8, 16, 32, 64, 128, 256];

/// Source of the bandwidth bursts; stores go one page above.
const BANDWIDTH_SRC: u32 = 0x8000;
const BANDWIDTH_DST: u32 = BANDWIDTH_SRC + 0x1000;

/// One burst size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandwidthSample {
    /// Words per burst.
    pub words: u32,
    /// Cycles for the DMA load, dispatch included.
    pub load_cycles: u64,
    /// Cycles for the DMA store, dispatch included.
    pub store_cycles: u64,
}

impl BandwidthSample {
    /// Bytes moved by one burst.
    pub fn bytes(&self) -> u64 {
        self.words as u64 * 8
    }

    /// Load throughput.
    pub fn load_bytes_per_cycle(&self) -> f64 {
        self.bytes() as f64 / self.load_cycles as f64
    }

    /// Store throughput.
    pub fn store_bytes_per_cycle(&self) -> f64 {
        self.bytes() as f64 / self.store_cycles as f64
    }
}

/// DMA bandwidth outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct BandwidthReport {
    /// Memory latency the samples were taken at.
    pub latency: u32,
    pub samples: Vec<BandwidthSample>,
}

impl std::fmt::Display for BandwidthReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "DMA bandwidth: memory latency {} cycles", self.latency)?;
        writeln!(
            f,
            "  {:>6} | {:>10} | {:>10} | {:>9} | {:>9}",
            "words", "load cyc", "store cyc", "load B/c", "store B/c"
        )?;
        write!(f, "  {:-<6}-+-{:-<10}-+-{:-<10}-+-{:-<9}-+-{:-<9}", "", "", "", "", "")?;
        for s in &self.samples {
            write!(
                f,
                "\n  {:>6} | {:>10} | {:>10} | {:>9.3} | {:>9.3}",
                s.words,
                s.load_cycles,
                s.store_cycles,
                s.load_bytes_per_cycle(),
                s.store_bytes_per_cycle()
            )?;
        }
        Ok(())
    }
}

/// Time a DMA load and a DMA store for each burst size.
///
/// Memory is cleared before each size so that a short store can never be
/// verified against words left behind by a longer one.
pub fn dma_bandwidth(engine: &mut CoprocessorEngine, sizes: &[u32]) -> Result<BandwidthReport> {
    let latency = engine.memory().latency();
    let mut samples = Vec::with_capacity(sizes.len());

    for &words in sizes {
        ensure!(
            words as usize <= SCRATCHPAD_WORDS,
            "burst of {} words exceeds the {}-word scratchpad",
            words,
            SCRATCHPAD_WORDS
        );

        let pattern: Vec<u64> = (0..words as u64).map(|i| 0xAA55_AA55_0000_0000 + i).collect();
        let memory = engine.memory_mut().memory_mut();
        memory.clear();
        memory.write_words(BANDWIDTH_SRC as u64, &pattern);

        let load = engine.execute(Instruction::dma_load(BANDWIDTH_SRC, words))?;
        ensure!(load.result == 0, "DMA load of {} words returned 0x{:08x}", words, load.result);
        let store = engine.execute(Instruction::dma_store(BANDWIDTH_DST, words))?;
        ensure!(store.result == 0, "DMA store of {} words returned 0x{:08x}", words, store.result);

        let stored = engine
            .memory()
            .memory()
            .read_words(BANDWIDTH_DST as u64, words as usize);
        if let Some(i) = stored.iter().zip(&pattern).position(|(a, b)| a != b) {
            bail!(
                "{}-word burst: word {} stored as 0x{:016x}, expected 0x{:016x}",
                words,
                i,
                stored[i],
                pattern[i]
            );
        }

        log::debug!("bandwidth {} words: load {} store {}", words, cost(load), cost(store));
        samples.push(BandwidthSample {
            words,
            load_cycles: cost(load),
            store_cycles: cost(store),
        });
    }

    Ok(BandwidthReport { latency, samples })
}
