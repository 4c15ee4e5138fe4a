//! ca-coproc: cycle-level model of a cellular-automaton coprocessor

use std::env;

use anyhow::{bail, Context};
use ca_coproc::config::Config;
use ca_coproc::interpreter::CoprocessorEngine;
use ca_coproc::parser::Program;
use ca_coproc::testing::{
    dma_bandwidth, parameter_sweep, time_series_capture, CaptureParams, SweepParams,
    BANDWIDTH_SIZES,
};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().collect();

    let mut dump_state = false;
    let mut positional = Vec::new();
    for arg in &args[1..] {
        match arg.as_str() {
            "--dump-state" => dump_state = true,
            "-h" | "--help" => {
                print_usage();
                return Ok(());
            }
            flag if flag.starts_with('-') => bail!("unknown option '{}'", flag),
            _ => positional.push(arg.as_str()),
        }
    }

    let Some(&command) = positional.first() else {
        print_usage();
        return Ok(());
    };

    if command == "config" {
        print!("{}", Config::sample_config());
        if let Some(path) = Config::user_config_path() {
            eprintln!("# user config location: {}", path.display());
        }
        return Ok(());
    }

    let config = Config::get();
    let mut engine = CoprocessorEngine::from_config(config);

    match command {
        "run" => {
            let path = positional
                .get(1)
                .context("run needs a program file")?;
            run_program(&mut engine, path)?;
        }
        "sweep" => {
            let report = parameter_sweep(&mut engine, &SweepParams::default())?;
            println!("{}", report);
        }
        "capture" => {
            let report = time_series_capture(&mut engine, &CaptureParams::default())?;
            println!("{}", report);
            println!("  verified against software model");
        }
        "bandwidth" => {
            let report = dma_bandwidth(&mut engine, &BANDWIDTH_SIZES)?;
            println!("{}", report);
        }
        other => {
            print_usage();
            bail!("unknown command '{}'", other);
        }
    }

    if dump_state {
        print_state(&engine);
    }

    Ok(())
}

fn run_program(engine: &mut CoprocessorEngine, path: &str) -> anyhow::Result<()> {
    let program = Program::from_file(path)?;
    println!("Loading: {} ({} instructions)", path, program.instruction_count());
    println!();

    let trace = program.run(engine)?;
    for step in &trace {
        let result = if step.instruction.operation().returns_value() {
            format!("0x{:08X}", step.completion.result)
        } else {
            "-".to_string()
        };
        println!(
            "{:>4}  {:<28} -> {:<10}  ({} cycles)",
            step.line,
            step.instruction.to_string(),
            result,
            step.completion.cycles
        );
    }

    let stats = engine.stats();
    println!();
    println!(
        "{} instructions, {} cycles",
        stats.instructions, stats.cycles
    );
    Ok(())
}

fn print_state(engine: &CoprocessorEngine) {
    let ctrl = engine.controller();
    let regs = ctrl.registers();

    println!();
    println!("Coprocessor State");
    println!("=================");
    println!("State:   {:?}", ctrl.state());
    println!("CAR:     0x{:016X}", regs.car);
    println!("Rule:    {}", regs.rule);
    println!("Steps:   {}", regs.steps);
    println!("History: {} snapshot(s)", regs.history.len());
    println!("DMA:     {:?}", regs.dma);

    let used: Vec<(usize, u64)> = regs
        .scratchpad
        .as_slice()
        .iter()
        .copied()
        .enumerate()
        .filter(|&(_, w)| w != 0)
        .collect();
    println!("Scratchpad: {} non-zero word(s)", used.len());
    for (i, w) in used {
        println!("  [{:3}] 0x{:016X}", i, w);
    }

    let (reads, writes) = engine.memory().stats();
    println!("Memory:  {} read(s), {} write(s)", reads, writes);

    let stats = engine.stats();
    if !stats.per_operation.is_empty() {
        println!("Operations:");
        for (mnemonic, count) in &stats.per_operation {
            println!("  {:<14} {}", mnemonic, count);
        }
    }
}

fn print_usage() {
    eprintln!("Usage: ca-coproc <command> [--dump-state]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  run <file>   execute a program and print each result");
    eprintln!("  sweep        parameter sweep: reload vs DMA + scratchpad reuse");
    eprintln!("  capture      time-series capture through the scratchpad");
    eprintln!("  bandwidth    DMA load/store cycles for bursts of 8 to 256 words");
    eprintln!("  config       print a sample configuration file");
    eprintln!();
    eprintln!("Environment: CA_COPROC_MEM_LATENCY, CA_COPROC_TIMEOUT, RUST_LOG");
}
