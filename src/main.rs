use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use emu::machine::{Machine, MachineConfig};

mod demo;
mod report;

use report::Report;

#[derive(Parser, Debug)]
#[command(name = "armpit", version)]
#[command(about = "Runs pre-encoded 32-bit ARM instruction words", long_about = None)]
struct Args {
    /// Log every executed instruction
    #[arg(short, long)]
    verbose: bool,

    /// Program file to run (not supported yet)
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Stop after this many instructions
    #[arg(long, default_value_t = 10_000)]
    max_steps: u64,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Print the final state as JSON
    #[arg(long)]
    json: bool,
}

/// Installs the global subscriber. The returned guard flushes the log file
/// when dropped and must outlive the run.
fn init_tracing(args: &Args) -> Result<Option<WorkerGuard>> {
    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let Some(path) = &args.log_file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    };

    let file = File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(file);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(Some(guard))
}

/// Builds the machine the arguments ask for, with the program loaded.
fn prepare_machine(args: &Args) -> Result<Machine> {
    if let Some(path) = &args.file {
        bail!(
            "loading programs from files is unsupported ({})",
            path.display()
        );
    }

    let config = MachineConfig {
        max_steps: Some(args.max_steps),
        ..MachineConfig::default()
    };
    let mut machine = Machine::new(&config);
    machine
        .load_program(demo::PROGRAM)
        .context("cannot load the demo program")?;

    Ok(machine)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _guard = init_tracing(&args)?;

    let mut machine = prepare_machine(&args)?;
    let summary = machine.run().context("run aborted")?;
    tracing::info!(
        "{} ({} executed, {} skipped, {} unsupported)",
        summary.halt_reason,
        summary.stats.executed,
        summary.stats.skipped,
        summary.stats.unsupported
    );

    let report = Report {
        summary,
        cpu: machine.cpu(),
    };
    if args.json {
        println!("{}", report.to_json()?);
    } else {
        println!("{}", report.to_text());
    }

    Ok(())
}
