//! handpose-answer - hold-to-confirm hand gesture answers.
//!
//! Reads landmark frames and timer ticks as s-expressions (stdin or a replay
//! file) and writes live pose responses and confirmed-answer events to stdout.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use handpose_answer::config::{SessionConfig, DEFAULT_TICK_INTERVAL_MS};
use handpose_answer::hand::hold::DEFAULT_HOLD_DURATION_MS;
use handpose_answer::ipc::{self, DriverState, Framing};

#[derive(Parser, Debug)]
#[command(name = "handpose-answer", about = "Hand pose answers for flashcard review")]
struct Cli {
    /// Time (ms) a pose must be held before it counts as an answer
    #[arg(long, default_value_t = DEFAULT_HOLD_DURATION_MS)]
    hold_ms: u64,

    /// Minimum spacing (ms) between timer ticks
    #[arg(long, default_value_t = DEFAULT_TICK_INTERVAL_MS)]
    tick_ms: u64,

    /// Read messages from a file instead of stdin
    #[arg(long)]
    input: Option<PathBuf>,

    /// Message framing on input and output
    #[arg(long, value_enum, default_value_t = Framing::Lines)]
    framing: Framing,

    /// Log all messages to stderr
    #[arg(long)]
    ipc_trace: bool,

    /// Show version and exit
    #[arg(long)]
    version: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("handpose-answer {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // stdout carries the protocol, so logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "handpose_answer=info".into()),
        )
        .init();

    let config = SessionConfig::new(cli.hold_ms, cli.tick_ms)?;
    info!(
        "handpose-answer v{} starting (hold {}ms, tick {}ms, {:?} framing)",
        env!("CARGO_PKG_VERSION"),
        config.hold_duration_ms,
        config.tick_interval_ms,
        cli.framing,
    );

    let mut state = DriverState::new(config);
    state.ipc_trace = cli.ipc_trace;

    let stdout = io::stdout().lock();
    match cli.input {
        Some(path) => {
            let file = File::open(&path)
                .with_context(|| format!("opening input {}", path.display()))?;
            ipc::run(&mut state, cli.framing, BufReader::new(file), stdout)
        }
        None => ipc::run(&mut state, cli.framing, io::stdin().lock(), stdout),
    }
}
