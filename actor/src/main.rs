//! Actor - self-play, arena and validation driver for Crucible
//!
//! A long-running process that:
//! 1. Reads training commands from stdin (self-play a generation, compare a
//!    candidate model)
//! 2. Runs MCTS games on a fixed pool of worker threads
//! 3. Streams statistics and self-play samples to stdout in the binary
//!    training protocol
//!
//! Logs and progress bars go to stderr.

use std::io::{self, BufReader, BufWriter};

use anyhow::Result;
use clap::Parser;
use tracing::info;

mod config;
mod models;
mod protocol;
mod samples;
mod trainer;
mod workers;

use crate::config::{Cli, Mode};
use crate::protocol::Emitter;
use crate::trainer::Trainer;
use crate::workers::WorkerPool;

fn init_tracing(level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;

    init_tracing(&config.common.log_level);
    info!(
        game = %config.common.game,
        log_level = %config.common.log_level,
        seed = ?config.common.seed,
        "Actor starting"
    );

    let pool = WorkerPool::new(config.common.threads, config.common.seed);
    let mut trainer = Trainer::new(config, pool)?;

    match cli.mode() {
        Mode::Serve => {
            let mut input = BufReader::new(io::stdin().lock());
            let mut out = Emitter::new(BufWriter::new(io::stdout().lock()));
            trainer.serve(&mut input, &mut out)?;
        }
        Mode::Pit {
            model_a,
            model_b,
            games,
        } => {
            let tally = trainer.pit(&model_a, &model_b, games)?;
            println!(
                "{}: {:.2}% against {} ({} wins, {} losses, {} draws)",
                model_a.display(),
                tally.first_player_winrate(),
                model_b.display(),
                tally.p1_wins,
                tally.p2_wins,
                tally.draws
            );
        }
    }

    info!("Actor finished");
    Ok(())
}
