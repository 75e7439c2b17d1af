//! Command line and the glue between `engine-config` and the engine crates.
//!
//! Configuration comes from crucible.toml with `CRUCIBLE_*` environment
//! overrides. Command line flags take highest priority.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use engine_config::{load_config, CentralConfig, LayerConfig, SearchConfig};
use engine_core::{create_game, list_registered_games, Game};
use mcts::{Activation, LayerSpec, MctsConfig, NetworkSpec};
use tracing::level_filters::LevelFilter;

#[derive(Parser, Debug, Clone)]
#[command(name = "actor")]
#[command(about = "Crucible actor - self-play, arena and validation driver")]
#[command(
    long_about = "Reads training commands from stdin and streams results and self-play samples
to stdout in the binary training protocol. Logs go to stderr.

Configuration is loaded from crucible.toml with CRUCIBLE_* environment variable
overrides. CLI arguments take highest priority."
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Worker threads per match
    #[arg(long, global = true)]
    pub threads: Option<usize>,

    /// Seed for reproducible runs
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    #[command(subcommand)]
    pub mode: Option<Mode>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Serve training commands on stdin (default)
    Serve,
    /// Play two weight files against each other and print the win rate
    Pit {
        /// Weights of player 1
        #[arg(long)]
        model_a: PathBuf,
        /// Weights of player 2
        #[arg(long)]
        model_b: PathBuf,
        /// Number of games; `pit_play.games` when absent
        #[arg(long)]
        games: Option<u32>,
    },
}

impl Cli {
    pub fn mode(&self) -> Mode {
        self.mode.clone().unwrap_or(Mode::Serve)
    }

    /// Load the configuration file and apply command line overrides.
    pub fn load_config(&self) -> Result<CentralConfig> {
        let mut config =
            load_config(self.config.as_deref()).context("failed to load configuration")?;
        self.apply_overrides(&mut config)?;
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut CentralConfig) -> Result<()> {
        if let Some(level) = &self.log_level {
            config.common.log_level = level.clone();
        }
        if let Some(threads) = self.threads {
            config.common.threads = threads;
        }
        if let Some(seed) = self.seed {
            config.common.seed = Some(seed);
        }

        if config.common.log_level.parse::<LevelFilter>().is_err() {
            bail!(
                "invalid log level '{}', expected one of trace, debug, info, warn, error",
                config.common.log_level
            );
        }
        config.validate().context("invalid configuration")?;
        Ok(())
    }
}

/// Search parameters as the engine expects them.
pub fn mcts_config(search: &SearchConfig) -> MctsConfig {
    MctsConfig {
        cpuct: search.cpuct,
        dirichlet_epsilon: search.dirichlet_epsilon,
        dirichlet_alpha: search.dirichlet_alpha,
        iterations: search.iterations,
        temperature_turns: search.temperature_turns,
        temperature_max: search.temperature_max,
        temperature_min: search.temperature_min,
        init_reserved_nodes: search.init_reserved_nodes,
    }
}

/// Network shape for `game`; the last layer holds the value plus one logit
/// per move slot.
pub fn network_spec(game: &dyn Game, layers: &[LayerConfig]) -> Result<NetworkSpec> {
    let layers = layers
        .iter()
        .map(|l| {
            l.activation
                .parse::<Activation>()
                .map(|activation| LayerSpec::new(l.units, activation))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let expected = 1 + game.max_moves();
    match layers.last() {
        Some(last) if last.units == expected => {}
        Some(last) => bail!(
            "last layer has {} units but {} needs {} (1 value + {} moves)",
            last.units,
            game.metadata().name,
            expected,
            game.max_moves()
        ),
        None => bail!("model has no layers"),
    }

    let spec = NetworkSpec::new(game.input_size(), layers);
    spec.validate()?;
    Ok(spec)
}

/// Instantiate a registered game by name.
pub fn resolve_game(name: &str) -> Result<Box<dyn Game>> {
    engine_games::register_all_games();
    create_game(name).ok_or_else(|| {
        anyhow!(
            "unknown game '{}', available: {}",
            name,
            list_registered_games().join(", ")
        )
    })
}
