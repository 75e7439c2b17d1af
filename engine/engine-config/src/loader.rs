//! Configuration loading logic.
//!
//! Handles loading config from files and applying environment variable overrides.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::{CentralConfig, ConfigError};

/// Standard locations to search for crucible.toml
pub const CONFIG_SEARCH_PATHS: &[&str] = &[
    "crucible.toml",      // Current directory
    "../crucible.toml",   // Parent directory (when running from subdirectory)
    "/app/crucible.toml", // Docker container
];

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "CRUCIBLE_CONFIG";

/// Load the central configuration.
///
/// Looks for the config file in the following order:
/// 1. `explicit`, usually the `--config` command-line option
/// 2. Path specified by the CRUCIBLE_CONFIG environment variable
/// 3. Current directory (crucible.toml)
/// 4. Parent directory (../crucible.toml)
/// 5. Docker container path (/app/crucible.toml)
///
/// There is no all-defaults fallback: `common.game` and `model.layers` have
/// to come from a file. Environment overrides are applied and the result is
/// validated before it is returned.
pub fn load_config(explicit: Option<&Path>) -> Result<CentralConfig, ConfigError> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                tried: path.display().to_string(),
            });
        }
        info!(path = %path.display(), "Loading config from --config");
        return load_from_path(path);
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        let path = PathBuf::from(&path);
        if path.exists() {
            info!(path = %path.display(), "Loading config from {}", CONFIG_ENV_VAR);
            return load_from_path(&path);
        }
        warn!(
            "{}={} not found, searching default locations",
            CONFIG_ENV_VAR,
            path.display()
        );
    }

    for path_str in CONFIG_SEARCH_PATHS {
        let path = Path::new(path_str);
        if path.exists() {
            info!(path = %path.display(), "Loading config");
            return load_from_path(path);
        }
    }

    Err(ConfigError::NotFound {
        tried: CONFIG_SEARCH_PATHS.join(", "),
    })
}

/// Load, override and validate configuration from a specific path.
pub fn load_from_path(path: &Path) -> Result<CentralConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        origin: path.display().to_string(),
        source,
    })?;
    let config = apply_env_overrides(config);
    config.validate()?;
    Ok(config)
}

/// Parse a TOML document without touching the environment.
pub fn parse_config(content: &str) -> Result<CentralConfig, ConfigError> {
    toml::from_str(content).map_err(|source| ConfigError::Parse {
        origin: "<inline>".into(),
        source,
    })
}

/// Macro to reduce env override boilerplate
macro_rules! env_override {
    // String-like field (String, PathBuf)
    ($config:expr, $($field:ident).+, $key:expr) => {
        if let Ok(v) = std::env::var($key) {
            $config.$($field).+ = v.into();
        }
    };
    // Parseable field (u32, f32, usize, etc.)
    ($config:expr, $($field:ident).+, $key:expr, parse) => {
        if let Ok(v) = std::env::var($key) {
            match v.parse() {
                Ok(parsed) => $config.$($field).+ = parsed,
                Err(_) => warn!("Ignoring {}={}: not a valid value", $key, v),
            }
        }
    };
    // Optional parseable field (Option<u64>, etc.)
    ($config:expr, $($field:ident).+, $key:expr, optional_parse) => {
        if let Ok(v) = std::env::var($key) {
            match v.parse() {
                Ok(parsed) => $config.$($field).+ = Some(parsed),
                Err(_) => warn!("Ignoring {}={}: not a valid value", $key, v),
            }
        }
    };
}

/// Apply environment variable overrides to a configuration.
///
/// Environment variables follow the pattern: CRUCIBLE_<SECTION>_<KEY>
pub fn apply_env_overrides(mut config: CentralConfig) -> CentralConfig {
    // Common
    env_override!(config, common.game, "CRUCIBLE_COMMON_GAME");
    env_override!(config, common.data_dir, "CRUCIBLE_COMMON_DATA_DIR");
    env_override!(config, common.log_level, "CRUCIBLE_COMMON_LOG_LEVEL");
    env_override!(config, common.threads, "CRUCIBLE_COMMON_THREADS", parse);
    env_override!(
        config,
        common.seed,
        "CRUCIBLE_COMMON_SEED",
        optional_parse
    );

    // Self-play
    env_override!(config, self_play.games, "CRUCIBLE_SELF_PLAY_GAMES", parse);
    env_override!(
        config,
        self_play.recent_window,
        "CRUCIBLE_SELF_PLAY_RECENT_WINDOW",
        parse
    );
    env_override!(
        config,
        self_play.warmup_generations,
        "CRUCIBLE_SELF_PLAY_WARMUP_GENERATIONS",
        parse
    );
    env_override!(
        config,
        self_play.warmup_floor,
        "CRUCIBLE_SELF_PLAY_WARMUP_FLOOR",
        parse
    );
    env_override!(
        config,
        self_play.value_floor,
        "CRUCIBLE_SELF_PLAY_VALUE_FLOOR",
        parse
    );
    env_override!(
        config,
        self_play.mcts.iterations,
        "CRUCIBLE_SELF_PLAY_MCTS_ITERATIONS",
        parse
    );

    // Pit-play
    env_override!(config, pit_play.games, "CRUCIBLE_PIT_PLAY_GAMES", parse);
    env_override!(
        config,
        pit_play.win_rate_accepted,
        "CRUCIBLE_PIT_PLAY_WIN_RATE_ACCEPTED",
        parse
    );
    env_override!(
        config,
        pit_play.move_time_ms,
        "CRUCIBLE_PIT_PLAY_MOVE_TIME_MS",
        optional_parse
    );
    env_override!(
        config,
        pit_play.mcts.iterations,
        "CRUCIBLE_PIT_PLAY_MCTS_ITERATIONS",
        parse
    );

    // Validation
    env_override!(
        config,
        validation.mcts.iterations,
        "CRUCIBLE_VALIDATION_MCTS_ITERATIONS",
        parse
    );

    config
}
