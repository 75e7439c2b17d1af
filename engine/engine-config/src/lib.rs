//! Centralized configuration loading from crucible.toml.
//!
//! This crate provides the configuration structs and loading logic used by
//! the actor: the common settings, one section per worker kind with its own
//! search parameters, and the network layer stack.
//!
//! # Configuration Priority
//!
//! Settings are loaded with the following priority (highest to lowest):
//! 1. Environment variables (`CRUCIBLE_<SECTION>_<KEY>`)
//! 2. crucible.toml file
//! 3. Built-in defaults (config.defaults.toml)
//!
//! `common.game` and `model.layers` have no built-in default.
//!
//! # Environment Variable Override Pattern
//!
//! ```text
//! CRUCIBLE_<SECTION>_<KEY>=value
//!
//! Examples:
//!     CRUCIBLE_COMMON_GAME=connect4
//!     CRUCIBLE_COMMON_THREADS=8
//!     CRUCIBLE_SELF_PLAY_GAMES=500
//!     CRUCIBLE_PIT_PLAY_MCTS_ITERATIONS=400
//! ```

pub mod defaults;
mod error;
mod loader;
mod structs;

pub use error::ConfigError;
pub use loader::{
    apply_env_overrides, load_config, load_from_path, parse_config, CONFIG_ENV_VAR,
    CONFIG_SEARCH_PATHS,
};
pub use structs::*;
