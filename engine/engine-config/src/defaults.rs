//! Default configuration values loaded from config.defaults.toml.
//!
//! The defaults file is embedded at compile time and parsed on first use.
//! Every optional setting in [`CentralConfig`](crate::CentralConfig) falls
//! back to the values here.

use once_cell::sync::Lazy;
use serde::Deserialize;

use crate::structs::SearchConfig;

/// The embedded defaults TOML file (loaded at compile time)
const DEFAULTS_TOML: &str = include_str!("../../../config.defaults.toml");

/// Parsed defaults structure (parsed once at first use)
static DEFAULTS: Lazy<DefaultsConfig> = Lazy::new(|| {
    toml::from_str(DEFAULTS_TOML).expect("config.defaults.toml should be valid TOML")
});

// ============================================================================
// Internal structs for parsing config.defaults.toml
//
// Every field is required here so a typo in the defaults file fails loudly.
// ============================================================================

#[derive(Debug, Deserialize)]
struct DefaultsConfig {
    common: CommonDefaults,
    mcts: SearchDefaults,
    self_play: SelfPlayDefaults,
    pit_play: PitPlayDefaults,
    validation: ValidationDefaults,
}

#[derive(Debug, Deserialize)]
struct CommonDefaults {
    data_dir: String,
    log_level: String,
    threads: usize,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct SearchDefaults {
    cpuct: f32,
    dirichlet_epsilon: f32,
    dirichlet_alpha: f32,
    iterations: u32,
    temperature_turns: u32,
    temperature_max: f32,
    temperature_min: f32,
    init_reserved_nodes: usize,
}

impl From<SearchDefaults> for SearchConfig {
    fn from(d: SearchDefaults) -> Self {
        Self {
            cpuct: d.cpuct,
            dirichlet_epsilon: d.dirichlet_epsilon,
            dirichlet_alpha: d.dirichlet_alpha,
            iterations: d.iterations,
            temperature_turns: d.temperature_turns,
            temperature_max: d.temperature_max,
            temperature_min: d.temperature_min,
            init_reserved_nodes: d.init_reserved_nodes,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SelfPlayDefaults {
    games: u32,
    recent_window: u32,
    warmup_generations: u32,
    warmup_floor: f32,
    value_floor: f32,
    mcts: SearchDefaults,
}

#[derive(Debug, Deserialize)]
struct PitPlayDefaults {
    games: u32,
    win_rate_accepted: f32,
    mcts: SearchDefaults,
}

#[derive(Debug, Deserialize)]
struct ValidationDefaults {
    mcts: SearchDefaults,
}

// ============================================================================
// Public accessor functions
// ============================================================================

// Common
pub fn data_dir() -> &'static str {
    &DEFAULTS.common.data_dir
}
pub fn log_level() -> &'static str {
    &DEFAULTS.common.log_level
}
pub fn threads() -> usize {
    DEFAULTS.common.threads
}

// Search
/// Fallback for keys missing from a `[*.mcts]` table.
pub fn search() -> SearchConfig {
    DEFAULTS.mcts.into()
}
pub fn cpuct() -> f32 {
    DEFAULTS.mcts.cpuct
}
pub fn dirichlet_epsilon() -> f32 {
    DEFAULTS.mcts.dirichlet_epsilon
}
pub fn dirichlet_alpha() -> f32 {
    DEFAULTS.mcts.dirichlet_alpha
}
pub fn iterations() -> u32 {
    DEFAULTS.mcts.iterations
}
pub fn temperature_turns() -> u32 {
    DEFAULTS.mcts.temperature_turns
}
pub fn temperature_max() -> f32 {
    DEFAULTS.mcts.temperature_max
}
pub fn temperature_min() -> f32 {
    DEFAULTS.mcts.temperature_min
}
pub fn init_reserved_nodes() -> usize {
    DEFAULTS.mcts.init_reserved_nodes
}

// Self-play
pub fn self_play_games() -> u32 {
    DEFAULTS.self_play.games
}
pub fn recent_window() -> u32 {
    DEFAULTS.self_play.recent_window
}
pub fn warmup_generations() -> u32 {
    DEFAULTS.self_play.warmup_generations
}
pub fn warmup_floor() -> f32 {
    DEFAULTS.self_play.warmup_floor
}
pub fn value_floor() -> f32 {
    DEFAULTS.self_play.value_floor
}
pub fn self_play_search() -> SearchConfig {
    DEFAULTS.self_play.mcts.into()
}

// Pit-play
pub fn pit_play_games() -> u32 {
    DEFAULTS.pit_play.games
}
pub fn win_rate_accepted() -> f32 {
    DEFAULTS.pit_play.win_rate_accepted
}
pub fn pit_play_search() -> SearchConfig {
    DEFAULTS.pit_play.mcts.into()
}

// Validation
pub fn validation_search() -> SearchConfig {
    DEFAULTS.validation.mcts.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_parse() {
        // Just accessing these will verify the TOML parses correctly
        assert_eq!(data_dir(), "./data");
        assert_eq!(log_level(), "info");
        assert_eq!(threads(), 4);
    }

    #[test]
    fn test_search_defaults() {
        assert_eq!(iterations(), 1600);
        assert!((cpuct() - 1.0).abs() < f32::EPSILON);
        assert_eq!(temperature_turns(), 30);
        assert_eq!(init_reserved_nodes(), 0);
        assert_eq!(search().iterations, iterations());
    }

    #[test]
    fn test_section_defaults() {
        assert_eq!(self_play_games(), 1000);
        assert!((value_floor() - 0.7).abs() < f32::EPSILON);
        assert!((win_rate_accepted() - 55.0).abs() < f32::EPSILON);
        assert_eq!(self_play_search().iterations, 800);
        assert_eq!(validation_search().temperature_turns, 0);
        assert!(validation_search().dirichlet_epsilon.abs() < f32::EPSILON);
    }
}
