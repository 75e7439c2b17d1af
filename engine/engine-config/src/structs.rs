//! Configuration struct definitions.
//!
//! All config structs with serde deserialization support. Optional settings
//! fall back to config.defaults.toml; `common.game` and `model.layers` have
//! no default and must be present.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::ConfigError;

// ============================================================================
// Serde default functions (required for #[serde(default = "...")])
// These call the accessor functions from defaults module
// ============================================================================

fn d_data_dir() -> PathBuf {
    defaults::data_dir().into()
}
fn d_log_level() -> String {
    defaults::log_level().into()
}
fn d_threads() -> usize {
    defaults::threads()
}
fn d_cpuct() -> f32 {
    defaults::cpuct()
}
fn d_dirichlet_epsilon() -> f32 {
    defaults::dirichlet_epsilon()
}
fn d_dirichlet_alpha() -> f32 {
    defaults::dirichlet_alpha()
}
fn d_iterations() -> u32 {
    defaults::iterations()
}
fn d_temperature_turns() -> u32 {
    defaults::temperature_turns()
}
fn d_temperature_max() -> f32 {
    defaults::temperature_max()
}
fn d_temperature_min() -> f32 {
    defaults::temperature_min()
}
fn d_init_reserved_nodes() -> usize {
    defaults::init_reserved_nodes()
}
fn d_self_play_games() -> u32 {
    defaults::self_play_games()
}
fn d_recent_window() -> u32 {
    defaults::recent_window()
}
fn d_warmup_generations() -> u32 {
    defaults::warmup_generations()
}
fn d_warmup_floor() -> f32 {
    defaults::warmup_floor()
}
fn d_value_floor() -> f32 {
    defaults::value_floor()
}
fn d_self_play_search() -> SearchConfig {
    defaults::self_play_search()
}
fn d_pit_play_games() -> u32 {
    defaults::pit_play_games()
}
fn d_win_rate_accepted() -> f32 {
    defaults::win_rate_accepted()
}
fn d_pit_play_search() -> SearchConfig {
    defaults::pit_play_search()
}
fn d_validation_search() -> SearchConfig {
    defaults::validation_search()
}

/// Activations the network layer stack understands.
pub const KNOWN_ACTIVATIONS: &[&str] = &["relu", "tanh", "linear"];

// ============================================================================
// Configuration Structs
// ============================================================================

/// Root configuration structure matching crucible.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CentralConfig {
    pub common: CommonConfig,
    #[serde(default)]
    pub self_play: SelfPlayConfig,
    #[serde(default)]
    pub pit_play: PitPlayConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
    pub model: ModelConfig,
}

/// Settings shared by every command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommonConfig {
    /// Registered game name, e.g. "connect4"
    pub game: String,
    #[serde(default = "d_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "d_log_level")]
    pub log_level: String,
    #[serde(default = "d_threads")]
    pub threads: usize,
    /// Fixed seed for reproducible runs; entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Per-search parameters, one table per worker kind
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "d_cpuct")]
    pub cpuct: f32,
    #[serde(default = "d_dirichlet_epsilon")]
    pub dirichlet_epsilon: f32,
    #[serde(default = "d_dirichlet_alpha")]
    pub dirichlet_alpha: f32,
    #[serde(default = "d_iterations")]
    pub iterations: u32,
    #[serde(default = "d_temperature_turns")]
    pub temperature_turns: u32,
    #[serde(default = "d_temperature_max")]
    pub temperature_max: f32,
    #[serde(default = "d_temperature_min")]
    pub temperature_min: f32,
    #[serde(default = "d_init_reserved_nodes")]
    pub init_reserved_nodes: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        defaults::search()
    }
}

/// Self-play data generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelfPlayConfig {
    /// Games per generation once warmup is over
    #[serde(default = "d_self_play_games")]
    pub games: u32,
    /// How many generations back the "recent" opponent is drawn from
    #[serde(default = "d_recent_window")]
    pub recent_window: u32,
    /// Generations over which the game budget ramps up
    #[serde(default = "d_warmup_generations")]
    pub warmup_generations: u32,
    /// Fraction of the game budget played at generation 0
    #[serde(default = "d_warmup_floor")]
    pub warmup_floor: f32,
    /// Weight of the game result in the first sample's value target
    #[serde(default = "d_value_floor")]
    pub value_floor: f32,
    #[serde(default = "d_self_play_search")]
    pub mcts: SearchConfig,
}

impl Default for SelfPlayConfig {
    fn default() -> Self {
        Self {
            games: defaults::self_play_games(),
            recent_window: defaults::recent_window(),
            warmup_generations: defaults::warmup_generations(),
            warmup_floor: defaults::warmup_floor(),
            value_floor: defaults::value_floor(),
            mcts: defaults::self_play_search(),
        }
    }
}

/// Arena matches deciding model promotion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PitPlayConfig {
    #[serde(default = "d_pit_play_games")]
    pub games: u32,
    /// Minimum win rate (percent) a candidate needs against every best model
    #[serde(default = "d_win_rate_accepted")]
    pub win_rate_accepted: f32,
    /// Search by wall clock instead of iteration count when set
    #[serde(default)]
    pub move_time_ms: Option<u64>,
    #[serde(default = "d_pit_play_search")]
    pub mcts: SearchConfig,
}

impl Default for PitPlayConfig {
    fn default() -> Self {
        Self {
            games: defaults::pit_play_games(),
            win_rate_accepted: defaults::win_rate_accepted(),
            move_time_ms: None,
            mcts: defaults::pit_play_search(),
        }
    }
}

/// Checks run whenever a new best model is accepted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "d_validation_search")]
    pub mcts: SearchConfig,
    #[serde(default)]
    pub validators: Vec<ValidatorConfig>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            mcts: defaults::validation_search(),
            validators: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ValidatorConfig {
    /// Score value and policy heads against a labelled dataset file
    Dataset { data_path: PathBuf },
    /// Play against uniformly random moves
    RandomAgent { games: u32 },
    /// Play against a one-ply heuristic player
    Depth1Agent { games: u32 },
    /// Play against a fixed reference network
    Model {
        data_path: PathBuf,
        games: u32,
        /// Layer stack of the reference network; `model.layers` when absent
        #[serde(default)]
        layers: Option<Vec<LayerConfig>>,
        /// Search for the reference side; `validation.mcts` when absent
        #[serde(default)]
        mcts: Option<SearchConfig>,
    },
}

impl ValidatorConfig {
    pub fn games(&self) -> Option<u32> {
        match self {
            ValidatorConfig::Dataset { .. } => None,
            ValidatorConfig::RandomAgent { games }
            | ValidatorConfig::Depth1Agent { games }
            | ValidatorConfig::Model { games, .. } => Some(*games),
        }
    }
}

/// Network shape; the input size comes from the game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub layers: Vec<LayerConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerConfig {
    pub units: usize,
    pub activation: String,
}

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(msg.into())
}

fn validate_layers(what: &str, layers: &[LayerConfig]) -> Result<(), ConfigError> {
    if layers.is_empty() {
        return Err(invalid(format!("{what} must list at least one layer")));
    }
    for (i, layer) in layers.iter().enumerate() {
        if layer.units == 0 {
            return Err(invalid(format!("{what}[{i}] has zero units")));
        }
        let activation = layer.activation.to_ascii_lowercase();
        if !KNOWN_ACTIVATIONS.contains(&activation.as_str()) {
            return Err(invalid(format!(
                "{what}[{i}] has unknown activation '{}'",
                layer.activation
            )));
        }
    }
    Ok(())
}

impl SearchConfig {
    fn validate(&self, section: &str) -> Result<(), ConfigError> {
        if self.iterations == 0 {
            return Err(invalid(format!("{section}.mcts.iterations must be > 0")));
        }
        if self.cpuct <= 0.0 {
            return Err(invalid(format!("{section}.mcts.cpuct must be > 0")));
        }
        if !(0.0..=1.0).contains(&self.dirichlet_epsilon) {
            return Err(invalid(format!(
                "{section}.mcts.dirichlet_epsilon must be within [0, 1]"
            )));
        }
        if self.temperature_turns > 0 && (self.temperature_max <= 0.0 || self.temperature_min <= 0.0)
        {
            return Err(invalid(format!(
                "{section}.mcts temperatures must be > 0 when temperature_turns > 0"
            )));
        }
        Ok(())
    }
}

impl CentralConfig {
    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.common.game.trim().is_empty() {
            return Err(invalid("common.game must not be empty"));
        }
        if self.common.threads == 0 {
            return Err(invalid("common.threads must be > 0"));
        }

        if self.self_play.games == 0 {
            return Err(invalid("self_play.games must be > 0"));
        }
        for (name, v) in [
            ("self_play.warmup_floor", self.self_play.warmup_floor),
            ("self_play.value_floor", self.self_play.value_floor),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(invalid(format!("{name} must be within [0, 1], got {v}")));
            }
        }
        self.self_play.mcts.validate("self_play")?;

        if self.pit_play.games == 0 {
            return Err(invalid("pit_play.games must be > 0"));
        }
        let rate = self.pit_play.win_rate_accepted;
        if !(0.0..=100.0).contains(&rate) {
            return Err(invalid(format!(
                "pit_play.win_rate_accepted must be within [0, 100], got {rate}"
            )));
        }
        if self.pit_play.move_time_ms == Some(0) {
            return Err(invalid("pit_play.move_time_ms must be > 0 when set"));
        }
        self.pit_play.mcts.validate("pit_play")?;

        self.validation.mcts.validate("validation")?;
        for (i, validator) in self.validation.validators.iter().enumerate() {
            if validator.games() == Some(0) {
                return Err(invalid(format!("validation.validators[{i}].games must be > 0")));
            }
            if let ValidatorConfig::Model { layers, mcts, .. } = validator {
                if let Some(layers) = layers {
                    validate_layers(&format!("validation.validators[{i}].layers"), layers)?;
                }
                if let Some(mcts) = mcts {
                    mcts.validate(&format!("validation.validators[{i}]"))?;
                }
            }
        }

        validate_layers("model.layers", &self.model.layers)
    }
}
