//! MCTS configuration parameters.

use serde::{Deserialize, Serialize};

/// Configuration for Monte Carlo Tree Search.
///
/// Immutable for the lifetime of a search; copy it into each tree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MctsConfig {
    /// Exploration constant of the PUCT formula.
    pub cpuct: f32,

    /// Fraction of the root prior replaced by Dirichlet noise.
    /// Below 0.001 the noise is skipped.
    pub dirichlet_epsilon: f32,

    /// Dirichlet concentration. A common heuristic is 10 / max legal moves.
    pub dirichlet_alpha: f32,

    /// Iterations per call to `search`.
    pub iterations: u32,

    /// Moves are sampled from visit counts for turns below this, afterwards
    /// the most visited move is played.
    pub temperature_turns: u32,

    /// Temperature at turn 0, decaying linearly to `temperature_min`.
    pub temperature_max: f32,

    pub temperature_min: f32,

    /// Nodes reserved up front in the node pool.
    pub init_reserved_nodes: usize,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            cpuct: 1.0,
            dirichlet_epsilon: 0.25,
            dirichlet_alpha: 0.1,
            iterations: 1600,
            temperature_turns: 30,
            temperature_max: 1.75,
            temperature_min: 0.5,
            init_reserved_nodes: 0,
        }
    }
}

impl MctsConfig {
    /// Create config for training (with exploration noise).
    pub fn for_training() -> Self {
        Self::default()
    }

    /// Create config for evaluation/arena play (no noise, greedy selection).
    pub fn for_evaluation() -> Self {
        Self {
            dirichlet_epsilon: 0.0,
            temperature_turns: 0,
            ..Self::default()
        }
    }

    /// Create a fast config for testing.
    pub fn for_testing() -> Self {
        Self {
            cpuct: 1.0,
            dirichlet_epsilon: 0.0,
            dirichlet_alpha: 0.0,
            iterations: 200,
            temperature_turns: 0,
            temperature_max: 1.0,
            temperature_min: 1.0,
            init_reserved_nodes: 1024,
        }
    }

    /// Builder pattern: set iterations per search.
    pub fn with_iterations(mut self, n: u32) -> Self {
        self.iterations = n;
        self
    }

    /// Builder pattern: set exploration constant.
    pub fn with_cpuct(mut self, c: f32) -> Self {
        self.cpuct = c;
        self
    }

    /// Builder pattern: set root noise.
    pub fn with_noise(mut self, epsilon: f32, alpha: f32) -> Self {
        self.dirichlet_epsilon = epsilon;
        self.dirichlet_alpha = alpha;
        self
    }

    /// Builder pattern: set the temperature schedule.
    pub fn with_temperature(mut self, turns: u32, max: f32, min: f32) -> Self {
        self.temperature_turns = turns;
        self.temperature_max = max;
        self.temperature_min = min;
        self
    }

    pub fn with_reserved_nodes(mut self, n: usize) -> Self {
        self.init_reserved_nodes = n;
        self
    }

    /// Temperature used at `turn`, or `None` once play is greedy.
    pub fn temperature_at(&self, turn: usize) -> Option<f32> {
        if turn >= self.temperature_turns as usize {
            return None;
        }
        if turn == 0 {
            return Some(self.temperature_max);
        }
        let decay =
            (self.temperature_max - self.temperature_min) / (self.temperature_turns - 1) as f32;
        Some(self.temperature_max - turn as f32 * decay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MctsConfig::default();
        assert_eq!(config.iterations, 1600);
        assert!((config.cpuct - 1.0).abs() < 1e-6);
        assert_eq!(config.temperature_turns, 30);
    }

    #[test]
    fn test_builder_pattern() {
        let config = MctsConfig::default()
            .with_iterations(100)
            .with_cpuct(3.0)
            .with_noise(0.15, 1.5)
            .with_temperature(20, 0.75, 0.75)
            .with_reserved_nodes(10);

        assert_eq!(config.iterations, 100);
        assert!((config.cpuct - 3.0).abs() < 1e-6);
        assert!((config.dirichlet_alpha - 1.5).abs() < 1e-6);
        assert_eq!(config.temperature_turns, 20);
        assert_eq!(config.init_reserved_nodes, 10);
    }

    #[test]
    fn test_evaluation_config() {
        let config = MctsConfig::for_evaluation();
        assert!(config.dirichlet_epsilon.abs() < 1e-6);
        assert_eq!(config.temperature_at(0), None);
    }

    #[test]
    fn test_temperature_schedule() {
        let config = MctsConfig::default().with_temperature(5, 2.0, 1.0);
        assert_eq!(config.temperature_at(0), Some(2.0));
        assert!((config.temperature_at(2).unwrap() - 1.5).abs() < 1e-6);
        assert!((config.temperature_at(4).unwrap() - 1.0).abs() < 1e-6);
        assert_eq!(config.temperature_at(5), None);

        // A single temperature turn never divides by zero
        let single = MctsConfig::default().with_temperature(1, 2.0, 1.0);
        assert_eq!(single.temperature_at(0), Some(2.0));
        assert_eq!(single.temperature_at(1), None);
    }
}
