//! Solver-aware Monte Carlo Tree Search for AlphaZero-style self-play.
//!
//! The search works with any game implementing the `engine-core` [`Game`]
//! trait and any evaluator implementing [`Model`].
//!
//! # Overview
//!
//! Each iteration consists of four phases:
//!
//! 1. **Selection**: descend with PUCT, skipping moves already proven lost
//! 2. **Expansion**: add one child per legal move with the model's priors
//! 3. **Evaluation**: the model's value, or the exact result at game end
//! 4. **Backpropagation**: update statistics and propagate win/loss/draw
//!    proofs as far up as they decide the outcome
//!
//! Proven nodes are never averaged again, and a proven root stops the search.
//!
//! # Usage
//!
//! ```
//! use engine_core::Game;
//! use games_tictactoe::TicTacToe;
//! use mcts::{FastRng, MctsConfig, MctsSearch, Sample, UniformModel};
//!
//! let game = TicTacToe::new();
//! let mut model = UniformModel::new(game.input_size(), game.max_moves());
//! let mut search = MctsSearch::new(&game, MctsConfig::for_testing(), FastRng::new(42));
//!
//! search.search(&mut model);
//! let mv = search.best_move();
//!
//! let mut sample = Sample::new(game.input_size(), game.max_moves());
//! search.fill_sample(&mut sample);
//! assert!((sample.policy.iter().sum::<f32>() - 1.0).abs() < 1e-4);
//!
//! search.restore_root(mv);
//! ```
//!
//! [`Game`]: engine_core::Game

pub mod config;
pub mod decision;
pub mod fast_math;
pub mod model;
pub mod network;
pub mod node;
pub mod random;
pub mod sample;
pub mod search;
pub mod stopwatch;
pub mod tree;

// Re-export main types
pub use config::MctsConfig;
pub use decision::MoveLabel;
pub use model::{model_factory, Model, ModelFactory, UniformModel};
pub use network::{Activation, DenseNetwork, LayerSpec, ModelError, NetworkSpec};
pub use node::{MctsNode, NodeId, NodeStatus};
pub use random::FastRng;
pub use sample::Sample;
pub use search::MctsSearch;
pub use stopwatch::Stopwatch;
pub use tree::{MctsTree, TreeStats};
