//! The game abstraction consumed by search and the workers.
//!
//! Every game is a two-player, zero-sum, perfect-information state machine.
//! All results and evaluations are reported from the perspective of the
//! player whose turn it is, so a caller can negate once per ply.

use std::any::Any;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::metadata::GameMetadata;

/// Final result of a game from the side-to-move's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Loss,
    Draw,
    Win,
}

impl Outcome {
    /// Integer encoding in {-1, 0, 1}.
    #[inline]
    pub fn value(self) -> i32 {
        match self {
            Outcome::Loss => -1,
            Outcome::Draw => 0,
            Outcome::Win => 1,
        }
    }

    /// The same result seen by the other player.
    #[inline]
    pub fn flipped(self) -> Outcome {
        match self {
            Outcome::Loss => Outcome::Win,
            Outcome::Draw => Outcome::Draw,
            Outcome::Win => Outcome::Loss,
        }
    }

    #[inline]
    pub fn as_f32(self) -> f32 {
        self.value() as f32
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Outcome::Loss => "loss",
            Outcome::Draw => "draw",
            Outcome::Win => "win",
        };
        f.write_str(s)
    }
}

/// Runtime interface every game implements.
///
/// The trait is object safe; search and the workers only ever hold
/// `Box<dyn Game>`. Cloning goes through [`Game::clone_box`] and is the only
/// way positions are shared between owners.
pub trait Game: Send + Sync + fmt::Debug + fmt::Display {
    /// Registry and display names.
    fn metadata(&self) -> GameMetadata;

    /// Write the legal moves of the current position into `moves`.
    ///
    /// The buffer is cleared first. Callers keep one buffer per search and
    /// pass it in on every call so no allocation happens in the hot loop.
    fn legal_moves(&self, moves: &mut Vec<usize>);

    /// Apply a move. The move must come from [`Game::legal_moves`].
    fn make_move(&mut self, mv: usize);

    fn is_terminal(&self) -> bool;

    /// Result for the player to move. Only meaningful once terminal.
    fn game_result(&self) -> Outcome;

    /// Continuous reward in [-1, 1] that also rewards short wins and long
    /// losses. Only meaningful once terminal.
    fn scaled_game_result(&self) -> f32;

    /// Fill `input` with the network encoding of this position.
    ///
    /// `input.len()` must equal [`Game::input_size`].
    fn encode_input(&self, input: &mut [f32]);

    /// Number of floats in the network input.
    fn input_size(&self) -> usize;

    /// Size of the policy vector (largest move id + 1).
    fn max_moves(&self) -> usize;

    /// Upper bound on the number of plies in a game.
    fn max_turns(&self) -> usize;

    /// Number of plies played so far.
    fn turn_number(&self) -> usize;

    /// Static heuristic score for the player to move. Higher is better.
    fn eval(&self) -> f32 {
        0.0
    }

    fn clone_box(&self) -> Box<dyn Game>;

    fn as_any(&self) -> &dyn Any;

    /// Structural equality with another position of any game type.
    fn same_position(&self, other: &dyn Game) -> bool;
}

impl Clone for Box<dyn Game> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Implements `clone_box`, `as_any` and `same_position` for a game type that
/// is `Clone + PartialEq + 'static`.
#[macro_export]
macro_rules! impl_game_boilerplate {
    () => {
        fn clone_box(&self) -> Box<dyn $crate::Game> {
            Box::new(self.clone())
        }

        fn as_any(&self) -> &dyn ::std::any::Any {
            self
        }

        fn same_position(&self, other: &dyn $crate::Game) -> bool {
            other
                .as_any()
                .downcast_ref::<Self>()
                .is_some_and(|other| other == self)
        }
    };
}
