//! Static game registry
//!
//! Games register a factory under a short name (e.g. "tictactoe") and the
//! actor looks them up at runtime from `common.game` in the configuration.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Mutex;

use tracing::warn;

use crate::game::Game;

/// Factory function type for creating a game at its initial position
pub type GameFactory = fn() -> Box<dyn Game>;

/// Thread-safe registry mapping game name to factory function
static REGISTRY: Lazy<Mutex<HashMap<String, GameFactory>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

fn registry() -> std::sync::MutexGuard<'static, HashMap<String, GameFactory>> {
    // A poisoned lock only means a panicking test held it; the map is still valid.
    REGISTRY.lock().unwrap_or_else(|e| e.into_inner())
}

/// Register a game with the global registry
///
/// Registering the same name twice replaces the earlier factory and logs a
/// warning.
///
/// # Example
///
/// ```rust
/// # use engine_core::registry::*;
/// # use engine_core::{Game, GameMetadata, Outcome};
/// #[derive(Debug, Clone, PartialEq, Default)]
/// struct Nim(u8);
///
/// impl std::fmt::Display for Nim {
///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
///         write!(f, "{} stones", self.0)
///     }
/// }
///
/// impl Game for Nim {
///     fn metadata(&self) -> GameMetadata { GameMetadata::new("nim", "Nim") }
///     fn legal_moves(&self, moves: &mut Vec<usize>) {
///         moves.clear();
///         moves.extend((0..2).filter(|m| (*m as u8) < self.0));
///     }
///     fn make_move(&mut self, mv: usize) { self.0 -= mv as u8 + 1; }
///     fn is_terminal(&self) -> bool { self.0 == 0 }
///     fn game_result(&self) -> Outcome { Outcome::Loss }
///     fn scaled_game_result(&self) -> f32 { -1.0 }
///     fn encode_input(&self, input: &mut [f32]) { input[0] = self.0 as f32; }
///     fn input_size(&self) -> usize { 1 }
///     fn max_moves(&self) -> usize { 2 }
///     fn max_turns(&self) -> usize { 10 }
///     fn turn_number(&self) -> usize { 0 }
///     engine_core::impl_game_boilerplate!();
/// }
///
/// fn nim_factory() -> Box<dyn Game> {
///     Box::new(Nim(5))
/// }
///
/// register_game("nim".to_string(), nim_factory);
/// assert!(is_registered("nim"));
/// ```
pub fn register_game(name: String, factory: GameFactory) {
    let mut registry = registry();
    if registry.contains_key(&name) {
        warn!(game = %name, "Overriding existing game registration");
    }
    registry.insert(name, factory);
}

/// Create a game at its initial position by name
///
/// Returns `None` (and logs a warning) when the name is not registered.
pub fn create_game(name: &str) -> Option<Box<dyn Game>> {
    let registry = registry();
    match registry.get(name) {
        Some(factory) => Some(factory()),
        None => {
            warn!(game = %name, "Attempted to create unregistered game");
            None
        }
    }
}

/// Get list of all registered game names
pub fn list_registered_games() -> Vec<String> {
    registry().keys().cloned().collect()
}

/// Check if a game is registered
pub fn is_registered(name: &str) -> bool {
    registry().contains_key(name)
}

/// Clear all registered games (mainly for testing)
pub fn clear_registry() {
    registry().clear();
}

/// Convenience macro for registering games
///
/// The game type must implement `Default` returning its initial position.
///
/// ```ignore
/// register_game!(TicTacToe, "tictactoe");
/// ```
#[macro_export]
macro_rules! register_game {
    ($game_type:ty, $name:expr) => {{
        fn factory() -> Box<dyn $crate::Game> {
            Box::new(<$game_type>::default())
        }
        $crate::registry::register_game($name.to_string(), factory);
    }};
}
