//! Game registration for the Crucible engine
//!
//! This crate provides a single initialization point for registering all
//! available games with the engine-core registry.
//!
//! # Usage
//!
//! ```rust
//! use engine_games::register_all_games;
//!
//! // Call once at startup - safe to call multiple times
//! register_all_games();
//! assert!(engine_core::is_registered("oware"));
//! ```

use std::sync::Once;

static INIT: Once = Once::new();

/// Register all available games with the engine-core registry.
///
/// This function uses `std::sync::Once` to ensure registration only
/// happens once, even if called multiple times. Safe to call from
/// multiple threads.
///
/// Currently registers:
/// - TicTacToe (`"tictactoe"`)
/// - Connect 4 (`"connect4"`)
/// - Oware (`"oware"`)
pub fn register_all_games() {
    INIT.call_once(|| {
        games_tictactoe::register_tictactoe();
        games_connect4::register_connect4();
        games_oware::register_oware();
    });
}

// Re-export individual registration functions for advanced use cases
pub use games_connect4::register_connect4;
pub use games_oware::register_oware;
pub use games_tictactoe::register_tictactoe;

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::{create_game, is_registered, list_registered_games};

    #[test]
    fn test_register_all_games() {
        register_all_games();

        assert!(is_registered("tictactoe"));
        assert!(is_registered("connect4"));
        assert!(is_registered("oware"));
    }

    #[test]
    fn test_register_all_games_idempotent() {
        register_all_games();
        register_all_games();
        register_all_games();

        let games = list_registered_games();
        for name in ["tictactoe", "connect4", "oware"] {
            assert_eq!(games.iter().filter(|g| *g == name).count(), 1);
        }
    }

    #[test]
    fn test_created_games_match_metadata() {
        register_all_games();

        for name in ["tictactoe", "connect4", "oware"] {
            let game = create_game(name).expect("registered game");
            let meta = game.metadata();
            assert_eq!(meta.name, name);
            assert!(!meta.display_name.is_empty());
            assert_eq!(game.turn_number(), 0);

            let mut moves = Vec::new();
            game.legal_moves(&mut moves);
            assert!(!moves.is_empty());
            assert!(moves.iter().all(|&m| m < game.max_moves()));
        }
    }
}
