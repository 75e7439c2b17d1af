//! Core traits and types for the Crucible game engine
//!
//! This crate provides the fundamental abstractions shared by search and the
//! games:
//! - `Game`: object-safe runtime interface every game implements
//! - `Outcome`: final result from the side-to-move's perspective
//! - `GameMetadata`: registry and display names
//! - `Registry`: static registration system for games

pub mod board_game;
pub mod game;
pub mod metadata;
pub mod registry;

// Re-export main types for convenience
pub use board_game::encode_relative_planes;
pub use game::{Game, Outcome};
pub use metadata::GameMetadata;
pub use registry::{
    clear_registry, create_game, is_registered, list_registered_games, register_game, GameFactory,
};
