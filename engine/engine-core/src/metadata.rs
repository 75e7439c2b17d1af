//! Game names for configuration and logging

use serde::{Deserialize, Serialize};

/// How a game is looked up in the registry and shown in logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameMetadata {
    /// Registry identifier (e.g., "tictactoe", "oware")
    pub name: String,

    /// Human-readable display name (e.g., "Tic-Tac-Toe")
    pub display_name: String,
}

impl GameMetadata {
    pub fn new(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let meta = GameMetadata::new("tictactoe", "Tic-Tac-Toe");
        assert_eq!(meta.name, "tictactoe");
        assert_eq!(meta.display_name, "Tic-Tac-Toe");
    }

    #[test]
    fn test_serialization() {
        let meta = GameMetadata::new("connect4", "Connect 4");
        let json = serde_json::to_string(&meta).unwrap();
        assert_eq!(json, r#"{"name":"connect4","display_name":"Connect 4"}"#);
        let parsed: GameMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(meta, parsed);
    }
}
