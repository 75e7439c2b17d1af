//! Fixed-strategy opponents for validation games.

use engine_core::Game;
use mcts::FastRng;

/// A player that picks moves without search.
pub trait Agent: Send {
    /// Name used in metric tags.
    fn name(&self) -> &'static str;

    /// Choose a move for the side to move in `state`, which is not terminal.
    fn choose(&mut self, state: &dyn Game, rng: &mut FastRng) -> usize;
}

/// Uniformly random legal move.
#[derive(Debug, Default)]
pub struct RandomAgent {
    legal: Vec<usize>,
}

impl Agent for RandomAgent {
    fn name(&self) -> &'static str {
        "RandomAgent"
    }

    fn choose(&mut self, state: &dyn Game, rng: &mut FastRng) -> usize {
        state.legal_moves(&mut self.legal);
        assert!(!self.legal.is_empty(), "agent asked to move in a finished game");
        self.legal[rng.next_below(self.legal.len() as u32) as usize]
    }
}

/// Greedy one-ply player: the move leaving the opponent the worst position.
///
/// Positions are scored with the game's static `eval`, finished games with
/// their exact result. Ties go to the first move.
#[derive(Debug, Default)]
pub struct Depth1Agent {
    legal: Vec<usize>,
}

impl Depth1Agent {
    fn score(child: &dyn Game) -> f32 {
        if child.is_terminal() {
            -child.game_result().as_f32()
        } else {
            -child.eval()
        }
    }
}

impl Agent for Depth1Agent {
    fn name(&self) -> &'static str {
        "Depth1Agent"
    }

    fn choose(&mut self, state: &dyn Game, _rng: &mut FastRng) -> usize {
        state.legal_moves(&mut self.legal);
        assert!(!self.legal.is_empty(), "agent asked to move in a finished game");

        let mut best = self.legal[0];
        let mut best_score = f32::NEG_INFINITY;
        for &mv in &self.legal {
            let mut child = state.clone_box();
            child.make_move(mv);
            let score = Self::score(child.as_ref());
            if score > best_score {
                best_score = score;
                best = mv;
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use games_tictactoe::TicTacToe;

    #[test]
    fn test_random_agent_plays_legal_moves() {
        let mut agent = RandomAgent::default();
        let mut rng = FastRng::new(3);
        let state = TicTacToe::from_board_str("XO.XO....").unwrap();
        let mut legal = Vec::new();
        state.legal_moves(&mut legal);

        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            let mv = agent.choose(&state, &mut rng);
            assert!(legal.contains(&mv));
            seen.insert(mv);
        }
        assert!(seen.len() > 1, "random agent always chose the same move");
    }

    #[test]
    fn test_depth1_takes_immediate_win() {
        let mut agent = Depth1Agent::default();
        let mut rng = FastRng::new(0);
        // X to move, 6 completes the left column
        let state = TicTacToe::from_board_str("XO.XO....").unwrap();
        assert_eq!(agent.choose(&state, &mut rng), 6);
    }

    #[test]
    fn test_depth1_is_deterministic() {
        let mut agent = Depth1Agent::default();
        let state = TicTacToe::new();
        let first = agent.choose(&state, &mut FastRng::new(1));
        for seed in 2..20 {
            assert_eq!(agent.choose(&state, &mut FastRng::new(seed)), first);
        }
    }

    #[test]
    fn test_agent_names() {
        assert_eq!(RandomAgent::default().name(), "RandomAgent");
        assert_eq!(Depth1Agent::default().name(), "Depth1Agent");
    }
}
