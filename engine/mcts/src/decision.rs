//! Turning a searched tree into a move or a training target.

use std::fmt;

use tracing::debug;

use crate::node::{NodeId, NodeStatus};
use crate::sample::Sample;
use crate::search::MctsSearch;

/// How the chosen move is expected to end for the player making it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveLabel {
    Win,
    Draw,
    Loss,
    /// Not proven; the search's value estimate.
    Score(f32),
}

impl fmt::Display for MoveLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveLabel::Win => f.write_str("WIN"),
            MoveLabel::Draw => f.write_str("DRAW"),
            MoveLabel::Loss => f.write_str("LOSE"),
            MoveLabel::Score(score) => write!(f, "{score:.6}"),
        }
    }
}

impl MctsSearch {
    /// Choose the move to play from the current root.
    ///
    /// A solved root plays its best proven move. Otherwise visit counts are
    /// sampled with the configured temperature early in the game and the
    /// most visited move is played afterwards. Moves proven to lose are never
    /// chosen while the root is unsolved.
    ///
    /// # Panics
    ///
    /// Panics if the root has no children.
    pub fn best_move(&mut self) -> usize {
        let root_id = self.tree.root();
        let root = self.tree.get(root_id);
        assert!(
            root.child_count > 0,
            "best_move on a root without children (was it searched?)"
        );

        if root.is_solved() {
            return self.tree.get(self.best_solved_child()).move_id;
        }

        let children: Vec<NodeId> = root.children().collect();
        let mut pi: Vec<f32> = children
            .iter()
            .map(|&c| {
                let child = self.tree.get(c);
                if child.status == NodeStatus::Win {
                    0.0
                } else {
                    child.visit_count as f32
                }
            })
            .collect();

        if pi.iter().all(|&p| p == 0.0) {
            return self.tree.get(self.highest_prior_child(&children)).move_id;
        }

        let turn = self.root_state.turn_number();
        let chosen = match self.config.temperature_at(turn) {
            Some(temperature) => {
                let exponent = 1.0 / temperature;
                let mut sum = 0.0;
                for p in &mut pi {
                    *p = p.powf(exponent);
                    sum += *p;
                }

                let x = self.rng.next_f32_range(0.0, sum);
                let mut cumulative = 0.0;
                pi.iter()
                    .position(|&p| {
                        cumulative += p;
                        x <= cumulative
                    })
                    .unwrap_or(children.len() - 1)
            }
            None => first_max_index(&pi),
        };

        self.tree.get(children[chosen]).move_id
    }

    /// Root child with the highest prior that is not proven lost, for roots
    /// whose playable children were never visited.
    fn highest_prior_child(&self, children: &[NodeId]) -> NodeId {
        let priors: Vec<f32> = children
            .iter()
            .map(|&c| {
                let child = self.tree.get(c);
                if child.status == NodeStatus::Win {
                    f32::NEG_INFINITY
                } else {
                    child.prior
                }
            })
            .collect();
        children[first_max_index(&priors)]
    }

    /// [`best_move`](Self::best_move) plus what the search knows about it.
    ///
    /// Every root child is logged at debug level.
    pub fn best_move_annotated(&mut self) -> (usize, MoveLabel) {
        let root = self.tree.root();
        for c in self.tree.children(root) {
            let child = self.tree.get(c);
            debug!(
                mv = child.move_id,
                visits = child.visit_count,
                score = -child.value(),
                prior = child.prior,
                "Root child"
            );
        }

        let mv = self.best_move();
        let Some(child) = self
            .tree
            .children(root)
            .map(|c| self.tree.get(c))
            .find(|c| c.move_id == mv)
        else {
            panic!("best move {mv} is not a child of the root");
        };

        let label = match child.status {
            NodeStatus::Loss => MoveLabel::Win,
            NodeStatus::Draw => MoveLabel::Draw,
            NodeStatus::Win => MoveLabel::Loss,
            NodeStatus::Unsolved => MoveLabel::Score(-child.value()),
        };
        (mv, label)
    }

    /// Write the root position and its search targets into `sample`.
    ///
    /// The policy target is one-hot on the best proven move for a solved
    /// root, and the visit distribution over not-lost moves otherwise.
    ///
    /// # Panics
    ///
    /// Panics if the root has no children.
    pub fn fill_sample(&mut self, sample: &mut Sample) {
        let root_id = self.tree.root();
        let root = self.tree.get(root_id);
        assert!(
            root.child_count > 0,
            "cannot build a sample from a root without children"
        );

        self.root_state.encode_input(&mut sample.input);
        sample.value = root.value();

        sample.legal_moves.fill(0);
        for c in root.children() {
            sample.legal_moves[self.tree.get(c).move_id] = 1;
        }

        sample.policy.fill(0.0);

        if root.is_solved() {
            let best = self.best_solved_child();
            sample.policy[self.tree.get(best).move_id] = 1.0;
            return;
        }

        let open: Vec<NodeId> = root
            .children()
            .filter(|&c| self.tree.get(c).status != NodeStatus::Win)
            .collect();

        let mut visits: f32 = open
            .iter()
            .map(|&c| self.tree.get(c).visit_count as f32)
            .sum();
        if visits == 0.0 {
            for &c in &open {
                self.tree.get_mut(c).visit_count = 1;
            }
            visits = open.len() as f32;
        }
        assert!(visits > 0.0, "every root move is proven lost");

        for &c in &open {
            let child = self.tree.get(c);
            sample.policy[child.move_id] = child.visit_count as f32 / visits;
        }
    }

    /// Dump the root and its children at debug level.
    pub fn log_root_stats(&self) {
        let root = self.tree.root();
        debug!(
            nodes = self.tree.len(),
            capacity = self.tree.capacity(),
            root = root.0,
            "MCTS stats"
        );

        for c in self.tree.children(root) {
            let child = self.tree.get(c);
            debug!(
                node = c.0,
                mv = child.move_id,
                visits = child.visit_count,
                score = -child.value(),
                prior = child.prior,
                status = %child.status,
                "Root child"
            );
        }
    }

    /// Solved child with the best value for the root.
    fn best_solved_child(&self) -> NodeId {
        let mut best_score = -2.0f32;
        let mut best = None;

        for c in self.tree.children(self.tree.root()) {
            let child = self.tree.get(c);
            if !child.is_solved() {
                continue;
            }
            let score = -child.value();
            if score > best_score {
                best_score = score;
                best = Some(c);
            }
        }

        match best {
            Some(c) => c,
            None => panic!("solved root has no solved child"),
        }
    }
}

fn first_max_index(xs: &[f32]) -> usize {
    let mut best = 0;
    for (i, &x) in xs.iter().enumerate() {
        if x > xs[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MctsConfig;
    use crate::model::UniformModel;
    use crate::random::FastRng;
    use engine_core::Game;
    use games_tictactoe::TicTacToe;

    /// Fresh tic-tac-toe search whose root has children for moves 0..n with
    /// the given visit counts.
    fn search_with_visits(config: MctsConfig, visits: &[u32]) -> MctsSearch {
        let mut search = MctsSearch::new(&TicTacToe::new(), config, FastRng::new(7));
        let root = search.tree.root();
        let prior = 1.0 / visits.len() as f32;
        search
            .tree
            .expand(root, (0..visits.len()).map(|mv| (mv, prior)));

        let children: Vec<_> = search.tree.children(root).collect();
        for (&c, &n) in children.iter().zip(visits) {
            let child = search.tree.get_mut(c);
            child.visit_count = n;
            child.value_sum = 0.0;
        }
        search.tree.get_mut(root).visit_count = visits.iter().sum();
        search
    }

    fn child_for(search: &MctsSearch, mv: usize) -> NodeId {
        let root = search.tree.root();
        search
            .tree
            .children(root)
            .find(|&c| search.tree.get(c).move_id == mv)
            .unwrap()
    }

    #[test]
    fn test_greedy_is_deterministic() {
        let mut search = search_with_visits(MctsConfig::for_evaluation(), &[3, 9, 9, 1]);

        for _ in 0..1000 {
            // Ties keep the first child
            assert_eq!(search.best_move(), 1);
        }
    }

    #[test]
    fn test_unvisited_root_skips_proven_loss() {
        for config in [MctsConfig::for_evaluation(), MctsConfig::for_training()] {
            let mut search = search_with_visits(config, &[0, 0, 0]);
            let lost = child_for(&search, 0);
            search.tree.get_mut(lost).status = NodeStatus::Win;
            search.tree.get_mut(lost).prior = 0.8;
            search.tree.get_mut(child_for(&search, 1)).prior = 0.05;
            search.tree.get_mut(child_for(&search, 2)).prior = 0.15;

            for _ in 0..100 {
                assert_eq!(search.best_move(), 2);
            }
        }
    }

    #[test]
    fn test_never_plays_proven_loss() {
        let mut search = search_with_visits(MctsConfig::for_evaluation(), &[100, 10, 5]);
        let lost = child_for(&search, 0);
        search.tree.get_mut(lost).status = NodeStatus::Win;
        search.tree.get_mut(lost).nn_value = 1.0;

        assert_eq!(search.best_move(), 1);

        let mut sampling = search_with_visits(MctsConfig::for_training(), &[100, 10, 5]);
        let lost = child_for(&sampling, 0);
        sampling.tree.get_mut(lost).status = NodeStatus::Win;
        for _ in 0..500 {
            assert_ne!(sampling.best_move(), 0);
        }
    }

    #[test]
    fn test_temperature_sampling_follows_visits() {
        let config = MctsConfig::for_training().with_temperature(10, 1.0, 1.0);
        let mut search = search_with_visits(config, &[90, 10, 0]);

        let mut counts = [0usize; 3];
        for _ in 0..2000 {
            counts[search.best_move()] += 1;
        }

        assert_eq!(counts[2], 0);
        assert!(counts[0] > counts[1] * 4, "{counts:?}");
        assert!(counts[1] > 0, "{counts:?}");
    }

    #[test]
    fn test_solved_root_plays_best_proof() {
        let mut search = search_with_visits(MctsConfig::for_training(), &[50, 1, 1]);
        let root = search.tree.root();
        search.tree.get_mut(root).status = NodeStatus::Win;

        let drawn = child_for(&search, 0);
        search.tree.solve_terminal(drawn, 0.0, NodeStatus::Draw);
        let winning = child_for(&search, 2);
        search.tree.solve_terminal(winning, -0.9, NodeStatus::Loss);

        assert_eq!(search.best_move(), 2);

        let mut sample = Sample::new(18, 9);
        search.fill_sample(&mut sample);
        assert_eq!(sample.policy[2], 1.0);
        assert_eq!(sample.policy.iter().sum::<f32>(), 1.0);
    }

    #[test]
    fn test_annotated_labels() {
        let mut search = search_with_visits(MctsConfig::for_evaluation(), &[1, 2, 3]);
        let (mv, label) = search.best_move_annotated();
        assert_eq!(mv, 2);
        // Unvisited-by-value children: value_sum 0 over visits
        assert_eq!(label, MoveLabel::Score(0.0));

        let best = child_for(&search, 2);
        search.tree.get_mut(best).status = NodeStatus::Draw;
        search.tree.get_mut(best).nn_value = 0.0;
        assert_eq!(search.best_move_annotated().1, MoveLabel::Draw);

        assert_eq!(MoveLabel::Win.to_string(), "WIN");
        assert_eq!(MoveLabel::Loss.to_string(), "LOSE");
        assert_eq!(MoveLabel::Score(0.25).to_string(), "0.250000");
    }

    #[test]
    fn test_fill_sample_visit_fractions() {
        let mut search = search_with_visits(MctsConfig::for_evaluation(), &[6, 2, 0, 2]);
        let lost = child_for(&search, 3);
        search.tree.get_mut(lost).status = NodeStatus::Win;

        let mut sample = Sample::new(18, 9);
        search.fill_sample(&mut sample);

        assert_eq!(&sample.legal_moves[..5], &[1, 1, 1, 1, 0]);
        assert!((sample.policy[0] - 0.75).abs() < 1e-6);
        assert!((sample.policy[1] - 0.25).abs() < 1e-6);
        assert_eq!(sample.policy[2], 0.0);
        assert_eq!(sample.policy[3], 0.0);
        assert_eq!(sample.input.len(), 18);
    }

    #[test]
    fn test_fill_sample_without_visits_is_uniform() {
        let mut search = search_with_visits(MctsConfig::for_evaluation(), &[0, 0, 0, 0]);

        let mut sample = Sample::new(18, 9);
        search.fill_sample(&mut sample);

        for mv in 0..4 {
            assert!((sample.policy[mv] - 0.25).abs() < 1e-6);
        }
    }

    #[test]
    fn test_tictactoe_search_proves_draw() {
        let game = TicTacToe::new();
        let mut model = UniformModel::new(game.input_size(), game.max_moves());
        let mut search = MctsSearch::new(
            &game,
            MctsConfig::for_testing().with_iterations(1000),
            FastRng::new(3),
        );

        for _ in 0..300 {
            search.search(&mut model);
            if search.tree().get(search.tree().root()).is_solved() {
                break;
            }
        }

        let root = search.tree().get(search.tree().root());
        assert_eq!(root.status, NodeStatus::Draw);
        assert!(root.nn_value.abs() < 1e-6);

        // Every proven move keeps the draw
        let (_, label) = search.best_move_annotated();
        assert_eq!(label, MoveLabel::Draw);
    }

    #[test]
    fn test_self_play_game_never_picks_lost_move() {
        let game = TicTacToe::new();
        let mut model = UniformModel::new(game.input_size(), game.max_moves());
        let config = MctsConfig::for_testing().with_iterations(400);
        let mut search = MctsSearch::new(&game, config, FastRng::new(11));

        while !search.root_state().is_terminal() {
            search.search(&mut model);
            let mv = search.best_move();

            let root = search.tree().root();
            let has_alternative = search
                .tree()
                .children(root)
                .any(|c| search.tree().get(c).status != NodeStatus::Win);
            let chosen = child_for(&search, mv);
            if has_alternative {
                assert_ne!(search.tree().get(chosen).status, NodeStatus::Win);
            }
            search.restore_root(mv);
        }
    }
}
