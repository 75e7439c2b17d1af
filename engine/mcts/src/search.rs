//! MCTS search implementation.
//!
//! Each iteration runs the usual four phases:
//! 1. Selection: descend with PUCT until a solved or unexpanded node
//! 2. Expansion: replay the path on a clone of the root position and add
//!    one child per legal move, priors from the model
//! 3. Evaluation: the model value, or the exact result at terminal nodes
//! 4. Backpropagation: update statistics and propagate proofs to the root
//!
//! A search owns its tree, a clone of the root position and its scratch
//! buffers. It is driven by one thread at a time.

use std::time::Duration;

use engine_core::Game;
use tracing::trace;

use crate::config::MctsConfig;
use crate::model::Model;
use crate::node::NodeId;
use crate::random::FastRng;
use crate::stopwatch::Stopwatch;
use crate::tree::{MctsTree, TreeStats};

/// Deadline checks happen once per this many iterations.
const DEADLINE_CHECK_INTERVAL: u32 = 10;

/// Solver-aware MCTS over a single game.
pub struct MctsSearch {
    pub(crate) config: MctsConfig,
    pub(crate) tree: MctsTree,
    pub(crate) root_state: Box<dyn Game>,
    pub(crate) rng: FastRng,
    path: Vec<NodeId>,
    legal_moves: Vec<usize>,
}

impl std::fmt::Debug for MctsSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MctsSearch")
            .field("config", &self.config)
            .field("nodes", &self.tree.len())
            .field("root", &self.tree.root())
            .finish_non_exhaustive()
    }
}

impl MctsSearch {
    /// Create a search rooted at a clone of `state`.
    pub fn new(state: &dyn Game, config: MctsConfig, rng: FastRng) -> Self {
        Self {
            tree: MctsTree::with_capacity(config.init_reserved_nodes),
            root_state: state.clone_box(),
            legal_moves: Vec::with_capacity(state.max_moves()),
            path: Vec::new(),
            config,
            rng,
        }
    }

    /// Forget the tree and start over from `state`.
    pub fn reset(&mut self, state: &dyn Game) {
        self.root_state = state.clone_box();
        self.tree.reset();
    }

    /// Run `config.iterations` iterations. Does nothing once the root is solved.
    pub fn search(&mut self, model: &mut dyn Model) {
        if self.root_solved() {
            return;
        }
        for _ in 0..self.config.iterations {
            self.update(model);
        }
    }

    /// Run iterations until `budget` has elapsed.
    ///
    /// The clock is read every few iterations, so the search may overrun
    /// the budget slightly. At least one batch of iterations always runs.
    pub fn search_for(&mut self, model: &mut dyn Model, budget: Duration) {
        if self.root_solved() {
            return;
        }

        let watch = Stopwatch::start(budget);
        let mut i: u32 = 0;
        while i % DEADLINE_CHECK_INTERVAL != 0 || !watch.timed_out() {
            self.update(model);
            i = i.wrapping_add(1);
        }

        trace!(
            iterations = i,
            elapsed_ms = watch.elapsed().as_millis() as u64,
            "Timed search finished"
        );
    }

    /// Advance the root by `mv`, keeping the subtree below it if it exists.
    pub fn restore_root(&mut self, mv: usize) {
        let root = self.tree.root();
        let child = self
            .tree
            .children(root)
            .find(|&c| self.tree.get(c).move_id == mv);

        self.root_state.make_move(mv);
        match child {
            Some(child) => self.tree.reroot(child),
            None => self.tree.reset(),
        }
    }

    /// Move the root to `state` if it is one move away from the current root.
    ///
    /// Only direct children are tried. Any other position resets the tree.
    pub fn restore_root_from_state(&mut self, state: &dyn Game) {
        let root = self.tree.root();
        let found = self.tree.children(root).find(|&c| {
            let mut next = self.root_state.clone_box();
            next.make_move(self.tree.get(c).move_id);
            next.same_position(state)
        });

        match found {
            Some(child) => {
                let mv = self.tree.get(child).move_id;
                self.tree.reroot(child);
                self.root_state.make_move(mv);
            }
            None => self.reset(state),
        }
    }

    pub fn root_state(&self) -> &dyn Game {
        self.root_state.as_ref()
    }

    pub fn tree(&self) -> &MctsTree {
        &self.tree
    }

    pub fn config(&self) -> &MctsConfig {
        &self.config
    }

    pub fn stats(&self) -> TreeStats {
        self.tree.stats()
    }

    fn root_solved(&self) -> bool {
        self.tree.get(self.tree.root()).is_solved()
    }

    /// One select / expand / backpropagate round.
    fn update(&mut self, model: &mut dyn Model) {
        let leaf = self.select();

        if !self.tree.get(leaf).is_solved() {
            let mut state = self.root_state.clone_box();
            for &id in &self.path[1..] {
                state.make_move(self.tree.get(id).move_id);
            }
            self.expand(leaf, state.as_ref(), model);
        }

        self.tree.backpropagate(&self.path);
    }

    /// Walk down from the root, recording the path. Returns the leaf.
    fn select(&mut self) -> NodeId {
        self.path.clear();
        let mut current = self.tree.root();

        loop {
            self.path.push(current);
            let node = self.tree.get(current);

            if node.is_solved() || node.child_count == 0 {
                return current;
            }

            current = if node.child_count == 1 {
                node.first_child
            } else {
                self.tree.select_child(current, self.config.cpuct)
            };
        }
    }

    fn expand(&mut self, id: NodeId, state: &dyn Game, model: &mut dyn Model) {
        if state.is_terminal() {
            self.tree
                .solve_terminal(id, state.scaled_game_result(), state.game_result().into());
        } else {
            state.legal_moves(&mut self.legal_moves);
            state.encode_input(model.input_mut());
            model.forward(Some(&self.legal_moves));

            self.tree.get_mut(id).nn_value = model.value();

            let model: &dyn Model = model;
            self.tree
                .expand(id, self.legal_moves.iter().map(|&mv| (mv, model.policy(mv))));
        }

        if id == self.tree.root() {
            self.tree.add_dirichlet_noise(
                id,
                self.config.dirichlet_epsilon,
                self.config.dirichlet_alpha,
                &mut self.rng,
            );
        }
    }
}
