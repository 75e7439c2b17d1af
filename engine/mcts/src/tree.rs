//! MCTS tree structure with arena allocation.
//!
//! Nodes live in one contiguous Vec and are referenced by [`NodeId`]. The
//! children of a node are appended as a single block on expansion and never
//! move afterwards, so a node only needs the first index and a count.
//!
//! The arena is append-only. Re-rooting leaves the abandoned part of the
//! tree in place until the next [`MctsTree::reset`].

use rand::RngCore;
use rand_distr::{Distribution, Gamma};

use crate::fast_math::{fast_recip, fast_sqrt};
use crate::node::{MctsNode, NodeId, NodeStatus};

/// Snapshot of tree statistics for logging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeStats {
    pub total_nodes: usize,
    pub root_visits: u32,
    pub root_value: f32,
    pub max_depth: usize,
}

/// MCTS tree with arena-based node storage.
#[derive(Debug)]
pub struct MctsTree {
    nodes: Vec<MctsNode>,
    root: NodeId,
}

impl Default for MctsTree {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl MctsTree {
    /// Create a tree holding a single unexpanded root.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut nodes = Vec::with_capacity(capacity.max(1));
        nodes.push(MctsNode::default());
        Self {
            nodes,
            root: NodeId::ROOT,
        }
    }

    /// Drop every node but a fresh root, keeping the allocation.
    pub fn reset(&mut self) {
        self.nodes.truncate(1);
        self.nodes[0] = MctsNode::default();
        self.root = NodeId::ROOT;
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Make `child` the new root. Its statistics are kept as they are.
    pub fn reroot(&mut self, child: NodeId) {
        debug_assert!(child.index() < self.nodes.len());
        self.root = child;
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> &MctsNode {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut MctsNode {
        &mut self.nodes[id.index()]
    }

    #[inline]
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> {
        self.get(id).children()
    }

    /// Number of nodes allocated in the arena.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    /// Append one child per `(move, prior)` pair as the child block of `id`.
    pub fn expand<I>(&mut self, id: NodeId, children: I)
    where
        I: IntoIterator<Item = (usize, f32)>,
    {
        let first = NodeId(self.nodes.len() as u32);
        self.nodes.extend(
            children
                .into_iter()
                .map(|(mv, prior)| MctsNode::new_child(mv, prior)),
        );
        let count = self.nodes.len() as u32 - first.0;

        let node = self.get_mut(id);
        node.first_child = first;
        node.child_count = count;
    }

    /// Mark `id` as a proven terminal position.
    pub fn solve_terminal(&mut self, id: NodeId, value: f32, status: NodeStatus) {
        let node = self.get_mut(id);
        node.nn_value = value;
        node.status = status;
        node.first_child = NodeId::ROOT;
        node.child_count = 0;
    }

    /// Mix Dirichlet noise into the priors of the children of `id`.
    ///
    /// Does nothing for a negligible `epsilon` or `alpha`, a childless node,
    /// or when the sampled vector sums to zero.
    pub fn add_dirichlet_noise<R: RngCore>(
        &mut self,
        id: NodeId,
        epsilon: f32,
        alpha: f32,
        rng: &mut R,
    ) {
        if epsilon < 0.001 || alpha < 0.001 {
            return;
        }
        let node = self.get(id);
        if node.child_count == 0 {
            return;
        }
        let Ok(gamma) = Gamma::new(alpha, 1.0) else {
            return;
        };

        let first = node.first_child.index();
        let count = node.child_count as usize;
        let noise: Vec<f32> = (0..count).map(|_| gamma.sample(&mut *rng)).collect();
        let sum: f32 = noise.iter().sum();
        if sum < f32::MIN_POSITIVE {
            return;
        }

        let factor = epsilon / sum;
        for (child, g) in self.nodes[first..first + count].iter_mut().zip(noise) {
            child.prior = child.prior * (1.0 - epsilon) + g * factor;
        }
    }

    /// Pick the child of `id` maximizing the PUCT score.
    ///
    /// Children proven to be wins for their own side are never chosen.
    ///
    /// # Panics
    ///
    /// Panics if every child is such a win.
    pub fn select_child(&self, id: NodeId, cpuct: f32) -> NodeId {
        let node = self.get(id);
        let scale = if node.visit_count <= 1 {
            cpuct
        } else {
            cpuct * fast_sqrt(node.visit_count as f32)
        };

        let mut best_u = -1e9f32;
        let mut best = None;

        for child_id in node.children() {
            let child = self.get(child_id);
            if child.status == NodeStatus::Win {
                continue;
            }

            let q = -child.value();
            let p = scale * child.prior * fast_recip(1 + child.visit_count);
            let u = q + p;

            if u > best_u {
                best_u = u;
                best = Some(child_id);
            }
        }

        match best {
            Some(child) => child,
            None => panic!(
                "no selectable child under node {} ({} children)",
                id.0, node.child_count
            ),
        }
    }

    /// Highest value among the solved children of `id`, from the side of `id`.
    fn max_solved_child_value(&self, id: NodeId) -> f32 {
        self.children(id)
            .map(|c| self.get(c))
            .filter(|c| c.is_solved())
            .fold(-1.0f32, |best, c| best.max(-c.nn_value))
    }

    fn all_children_solved(&self, id: NodeId) -> bool {
        self.children(id).all(|c| self.get(c).is_solved())
    }

    fn any_child_draw(&self, id: NodeId) -> bool {
        self.children(id)
            .any(|c| self.get(c).status == NodeStatus::Draw)
    }

    /// Propagate the result of the leaf at the end of `path` to the root.
    ///
    /// `path` starts at the root of the search and ends at the evaluated leaf.
    /// Proven results climb the path as long as they decide the parent.
    pub fn backpropagate(&mut self, path: &[NodeId]) {
        let Some((&leaf_id, ancestors)) = path.split_last() else {
            return;
        };

        let leaf = self.get(leaf_id);
        if !leaf.is_solved() {
            let mut value = leaf.nn_value;
            for &id in path.iter().rev() {
                let node = self.get_mut(id);
                node.visit_count += 1;
                node.value_sum += value;
                value = -value;
            }
            return;
        }

        let leaf = self.get_mut(leaf_id);
        leaf.visit_count += 1;
        let mut value = -leaf.nn_value;
        let mut status = leaf.status.flipped();

        for &id in ancestors.iter().rev() {
            self.get_mut(id).visit_count += 1;

            match status {
                NodeStatus::Unsolved => {
                    self.get_mut(id).value_sum += value;
                    value = -value;
                }
                NodeStatus::Win => {
                    let node = self.get_mut(id);
                    node.status = NodeStatus::Win;
                    node.nn_value = value;
                    status = NodeStatus::Loss;
                    value = -value;
                }
                NodeStatus::Loss | NodeStatus::Draw => {
                    if status == NodeStatus::Draw {
                        self.get_mut(id).has_drawing_child = true;
                    }

                    if self.all_children_solved(id) {
                        let resolved = if self.any_child_draw(id) {
                            NodeStatus::Draw
                        } else {
                            NodeStatus::Loss
                        };
                        let exact = self.max_solved_child_value(id);

                        let node = self.get_mut(id);
                        node.has_drawing_child |= resolved == NodeStatus::Draw;
                        node.status = resolved;
                        node.nn_value = exact;

                        value = -exact;
                        status = resolved.flipped();
                    } else {
                        self.get_mut(id).value_sum += value;
                        status = NodeStatus::Unsolved;
                        value = -value;
                    }
                }
            }
        }
    }

    pub fn stats(&self) -> TreeStats {
        let root = self.get(self.root);

        let mut max_depth = 0;
        let mut stack = vec![(self.root, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            stack.extend(self.children(id).map(|c| (c, depth + 1)));
        }

        TreeStats {
            total_nodes: self.nodes.len(),
            root_visits: root.visit_count,
            root_value: root.value(),
            max_depth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::FastRng;

    /// Root with `n` children of equal prior.
    fn tree_with_children(n: usize) -> MctsTree {
        let mut tree = MctsTree::with_capacity(16);
        let prior = 1.0 / n as f32;
        tree.expand(NodeId::ROOT, (0..n).map(|mv| (mv, prior)));
        tree
    }

    fn child(tree: &MctsTree, i: u32) -> NodeId {
        tree.get(tree.root()).first_child.offset(i)
    }

    #[test]
    fn test_expand_appends_contiguous_block() {
        let tree = tree_with_children(3);
        let root = tree.get(tree.root());

        assert_eq!(tree.len(), 4);
        assert_eq!(root.first_child, NodeId(1));
        assert_eq!(root.child_count, 3);

        let moves: Vec<_> = tree
            .children(tree.root())
            .map(|c| tree.get(c).move_id)
            .collect();
        assert_eq!(moves, vec![0, 1, 2]);
    }

    #[test]
    fn test_expand_with_no_moves() {
        let mut tree = MctsTree::with_capacity(4);
        tree.expand(NodeId::ROOT, std::iter::empty());
        assert_eq!(tree.get(NodeId::ROOT).child_count, 0);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_reset_keeps_capacity() {
        let mut tree = tree_with_children(5);
        let cap = tree.capacity();
        tree.reroot(child(&tree, 2));

        tree.reset();

        assert_eq!(tree.len(), 1);
        assert_eq!(tree.root(), NodeId::ROOT);
        assert_eq!(tree.capacity(), cap);
        assert_eq!(tree.get(NodeId::ROOT).child_count, 0);
    }

    #[test]
    fn test_select_prefers_higher_prior_when_unvisited() {
        let mut tree = MctsTree::with_capacity(8);
        tree.expand(NodeId::ROOT, [(0, 0.1), (1, 0.7), (2, 0.2)]);

        assert_eq!(tree.select_child(NodeId::ROOT, 1.0), NodeId(2));
    }

    #[test]
    fn test_select_ties_keep_first() {
        let tree = tree_with_children(4);
        assert_eq!(tree.select_child(NodeId::ROOT, 1.0), NodeId(1));
    }

    #[test]
    fn test_select_skips_children_won_for_opponent() {
        let mut tree = MctsTree::with_capacity(8);
        tree.expand(NodeId::ROOT, [(0, 0.9), (1, 0.1)]);
        tree.solve_terminal(NodeId(1), 1.0, NodeStatus::Win);

        assert_eq!(tree.select_child(NodeId::ROOT, 1.0), NodeId(2));
    }

    #[test]
    #[should_panic(expected = "no selectable child")]
    fn test_select_panics_when_everything_loses() {
        let mut tree = tree_with_children(2);
        tree.solve_terminal(NodeId(1), 1.0, NodeStatus::Win);
        tree.solve_terminal(NodeId(2), 1.0, NodeStatus::Win);

        tree.select_child(NodeId::ROOT, 1.0);
    }

    #[test]
    fn test_backprop_unsolved_alternates_sign() {
        let mut tree = tree_with_children(2);
        let leaf = child(&tree, 0);
        tree.get_mut(leaf).nn_value = 0.5;

        tree.backpropagate(&[NodeId::ROOT, leaf]);

        assert_eq!(tree.get(leaf).visit_count, 1);
        assert!((tree.get(leaf).value_sum - 0.5).abs() < 1e-6);
        assert_eq!(tree.get(NodeId::ROOT).visit_count, 1);
        assert!((tree.get(NodeId::ROOT).value_sum + 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_child_loss_makes_parent_win() {
        let mut tree = tree_with_children(3);
        let leaf = child(&tree, 1);
        tree.solve_terminal(leaf, -1.0, NodeStatus::Loss);

        tree.backpropagate(&[NodeId::ROOT, leaf]);

        let root = tree.get(NodeId::ROOT);
        assert_eq!(root.status, NodeStatus::Win);
        assert!((root.nn_value - 1.0).abs() < 1e-6);
        assert_eq!(root.visit_count, 1);
        assert_eq!(tree.get(leaf).visit_count, 1);
    }

    #[test]
    fn test_all_children_winning_for_opponent_makes_parent_loss() {
        let mut tree = tree_with_children(2);
        tree.solve_terminal(child(&tree, 0), 0.9, NodeStatus::Win);
        let last = child(&tree, 1);
        tree.solve_terminal(last, 0.95, NodeStatus::Win);

        tree.backpropagate(&[NodeId::ROOT, last]);

        let root = tree.get(NodeId::ROOT);
        assert_eq!(root.status, NodeStatus::Loss);
        // Best of the losing options
        assert!((root.nn_value + 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_partial_proof_keeps_parent_unsolved() {
        let mut tree = tree_with_children(2);
        let leaf = child(&tree, 0);
        tree.solve_terminal(leaf, 1.0, NodeStatus::Win);

        tree.backpropagate(&[NodeId::ROOT, leaf]);

        let root = tree.get(NodeId::ROOT);
        assert_eq!(root.status, NodeStatus::Unsolved);
        assert!((root.value_sum + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_draw_resolution() {
        let mut tree = tree_with_children(2);
        tree.solve_terminal(child(&tree, 1), 1.0, NodeStatus::Win);
        let drawn = child(&tree, 0);
        tree.solve_terminal(drawn, 0.0, NodeStatus::Draw);

        tree.backpropagate(&[NodeId::ROOT, drawn]);

        let root = tree.get(NodeId::ROOT);
        assert_eq!(root.status, NodeStatus::Draw);
        assert!(root.has_drawing_child);
        assert!(root.nn_value.abs() < 1e-6);
    }

    #[test]
    fn test_draw_found_before_loss_still_resolves_to_draw() {
        let mut tree = tree_with_children(2);
        let drawn = child(&tree, 0);
        let lost = child(&tree, 1);

        // The draw is proven first but cannot decide the parent yet
        tree.solve_terminal(drawn, 0.0, NodeStatus::Draw);
        tree.backpropagate(&[NodeId::ROOT, drawn]);
        assert_eq!(tree.get(NodeId::ROOT).status, NodeStatus::Unsolved);

        tree.solve_terminal(lost, 1.0, NodeStatus::Win);
        tree.backpropagate(&[NodeId::ROOT, lost]);

        assert_eq!(tree.get(NodeId::ROOT).status, NodeStatus::Draw);
    }

    #[test]
    fn test_proof_climbs_multiple_levels() {
        // root -> a -> {b}, b is a loss for its mover so a wins, so root
        // has a child that wins for the opponent.
        let mut tree = MctsTree::with_capacity(8);
        tree.expand(NodeId::ROOT, [(0, 0.5), (1, 0.5)]);
        let a = NodeId(1);
        tree.expand(a, [(0, 1.0)]);
        let b = tree.get(a).first_child;
        tree.solve_terminal(b, -1.0, NodeStatus::Loss);

        tree.backpropagate(&[NodeId::ROOT, a, b]);

        assert_eq!(tree.get(a).status, NodeStatus::Win);
        let root = tree.get(NodeId::ROOT);
        assert_eq!(root.status, NodeStatus::Unsolved);
        assert_eq!(root.visit_count, 1);
        assert!((root.value_sum + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_dirichlet_noise_keeps_distribution() {
        let mut tree = tree_with_children(5);
        let mut rng = FastRng::new(17);

        tree.add_dirichlet_noise(NodeId::ROOT, 0.25, 0.3, &mut rng);

        let priors: Vec<f32> = tree
            .children(NodeId::ROOT)
            .map(|c| tree.get(c).prior)
            .collect();
        let sum: f32 = priors.iter().sum();
        assert!((sum - 1.0).abs() < 1e-4, "priors sum to {sum}");
        assert!(priors.iter().all(|&p| p >= 0.2 * 0.75 - 1e-6));
    }

    #[test]
    fn test_dirichlet_noise_skipped_for_small_epsilon() {
        let mut tree = tree_with_children(4);
        let mut rng = FastRng::new(3);

        tree.add_dirichlet_noise(NodeId::ROOT, 0.0005, 0.3, &mut rng);
        tree.add_dirichlet_noise(NodeId::ROOT, 0.25, 0.0, &mut rng);

        assert!(tree
            .children(NodeId::ROOT)
            .all(|c| (tree.get(c).prior - 0.25).abs() < 1e-6));
    }

    #[test]
    fn test_stats_depth() {
        let mut tree = tree_with_children(2);
        let a = child(&tree, 0);
        tree.expand(a, [(3, 1.0)]);

        let stats = tree.stats();
        assert_eq!(stats.total_nodes, 4);
        assert_eq!(stats.max_depth, 2);
        assert_eq!(stats.root_visits, 0);
    }
}
