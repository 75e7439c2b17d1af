//! MCTS tree node representation.
//!
//! Each node represents a position reached by playing `move_id` from its
//! parent. Statistics and proof status are stored from the perspective of
//! the player to move at that node.

use std::fmt;

use engine_core::Outcome;

/// Index into the node pool. Using a newtype for type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Id of the `offset`-th node after this one.
    #[inline]
    pub fn offset(self, offset: u32) -> NodeId {
        NodeId(self.0 + offset)
    }
}

/// Proof state of a node for the player to move there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NodeStatus {
    #[default]
    Unsolved,
    Win,
    Loss,
    Draw,
}

impl NodeStatus {
    #[inline]
    pub fn is_solved(self) -> bool {
        self != NodeStatus::Unsolved
    }

    /// The same status seen from the parent's side.
    #[inline]
    pub fn flipped(self) -> NodeStatus {
        match self {
            NodeStatus::Win => NodeStatus::Loss,
            NodeStatus::Loss => NodeStatus::Win,
            other => other,
        }
    }
}

impl From<Outcome> for NodeStatus {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Win => NodeStatus::Win,
            Outcome::Loss => NodeStatus::Loss,
            Outcome::Draw => NodeStatus::Draw,
        }
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeStatus::Unsolved => "unsolved",
            NodeStatus::Win => "win",
            NodeStatus::Loss => "loss",
            NodeStatus::Draw => "draw",
        };
        f.write_str(s)
    }
}

/// A node in the MCTS tree.
///
/// Children occupy the contiguous range
/// `first_child .. first_child + child_count` of the pool.
#[derive(Debug, Clone, Default)]
pub struct MctsNode {
    /// Number of times this node has been visited
    pub visit_count: u32,

    /// Sum of values backpropagated through this node
    pub value_sum: f32,

    /// Network value at expansion, or the exact value once solved
    pub nn_value: f32,

    /// Prior probability from the policy network
    pub prior: f32,

    /// Move that led to this node from its parent
    pub move_id: usize,

    pub first_child: NodeId,

    pub child_count: u32,

    pub status: NodeStatus,

    /// Set once a child was proven to be a draw
    pub has_drawing_child: bool,
}

impl MctsNode {
    /// Create an unexpanded child for `move_id`.
    pub fn new_child(move_id: usize, prior: f32) -> Self {
        Self {
            move_id,
            prior,
            ..Self::default()
        }
    }

    #[inline]
    pub fn is_solved(&self) -> bool {
        self.status.is_solved()
    }

    #[inline]
    pub fn is_expanded(&self) -> bool {
        self.child_count > 0
    }

    /// Ids of this node's children.
    #[inline]
    pub fn children(&self) -> impl Iterator<Item = NodeId> {
        let first = self.first_child.0;
        (first..first + self.child_count).map(NodeId)
    }

    /// Value estimate for the player to move at this node.
    ///
    /// Solved nodes report their exact value. An unvisited node reports 1.0,
    /// so from the parent's side it looks like a loss until explored.
    #[inline]
    pub fn value(&self) -> f32 {
        if self.is_solved() {
            return self.nn_value;
        }
        match self.visit_count {
            0 => 1.0,
            1 => self.value_sum,
            n => self.value_sum / n as f32,
        }
    }
}
