//! Training sample produced from a searched position.

/// One position with its search-derived targets.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Network input encoding of the position.
    pub input: Vec<f32>,

    /// 0/1 mask over move slots.
    pub legal_moves: Vec<i32>,

    /// Target move distribution.
    pub policy: Vec<f32>,

    /// Target value for the side to move.
    pub value: f32,
}

impl Sample {
    pub fn new(input_size: usize, policy_size: usize) -> Self {
        Self {
            input: vec![0.0; input_size],
            legal_moves: vec![0; policy_size],
            policy: vec![0.0; policy_size],
            value: 0.0,
        }
    }

    pub fn input_size(&self) -> usize {
        self.input.len()
    }

    pub fn policy_size(&self) -> usize {
        self.policy.len()
    }
}
