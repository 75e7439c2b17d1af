//! Model trait for position evaluation.
//!
//! A model takes the encoded position written into its input buffer and
//! produces a value estimate for the side to move plus a policy over moves.
//! In training this is [`DenseNetwork`](crate::network::DenseNetwork). For
//! tests and benches we provide a uniform model.
//!
//! Models carry their own activation buffers, so each search thread owns one
//! instance. Instances are created from a shared [`ModelFactory`].

use std::sync::Arc;

/// A value/policy evaluator with internal buffers.
pub trait Model: Send {
    /// Number of floats the input buffer holds.
    fn input_size(&self) -> usize;

    /// Number of move slots in the policy.
    fn policy_size(&self) -> usize;

    /// Input buffer to encode the position into before [`Model::forward`].
    fn input_mut(&mut self) -> &mut [f32];

    /// Evaluate the current input.
    ///
    /// With `Some(legal)` only the listed moves receive probability. An
    /// empty list yields an all-zero policy. `None` normalizes over every
    /// move slot.
    fn forward(&mut self, legal_moves: Option<&[usize]>);

    /// Value of the last forward pass, in `[-1, 1]`.
    fn value(&self) -> f32;

    /// Probability of `mv` from the last forward pass.
    fn policy(&self, mv: usize) -> f32;
}

/// Builds a fresh model for each thread that needs one.
pub type ModelFactory = Arc<dyn Fn() -> Box<dyn Model> + Send + Sync>;

/// Wrap a closure as a [`ModelFactory`].
pub fn model_factory<F>(f: F) -> ModelFactory
where
    F: Fn() -> Box<dyn Model> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Model with a neutral value and a uniform policy over legal moves.
#[derive(Debug, Clone)]
pub struct UniformModel {
    input: Vec<f32>,
    policy: Vec<f32>,
}

impl UniformModel {
    pub fn new(input_size: usize, policy_size: usize) -> Self {
        Self {
            input: vec![0.0; input_size],
            policy: vec![0.0; policy_size],
        }
    }

    /// Factory producing uniform models of the given shape.
    pub fn factory(input_size: usize, policy_size: usize) -> ModelFactory {
        model_factory(move || Box::new(UniformModel::new(input_size, policy_size)))
    }
}

impl Model for UniformModel {
    fn input_size(&self) -> usize {
        self.input.len()
    }

    fn policy_size(&self) -> usize {
        self.policy.len()
    }

    fn input_mut(&mut self) -> &mut [f32] {
        &mut self.input
    }

    fn forward(&mut self, legal_moves: Option<&[usize]>) {
        match legal_moves {
            Some(legal) => {
                self.policy.fill(0.0);
                if legal.is_empty() {
                    return;
                }
                let prob = 1.0 / legal.len() as f32;
                for &mv in legal {
                    self.policy[mv] = prob;
                }
            }
            None => {
                let prob = 1.0 / self.policy.len().max(1) as f32;
                self.policy.fill(prob);
            }
        }
    }

    fn value(&self) -> f32 {
        0.0
    }

    fn policy(&self, mv: usize) -> f32 {
        self.policy[mv]
    }
}
