//! Dense feed-forward value/policy network.
//!
//! The network is a stack of fully connected layers. The last layer has one
//! unit for the value head followed by one logit per move slot:
//!
//! - value = `tanh(out[0])`
//! - policy = softmax of `out[1..]` restricted to the legal moves
//!
//! # Weight format
//!
//! Weights are a flat little-endian `f32` stream. For every layer in order:
//! `units * inputs` weights in row-major order (one row per unit), followed
//! by `units` biases. Training happens elsewhere, this only needs to agree
//! with the exporter.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::model::{model_factory, Model, ModelFactory};

/// Errors that can occur while building or loading a network.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("weight size mismatch: expected {expected} bytes, got {actual}")]
    WeightSize { expected: usize, actual: usize },

    #[error("invalid network spec: {0}")]
    BadSpec(String),

    #[error("unknown activation '{0}' (expected relu, tanh or linear)")]
    UnknownActivation(String),

    #[error("failed to read weights from {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Relu,
    Tanh,
    Linear,
}

impl Activation {
    #[inline]
    fn apply(self, x: f32) -> f32 {
        match self {
            Activation::Relu => x.max(0.0),
            Activation::Tanh => x.tanh(),
            Activation::Linear => x,
        }
    }
}

impl FromStr for Activation {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "relu" => Ok(Activation::Relu),
            "tanh" => Ok(Activation::Tanh),
            "linear" => Ok(Activation::Linear),
            _ => Err(ModelError::UnknownActivation(s.to_string())),
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Activation::Relu => "relu",
            Activation::Tanh => "tanh",
            Activation::Linear => "linear",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub units: usize,
    pub activation: Activation,
}

impl LayerSpec {
    pub fn new(units: usize, activation: Activation) -> Self {
        Self { units, activation }
    }
}

/// Shape of a [`DenseNetwork`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSpec {
    pub input_size: usize,
    pub layers: Vec<LayerSpec>,
}

impl NetworkSpec {
    pub fn new(input_size: usize, layers: Vec<LayerSpec>) -> Self {
        Self { input_size, layers }
    }

    /// Move slots covered by the output layer.
    pub fn policy_size(&self) -> usize {
        self.layers.last().map_or(0, |l| l.units.saturating_sub(1))
    }

    /// Total number of `f32` parameters.
    pub fn parameter_count(&self) -> usize {
        let mut inputs = self.input_size;
        let mut total = 0;
        for layer in &self.layers {
            total += layer.units * inputs + layer.units;
            inputs = layer.units;
        }
        total
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.input_size == 0 {
            return Err(ModelError::BadSpec("input size must be positive".into()));
        }
        let Some(last) = self.layers.last() else {
            return Err(ModelError::BadSpec("network has no layers".into()));
        };
        if let Some(i) = self.layers.iter().position(|l| l.units == 0) {
            return Err(ModelError::BadSpec(format!("layer {i} has no units")));
        }
        if last.units < 2 {
            return Err(ModelError::BadSpec(format!(
                "output layer needs a value unit and at least one policy unit, got {} units",
                last.units
            )));
        }
        Ok(())
    }
}

#[derive(Debug)]
struct Layer {
    inputs: usize,
    units: usize,
    activation: Activation,
    weights: Vec<f32>,
    biases: Vec<f32>,
}

impl Layer {
    fn apply(&self, x: &[f32], out: &mut [f32]) {
        for (j, (o, row)) in out
            .iter_mut()
            .zip(self.weights.chunks_exact(self.inputs))
            .enumerate()
        {
            let sum: f32 = row.iter().zip(x).map(|(w, v)| w * v).sum();
            *o = self.activation.apply(sum + self.biases[j]);
        }
    }
}

/// Feed-forward network implementing [`Model`].
///
/// Parameters are shared between clones, activation buffers are not, so a
/// clone per thread is cheap and lock free.
#[derive(Debug, Clone)]
pub struct DenseNetwork {
    spec: Arc<NetworkSpec>,
    layers: Arc<Vec<Layer>>,
    input: Vec<f32>,
    activations: Vec<Vec<f32>>,
    value: f32,
    policy: Vec<f32>,
}

impl DenseNetwork {
    fn from_params(spec: NetworkSpec, params: &[f32]) -> Self {
        let mut layers = Vec::with_capacity(spec.layers.len());
        let mut inputs = spec.input_size;
        let mut offset = 0;

        for layer in &spec.layers {
            let w = layer.units * inputs;
            let weights = params[offset..offset + w].to_vec();
            offset += w;
            let biases = params[offset..offset + layer.units].to_vec();
            offset += layer.units;

            layers.push(Layer {
                inputs,
                units: layer.units,
                activation: layer.activation,
                weights,
                biases,
            });
            inputs = layer.units;
        }

        let activations = layers.iter().map(|l| vec![0.0; l.units]).collect();
        let policy_size = spec.policy_size();

        Self {
            input: vec![0.0; spec.input_size],
            spec: Arc::new(spec),
            layers: Arc::new(layers),
            activations,
            value: 0.0,
            policy: vec![0.0; policy_size],
        }
    }

    /// Build a network from a weight blob.
    pub fn from_bytes(spec: NetworkSpec, bytes: &[u8]) -> Result<Self, ModelError> {
        spec.validate()?;

        let expected = spec.parameter_count() * 4;
        if bytes.len() != expected {
            return Err(ModelError::WeightSize {
                expected,
                actual: bytes.len(),
            });
        }

        let params: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        Ok(Self::from_params(spec, &params))
    }

    /// Load a weight file written by the trainer.
    pub fn load(spec: NetworkSpec, path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), bytes = bytes.len(), "Loaded network weights");
        Self::from_bytes(spec, &bytes)
    }

    /// Network with every parameter zero: value 0 and a uniform policy.
    pub fn zeroed(spec: NetworkSpec) -> Result<Self, ModelError> {
        spec.validate()?;
        let params = vec![0.0; spec.parameter_count()];
        Ok(Self::from_params(spec, &params))
    }

    /// Network with uniform Glorot initialization.
    pub fn random<R: Rng + ?Sized>(spec: NetworkSpec, rng: &mut R) -> Result<Self, ModelError> {
        spec.validate()?;

        let mut params = Vec::with_capacity(spec.parameter_count());
        let mut inputs = spec.input_size;
        for layer in &spec.layers {
            let limit = (6.0 / (inputs + layer.units) as f32).sqrt();
            params.extend((0..layer.units * inputs).map(|_| rng.gen_range(-limit..limit)));
            params.extend(std::iter::repeat(0.0).take(layer.units));
            inputs = layer.units;
        }

        Ok(Self::from_params(spec, &params))
    }

    /// Serialize the parameters in the weight file format.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.spec.parameter_count() * 4);
        for layer in self.layers.iter() {
            for x in layer.weights.iter().chain(&layer.biases) {
                out.extend_from_slice(&x.to_le_bytes());
            }
        }
        out
    }

    pub fn spec(&self) -> &NetworkSpec {
        &self.spec
    }

    /// Whether `other` reads the same parameter storage.
    pub fn shares_weights_with(&self, other: &DenseNetwork) -> bool {
        Arc::ptr_eq(&self.layers, &other.layers)
    }

    /// Factory handing out clones that share these parameters.
    pub fn factory(self) -> ModelFactory {
        model_factory(move || Box::new(self.clone()))
    }
}

/// Softmax of `logits` into `out`, restricted to `legal` when given.
fn masked_softmax(logits: &[f32], legal: Option<&[usize]>, out: &mut [f32]) {
    out.fill(0.0);

    match legal {
        Some(legal) => {
            let max = legal
                .iter()
                .map(|&mv| logits[mv])
                .fold(f32::NEG_INFINITY, f32::max);
            if max == f32::NEG_INFINITY {
                return;
            }

            let mut sum = 0.0;
            for &mv in legal {
                let e = (logits[mv] - max).exp();
                out[mv] = e;
                sum += e;
            }
            if sum > 0.0 {
                for &mv in legal {
                    out[mv] /= sum;
                }
            }
        }
        None => {
            let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            let mut sum = 0.0;
            for (o, &l) in out.iter_mut().zip(logits) {
                *o = (l - max).exp();
                sum += *o;
            }
            if sum > 0.0 {
                out.iter_mut().for_each(|o| *o /= sum);
            }
        }
    }
}

impl Model for DenseNetwork {
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
        for (i, layer) in self.layers.iter().enumerate() {
            let (done, rest) = self.activations.split_at_mut(i);
            let x: &[f32] = if i == 0 { &self.input } else { &done[i - 1] };
            layer.apply(x, &mut rest[0]);
        }

        let Some(out) = self.activations.last() else {
            return;
        };
        self.value = out[0].tanh();
        masked_softmax(&out[1..], legal_moves, &mut self.policy);
    }

    fn value(&self) -> f32 {
        self.value
    }

    fn policy(&self, mv: usize) -> f32 {
        self.policy[mv]
    }
}
