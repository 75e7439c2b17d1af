//! Model files and the best-model bookkeeping under `data_dir`.
//!
//! ```text
//! data_dir/
//!   models/model_<generation>   weights written by the trainer
//!   models_stats.json           {"best1": 4, "best2": 2}
//!   model_best                  copy of the current best weights
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use mcts::{DenseNetwork, ModelFactory, NetworkSpec};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// The two strongest generations so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelsStats {
    pub best1: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best2: Option<i32>,
}

impl ModelsStats {
    /// Make `generation` the best model, demoting the previous one.
    pub fn promote(&mut self, generation: i32) {
        self.best2 = Some(self.best1);
        self.best1 = generation;
    }

    /// Distinct best generations, strongest first.
    pub fn bests(&self) -> Vec<i32> {
        let mut out = vec![self.best1];
        if let Some(best2) = self.best2.filter(|&b| b != self.best1) {
            out.push(best2);
        }
        out
    }
}

/// Write `bytes` next to `path` and move it into place.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, bytes).with_context(|| format!("failed to write {}", tmp.display()))?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e).with_context(|| format!("failed to move {} into place", path.display()));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct ModelStore {
    data_dir: PathBuf,
    spec: NetworkSpec,
}

impl ModelStore {
    pub fn new(data_dir: impl Into<PathBuf>, spec: NetworkSpec) -> Self {
        Self {
            data_dir: data_dir.into(),
            spec,
        }
    }

    pub fn spec(&self) -> &NetworkSpec {
        &self.spec
    }

    pub fn model_path(&self, generation: i32) -> PathBuf {
        self.data_dir
            .join("models")
            .join(format!("model_{generation}"))
    }

    pub fn stats_path(&self) -> PathBuf {
        self.data_dir.join("models_stats.json")
    }

    pub fn best_path(&self) -> PathBuf {
        self.data_dir.join("model_best")
    }

    /// Current best generations; generation 0 until a model is accepted.
    pub fn load_stats(&self) -> Result<ModelsStats> {
        let path = self.stats_path();
        if !path.exists() {
            debug!(path = %path.display(), "No model stats yet, generation 0 is best");
            return Ok(ModelsStats::default());
        }
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn save_stats(&self, stats: &ModelsStats) -> Result<()> {
        let json = serde_json::to_string_pretty(stats).context("failed to serialize model stats")?;
        write_atomic(&self.stats_path(), json.as_bytes())?;
        debug!(best1 = stats.best1, best2 = ?stats.best2, "Saved model stats");
        Ok(())
    }

    pub fn write_best(&self, weights: &[u8]) -> Result<()> {
        write_atomic(&self.best_path(), weights)
    }

    pub fn load(&self, generation: i32) -> Result<DenseNetwork> {
        DenseNetwork::load(self.spec.clone(), self.model_path(generation))
            .with_context(|| format!("failed to load model of generation {generation}"))
    }

    pub fn factory(&self, generation: i32) -> Result<ModelFactory> {
        Ok(self.load(generation)?.factory())
    }

    pub fn factory_from_bytes(&self, weights: &[u8]) -> Result<ModelFactory> {
        let net = DenseNetwork::from_bytes(self.spec.clone(), weights)
            .context("candidate weights do not match the configured layers")?;
        Ok(net.factory())
    }

    /// Create `model_0` with random weights if it does not exist yet.
    ///
    /// Returns whether a model was written.
    pub fn ensure_initial_model<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<bool> {
        let path = self.model_path(0);
        if path.exists() {
            return Ok(false);
        }
        let dir = self.data_dir.join("models");
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;

        let net = DenseNetwork::random(self.spec.clone(), rng)
            .context("failed to initialise generation 0")?;
        write_atomic(&path, &net.to_bytes())?;
        info!(
            path = %path.display(),
            parameters = self.spec.parameter_count(),
            "Wrote random initial model"
        );
        Ok(true)
    }
}
