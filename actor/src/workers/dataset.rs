//! Scoring a model without search against a labelled position file.
//!
//! File layout (little-endian): `i32 count`, then `count` records of
//! `input_size` f32 inputs, `policy_size` f32 policy targets and one f32
//! value target.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};

use mcts::Model;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("dataset truncated in record {record} of {count}")]
    Truncated { record: usize, count: usize },

    #[error("dataset declares a negative record count ({0})")]
    NegativeCount(i32),

    #[error(transparent)]
    Read(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatasetRecord {
    pub input: Vec<f32>,
    pub policy: Vec<f32>,
    pub value: f32,
}

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub records: Vec<DatasetRecord>,
}

fn read_f32s<R: Read>(reader: &mut R, out: &mut [f32]) -> std::io::Result<()> {
    let mut buf = [0u8; 4];
    for x in out.iter_mut() {
        reader.read_exact(&mut buf)?;
        *x = f32::from_le_bytes(buf);
    }
    Ok(())
}

fn read_record<R: Read>(
    reader: &mut R,
    input_size: usize,
    policy_size: usize,
) -> std::io::Result<DatasetRecord> {
    let mut input = vec![0.0; input_size];
    let mut policy = vec![0.0; policy_size];
    let mut value = [0.0];
    read_f32s(reader, &mut input)?;
    read_f32s(reader, &mut policy)?;
    read_f32s(reader, &mut value)?;
    Ok(DatasetRecord {
        input,
        policy,
        value: value[0],
    })
}

impl Dataset {
    pub fn load(
        path: impl AsRef<Path>,
        input_size: usize,
        policy_size: usize,
    ) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let dataset = Self::read_from(&mut BufReader::new(file), input_size, policy_size)?;
        info!(path = %path.display(), records = dataset.len(), "Loaded validation dataset");
        Ok(dataset)
    }

    pub fn read_from<R: Read>(
        reader: &mut R,
        input_size: usize,
        policy_size: usize,
    ) -> Result<Self, DatasetError> {
        let mut header = [0u8; 4];
        reader.read_exact(&mut header).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => DatasetError::Truncated {
                record: 0,
                count: 0,
            },
            _ => DatasetError::Read(e),
        })?;
        let count = i32::from_le_bytes(header);
        if count < 0 {
            return Err(DatasetError::NegativeCount(count));
        }
        let count = count as usize;

        let mut records = Vec::with_capacity(count.min(1 << 16));
        for record in 0..count {
            let r = read_record(reader, input_size, policy_size).map_err(|e| match e.kind() {
                ErrorKind::UnexpectedEof => DatasetError::Truncated { record, count },
                _ => DatasetError::Read(e),
            })?;
            records.push(r);
        }

        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// How well the raw network matches the labels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DatasetReport {
    pub value_mse: f32,
    /// Summed squared error over the policy, averaged per record.
    pub policy_mse: f32,
    /// Fraction of decisive records where the value has the right sign.
    pub good_sign: f32,
    /// Fraction of records where the top policy move has positive target.
    pub optimal_move: f32,
}

impl DatasetReport {
    /// Tag/value pairs in emission order.
    pub fn scalars(&self) -> [(&'static str, f32); 4] {
        [
            ("value_mse", self.value_mse),
            ("policy_mse", self.policy_mse),
            ("good_sign", self.good_sign),
            ("optimal_move", self.optimal_move),
        ]
    }
}

/// Evaluate `model` on every record with an unmasked policy.
pub fn validate_dataset(model: &mut dyn Model, dataset: &Dataset) -> DatasetReport {
    let mut report = DatasetReport::default();
    if dataset.is_empty() {
        return report;
    }

    let policy_size = model.policy_size();
    let mut decisive = 0usize;
    let mut good_sign = 0usize;
    let mut optimal = 0usize;

    for record in &dataset.records {
        model.input_mut().copy_from_slice(&record.input);
        model.forward(None);

        let value = model.value();
        report.value_mse += (record.value - value) * (record.value - value);

        if record.value != 0.0 {
            decisive += 1;
            if record.value * value > 0.0 {
                good_sign += 1;
            }
        }

        let mut best_move = 0;
        let mut best_p = f32::NEG_INFINITY;
        for mv in 0..policy_size {
            let p = model.policy(mv);
            let target = record.policy.get(mv).copied().unwrap_or(0.0);
            report.policy_mse += (target - p) * (target - p);
            if p > best_p {
                best_p = p;
                best_move = mv;
            }
        }
        if record.policy.get(best_move).is_some_and(|&t| t > 0.0) {
            optimal += 1;
        }
    }

    let n = dataset.len() as f32;
    report.value_mse /= n;
    report.policy_mse /= n;
    report.optimal_move = optimal as f32 / n;
    if decisive > 0 {
        report.good_sign = good_sign as f32 / decisive as f32;
    }
    report
}
