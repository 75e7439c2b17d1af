//! Duplicate-position diagnostic over a batch of self-play samples.

use std::collections::HashMap;

use mcts::Sample;
use tracing::info;

/// How much duplicated positions disagreed before averaging.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DuplicateReport {
    pub samples: usize,
    pub unique: usize,
    /// Mean squared distance of each value from its group average.
    pub value_mse: f32,
    /// Summed over moves, averaged per sample.
    pub policy_mse: f32,
}

struct Group {
    count: u32,
    value_sum: f32,
    policy_sum: Vec<f32>,
}

fn input_key(sample: &Sample) -> Vec<u32> {
    sample.input.iter().map(|x| x.to_bits()).collect()
}

/// Replace every value by the average over samples with the same input.
///
/// Policies are left as they are; their spread only feeds the report.
pub fn average_duplicate_values(samples: &mut [Sample]) -> DuplicateReport {
    let mut groups: HashMap<Vec<u32>, Group> = HashMap::new();
    for sample in samples.iter() {
        let group = groups.entry(input_key(sample)).or_insert_with(|| Group {
            count: 0,
            value_sum: 0.0,
            policy_sum: vec![0.0; sample.policy.len()],
        });
        group.count += 1;
        group.value_sum += sample.value;
        for (sum, p) in group.policy_sum.iter_mut().zip(&sample.policy) {
            *sum += p;
        }
    }

    let mut report = DuplicateReport {
        samples: samples.len(),
        unique: groups.len(),
        ..DuplicateReport::default()
    };
    if samples.is_empty() {
        return report;
    }

    for sample in samples.iter_mut() {
        let group = &groups[&input_key(sample)];
        let n = group.count as f32;

        let avg = group.value_sum / n;
        report.value_mse += (avg - sample.value) * (avg - sample.value);
        sample.value = avg;

        for (sum, p) in group.policy_sum.iter().zip(&sample.policy) {
            let avg = sum / n;
            report.policy_mse += (avg - p) * (avg - p);
        }
    }

    let n = samples.len() as f32;
    report.value_mse /= n;
    report.policy_mse /= n;

    info!(
        samples = report.samples,
        unique = report.unique,
        value_mse = report.value_mse,
        policy_mse = report.policy_mse,
        "Averaged duplicate samples"
    );
    report
}
