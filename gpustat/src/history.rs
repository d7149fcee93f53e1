//! Statistics over a deserialized run of usage snapshots.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDateTime;

use crate::snapshot::Snapshot;

/// Mean and peak of a user's per-sample allocation of one GPU type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeStats {
    pub average: u32,
    pub peak: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistorySummary {
    pub samples: usize,
    pub first: NaiveDateTime,
    pub last: NaiveDateTime,
    /// Per user, per GPU type; types the user never held are omitted.
    pub by_user: BTreeMap<String, BTreeMap<String, TypeStats>>,
    /// Per user, the sum of the per-type averages.
    pub total_average: BTreeMap<String, u32>,
}

/// Summarize a chronological run of snapshots. Returns `None` for an
/// empty run. A user's statistics cover the samples in which that user
/// appears; the GPU-type set is the union across all samples.
pub fn summarize(samples: &[Snapshot]) -> Option<HistorySummary> {
    let first = samples.first()?;
    let last = samples.last()?;

    let mut gpu_types: BTreeSet<&str> = BTreeSet::new();
    for snapshot in samples {
        for by_type in snapshot.usage.values() {
            gpu_types.extend(by_type.keys().map(String::as_str));
        }
    }

    // Per-sample summed counts, one series per (user, type).
    let mut series: BTreeMap<&str, BTreeMap<&str, Vec<u32>>> = BTreeMap::new();
    for snapshot in samples {
        for (user, by_type) in &snapshot.usage {
            let user_series = series.entry(user).or_default();
            for gpu_type in &gpu_types {
                let count: u32 = by_type
                    .get(*gpu_type)
                    .map(|nodes| nodes.values().sum())
                    .unwrap_or(0);
                user_series.entry(gpu_type).or_default().push(count);
            }
        }
    }

    let mut by_user = BTreeMap::new();
    let mut total_average = BTreeMap::new();
    for (user, types) in series {
        let mut stats = BTreeMap::new();
        let mut total = 0;
        for (gpu_type, counts) in types {
            let sum: u32 = counts.iter().sum();
            if sum == 0 {
                continue;
            }
            let average = sum / counts.len() as u32;
            let peak = counts.iter().copied().max().unwrap_or(0);
            total += average;
            stats.insert(gpu_type.to_string(), TypeStats { average, peak });
        }
        by_user.insert(user.to_string(), stats);
        total_average.insert(user.to_string(), total);
    }

    Some(HistorySummary {
        samples: samples.len(),
        first: first.timestamp,
        last: last.timestamp,
        by_user,
        total_average,
    })
}
