//! Per-user GPU allocation, parsed from `squeue` job rows.

use std::collections::BTreeMap;

use rand::Rng;

use crate::nodelist::{parse_node_names, NodeListError};
use crate::resources::{Inventory, GPU_MARKER};

/// User name to GPU type to node name to allocated GPU count.
pub type Usage = BTreeMap<String, BTreeMap<String, BTreeMap<String, u32>>>;

/// Aggregate `squeue -O tres-per-node,nodelist,username --noheader` rows
/// into per-user usage. Rows for pending or non-GPU jobs are skipped.
///
/// An allocation token of the form `gpu:<count>` names no GPU type; the
/// type is then inferred per node from the inventory. A node offering
/// several distinct types cannot be disambiguated, so one of its types is
/// picked at random and a warning is emitted.
pub fn parse_gpu_usage(rows: &[String], inventory: &Inventory) -> Result<Usage, NodeListError> {
    let mut usage = Usage::new();
    for row in rows {
        let tokens: Vec<&str> = row.split_whitespace().collect();
        if tokens.len() < 3 || !tokens[0].starts_with(GPU_MARKER) {
            continue;
        }
        let (alloc, node_list, user) = (tokens[0], tokens[1], tokens[2]);
        let fields: Vec<&str> = alloc.split(':').collect();
        let (explicit_type, count_field) = match fields.as_slice() {
            [_, count] => (None, *count),
            [_, gpu_type, count] => (Some(*gpu_type), *count),
            _ => {
                tracing::debug!(%row, "skipping allocation row with unexpected gres shape");
                continue;
            }
        };
        let count: u32 = match count_field.parse() {
            Ok(count) => count,
            Err(_) => {
                tracing::debug!(%row, "skipping allocation row with unparsable gpu count");
                continue;
            }
        };
        for node in parse_node_names(node_list)? {
            let gpu_type = match explicit_type {
                Some(gpu_type) => gpu_type.to_string(),
                None => match infer_gpu_type(&node, user, inventory) {
                    Some(gpu_type) => gpu_type,
                    None => continue,
                },
            };
            *usage
                .entry(user.to_string())
                .or_default()
                .entry(gpu_type)
                .or_default()
                .entry(node)
                .or_insert(0) += count;
        }
    }
    Ok(usage)
}

/// Resolve the GPU type of an allocation that did not name one, from the
/// node's distinct inventory types. Inference is per node; an earlier
/// node's guess never carries over.
fn infer_gpu_type(node: &str, user: &str, inventory: &Inventory) -> Option<String> {
    let mut distinct: Vec<&str> = Vec::new();
    for spec in inventory.get(node).map(Vec::as_slice).unwrap_or_default() {
        if !distinct.contains(&spec.gpu_type.as_str()) {
            distinct.push(&spec.gpu_type);
        }
    }
    match distinct.as_slice() {
        [] => {
            tracing::warn!(user, node, "cannot determine gpu type: node has no gpu inventory");
            None
        }
        [only] => Some(only.to_string()),
        several => {
            let guess = several[rand::rng().random_range(0..several.len())];
            tracing::warn!(user, node, guess, "cannot determine gpu type, guessing");
            Some(guess.to_string())
        }
    }
}

/// Collapse usage to user -> GPU type -> total count across nodes.
pub fn totals_by_user(usage: &Usage) -> BTreeMap<String, BTreeMap<String, u32>> {
    usage
        .iter()
        .map(|(user, by_type)| {
            let totals = by_type
                .iter()
                .map(|(gpu_type, nodes)| (gpu_type.clone(), nodes.values().sum()))
                .collect();
            (user.clone(), totals)
        })
        .collect()
}
