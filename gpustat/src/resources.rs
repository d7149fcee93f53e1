//! Per-node GPU inventory and node states, parsed from `sinfo` output.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::nodelist::{parse_node_names, NodeListError};

/// GPU count assumed for nodes whose SLURM metadata omits one.
pub const DEFAULT_GPU_COUNT: u32 = 4;

/// SLURM states under which a node does not accept new jobs.
pub const INACCESSIBLE_STATES: &[&str] = &["drain*", "down*", "drng", "drain", "down"];

/// Gres tokens and allocation tokens are recognised by this prefix.
pub(crate) const GPU_MARKER: &str = "gpu";

/// One GPU type offered by a node, as listed in its gres column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GresSpec {
    pub gpu_type: String,
    pub count: u32,
}

/// Node name to the ordered GPU specs it offers. A heterogeneous node
/// accumulates one spec per gres token.
pub type Inventory = BTreeMap<String, Vec<GresSpec>>;

/// Build the cluster GPU inventory from `sinfo -o '%50N|%30G' --noheader`
/// rows. Gres tokens that do not look like `gpu:<type>:<count>` are
/// skipped; an empty count field falls back to `default_gpu_count`.
pub fn parse_gpu_inventory(
    rows: &[String],
    default_gpu_count: u32,
) -> Result<Inventory, NodeListError> {
    let mut inventory = Inventory::new();
    for row in rows {
        let Some((node_list, gres_list)) = row.split_once('|') else {
            tracing::debug!(%row, "skipping inventory row without a gres column");
            continue;
        };
        let names = parse_node_names(node_list)?;
        for token in gres_list.split(',') {
            let token = token.trim();
            if !token.starts_with(GPU_MARKER) {
                continue;
            }
            let fields: Vec<&str> = token.split(':').collect();
            if fields.len() < 3 {
                tracing::debug!(%token, "skipping gres token with too few fields");
                continue;
            }
            let count = if fields[2].is_empty() {
                default_gpu_count
            } else {
                match fields[2].parse() {
                    Ok(count) => count,
                    Err(_) => {
                        tracing::debug!(%token, "skipping gres token with unparsable count");
                        continue;
                    }
                }
            };
            for name in &names {
                inventory.entry(name.clone()).or_default().push(GresSpec {
                    gpu_type: fields[1].to_string(),
                    count,
                });
            }
        }
    }
    Ok(inventory)
}

/// Map node names to their SLURM state from `sinfo --noheader` rows
/// (state in the fifth column, node list in the sixth).
pub fn parse_node_states(rows: &[String]) -> Result<HashMap<String, String>, NodeListError> {
    let mut states = HashMap::new();
    for row in rows {
        let tokens: Vec<&str> = row.split_whitespace().collect();
        if tokens.len() < 6 {
            tracing::debug!(%row, "skipping node state row with too few columns");
            continue;
        }
        let (state, node_list) = (tokens[4], tokens[5]);
        for name in parse_node_names(node_list)? {
            states.insert(name, state.to_string());
        }
    }
    Ok(states)
}

/// Restrict an inventory to nodes that accept jobs. A node with no
/// reported state is treated as down.
pub fn accessible_nodes(inventory: &Inventory, states: &HashMap<String, String>) -> Inventory {
    inventory
        .iter()
        .filter(|(node, _)| {
            let state = states.get(*node).map(String::as_str).unwrap_or("down");
            !INACCESSIBLE_STATES.contains(&state)
        })
        .map(|(node, specs)| (node.clone(), specs.clone()))
        .collect()
}

/// Total GPU count per type across the whole inventory.
pub fn resource_by_type(inventory: &Inventory) -> BTreeMap<String, u32> {
    let mut by_type = BTreeMap::new();
    for specs in inventory.values() {
        for spec in specs {
            *by_type.entry(spec.gpu_type.clone()).or_insert(0) += spec.count;
        }
    }
    by_type
}
