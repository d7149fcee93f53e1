//! Conservative estimate of free GPUs under shared-GPU semantics.

use std::collections::BTreeMap;

use crate::resources::Inventory;
use crate::usage::Usage;

/// Subtract the allocated GPUs from a working copy of the inventory,
/// flooring at zero. Allocation beyond a node's nominal count is taken to
/// mean the GPUs are shared, never that the node is over-subscribed.
///
/// Allocations are summed per (node, type) across every user before the
/// single flooring subtraction; clamping after each individual job would
/// miscount once the running total crosses the inventory.
pub fn estimate_available(inventory: &Inventory, usage: &Usage) -> Inventory {
    let mut allocated: BTreeMap<(&str, &str), u32> = BTreeMap::new();
    for by_type in usage.values() {
        for (gpu_type, nodes) in by_type {
            for (node, count) in nodes {
                *allocated
                    .entry((node.as_str(), gpu_type.as_str()))
                    .or_insert(0) += count;
            }
        }
    }

    let mut remaining = inventory.clone();
    for ((node, gpu_type), total) in allocated {
        let Some(specs) = remaining.get_mut(node) else {
            continue;
        };
        if let Some(spec) = specs.iter_mut().find(|spec| spec.gpu_type == gpu_type) {
            spec.count = spec.count.saturating_sub(total);
        }
    }
    remaining
}
