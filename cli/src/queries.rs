// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::collections::HashMap;

use anyhow::{Context, Result};
use gpustat::{parse_gpu_inventory, parse_node_states, Inventory};

use crate::exec;

pub const NODE_STATES_CMD: &str = "sinfo --noheader";
pub const GPU_INVENTORY_CMD: &str = "sinfo -o '%50N|%30G' --noheader";
pub const GPU_USAGE_CMD: &str = "squeue -O tres-per-node,nodelist,username --noheader";

/// Query SLURM for the number and types of GPUs under management.
pub async fn fetch_inventory(default_gpu_count: u32) -> Result<Inventory> {
    let rows = exec::run_lines(GPU_INVENTORY_CMD)
        .await
        .context("querying the gpu inventory")?;
    parse_gpu_inventory(&rows, default_gpu_count).context("parsing the gpu inventory")
}

/// Query SLURM for the state of each managed node.
pub async fn fetch_node_states() -> Result<HashMap<String, String>> {
    let rows = exec::run_lines(NODE_STATES_CMD)
        .await
        .context("querying node states")?;
    parse_node_states(&rows).context("parsing node states")
}

/// Query SLURM for the per-job GPU allocation rows. The rows are parsed
/// separately so one `squeue` invocation can feed several inventories.
pub async fn fetch_usage_rows() -> Result<Vec<String>> {
    exec::run_lines(GPU_USAGE_CMD)
        .await
        .context("querying gpu allocations")
}
