//! Core parsing and aggregation for GPU statistics on a SLURM cluster.
//!
//! Everything in this crate is a pure function over already-fetched text
//! rows: the binary crate runs the `sinfo`/`squeue` queries and owns all
//! process, file and terminal concerns.

pub mod availability;
pub mod history;
pub mod nodelist;
pub mod resources;
pub mod snapshot;
pub mod usage;

pub use availability::estimate_available;
pub use nodelist::{parse_node_names, NodeListError};
pub use resources::{
    accessible_nodes, parse_gpu_inventory, parse_node_states, resource_by_type, GresSpec,
    Inventory, DEFAULT_GPU_COUNT, INACCESSIBLE_STATES,
};
pub use snapshot::{Snapshot, SnapshotError, TIMESTAMP_FORMAT};
pub use usage::{parse_gpu_usage, totals_by_user, Usage};
