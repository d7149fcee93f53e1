// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::env;
use std::io;

use tracing_subscriber::EnvFilter;

/// Initialize tracing on stderr. `GPUSTAT_LOG` overrides the level
/// (standard env-filter syntax); otherwise warnings only, or debug with
/// `--verbose`.
pub fn init(verbose: bool) {
    let filter = match env::var("GPUSTAT_LOG") {
        Ok(value) => EnvFilter::new(value),
        Err(_) => {
            if verbose {
                EnvFilter::new("debug")
            } else {
                EnvFilter::new("warn")
            }
        }
    };
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}
