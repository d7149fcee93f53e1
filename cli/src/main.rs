// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::fs;

mod args;
mod config;
mod daemon;
mod exec;
mod logging;
mod queries;
mod report;

use args::{Cli, Cmd, DaemonCmd};
use config::Config;
use gpustat::{
    accessible_nodes, estimate_available, parse_gpu_usage, resource_by_type, totals_by_user,
    DEFAULT_GPU_COUNT,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let overrides = config::Overrides {
        log_path: cli.log_path,
        pid_path: cli.pid_path,
        interval_secs: cli.interval_secs,
    };
    let config = config::load(cli.config, overrides)?;

    match cli.cmd.unwrap_or(Cmd::Current) {
        Cmd::Current => current().await,
        Cmd::History => history(&config),
        Cmd::Daemon(daemon_args) => match daemon_args.cmd {
            DaemonCmd::Start => daemon::start(&config),
            DaemonCmd::Stop => daemon::stop(&config),
            DaemonCmd::Run => daemon::run(&config).await,
        },
    }
}

/// Print the full current-usage report: cluster capacity, capacity of the
/// nodes accepting jobs, per-user usage and the conservative estimate of
/// what is still free.
async fn current() -> Result<()> {
    let inventory = queries::fetch_inventory(DEFAULT_GPU_COUNT).await?;
    let states = queries::fetch_node_states().await?;
    let usage_rows = queries::fetch_usage_rows().await?;

    report::print_divider()?;
    report::print_banner()?;
    report::print_divider()?;
    print!("{}", report::render_type_summary(&resource_by_type(&inventory), "up"));
    report::print_divider()?;

    let accessible = accessible_nodes(&inventory, &states);
    print!(
        "{}",
        report::render_type_summary(&resource_by_type(&accessible), "accessible")
    );
    report::print_divider()?;

    let usage = parse_gpu_usage(&usage_rows, &inventory).context("parsing gpu allocations")?;
    print!("{}", report::render_usage_table(&totals_by_user(&usage)));
    report::print_divider()?;

    let accessible_usage =
        parse_gpu_usage(&usage_rows, &accessible).context("parsing gpu allocations")?;
    let available = estimate_available(&accessible, &accessible_usage);
    print!("{}", report::render_available(&resource_by_type(&available)));
    report::print_divider()?;
    Ok(())
}

fn history(config: &Config) -> Result<()> {
    if !config.log_path.exists() {
        bail!(
            "no historical log found at {} (is the sampling daemon running?)",
            config.log_path.display()
        );
    }
    let contents = fs::read_to_string(&config.log_path)
        .with_context(|| format!("failed to read {}", config.log_path.display()))?;
    let snapshots =
        gpustat::snapshot::parse_snapshot_log(&contents).context("parsing the historical log")?;
    let Some(summary) = gpustat::history::summarize(&snapshots) else {
        bail!("historical log at {} is empty", config.log_path.display());
    };
    print!("{}", report::render_history(&summary));
    Ok(())
}
