// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gpustat", version, about = "Summarize GPU usage on a SLURM cluster", long_about = None)]
pub struct Cli {
    /// Config file (defaults to gpustat.toml in the user config directory).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Where the historical usage log is stored.
    #[arg(long, global = true)]
    pub log_path: Option<PathBuf>,

    /// Where the sampling daemon pid file is stored.
    #[arg(long, global = true)]
    pub pid_path: Option<PathBuf>,

    /// Seconds between usage snapshots taken by the daemon.
    #[arg(long, global = true)]
    pub interval_secs: Option<u64>,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub cmd: Option<Cmd>,
}

#[derive(Subcommand)]
pub enum Cmd {
    /// Summarize current cluster-wide GPU usage (the default action).
    Current,
    /// Report statistics from the historical usage log.
    History,
    /// Control the background sampling daemon.
    Daemon(DaemonArgs),
}

#[derive(Args)]
pub struct DaemonArgs {
    #[command(subcommand)]
    pub cmd: DaemonCmd,
}

#[derive(Subcommand)]
pub enum DaemonCmd {
    /// Start the sampling daemon in the background.
    Start,
    /// Stop a running sampling daemon.
    Stop,
    /// Run the sampling loop in the foreground (spawned by `start`).
    #[command(hide = true)]
    Run,
}
