// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use std::{env, fs};

use anyhow::{bail, Context, Result};
use chrono::Local;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tokio::io::AsyncWriteExt;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use gpustat::snapshot::{format_snapshot_line, Snapshot};
use gpustat::{parse_gpu_usage, DEFAULT_GPU_COUNT};

use crate::config::{self, Config};
use crate::queries;

/// Spawn the sampling loop as a detached background process and record
/// its pid. Refuses to start a second daemon.
pub fn start(config: &Config) -> Result<()> {
    if let Some(pid) = read_pid_file(&config.pid_path)? {
        if process_alive(pid) {
            bail!("sampling daemon already running (pid {pid})");
        }
        tracing::warn!(pid, "removing stale pid file");
        fs::remove_file(&config.pid_path)
            .with_context(|| format!("failed to remove {}", config.pid_path.display()))?;
    }
    config::ensure_parent_dir(&config.pid_path)?;
    config::ensure_parent_dir(&config.log_path)?;

    let exe = env::current_exe().context("failed to locate the gpustat executable")?;
    let child = std::process::Command::new(exe)
        .args(["daemon", "run"])
        .arg("--log-path")
        .arg(&config.log_path)
        .arg("--interval-secs")
        .arg(config.interval_secs.to_string())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .context("failed to spawn the sampling daemon")?;
    write_pid_file(&config.pid_path, child.id())?;
    println!("Starting daemon (pid {})", child.id());
    Ok(())
}

/// Terminate the daemon named by the pid file. A stale pid file is
/// cleaned up with a warning rather than treated as an error.
pub fn stop(config: &Config) -> Result<()> {
    let Some(pid) = read_pid_file(&config.pid_path)? else {
        bail!(
            "no pid file at {}; is the daemon running?",
            config.pid_path.display()
        );
    };
    if process_alive(pid) {
        kill(Pid::from_raw(pid), Signal::SIGTERM)
            .with_context(|| format!("failed to signal the daemon (pid {pid})"))?;
        println!("Stopping daemon (pid {pid})");
    } else {
        tracing::warn!(pid, "daemon is not running; removing stale pid file");
    }
    fs::remove_file(&config.pid_path)
        .with_context(|| format!("failed to remove {}", config.pid_path.display()))?;
    Ok(())
}

/// Run the sampling loop until SIGTERM or Ctrl-C. This is the body of the
/// background process spawned by [`start`].
pub async fn run(config: &Config) -> Result<()> {
    config::ensure_parent_dir(&config.log_path)?;
    let sampler = Sampler::start(
        config.log_path.clone(),
        Duration::from_secs(config.interval_secs),
    );
    wait_for_shutdown().await?;
    tracing::info!("shutting down the sampling loop");
    sampler.stop().await;
    Ok(())
}

/// The periodic sampling task. At most one snapshot is ever in flight;
/// shutdown lands between iterations.
struct Sampler {
    shutdown: Arc<Notify>,
    handle: JoinHandle<()>,
}

impl Sampler {
    fn start(log_path: PathBuf, interval: Duration) -> Self {
        let shutdown = Arc::new(Notify::new());
        let notify = Arc::clone(&shutdown);
        let handle = tokio::spawn(async move {
            loop {
                match sample_once(&log_path).await {
                    Ok(()) => tracing::info!(log_path = %log_path.display(), "wrote usage snapshot"),
                    // A failed query or parse skips this sample; the next
                    // tick starts from fresh scheduler output.
                    Err(err) => tracing::error!(error = %err, "skipping usage snapshot"),
                }
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = notify.notified() => break,
                }
            }
        });
        Self { shutdown, handle }
    }

    async fn stop(self) {
        self.shutdown.notify_one();
        let _ = self.handle.await;
    }
}

async fn sample_once(log_path: &Path) -> Result<()> {
    let inventory = queries::fetch_inventory(DEFAULT_GPU_COUNT).await?;
    let usage_rows = queries::fetch_usage_rows().await?;
    let usage = parse_gpu_usage(&usage_rows, &inventory).context("parsing gpu allocations")?;
    let snapshot = Snapshot {
        timestamp: Local::now().naive_local(),
        usage,
    };
    let line = format_snapshot_line(&snapshot).context("serializing the usage snapshot")?;
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .await
        .with_context(|| format!("failed to open {}", log_path.display()))?;
    file.write_all(format!("{line}\n").as_bytes())
        .await
        .with_context(|| format!("failed to append to {}", log_path.display()))?;
    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    let mut sigterm =
        signal(SignalKind::terminate()).context("failed to install the SIGTERM handler")?;
    tokio::select! {
        _ = sigterm.recv() => {}
        _ = tokio::signal::ctrl_c() => {}
    }
    Ok(())
}

fn process_alive(pid: i32) -> bool {
    kill(Pid::from_raw(pid), None).is_ok()
}

fn read_pid_file(path: &Path) -> Result<Option<i32>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read pid file {}", path.display()))?;
    let pid = contents
        .trim()
        .parse()
        .with_context(|| format!("pid file {} is corrupt", path.display()))?;
    Ok(Some(pid))
}

fn write_pid_file(path: &Path, pid: u32) -> Result<()> {
    fs::write(path, format!("{pid}\n"))
        .with_context(|| format!("failed to write pid file {}", path.display()))
}
