// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

const APP_DIR_NAME: &str = "gpustat";
const CONFIG_FILE_NAME: &str = "gpustat.toml";
const LOG_FILE_NAME: &str = "gpustat.log";
const PID_FILE_NAME: &str = "gpustat.pid";
const DEFAULT_INTERVAL_SECS: u64 = 43_200;

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    log_path: Option<String>,
    pid_path: Option<String>,
    interval_secs: Option<u64>,
}

#[derive(Debug)]
pub struct Config {
    pub log_path: PathBuf,
    pub pid_path: PathBuf,
    pub interval_secs: u64,
    pub config_path: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct Overrides {
    pub log_path: Option<PathBuf>,
    pub pid_path: Option<PathBuf>,
    pub interval_secs: Option<u64>,
}

pub fn load(config_path_override: Option<PathBuf>, overrides: Overrides) -> Result<Config> {
    let required = config_path_override.is_some();
    let config_path = match config_path_override {
        Some(path) => Some(expand_path(path)),
        None => default_config_path().ok(),
    };

    let file_config = match config_path.as_deref() {
        Some(path) => read_config_file(path, required)?,
        None => FileConfig::default(),
    };

    let config_dir = config_path.as_deref().and_then(|path| path.parent());
    let log_path = resolve_file_path(overrides.log_path, file_config.log_path, config_dir)
        .map(Ok)
        .unwrap_or_else(|| default_data_path(LOG_FILE_NAME))?;
    let pid_path = resolve_file_path(overrides.pid_path, file_config.pid_path, config_dir)
        .map(Ok)
        .unwrap_or_else(|| default_data_path(PID_FILE_NAME))?;

    let interval_secs = overrides
        .interval_secs
        .or(file_config.interval_secs)
        .unwrap_or(DEFAULT_INTERVAL_SECS);
    if interval_secs == 0 {
        anyhow::bail!("interval_secs must be at least 1");
    }

    Ok(Config {
        log_path,
        pid_path,
        interval_secs,
        config_path,
    })
}

pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    Ok(())
}

fn read_config_file(path: &Path, required: bool) -> Result<FileConfig> {
    if !path.exists() {
        if required {
            anyhow::bail!("config file not found at {}", path.display());
        }
        return Ok(FileConfig::default());
    }

    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file {}", path.display()))
}

fn resolve_file_path(
    override_path: Option<PathBuf>,
    file_value: Option<String>,
    config_dir: Option<&Path>,
) -> Option<PathBuf> {
    match override_path {
        Some(path) => Some(expand_path(path)),
        None => file_value.map(|raw| resolve_path(&raw, config_dir)),
    }
}

fn resolve_path(raw: &str, base_dir: Option<&Path>) -> PathBuf {
    let expanded = shellexpand::tilde(raw);
    let path = PathBuf::from(expanded.as_ref());
    if path.is_absolute() {
        return path;
    }
    match base_dir {
        Some(dir) => dir.join(path),
        None => path,
    }
}

fn expand_path(path: PathBuf) -> PathBuf {
    let path_string = path.to_string_lossy().to_string();
    let expanded = shellexpand::tilde(&path_string);
    PathBuf::from(expanded.as_ref())
}

fn default_config_path() -> Result<PathBuf> {
    let base = dirs::config_dir().context("failed to resolve config directory")?;
    Ok(base.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}

fn default_data_path(file_name: &str) -> Result<PathBuf> {
    let base = dirs::data_dir().context("failed to resolve data directory")?;
    Ok(base.join(APP_DIR_NAME).join(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn missing_optional_config_file_is_ok() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("missing.toml");
        let cfg = read_config_file(&config_path, false).unwrap();
        assert!(cfg.log_path.is_none());
        assert!(cfg.interval_secs.is_none());
    }

    #[test]
    fn missing_required_config_file_errors() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("missing.toml");
        let err = read_config_file(&config_path, true).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn resolves_relative_paths_from_config_dir() {
        let dir = TempDir::new().unwrap();
        let config_dir = dir.path().join("config");
        fs::create_dir_all(&config_dir).unwrap();
        let config_path = config_dir.join("gpustat.toml");
        fs::write(
            &config_path,
            "log_path = \"logs/gpustat.log\"\npid_path = \"pids/gpustat.pid\"\ninterval_secs = 60\n",
        )
        .unwrap();

        let config = load(Some(config_path.clone()), Overrides::default()).unwrap();
        assert_eq!(config.log_path, config_dir.join("logs").join("gpustat.log"));
        assert_eq!(config.pid_path, config_dir.join("pids").join("gpustat.pid"));
        assert_eq!(config.interval_secs, 60);
        assert_eq!(config.config_path, Some(config_path));
    }

    #[test]
    fn cli_overrides_take_precedence_over_file_config() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("gpustat.toml");
        fs::write(
            &config_path,
            "log_path = \"from_config.log\"\ninterval_secs = 60\n",
        )
        .unwrap();

        let config = load(
            Some(config_path),
            Overrides {
                log_path: Some(PathBuf::from("/tmp/from_flag.log")),
                pid_path: None,
                interval_secs: Some(5),
            },
        )
        .unwrap();

        assert_eq!(config.log_path, PathBuf::from("/tmp/from_flag.log"));
        assert_eq!(config.interval_secs, 5);
    }

    #[test]
    fn overrides_apply_per_field() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("gpustat.toml");
        fs::write(
            &config_path,
            "log_path = \"from_config.log\"\ninterval_secs = 60\n",
        )
        .unwrap();

        let config = load(
            Some(config_path),
            Overrides {
                log_path: None,
                pid_path: None,
                interval_secs: Some(5),
            },
        )
        .unwrap();

        assert_eq!(config.log_path, dir.path().join("from_config.log"));
        assert_eq!(config.interval_secs, 5);
    }

    #[test]
    fn uses_default_interval_when_missing() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("gpustat.toml");
        fs::write(&config_path, "log_path = \"gpustat.log\"\n").unwrap();

        let config = load(Some(config_path), Overrides::default()).unwrap();
        assert_eq!(config.interval_secs, DEFAULT_INTERVAL_SECS);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("gpustat.toml");
        fs::write(&config_path, "interval_secs = 0\n").unwrap();

        let err = load(Some(config_path), Overrides::default()).unwrap_err();
        assert!(err.to_string().contains("interval_secs"));
    }

    #[test]
    fn ensure_parent_dir_creates_missing_directories() {
        let dir = TempDir::new().unwrap();
        let log_path = dir.path().join("nested").join("gpustat.log");
        ensure_parent_dir(&log_path).unwrap();
        assert!(dir.path().join("nested").is_dir());
    }

    #[test]
    fn ensure_parent_dir_without_parent_does_not_error() {
        ensure_parent_dir(Path::new("gpustat.log")).unwrap();
    }
}
