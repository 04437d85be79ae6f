// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Configuration loading and priority management.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

use crate::cluster::RetryPolicy;

use super::types::Config;
use super::utils::expand_tilde;

/// Default value of the `--config` flag.
pub const DEFAULT_CONFIG_PATH: &str = "~/.config/clusterexec/config.yaml";

/// Environment variables consulted for the coordinator data directory, in order.
pub const DATA_DIR_ENV_VARS: &[&str] = &["COORDINATOR_DATA_DIRECTORY", "MASTER_DATA_DIRECTORY"];

impl Config {
    /// Load configuration from a file.
    pub async fn load(path: &Path) -> Result<Self> {
        let expanded_path = expand_tilde(path);

        if !expanded_path.exists() {
            tracing::debug!(
                "Config file not found at {:?}, using defaults",
                expanded_path
            );
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&expanded_path)
            .await
            .with_context(|| format!("Failed to read configuration file at {}. Please check file permissions.", expanded_path.display()))?;

        let config: Config = serde_yaml::from_str(&content).with_context(|| {
            format!(
                "Failed to parse YAML configuration file at {}. Please check the YAML syntax is valid.",
                expanded_path.display()
            )
        })?;

        Ok(config)
    }

    /// Load configuration with priority order:
    /// 1. Explicit --config path (if exists and different from default)
    /// 2. Current directory clusterexec.yaml
    /// 3. $XDG_CONFIG_HOME/clusterexec/config.yaml
    /// 4. Platform config directory
    /// 5. Built-in defaults
    pub async fn load_with_priority(cli_config_path: &Path) -> Result<Self> {
        let expanded_cli_path = expand_tilde(cli_config_path);
        let expanded_default_path = expand_tilde(Path::new(DEFAULT_CONFIG_PATH));

        if expanded_cli_path != expanded_default_path {
            if expanded_cli_path.exists() {
                tracing::debug!(
                    "Using explicitly specified config file: {:?}",
                    expanded_cli_path
                );
                return Self::load(&expanded_cli_path).await;
            }
            tracing::debug!(
                "Custom config file not found, continuing with other sources: {:?}",
                expanded_cli_path
            );
        }

        for candidate in Self::standard_locations() {
            if candidate.exists() {
                tracing::debug!("Found config at {:?}", candidate);
                return Self::load(&candidate).await;
            }
        }

        tracing::debug!("No config file found, using default configuration");
        Ok(Self::default())
    }

    fn standard_locations() -> Vec<PathBuf> {
        let mut locations = vec![PathBuf::from("clusterexec.yaml")];
        if let Ok(xdg_config_home) = env::var("XDG_CONFIG_HOME") {
            locations.push(
                PathBuf::from(xdg_config_home)
                    .join("clusterexec")
                    .join("config.yaml"),
            );
        }
        if let Some(proj_dirs) = ProjectDirs::from("", "", "clusterexec") {
            locations.push(proj_dirs.config_dir().join("config.yaml"));
        }
        locations.push(expand_tilde(Path::new(DEFAULT_CONFIG_PATH)));
        locations
    }

    /// Coordinator data directory: CLI value, then config, then environment.
    pub fn coordinator_data_dir(&self, cli_value: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = cli_value {
            return Some(expand_tilde(path));
        }
        if let Some(path) = &self.defaults.coordinator_data_dir {
            return Some(expand_tilde(Path::new(path)));
        }
        DATA_DIR_ENV_VARS
            .iter()
            .find_map(|var| env::var_os(var).filter(|v| !v.is_empty()))
            .map(PathBuf::from)
    }

    /// Retry policy with CLI overrides applied on top of the config.
    pub fn retry_policy(&self, max_attempts: Option<u32>, retry_delay_ms: Option<u64>) -> RetryPolicy {
        let default = RetryPolicy::default();
        RetryPolicy {
            max_attempts: max_attempts
                .or(self.defaults.max_attempts)
                .unwrap_or(default.max_attempts)
                .max(1),
            retry_delay: retry_delay_ms
                .or(self.defaults.retry_delay_ms)
                .map(Duration::from_millis)
                .unwrap_or(default.retry_delay),
        }
    }

    pub fn parallel(&self, cli_value: Option<usize>) -> usize {
        cli_value.or(self.defaults.parallel).unwrap_or(0)
    }

    pub fn user(&self, cli_value: Option<&str>) -> Option<String> {
        cli_value
            .map(str::to_string)
            .or_else(|| self.defaults.user.clone())
    }

    pub fn log_file(&self) -> Option<PathBuf> {
        self.defaults
            .log_file
            .as_deref()
            .map(|path| expand_tilde(Path::new(path)))
    }
}
