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

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Create an environment filter based on verbosity level
pub fn create_env_filter(verbosity: u8) -> EnvFilter {
    if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match verbosity {
            0 => EnvFilter::new("clusterexec=warn"),
            1 => EnvFilter::new("clusterexec=info"),
            2 => EnvFilter::new("clusterexec=debug"),
            _ => EnvFilter::new("clusterexec=trace"),
        }
    }
}

/// Initialize logging to stderr and, optionally, to `log_file`.
///
/// The log file is appended to and never gets ANSI colors. Its path is what
/// fatal error summaries point the user at.
pub fn init_logging(verbosity: u8, log_file: Option<&Path>) -> Result<()> {
    let filter = create_env_filter(verbosity);

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create log directory {}", parent.display())
                })?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(true),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to initialize logging")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_create_env_filter() {
        let saved = std::env::var_os("RUST_LOG");
        unsafe { std::env::remove_var("RUST_LOG") };

        assert_eq!(create_env_filter(0).to_string(), "clusterexec=warn");
        assert_eq!(create_env_filter(1).to_string(), "clusterexec=info");
        assert_eq!(create_env_filter(2).to_string(), "clusterexec=debug");
        assert_eq!(create_env_filter(3).to_string(), "clusterexec=trace");
        assert_eq!(create_env_filter(7).to_string(), "clusterexec=trace");

        unsafe { std::env::set_var("RUST_LOG", "clusterexec=error") };
        assert_eq!(create_env_filter(3).to_string(), "clusterexec=error");

        unsafe {
            match saved {
                Some(value) => std::env::set_var("RUST_LOG", value),
                None => std::env::remove_var("RUST_LOG"),
            }
        }
    }
}
