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

//! Configuration tests.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serial_test::serial;
use tempfile::TempDir;

use super::loader::DATA_DIR_ENV_VARS;
use super::types::Config;
use super::utils::expand_tilde;
use crate::cluster::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY};

fn with_env<F: FnOnce()>(vars: &[(&str, Option<&str>)], f: F) {
    let saved: Vec<_> = vars
        .iter()
        .map(|(name, _)| (name.to_string(), std::env::var_os(name)))
        .collect();
    for (name, value) in vars {
        unsafe {
            match value {
                Some(value) => std::env::set_var(name, value),
                None => std::env::remove_var(name),
            }
        }
    }
    f();
    for (name, value) in saved {
        unsafe {
            match value {
                Some(value) => std::env::set_var(&name, value),
                None => std::env::remove_var(&name),
            }
        }
    }
}

#[test]
#[serial]
fn test_expand_tilde() {
    with_env(&[("HOME", Some("/home/gpadmin"))], || {
        assert_eq!(
            expand_tilde(Path::new("~/.config/clusterexec/config.yaml")),
            PathBuf::from("/home/gpadmin/.config/clusterexec/config.yaml")
        );
        assert_eq!(
            expand_tilde(Path::new("/data/coordinator")),
            PathBuf::from("/data/coordinator")
        );
        assert_eq!(
            expand_tilde(Path::new("~other/dir")),
            PathBuf::from("~other/dir")
        );
    });
}

#[test]
fn test_config_parsing() {
    let yaml = r#"
defaults:
  user: gpadmin
  coordinator_data_dir: /data/coordinator/gpseg-1
  max_attempts: 3
  retry_delay_ms: 250
  parallel: 16
  log_file: /var/log/clusterexec.log
"#;

    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.defaults.user.as_deref(), Some("gpadmin"));
    assert_eq!(config.defaults.max_attempts, Some(3));
    assert_eq!(config.parallel(None), 16);
    assert_eq!(config.parallel(Some(2)), 2);

    let policy = config.retry_policy(None, None);
    assert_eq!(policy.max_attempts, 3);
    assert_eq!(policy.retry_delay, Duration::from_millis(250));

    let policy = config.retry_policy(Some(0), Some(10));
    assert_eq!(policy.max_attempts, 1);
    assert_eq!(policy.retry_delay, Duration::from_millis(10));

    assert_eq!(
        config.log_file(),
        Some(PathBuf::from("/var/log/clusterexec.log"))
    );
    assert_eq!(config.user(Some("admin")).as_deref(), Some("admin"));
    assert_eq!(config.user(None).as_deref(), Some("gpadmin"));
}

#[test]
fn test_empty_config_uses_defaults() {
    let config: Config = serde_yaml::from_str("{}").unwrap();
    assert_eq!(config, Config::default());

    let policy = config.retry_policy(None, None);
    assert_eq!(policy.max_attempts, DEFAULT_MAX_ATTEMPTS);
    assert_eq!(policy.retry_delay, DEFAULT_RETRY_DELAY);
    assert_eq!(config.parallel(None), 0);
    assert_eq!(config.log_file(), None);
}

#[test]
#[serial]
fn test_coordinator_data_dir_resolution() {
    let config = Config::default();
    let clear: Vec<(&str, Option<&str>)> =
        DATA_DIR_ENV_VARS.iter().map(|var| (*var, None)).collect();

    with_env(&clear, || {
        assert_eq!(config.coordinator_data_dir(None), None);
    });

    with_env(
        &[
            ("COORDINATOR_DATA_DIRECTORY", None),
            ("MASTER_DATA_DIRECTORY", Some("/data/master/gpseg-1")),
        ],
        || {
            assert_eq!(
                config.coordinator_data_dir(None),
                Some(PathBuf::from("/data/master/gpseg-1"))
            );
        },
    );

    with_env(
        &[
            ("COORDINATOR_DATA_DIRECTORY", Some("/data/coordinator/gpseg-1")),
            ("MASTER_DATA_DIRECTORY", Some("/data/master/gpseg-1")),
        ],
        || {
            assert_eq!(
                config.coordinator_data_dir(None),
                Some(PathBuf::from("/data/coordinator/gpseg-1"))
            );

            let mut configured = Config::default();
            configured.defaults.coordinator_data_dir = Some("/data/from-config".to_string());
            assert_eq!(
                configured.coordinator_data_dir(None),
                Some(PathBuf::from("/data/from-config"))
            );
            assert_eq!(
                configured.coordinator_data_dir(Some(Path::new("/data/cli"))),
                Some(PathBuf::from("/data/cli"))
            );
        },
    );
}

#[tokio::test]
async fn test_load_missing_file_returns_default() {
    let dir = TempDir::new().unwrap();
    let config = Config::load(&dir.path().join("absent.yaml")).await.unwrap();
    assert_eq!(config, Config::default());
}

#[tokio::test]
async fn test_load_explicit_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("custom.yaml");
    std::fs::write(&path, "defaults:\n  parallel: 4\n").unwrap();

    let config = Config::load_with_priority(&path).await.unwrap();
    assert_eq!(config.defaults.parallel, Some(4));
}

#[tokio::test]
async fn test_load_invalid_yaml_reports_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.yaml");
    std::fs::write(&path, "defaults: [unterminated\n").unwrap();

    let err = Config::load(&path).await.unwrap_err();
    assert!(format!("{err:#}").contains("broken.yaml"));
}
