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

//! Configuration type definitions.

use serde::{Deserialize, Serialize};

/// Main configuration structure.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,
}

/// Global default settings. Every key is optional.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Defaults {
    /// Login user for `ssh user@host`.
    pub user: Option<String>,
    /// Coordinator data directory holding `gpsegconfig_dump`.
    pub coordinator_data_dir: Option<String>,
    /// Attempts per command for generate-and-execute operations.
    pub max_attempts: Option<u32>,
    /// Delay between attempts, in milliseconds.
    pub retry_delay_ms: Option<u64>,
    /// Maximum commands running at once. 0 means no limit.
    pub parallel: Option<usize>,
    /// Log file that also receives every log line.
    pub log_file: Option<String>,
}
