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

pub mod exec;
pub mod list;

use anyhow::{Context, Result};
use std::path::Path;

use crate::cluster::dump::read_segment_configuration_from_file;
use crate::segment::SegmentConfig;

/// Read the topology from the dump file in `coordinator_data_dir`.
///
/// Mirrors and the standby coordinator are dropped unless `include_mirrors`.
pub async fn load_segments(
    coordinator_data_dir: Option<&Path>,
    include_mirrors: bool,
) -> Result<Vec<SegmentConfig>> {
    let data_dir = coordinator_data_dir.context(
        "Coordinator data directory is not set. Use --coordinator-data-dir, the config file, or COORDINATOR_DATA_DIRECTORY",
    )?;

    let mut segments = read_segment_configuration_from_file(data_dir)
        .await
        .context("Failed to load the segment configuration")?;
    if !include_mirrors {
        segments.retain(|segment| !segment.is_mirror());
    }
    Ok(segments)
}
