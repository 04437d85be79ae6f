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

//! Reader for the segment configuration dump file.
//!
//! The coordinator writes `gpsegconfig_dump` into its data directory, one
//! segment per line:
//!
//! ```text
//! dbid content role preferred_role mode status port hostname address [datadir]
//! 1 -1 p p n u 5432 cdw cdw /data/coordinator/gpseg-1
//! 2 0 p p s u 6000 sdw1 sdw1 /data/primary/gpseg0
//! ```
//!
//! Older files omit the data directory, so both 9 and 10 fields are valid.
//! Use this when the database is down; the file may be slightly stale.

use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::AsyncReadExt;

use crate::error::TopologyError;
use crate::segment::SegmentConfig;

pub const SEGMENT_CONFIG_DUMP_FILE: &str = "gpsegconfig_dump";

/// Path of the dump file inside a coordinator data directory.
pub fn dump_file_path(coordinator_data_dir: &Path) -> PathBuf {
    coordinator_data_dir.join(SEGMENT_CONFIG_DUMP_FILE)
}

/// Read `<coordinator_data_dir>/gpsegconfig_dump`.
pub async fn read_segment_configuration_from_file(
    coordinator_data_dir: &Path,
) -> Result<Vec<SegmentConfig>, TopologyError> {
    if coordinator_data_dir
        .as_os_str()
        .to_string_lossy()
        .trim()
        .is_empty()
    {
        return Err(TopologyError::EmptyDataDir);
    }

    let path = dump_file_path(coordinator_data_dir);
    let mut file = File::open(&path)
        .await
        .map_err(|source| TopologyError::Open {
            path: path.clone(),
            source,
        })?;

    let mut content = String::new();
    file.read_to_string(&mut content)
        .await
        .map_err(|source| TopologyError::Read {
            path: path.clone(),
            source,
        })?;

    let segments = parse_segment_configuration(&content)?;
    tracing::debug!("Read {} segments from {}", segments.len(), path.display());
    Ok(segments)
}

/// Parse the whole dump. Every line, blank ones included, must hold a segment.
pub fn parse_segment_configuration(content: &str) -> Result<Vec<SegmentConfig>, TopologyError> {
    content.lines().map(parse_segment_line).collect()
}

/// Parse a single dump line.
pub fn parse_segment_line(line: &str) -> Result<SegmentConfig, TopologyError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 9 && fields.len() != 10 {
        return Err(TopologyError::FieldCount {
            count: fields.len(),
            line: line.to_string(),
        });
    }

    Ok(SegmentConfig {
        dbid: parse_number("dbid", fields[0])?,
        content_id: parse_number("content", fields[1])?,
        role: fields[2].parse()?,
        preferred_role: fields[3].parse()?,
        mode: fields[4].to_string(),
        status: fields[5].to_string(),
        port: parse_number("port", fields[6])?,
        hostname: fields[7].to_string(),
        address: fields[8].to_string(),
        data_dir: fields.get(9).map(|s| s.to_string()).unwrap_or_default(),
    })
}

fn parse_number<T>(field: &'static str, value: &str) -> Result<T, TopologyError>
where
    T: std::str::FromStr<Err = std::num::ParseIntError>,
{
    value.parse().map_err(|source| TopologyError::InvalidNumber {
        field,
        value: value.to_string(),
        source,
    })
}
