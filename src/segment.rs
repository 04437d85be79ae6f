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

//! Segment (node) records as reported by the cluster catalog.

use std::fmt;
use std::str::FromStr;

use crate::error::TopologyError;

/// Content id of the coordinator (and its standby).
pub const COORDINATOR_CONTENT_ID: i32 = -1;

/// Role of a segment within its content pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Role {
    #[default]
    Primary,
    Mirror,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Primary => "p",
            Role::Mirror => "m",
        }
    }
}

impl FromStr for Role {
    type Err = TopologyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "p" => Ok(Role::Primary),
            "m" => Ok(Role::Mirror),
            other => Err(TopologyError::InvalidRole {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the segment configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentConfig {
    pub dbid: i32,
    pub content_id: i32,
    pub role: Role,
    pub preferred_role: Role,
    pub mode: String,
    pub status: String,
    pub port: u16,
    pub hostname: String,
    pub address: String,
    pub data_dir: String,
}

impl SegmentConfig {
    /// Shorthand used mostly by tests and topology fixtures.
    pub fn new(dbid: i32, content_id: i32, role: Role, port: u16, hostname: &str) -> Self {
        Self {
            dbid,
            content_id,
            role,
            preferred_role: role,
            mode: "n".to_string(),
            status: "u".to_string(),
            port,
            hostname: hostname.to_string(),
            address: hostname.to_string(),
            data_dir: String::new(),
        }
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<String>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn is_coordinator(&self) -> bool {
        self.content_id == COORDINATOR_CONTENT_ID
    }

    pub fn is_mirror(&self) -> bool {
        self.role == Role::Mirror
    }
}

impl fmt::Display for SegmentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "dbid {} (content {}, {}) on {}:{}",
            self.dbid, self.content_id, self.role, self.hostname, self.port
        )
    }
}
