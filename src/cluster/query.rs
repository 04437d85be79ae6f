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

//! Segment configuration lookup against a live database.
//!
//! The crate does not talk to the database itself. Callers provide a
//! [`SegmentSource`] that can run a query and map rows to [`SegmentConfig`],
//! plus the server version as [`VersionInfo`] predicates.

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::segment::SegmentConfig;

/// Version predicates of the connected server.
pub trait VersionInfo: Send + Sync {
    /// Whether the server belongs to the GPDB family.
    fn is_gpdb(&self) -> bool;

    /// Whether the server version is strictly lower than `version`.
    fn before(&self, version: &str) -> bool;
}

/// A database connection able to return segment configuration rows.
#[async_trait]
pub trait SegmentSource: Send + Sync {
    fn version(&self) -> &dyn VersionInfo;

    /// Run `query` and map each row (dbid, contentid, role, preferredrole,
    /// mode, status, port, hostname, address, datadir) to a segment.
    async fn select_segments(&self, query: &str) -> Result<Vec<SegmentConfig>>;
}

/// Which roles to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MirrorSelection {
    /// Primaries and the coordinator.
    #[default]
    PrimariesOnly,
    /// Every segment, mirrors and standby included.
    All,
    /// Mirrors and the standby coordinator only.
    MirrorsOnly,
}

/// Build the segment configuration query for the given server version.
///
/// Servers of the GPDB family older than 6 keep data directories in the
/// filespace catalog, so the query joins it. Rows come back ordered by
/// content, primary before mirror.
pub fn segment_configuration_query(version: &dyn VersionInfo, selection: MirrorSelection) -> String {
    if version.is_gpdb() && version.before("6") {
        let role_filter = match selection {
            MirrorSelection::PrimariesOnly => " s.role = 'p' AND",
            MirrorSelection::All => "",
            MirrorSelection::MirrorsOnly => " s.role = 'm' AND",
        };
        format!(
            r#"
SELECT
	s.dbid,
	s.content as contentid,
	s.role,
	s.preferred_role as preferredrole,
	s.mode,
	s.status,
	s.port,
	s.hostname,
	s.address,
	e.fselocation as datadir
FROM gp_segment_configuration s
JOIN pg_filespace_entry e ON s.dbid = e.fsedbid
JOIN pg_filespace f ON e.fsefsoid = f.oid
WHERE{role_filter} f.fsname = 'pg_system'
ORDER BY s.content, s.role DESC;"#
        )
    } else {
        let where_clause = match selection {
            MirrorSelection::PrimariesOnly => "WHERE role = 'p'",
            MirrorSelection::All => "",
            MirrorSelection::MirrorsOnly => "WHERE role = 'm'",
        };
        format!(
            r#"
SELECT
	dbid,
	content as contentid,
	role,
	preferred_role as preferredrole,
	mode,
	status,
	port,
	hostname,
	address,
	datadir
FROM gp_segment_configuration
{where_clause}
ORDER BY content, role DESC;"#
        )
    }
}

/// Fetch the segment configuration through `source`.
pub async fn get_segment_configuration(
    source: &dyn SegmentSource,
    selection: MirrorSelection,
) -> Result<Vec<SegmentConfig>> {
    let query = segment_configuration_query(source.version(), selection);
    tracing::trace!("Segment configuration query: {}", query);
    source
        .select_segments(&query)
        .await
        .with_context(|| format!("Failed to query segment configuration ({selection:?})"))
}
