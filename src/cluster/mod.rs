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

//! Cluster topology and cluster-wide command execution.
//!
//! A [`Cluster`] keeps the segment configuration in three shapes:
//!
//! - `segments`: the plain list, ordered by content id. This is the source of truth.
//! - by content: content id to the one or two segments at that content,
//!   primary first and mirror second.
//! - by host: hostname to every segment on that host.
//!
//! The two lookup maps hold indices into `segments`, never copies. A cluster is
//! built once per snapshot of the configuration and never mutated; rebuild it
//! after anything that changes the topology.

mod check;
pub mod dump;
mod generator;
pub mod query;
mod ssh;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ExecError;
use crate::executor::{Executor, ParallelExecutor, RemoteOutput, ShellCommand};
use crate::scope::Scope;
use crate::segment::{Role, SegmentConfig};

pub use check::{fatal_cluster_error_summary, ErrorPolicy};
pub use generator::{ArgvGenerator, CommandGenerator, Generator, MessageGenerator};
pub use ssh::construct_ssh_command;

/// Attempts made by [`Cluster::generate_and_execute_command`] unless configured.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
/// Delay between those attempts unless configured.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Retry settings applied by [`Cluster::generate_and_execute_command`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

pub struct Cluster {
    content_ids: Vec<i32>,
    hostnames: Vec<String>,
    segments: Vec<SegmentConfig>,
    by_content: HashMap<i32, Vec<usize>>,
    by_host: HashMap<String, Vec<usize>>,
    executor: Arc<dyn Executor>,
    user: String,
    retry_policy: RetryPolicy,
    log_location: Option<PathBuf>,
}

impl Cluster {
    pub fn new(segments: Vec<SegmentConfig>) -> Self {
        let mut by_content: HashMap<i32, Vec<usize>> = HashMap::new();
        let mut by_host: HashMap<String, Vec<usize>> = HashMap::new();
        let mut hostnames = Vec::new();

        for (idx, segment) in segments.iter().enumerate() {
            let pair = by_content.entry(segment.content_id).or_default();
            pair.push(idx);
            // Input is not guaranteed to list primaries before mirrors.
            if pair.len() == 2 && segments[pair[0]].role == Role::Mirror {
                pair.swap(0, 1);
            }

            let on_host = by_host.entry(segment.hostname.clone()).or_default();
            on_host.push(idx);
            if on_host.len() == 1 {
                hostnames.push(segment.hostname.clone());
            }
        }

        let mut content_ids: Vec<i32> = by_content.keys().copied().collect();
        content_ids.sort_unstable();

        tracing::debug!(
            "Built cluster topology: {} segments, {} contents, {} hosts",
            segments.len(),
            content_ids.len(),
            hostnames.len()
        );

        Self {
            content_ids,
            hostnames,
            segments,
            by_content,
            by_host,
            executor: Arc::new(ParallelExecutor::new()),
            user: current_username(),
            retry_policy: RetryPolicy::default(),
            log_location: None,
        }
    }

    /// Replace the executor, e.g. with a bounded one or a test double.
    pub fn with_executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = executor;
        self
    }

    /// User for `ssh user@host`. Defaults to the current OS user.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Log file named in fatal error summaries.
    pub fn with_log_location(mut self, log_location: Option<PathBuf>) -> Self {
        self.log_location = log_location;
        self
    }

    pub fn segments(&self) -> &[SegmentConfig] {
        &self.segments
    }

    /// Distinct content ids in ascending order.
    pub fn content_ids(&self) -> &[i32] {
        &self.content_ids
    }

    /// Distinct hostnames in the order they first appear.
    pub fn hostnames(&self) -> &[String] {
        &self.hostnames
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry_policy
    }

    /// Segments at `content_id`, primary first.
    pub fn segments_for_content(&self, content_id: i32) -> Vec<&SegmentConfig> {
        self.by_content
            .get(&content_id)
            .map(|indices| indices.iter().map(|&idx| &self.segments[idx]).collect())
            .unwrap_or_default()
    }

    /// Segments on `hostname`, in configuration order.
    pub fn segments_for_host(&self, hostname: &str) -> Vec<&SegmentConfig> {
        self.by_host
            .get(hostname)
            .map(|indices| indices.iter().map(|&idx| &self.segments[idx]).collect())
            .unwrap_or_default()
    }

    /// `Role::Primary` picks the first segment at the content, `Role::Mirror`
    /// the second one.
    pub fn segment_by_role(&self, content_id: i32, role: Role) -> Option<&SegmentConfig> {
        let indices = self.by_content.get(&content_id)?;
        let idx = match role {
            Role::Primary => indices.first(),
            Role::Mirror => indices.get(1),
        }?;
        Some(&self.segments[*idx])
    }

    pub fn dbid_for_content(&self, content_id: i32, role: Role) -> Option<i32> {
        self.segment_by_role(content_id, role).map(|s| s.dbid)
    }

    pub fn port_for_content(&self, content_id: i32, role: Role) -> Option<u16> {
        self.segment_by_role(content_id, role).map(|s| s.port)
    }

    pub fn host_for_content(&self, content_id: i32, role: Role) -> Option<&str> {
        self.segment_by_role(content_id, role)
            .map(|s| s.hostname.as_str())
    }

    pub fn dir_for_content(&self, content_id: i32, role: Role) -> Option<&str> {
        self.segment_by_role(content_id, role)
            .map(|s| s.data_dir.as_str())
    }

    pub fn dbids_for_host(&self, hostname: &str) -> Vec<i32> {
        self.segments_for_host(hostname)
            .into_iter()
            .map(|s| s.dbid)
            .collect()
    }

    pub fn contents_for_host(&self, hostname: &str) -> Vec<i32> {
        self.segments_for_host(hostname)
            .into_iter()
            .map(|s| s.content_id)
            .collect()
    }

    pub fn ports_for_host(&self, hostname: &str) -> Vec<u16> {
        self.segments_for_host(hostname)
            .into_iter()
            .map(|s| s.port)
            .collect()
    }

    pub fn dirs_for_host(&self, hostname: &str) -> Vec<&str> {
        self.segments_for_host(hostname)
            .into_iter()
            .map(|s| s.data_dir.as_str())
            .collect()
    }

    pub async fn execute_local_command(&self, command: &str) -> Result<String, ExecError> {
        self.executor.execute_local_command(command).await
    }

    pub async fn execute_local_command_with_timeout(
        &self,
        command: &str,
        timeout: Duration,
    ) -> Result<String, ExecError> {
        self.executor
            .execute_local_command_with_timeout(command, timeout)
            .await
    }

    pub async fn execute_cluster_command(
        &self,
        scope: Scope,
        commands: Vec<ShellCommand>,
    ) -> RemoteOutput {
        self.executor.execute_cluster_command(scope, commands).await
    }

    pub async fn execute_cluster_command_with_retries(
        &self,
        scope: Scope,
        commands: Vec<ShellCommand>,
        max_attempts: u32,
        retry_delay: Duration,
    ) -> RemoteOutput {
        self.executor
            .execute_cluster_command_with_retries(scope, commands, max_attempts, retry_delay)
            .await
    }

    /// Build the ssh command list for `generator` and run it with the
    /// cluster's retry policy.
    pub async fn generate_and_execute_command(
        &self,
        verbose_msg: &str,
        scope: Scope,
        generator: &CommandGenerator<'_>,
    ) -> RemoteOutput {
        tracing::debug!("{}", verbose_msg);
        let commands = self.generate_ssh_command_list(scope, generator);
        self.execute_cluster_command_with_retries(
            scope,
            commands,
            self.retry_policy.max_attempts,
            self.retry_policy.retry_delay,
        )
        .await
    }
}

fn current_username() -> String {
    whoami::fallible::username()
        .ok()
        .or_else(|| std::env::var("USER").ok())
        .or_else(|| std::env::var("LOGNAME").ok())
        .unwrap_or_else(|| "gpadmin".to_string())
}
