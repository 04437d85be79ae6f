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

//! Error types shared by topology loading, command execution and result checking.
//!
//! # Error Categories
//!
//! - [`TopologyError`]: the segment configuration could not be loaded or parsed
//! - [`ExecError`]: a single attempt of a command failed
//! - [`AttemptError`] / [`RetryError`]: failed attempts recorded while retrying
//! - [`ClusterError`]: one or more commands of a fan-out ended in failure

use std::num::ParseIntError;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// Errors raised while reading the segment configuration dump file.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("coordinator data directory path is empty")]
    EmptyDataDir,

    #[error("failed to open file {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read segment configuration dump {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unexpected number of fields ({count}) in line: {line}")]
    FieldCount { count: usize, line: String },

    #[error("failed to convert {field} with value {value} to an integer: {source}")]
    InvalidNumber {
        field: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("unknown segment role '{value}' (expected 'p' or 'm')")]
    InvalidRole { value: String },
}

/// Failure of a single command attempt.
#[derive(Debug, Clone, Error)]
pub enum ExecError {
    #[error("empty command")]
    EmptyCommand,

    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The process ran but did not exit cleanly. `output` holds what it printed.
    #[error("{}", exit_message(.code))]
    ExitStatus { code: Option<i32>, output: String },

    #[error("command timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("execution task failed: {reason}")]
    TaskFailed { reason: String },
}

impl ExecError {
    /// Output captured from a process that exited unsuccessfully.
    pub fn output(&self) -> Option<&str> {
        match self {
            ExecError::ExitStatus { output, .. } => Some(output),
            _ => None,
        }
    }
}

fn exit_message(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit status {code}"),
        None => "terminated by signal".to_string(),
    }
}

/// A failed attempt, tagged with its attempt number and the stderr it produced.
#[derive(Debug, Clone, Error)]
#[error("attempt {attempt}: error was {source}: {stderr}")]
pub struct AttemptError {
    pub attempt: u32,
    #[source]
    pub source: ExecError,
    pub stderr: String,
}

/// Every failed attempt of one command, in attempt order.
#[derive(Debug, Clone, Default, Error)]
#[error("{}", join_attempts(.attempts))]
pub struct RetryError {
    pub attempts: Vec<AttemptError>,
}

impl RetryError {
    pub fn push(&mut self, attempt: AttemptError) {
        self.attempts.push(attempt);
    }

    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }
}

fn join_attempts(attempts: &[AttemptError]) -> String {
    attempts
        .iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Aggregate failure of a cluster command.
///
/// Library code never terminates the process. A `Fatal` error tells the
/// outermost caller that the operation must not continue.
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("{summary}")]
    Fatal { summary: String, failures: usize },

    #[error("{message}")]
    NonFatal { message: String, failures: usize },
}

impl ClusterError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, ClusterError::Fatal { .. })
    }

    pub fn failures(&self) -> usize {
        match self {
            ClusterError::Fatal { failures, .. } | ClusterError::NonFatal { failures, .. } => {
                *failures
            }
        }
    }
}
