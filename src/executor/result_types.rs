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

//! Commands handed to the executor and the report it returns.

use std::fmt;

use crate::error::{ExecError, RetryError};
use crate::scope::Scope;

/// Content id reported by per-host commands.
pub const HOST_TARGET_CONTENT_ID: i32 = -2;

/// What a command runs against: a segment content id or a hostname.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    Segment(i32),
    Host(String),
}

impl Target {
    /// Content id, or [`HOST_TARGET_CONTENT_ID`] for per-host commands.
    pub fn content_id(&self) -> i32 {
        match self {
            Target::Segment(content) => *content,
            Target::Host(_) => HOST_TARGET_CONTENT_ID,
        }
    }

    /// Hostname, or an empty string for per-segment commands.
    pub fn host(&self) -> &str {
        match self {
            Target::Segment(_) => "",
            Target::Host(host) => host,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Segment(content) => write!(f, "segment {content}"),
            Target::Host(host) => write!(f, "host {host}"),
        }
    }
}

/// A command to run on one segment or host, plus its outcome once executed.
///
/// The executor fills in `stdout`, `stderr`, `error`, `retry_error` and
/// `completed` once, after the last attempt.
#[derive(Debug, Clone)]
pub struct ShellCommand {
    pub scope: Scope,
    pub target: Target,
    pub argv: Vec<String>,
    pub command_string: String,
    pub stdout: String,
    pub stderr: String,
    /// Error of the final attempt.
    pub error: Option<ExecError>,
    /// Every failed attempt, including the final one when it failed.
    pub retry_error: Option<RetryError>,
    pub completed: bool,
}

impl ShellCommand {
    pub fn new(scope: Scope, target: Target, argv: Vec<String>) -> Self {
        let command_string = argv.join(" ");
        Self {
            scope,
            target,
            argv,
            command_string,
            stdout: String::new(),
            stderr: String::new(),
            error: None,
            retry_error: None,
            completed: false,
        }
    }

    pub fn is_success(&self) -> bool {
        self.completed && self.error.is_none()
    }

    /// Succeeded, but only after at least one failed attempt.
    pub fn was_retried(&self) -> bool {
        self.error.is_none() && self.retry_error.as_ref().is_some_and(|e| !e.is_empty())
    }

    pub fn attempts_failed(&self) -> usize {
        self.retry_error.as_ref().map_or(0, RetryError::len)
    }
}

/// Outcome of one execution round.
///
/// The failed and retried views are indices into `commands`, so a command
/// is stored exactly once.
#[derive(Debug)]
pub struct RemoteOutput {
    pub scope: Scope,
    pub num_errors: usize,
    commands: Vec<ShellCommand>,
    failed: Vec<usize>,
    retried: Vec<usize>,
}

impl RemoteOutput {
    pub fn new(scope: Scope, num_errors: usize, commands: Vec<ShellCommand>) -> Self {
        let mut failed = Vec::new();
        let mut retried = Vec::new();
        for (idx, command) in commands.iter().enumerate() {
            if command.error.is_some() {
                failed.push(idx);
            } else if command.was_retried() {
                retried.push(idx);
            }
        }

        Self {
            scope,
            num_errors,
            commands,
            failed,
            retried,
        }
    }

    pub fn commands(&self) -> &[ShellCommand] {
        &self.commands
    }

    pub fn failed_commands(&self) -> impl Iterator<Item = &ShellCommand> {
        self.failed.iter().map(|&idx| &self.commands[idx])
    }

    pub fn retried_commands(&self) -> impl Iterator<Item = &ShellCommand> {
        self.retried.iter().map(|&idx| &self.commands[idx])
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    pub fn retried_count(&self) -> usize {
        self.retried.len()
    }

    pub fn is_success(&self) -> bool {
        self.num_errors == 0
    }
}
