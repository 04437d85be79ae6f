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

//! Core parallel executor implementation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use tokio::sync::Semaphore;

use crate::error::ExecError;
use crate::scope::Scope;

use super::execution_strategy::{execute_with_retries, run_local};
use super::result_types::{RemoteOutput, ShellCommand};

/// Runs local commands and fans cluster command lists out in parallel.
///
/// [`crate::Cluster`] holds an `Arc<dyn Executor>` so tests can substitute
/// their own implementation.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Run `bash -c <command>` on the invoking host.
    async fn execute_local_command(&self, command: &str) -> Result<String, ExecError>;

    /// Same as [`Executor::execute_local_command`], killing the process once
    /// `timeout` has elapsed.
    async fn execute_local_command_with_timeout(
        &self,
        command: &str,
        timeout: Duration,
    ) -> Result<String, ExecError>;

    /// Run every command once, in parallel.
    async fn execute_cluster_command(
        &self,
        scope: Scope,
        commands: Vec<ShellCommand>,
    ) -> RemoteOutput {
        self.execute_cluster_command_with_retries(scope, commands, 1, Duration::ZERO)
            .await
    }

    /// Run every command in parallel, retrying each one up to `max_attempts`
    /// times. Returns only after every command has finished all its attempts.
    async fn execute_cluster_command_with_retries(
        &self,
        scope: Scope,
        commands: Vec<ShellCommand>,
        max_attempts: u32,
        retry_delay: Duration,
    ) -> RemoteOutput;
}

/// Parallel executor spawning one task per command.
#[derive(Debug, Clone, Default)]
pub struct ParallelExecutor {
    pub(crate) max_parallel: usize,
}

impl ParallelExecutor {
    /// Executor without a concurrency cap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit how many commands run at once. `0` removes the limit.
    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel;
        self
    }

    pub fn max_parallel(&self) -> usize {
        self.max_parallel
    }
}

#[async_trait]
impl Executor for ParallelExecutor {
    async fn execute_local_command(&self, command: &str) -> Result<String, ExecError> {
        run_local(command, None).await
    }

    async fn execute_local_command_with_timeout(
        &self,
        command: &str,
        timeout: Duration,
    ) -> Result<String, ExecError> {
        run_local(command, Some(timeout)).await
    }

    async fn execute_cluster_command_with_retries(
        &self,
        scope: Scope,
        commands: Vec<ShellCommand>,
        max_attempts: u32,
        retry_delay: Duration,
    ) -> RemoteOutput {
        let semaphore = (self.max_parallel > 0).then(|| Arc::new(Semaphore::new(self.max_parallel)));
        tracing::debug!(
            "Executing {} commands ({}), max attempts {}, parallel limit {}",
            commands.len(),
            scope,
            max_attempts,
            self.max_parallel
        );

        let tasks: Vec<_> = commands
            .iter()
            .cloned()
            .map(|command| {
                let semaphore = semaphore.clone();
                tokio::spawn(async move {
                    let _permit = match semaphore {
                        Some(semaphore) => match semaphore.acquire_owned().await {
                            Ok(permit) => Some(permit),
                            Err(e) => {
                                return failed_task(command, format!("semaphore closed: {e}"));
                            }
                        },
                        None => None,
                    };
                    execute_with_retries(command, max_attempts, retry_delay).await
                })
            })
            .collect();

        let results = join_all(tasks).await;
        collect_results(scope, commands, results)
    }
}

fn failed_task(mut command: ShellCommand, reason: String) -> ShellCommand {
    command.error = Some(ExecError::TaskFailed { reason });
    command.completed = true;
    command
}

/// Put every finished command back in its original slot, handling task panics.
fn collect_results(
    scope: Scope,
    pending: Vec<ShellCommand>,
    results: Vec<Result<ShellCommand, tokio::task::JoinError>>,
) -> RemoteOutput {
    let mut num_errors = 0;
    let commands: Vec<ShellCommand> = pending
        .into_iter()
        .zip(results)
        .map(|(pending, result)| {
            let command = match result {
                Ok(command) => command,
                Err(e) => {
                    tracing::error!("Task failed for {}: {}", pending.target, e);
                    failed_task(pending, e.to_string())
                }
            };
            if command.error.is_some() {
                num_errors += 1;
            }
            command
        })
        .collect();

    RemoteOutput::new(scope, num_errors, commands)
}
