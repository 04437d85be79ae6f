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

//! Process invocation and the per-command retry loop.

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::process::Command;

use crate::error::{AttemptError, ExecError, RetryError};

use super::result_types::ShellCommand;

/// Output of one process invocation.
pub(crate) struct AttemptOutcome {
    pub stdout: String,
    pub stderr: String,
    pub result: Result<(), ExecError>,
}

/// Run `argv` once, capturing stdout and stderr separately.
pub(crate) async fn run_attempt(argv: &[String]) -> AttemptOutcome {
    let Some((program, args)) = argv.split_first() else {
        return AttemptOutcome {
            stdout: String::new(),
            stderr: String::new(),
            result: Err(ExecError::EmptyCommand),
        };
    };

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await;

    match output {
        Ok(output) => {
            let stdout = String::from_utf8_lossy(&output.stdout).to_string();
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            let result = if output.status.success() {
                Ok(())
            } else {
                Err(ExecError::ExitStatus {
                    code: output.status.code(),
                    output: stdout.clone(),
                })
            };
            AttemptOutcome {
                stdout,
                stderr,
                result,
            }
        }
        Err(e) => AttemptOutcome {
            stdout: String::new(),
            stderr: String::new(),
            result: Err(ExecError::Spawn {
                program: program.clone(),
                source: Arc::new(e),
            }),
        },
    }
}

/// Run a command up to `max_attempts` times, sleeping `retry_delay` between
/// failed attempts, and record the final outcome on the command.
pub(crate) async fn execute_with_retries(
    mut command: ShellCommand,
    max_attempts: u32,
    retry_delay: Duration,
) -> ShellCommand {
    let max_attempts = max_attempts.max(1);
    let mut retry_error = RetryError::default();
    let mut last = AttemptOutcome {
        stdout: String::new(),
        stderr: String::new(),
        result: Ok(()),
    };

    for attempt in 1..=max_attempts {
        last = run_attempt(&command.argv).await;
        match &last.result {
            Ok(()) => break,
            Err(e) => {
                tracing::trace!(
                    "{} failed on attempt {}/{}: {}",
                    command.target,
                    attempt,
                    max_attempts,
                    e
                );
                retry_error.push(AttemptError {
                    attempt,
                    source: e.clone(),
                    stderr: last.stderr.clone(),
                });
                if attempt != max_attempts {
                    tokio::time::sleep(retry_delay).await;
                }
            }
        }
    }

    command.stdout = last.stdout;
    command.stderr = last.stderr;
    command.error = last.result.err();
    command.retry_error = (!retry_error.is_empty()).then_some(retry_error);
    command.completed = true;
    command
}

/// Run `bash -c <command>` locally and return stdout followed by stderr.
pub(crate) async fn run_local(command: &str, timeout: Option<Duration>) -> Result<String, ExecError> {
    let mut cmd = Command::new("bash");
    cmd.arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .kill_on_drop(true);
    let child = cmd.output();

    let output = match timeout {
        Some(timeout) => tokio::time::timeout(timeout, child)
            .await
            .map_err(|_| ExecError::Timeout { timeout })?,
        None => child.await,
    }
    .map_err(|e| ExecError::Spawn {
        program: "bash".to_string(),
        source: Arc::new(e),
    })?;

    let mut combined = String::from_utf8_lossy(&output.stdout).to_string();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));

    if output.status.success() {
        Ok(combined)
    } else {
        Err(ExecError::ExitStatus {
            code: output.status.code(),
            output: combined,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::result_types::Target;
    use crate::scope::Scope;

    fn bash(script: &str) -> ShellCommand {
        ShellCommand::new(
            Scope::default(),
            Target::Segment(0),
            vec!["bash".to_string(), "-c".to_string(), script.to_string()],
        )
    }

    #[tokio::test]
    async fn test_run_attempt_captures_streams() {
        let outcome = run_attempt(&[
            "bash".to_string(),
            "-c".to_string(),
            "echo out; echo err >&2".to_string(),
        ])
        .await;
        assert!(outcome.result.is_ok());
        assert_eq!(outcome.stdout, "out\n");
        assert_eq!(outcome.stderr, "err\n");
    }

    #[tokio::test]
    async fn test_run_attempt_empty_argv() {
        let outcome = run_attempt(&[]).await;
        assert!(matches!(outcome.result, Err(ExecError::EmptyCommand)));
    }

    #[tokio::test]
    async fn test_run_attempt_missing_program() {
        let outcome = run_attempt(&["/nonexistent/clusterexec-test-binary".to_string()]).await;
        assert!(matches!(outcome.result, Err(ExecError::Spawn { .. })));
    }

    #[tokio::test]
    async fn test_success_stops_retrying() {
        let command = execute_with_retries(bash("echo done"), 3, Duration::from_millis(10)).await;
        assert!(command.completed);
        assert!(command.error.is_none());
        assert!(command.retry_error.is_none());
        assert_eq!(command.stdout, "done\n");
    }

    #[tokio::test]
    async fn test_every_attempt_recorded_on_failure() {
        let command =
            execute_with_retries(bash("echo nope >&2; exit 3"), 3, Duration::from_millis(1)).await;
        assert!(command.completed);
        assert!(matches!(
            command.error,
            Some(ExecError::ExitStatus { code: Some(3), .. })
        ));
        assert_eq!(command.attempts_failed(), 3);
        assert_eq!(command.stderr, "nope\n");
        let trail = command.retry_error.unwrap().to_string();
        assert!(trail.starts_with("attempt 1: error was exit status 3: nope"));
    }

    #[tokio::test]
    async fn test_zero_attempts_runs_once() {
        let command = execute_with_retries(bash("exit 1"), 0, Duration::ZERO).await;
        assert_eq!(command.attempts_failed(), 1);
    }

    #[tokio::test]
    async fn test_run_local_combines_output() {
        let output = run_local("echo out; echo err >&2", None).await.unwrap();
        assert_eq!(output, "out\nerr\n");
    }

    #[tokio::test]
    async fn test_run_local_failure_keeps_output() {
        let err = run_local("echo partial; exit 2", None).await.unwrap_err();
        assert!(matches!(err, ExecError::ExitStatus { code: Some(2), .. }));
        assert_eq!(err.output(), Some("partial\n"));
    }

    #[tokio::test]
    async fn test_run_local_timeout() {
        let err = run_local("sleep 5", Some(Duration::from_millis(100)))
            .await
            .unwrap_err();
        assert!(matches!(err, ExecError::Timeout { .. }));
    }
}
