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

//! Reporting of retried and failed commands after an execution round.

use std::path::Path;

use crate::error::ClusterError;
use crate::executor::RemoteOutput;
use crate::scope::Scope;
use crate::segment::Role;

use super::generator::{Generator, MessageGenerator};
use super::Cluster;

/// What [`Cluster::check_cluster_error`] returns when a command failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// The whole operation must stop.
    #[default]
    Fatal,
    /// Log the final message and let the caller carry on.
    NonFatal,
}

impl Cluster {
    /// Log retried and failed commands, and turn failures into an error.
    ///
    /// Retried commands are logged at debug level, failed ones at error level.
    /// Returns `Ok(())` when no command failed.
    pub fn check_cluster_error(
        &self,
        output: &RemoteOutput,
        final_err_msg: &str,
        message: &MessageGenerator<'_>,
        policy: ErrorPolicy,
    ) -> Result<(), ClusterError> {
        for retried in output.retried_commands() {
            let retry_error = retried
                .retry_error
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default();
            match message {
                Generator::PerSegment(_) => {
                    let content = retried.target.content_id();
                    tracing::debug!(
                        "Command failed before passing on segment {} on host {} with error:\n{}",
                        content,
                        self.host_for_content(content, Role::Primary).unwrap_or_default(),
                        retry_error
                    );
                }
                Generator::PerHost(_) => {
                    tracing::debug!(
                        "Command failed before passing on host {} with error:\n{}",
                        retried.target.host(),
                        retry_error
                    );
                }
            }
            tracing::debug!("Command was: {}", retried.command_string);
        }

        if output.num_errors == 0 {
            return Ok(());
        }

        for failed in output.failed_commands() {
            let err_str = format!(
                "with error {}: {}",
                failed
                    .error
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_default(),
                failed.stderr
            );
            match message {
                Generator::PerSegment(get_message) => {
                    let content = failed.target.content_id();
                    tracing::error!(
                        "{} on segment {} on host {} {}",
                        get_message(content),
                        content,
                        self.host_for_content(content, Role::Primary).unwrap_or_default(),
                        err_str
                    );
                }
                Generator::PerHost(get_message) => {
                    let host = failed.target.host();
                    tracing::error!("{} on host {} {}", get_message(host), host, err_str);
                }
            }
            tracing::debug!("Command was: {}", failed.command_string);
        }

        match policy {
            ErrorPolicy::NonFatal => {
                tracing::error!("{}", final_err_msg);
                Err(ClusterError::NonFatal {
                    message: final_err_msg.to_string(),
                    failures: output.num_errors,
                })
            }
            ErrorPolicy::Fatal => Err(ClusterError::Fatal {
                summary: fatal_cluster_error_summary(
                    final_err_msg,
                    output.scope,
                    output.num_errors,
                    self.log_location.as_deref(),
                ),
                failures: output.num_errors,
            }),
        }
    }
}

/// Summary line for a fatal cluster failure, e.g.
/// `"Unable to start on 2 segments. See /var/log/x.log for a complete list of errors."`
pub fn fatal_cluster_error_summary(
    err_msg: &str,
    scope: Scope,
    num_errors: usize,
    log_location: Option<&Path>,
) -> String {
    let location = if scope.is_local() {
        " on coordinator for"
    } else {
        " on"
    };
    let mut noun = if scope.is_hosts() {
        "host".to_string()
    } else {
        "segment".to_string()
    };
    if num_errors != 1 {
        noun.push('s');
    }
    let log = log_location
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "the log".to_string());

    format!("{err_msg}{location} {num_errors} {noun}. See {log} for a complete list of errors.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AttemptError, ExecError, RetryError};
    use crate::executor::{ShellCommand, Target};
    use crate::segment::SegmentConfig;
    use std::path::PathBuf;

    fn cluster() -> Cluster {
        Cluster::new(vec![
            SegmentConfig::new(1, -1, Role::Primary, 5432, "cdw"),
            SegmentConfig::new(2, 0, Role::Primary, 6000, "sdw1"),
            SegmentConfig::new(3, 1, Role::Primary, 6000, "sdw2"),
        ])
        .with_log_location(Some(PathBuf::from("/tmp/clusterexec.log")))
    }

    fn finished(target: Target, failed: bool, retried: bool) -> ShellCommand {
        let mut command = ShellCommand::new(Scope::default(), target, vec!["true".to_string()]);
        command.completed = true;
        if failed {
            command.error = Some(ExecError::ExitStatus {
                code: Some(1),
                output: String::new(),
            });
        }
        if failed || retried {
            command.retry_error = Some(RetryError {
                attempts: vec![AttemptError {
                    attempt: 1,
                    source: ExecError::ExitStatus {
                        code: Some(1),
                        output: String::new(),
                    },
                    stderr: "oops".to_string(),
                }],
            });
        }
        command
    }

    #[test]
    fn test_summary_pluralization() {
        assert_eq!(
            fatal_cluster_error_summary("Unable to start", Scope::segments(), 1, None),
            "Unable to start on 1 segment. See the log for a complete list of errors."
        );
        assert_eq!(
            fatal_cluster_error_summary(
                "Unable to start",
                Scope::hosts(),
                3,
                Some(Path::new("/tmp/a.log"))
            ),
            "Unable to start on 3 hosts. See /tmp/a.log for a complete list of errors."
        );
        assert_eq!(
            fatal_cluster_error_summary("Unable to copy", Scope::hosts().on_local(), 1, None),
            "Unable to copy on coordinator for 1 host. See the log for a complete list of errors."
        );
    }

    #[test]
    fn test_no_failures_is_ok() {
        let cluster = cluster();
        let output = RemoteOutput::new(
            Scope::default(),
            0,
            vec![
                finished(Target::Segment(0), false, true),
                finished(Target::Segment(1), false, false),
            ],
        );
        let message = MessageGenerator::per_segment(|content| format!("Failed on {content}"));
        assert!(cluster
            .check_cluster_error(&output, "Unable to run", &message, ErrorPolicy::Fatal)
            .is_ok());
    }

    #[test]
    fn test_fatal_policy() {
        let cluster = cluster();
        let output = RemoteOutput::new(
            Scope::default(),
            2,
            vec![
                finished(Target::Segment(0), true, false),
                finished(Target::Segment(1), true, false),
            ],
        );
        let message = MessageGenerator::per_segment(|_| "Unable to list directory".to_string());
        let err = cluster
            .check_cluster_error(&output, "Unable to run", &message, ErrorPolicy::default())
            .unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(err.failures(), 2);
        assert_eq!(
            err.to_string(),
            "Unable to run on 2 segments. See /tmp/clusterexec.log for a complete list of errors."
        );
    }

    #[test]
    fn test_non_fatal_policy() {
        let cluster = cluster();
        let output = RemoteOutput::new(
            Scope::hosts(),
            1,
            vec![finished(Target::Host("sdw2".to_string()), true, false)],
        );
        let message = MessageGenerator::per_host(|host| format!("Could not reach {host}"));
        let err = cluster
            .check_cluster_error(&output, "Host check failed", &message, ErrorPolicy::NonFatal)
            .unwrap_err();
        assert!(!err.is_fatal());
        assert_eq!(err.to_string(), "Host check failed");
    }
}
