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

use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::cli::ExecArgs;
use crate::cluster::{Cluster, CommandGenerator, ErrorPolicy, MessageGenerator, RetryPolicy};
use crate::error::ClusterError;
use crate::executor::{ParallelExecutor, RemoteOutput, ShellCommand};
use crate::scope::Scope;
use crate::segment::{Role, SegmentConfig};

pub struct ExecuteCommandParams<'a> {
    pub segments: Vec<SegmentConfig>,
    pub args: &'a ExecArgs,
    pub user: Option<String>,
    pub retry_policy: RetryPolicy,
    pub max_parallel: usize,
    pub log_location: Option<PathBuf>,
}

/// Scope selected by the `exec` flags.
pub fn scope_from_args(args: &ExecArgs) -> Scope {
    let mut scope = if args.hosts {
        Scope::hosts()
    } else {
        Scope::segments()
    };
    if args.local {
        scope = scope.on_local();
    }
    if args.include_coordinator {
        scope = scope.include_coordinator();
    }
    if args.include_mirrors {
        scope = scope.include_mirrors();
    }
    scope
}

/// Fill `{content}`, `{dbid}`, `{host}`, `{port}` and `{datadir}` from the
/// primary at `content`.
pub fn render_segment_command(template: &str, cluster: &Cluster, content: i32) -> String {
    let rendered = template.replace("{content}", &content.to_string());
    match cluster.segment_by_role(content, Role::Primary) {
        Some(segment) => rendered
            .replace("{dbid}", &segment.dbid.to_string())
            .replace("{host}", &segment.hostname)
            .replace("{port}", &segment.port.to_string())
            .replace("{datadir}", &segment.data_dir),
        None => rendered,
    }
}

pub fn render_host_command(template: &str, host: &str) -> String {
    template.replace("{host}", host)
}

pub async fn execute_command(params: ExecuteCommandParams<'_>) -> Result<(), ClusterError> {
    let args = params.args;
    let scope = scope_from_args(args);
    let template = args.command_string();

    let mut cluster = Cluster::new(params.segments)
        .with_executor(Arc::new(
            ParallelExecutor::new().with_max_parallel(params.max_parallel),
        ))
        .with_retry_policy(params.retry_policy)
        .with_log_location(params.log_location);
    if let Some(user) = params.user {
        cluster = cluster.with_user(user);
    }

    let (generator, message) = if scope.is_hosts() {
        (
            CommandGenerator::per_host(|host| render_host_command(&template, host)),
            MessageGenerator::per_host(|_| "Command failed".to_string()),
        )
    } else {
        (
            CommandGenerator::per_segment(|content| {
                render_segment_command(&template, &cluster, content)
            }),
            MessageGenerator::per_segment(|_| "Command failed".to_string()),
        )
    };

    println!(
        "\n{} {} ({}):\n{}\n",
        "►".cyan().bold(),
        "Executing".cyan(),
        scope,
        format!("  {template}").dimmed()
    );

    let output = cluster
        .generate_and_execute_command(&format!("Executing \"{template}\""), scope, &generator)
        .await;

    for command in output.commands() {
        print!("{}", format_command_output(command));
    }
    println!("{}", format_summary(&output));

    let policy = if args.no_fatal {
        ErrorPolicy::NonFatal
    } else {
        ErrorPolicy::Fatal
    };
    match cluster.check_cluster_error(&output, "Unable to execute command", &message, policy) {
        Err(err) if err.is_fatal() => Err(err),
        _ => Ok(()),
    }
}

pub fn format_command_output(command: &ShellCommand) -> String {
    let mut out = String::new();
    let label = command.target.to_string();
    match &command.error {
        None => {
            out.push_str(&format!("{} {}", "●".green(), label.bold()));
            if command.was_retried() {
                out.push_str(&format!(
                    " {}",
                    format!("(after {} failed attempts)", command.attempts_failed()).yellow()
                ));
            }
            out.push('\n');
            for line in command.stdout.lines() {
                out.push_str(&format!("    {line}\n"));
            }
        }
        Some(err) => {
            out.push_str(&format!(
                "{} {}: {}\n",
                "●".red(),
                label.bold(),
                err.to_string().red()
            ));
            for line in command.stderr.lines() {
                out.push_str(&format!("    {}\n", line.dimmed()));
            }
        }
    }
    out
}

pub fn format_summary(output: &RemoteOutput) -> String {
    let total = output.commands().len();
    let failed = output.failed_count();
    let mut parts = vec![format!("{} commands", total.to_string().bold())];

    if total > failed {
        parts.push(format!(
            "{} {}",
            (total - failed).to_string().green().bold(),
            "successful".green()
        ));
    }
    if failed > 0 {
        parts.push(format!(
            "{} {}",
            failed.to_string().red().bold(),
            "failed".red()
        ));
    }
    if output.retried_count() > 0 {
        parts.push(format!(
            "{} {}",
            output.retried_count().to_string().yellow().bold(),
            "retried".yellow()
        ));
    }

    format!("\n{}\n", parts.join(" • "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExecError;
    use crate::executor::Target;
    use clap::Parser;

    fn exec_args(flags: &[&str]) -> ExecArgs {
        let mut argv = vec!["clusterexec", "exec"];
        argv.extend_from_slice(flags);
        argv.extend_from_slice(&["--", "true"]);
        match crate::cli::Cli::parse_from(argv).command {
            crate::cli::Commands::Exec(args) => args,
            crate::cli::Commands::List { .. } => unreachable!(),
        }
    }

    fn cluster() -> Cluster {
        Cluster::new(vec![
            SegmentConfig::new(1, -1, Role::Primary, 5432, "cdw").with_data_dir("/data/qddir"),
            SegmentConfig::new(2, 0, Role::Primary, 6000, "sdw1").with_data_dir("/data/p0"),
            SegmentConfig::new(3, 0, Role::Mirror, 7000, "sdw2").with_data_dir("/data/m0"),
        ])
    }

    #[test]
    fn test_scope_from_args() {
        let scope = scope_from_args(&exec_args(&[]));
        assert_eq!(scope, Scope::segments());

        let scope = scope_from_args(&exec_args(&[
            "--hosts",
            "--local",
            "--include-coordinator",
            "--include-mirrors",
        ]));
        assert!(scope.is_hosts());
        assert!(scope.is_local());
        assert!(scope.includes_coordinator());
        assert!(scope.includes_mirrors());
    }

    #[test]
    fn test_render_segment_command_uses_primary() {
        let cluster = cluster();
        assert_eq!(
            render_segment_command("ls {datadir} # {content} {dbid} {host}:{port}", &cluster, 0),
            "ls /data/p0 # 0 2 sdw1:6000"
        );
        assert_eq!(render_segment_command("echo {content}", &cluster, 9), "echo 9");
        assert_eq!(render_host_command("ping -c1 {host}", "sdw2"), "ping -c1 sdw2");
    }

    #[test]
    fn test_format_command_output() {
        let mut ok = ShellCommand::new(Scope::default(), Target::Segment(0), vec![]);
        ok.stdout = "hello\n".to_string();
        let out = format_command_output(&ok);
        assert!(out.contains("segment 0"));
        assert!(out.contains("    hello"));

        let mut failed = ShellCommand::new(Scope::hosts(), Target::Host("sdw1".to_string()), vec![]);
        failed.stderr = "no such file".to_string();
        failed.error = Some(ExecError::ExitStatus {
            code: Some(2),
            output: String::new(),
        });
        let out = format_command_output(&failed);
        assert!(out.contains("host sdw1"));
        assert!(out.contains("exit status 2"));
        assert!(out.contains("no such file"));
    }
}
