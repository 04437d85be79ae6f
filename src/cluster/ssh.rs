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

//! Wrapping of shell command strings in local `bash` or remote `ssh` calls.

use crate::executor::ShellCommand;
use crate::scope::Scope;
use crate::segment::{Role, COORDINATOR_CONTENT_ID};

use super::generator::{ArgvGenerator, CommandGenerator, Generator};
use super::Cluster;

/// `bash -c <command>` when `use_local`, otherwise
/// `ssh -o StrictHostKeyChecking=no <user>@<host> <command>`.
pub fn construct_ssh_command(use_local: bool, user: &str, host: &str, command: &str) -> Vec<String> {
    if use_local {
        return vec!["bash".to_string(), "-c".to_string(), command.to_string()];
    }
    vec![
        "ssh".to_string(),
        "-o".to_string(),
        "StrictHostKeyChecking=no".to_string(),
        format!("{user}@{host}"),
        command.to_string(),
    ]
}

impl Cluster {
    /// Like [`Cluster::generate_command_list`], but `generator` returns a
    /// shell string. Targets on the coordinator host, or every target when the
    /// scope is local, run through `bash`; the rest through `ssh`.
    pub fn generate_ssh_command_list(
        &self,
        scope: Scope,
        generator: &CommandGenerator<'_>,
    ) -> Vec<ShellCommand> {
        let local_host = self.host_for_content(COORDINATOR_CONTENT_ID, Role::Primary);
        let user = self.user();

        let wrapped = match generator {
            Generator::PerSegment(generate) => ArgvGenerator::per_segment(move |content| {
                let host = self.host_for_content(content, Role::Primary);
                let use_local = host == local_host || scope.is_local();
                construct_ssh_command(use_local, user, host.unwrap_or_default(), &generate(content))
            }),
            Generator::PerHost(generate) => ArgvGenerator::per_host(move |host| {
                let use_local = Some(host) == local_host || scope.is_local();
                construct_ssh_command(use_local, user, host, &generate(host))
            }),
        };

        self.generate_command_list(scope, &wrapped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::SegmentConfig;

    fn cluster() -> Cluster {
        Cluster::new(vec![
            SegmentConfig::new(1, -1, Role::Primary, 5432, "cdw"),
            SegmentConfig::new(2, 0, Role::Primary, 6000, "cdw"),
            SegmentConfig::new(3, 1, Role::Primary, 6000, "sdw1"),
        ])
        .with_user("gpadmin")
    }

    #[test]
    fn test_construct_local_command() {
        assert_eq!(
            construct_ssh_command(true, "gpadmin", "sdw1", "ls -l"),
            vec!["bash", "-c", "ls -l"]
        );
    }

    #[test]
    fn test_construct_remote_command() {
        assert_eq!(
            construct_ssh_command(false, "gpadmin", "sdw1", "ls -l"),
            vec![
                "ssh",
                "-o",
                "StrictHostKeyChecking=no",
                "gpadmin@sdw1",
                "ls -l"
            ]
        );
    }

    #[test]
    fn test_per_segment_uses_bash_on_coordinator_host() {
        let cluster = cluster();
        let generator = CommandGenerator::per_segment(|content| format!("echo {content}"));
        let commands = cluster.generate_ssh_command_list(Scope::segments(), &generator);
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].command_string, "bash -c echo 0");
        assert_eq!(
            commands[1].command_string,
            "ssh -o StrictHostKeyChecking=no gpadmin@sdw1 echo 1"
        );
    }

    #[test]
    fn test_per_host_remote_and_local_scope() {
        let cluster = cluster();
        let generator = CommandGenerator::per_host(|host| format!("hostname # {host}"));

        let commands = cluster.generate_ssh_command_list(Scope::hosts(), &generator);
        assert_eq!(commands[0].argv[0], "bash");
        assert_eq!(commands[1].argv[0], "ssh");
        assert_eq!(commands[1].argv[3], "gpadmin@sdw1");

        let commands = cluster.generate_ssh_command_list(Scope::hosts().on_local(), &generator);
        assert!(commands.iter().all(|c| c.argv[0] == "bash"));
        assert_eq!(commands[1].argv[2], "hostname # sdw1");
    }
}
