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

//! Command list generation.
//!
//! A generator is either per segment (called with a content id) or per host
//! (called with a hostname). The variant, not the scope, decides whether the
//! cluster is walked by content or by host.

use crate::executor::{ShellCommand, Target};
use crate::scope::Scope;
use crate::segment::{Role, COORDINATOR_CONTENT_ID};

use super::Cluster;

pub enum Generator<'a, T> {
    PerSegment(Box<dyn Fn(i32) -> T + 'a>),
    PerHost(Box<dyn Fn(&str) -> T + 'a>),
}

impl<'a, T> Generator<'a, T> {
    pub fn per_segment(f: impl Fn(i32) -> T + 'a) -> Self {
        Generator::PerSegment(Box::new(f))
    }

    pub fn per_host(f: impl Fn(&str) -> T + 'a) -> Self {
        Generator::PerHost(Box::new(f))
    }

    pub fn is_per_host(&self) -> bool {
        matches!(self, Generator::PerHost(_))
    }
}

/// Produces the argv to run for each target.
pub type ArgvGenerator<'a> = Generator<'a, Vec<String>>;
/// Produces a shell command string for each target; see
/// [`Cluster::generate_ssh_command_list`].
pub type CommandGenerator<'a> = Generator<'a, String>;
/// Produces the error message prefix for a failed target.
pub type MessageGenerator<'a> = Generator<'a, String>;

impl Cluster {
    /// Build one command per content id or per host.
    ///
    /// Per segment, the coordinator content is skipped when the scope excludes
    /// the coordinator. Per host, the coordinator host is skipped when the
    /// coordinator is excluded, and the standby host when both the coordinator
    /// and mirrors are excluded, but only if that host carries no other
    /// segment; a host that also runs segments always gets the command.
    pub fn generate_command_list(
        &self,
        scope: Scope,
        generator: &ArgvGenerator<'_>,
    ) -> Vec<ShellCommand> {
        match generator {
            Generator::PerSegment(generate) => self
                .content_ids()
                .iter()
                .copied()
                .filter(|&content| {
                    !(content == COORDINATOR_CONTENT_ID && scope.excludes_coordinator())
                })
                .map(|content| {
                    ShellCommand::new(scope, Target::Segment(content), generate(content))
                })
                .collect(),
            Generator::PerHost(generate) => {
                let coordinator_host =
                    self.host_for_content(COORDINATOR_CONTENT_ID, Role::Primary);
                let standby_host = self.host_for_content(COORDINATOR_CONTENT_ID, Role::Mirror);

                self.hostnames()
                    .iter()
                    .filter(|host| {
                        let only_one_segment = self.contents_for_host(host).len() == 1;
                        let host = Some(host.as_str());
                        let skip_coordinator = host == coordinator_host
                            && scope.excludes_coordinator()
                            && only_one_segment;
                        // The standby counts as both coordinator and mirror.
                        let skip_standby = host == standby_host
                            && scope.excludes_coordinator()
                            && scope.excludes_mirrors()
                            && only_one_segment;
                        !(skip_coordinator || skip_standby)
                    })
                    .map(|host| {
                        ShellCommand::new(scope, Target::Host(host.clone()), generate(host.as_str()))
                    })
                    .collect()
            }
        }
    }
}
