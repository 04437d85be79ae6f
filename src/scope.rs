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

//! Execution scope of a cluster command.
//!
//! A scope is made of four independent axes:
//!
//! - per segment (default) or per host
//! - remote (default) or local execution
//! - coordinator excluded (default) or included
//! - mirrors excluded (default) or included
//!
//! `Scope::default()` runs one remote command per primary segment, skipping
//! the coordinator. Callers only set the axes that deviate from that:
//!
//! ```
//! use clusterexec::Scope;
//!
//! let scope = Scope::hosts().include_coordinator();
//! assert!(scope.is_hosts());
//! assert!(scope.includes_coordinator());
//! assert!(scope.excludes_mirrors());
//! ```

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Scope {
    per_host: bool,
    local: bool,
    coordinator: bool,
    mirrors: bool,
}

impl Scope {
    /// One command per segment.
    pub const fn segments() -> Self {
        Self {
            per_host: false,
            local: false,
            coordinator: false,
            mirrors: false,
        }
    }

    /// One command per host.
    pub const fn hosts() -> Self {
        Self::segments().on_hosts()
    }

    pub const fn on_hosts(mut self) -> Self {
        self.per_host = true;
        self
    }

    pub const fn on_segments(mut self) -> Self {
        self.per_host = false;
        self
    }

    /// Run every command on the invoking host instead of over ssh.
    pub const fn on_local(mut self) -> Self {
        self.local = true;
        self
    }

    pub const fn on_remote(mut self) -> Self {
        self.local = false;
        self
    }

    pub const fn include_coordinator(mut self) -> Self {
        self.coordinator = true;
        self
    }

    pub const fn exclude_coordinator(mut self) -> Self {
        self.coordinator = false;
        self
    }

    pub const fn include_mirrors(mut self) -> Self {
        self.mirrors = true;
        self
    }

    pub const fn exclude_mirrors(mut self) -> Self {
        self.mirrors = false;
        self
    }

    pub const fn is_segments(&self) -> bool {
        !self.per_host
    }

    pub const fn is_hosts(&self) -> bool {
        self.per_host
    }

    pub const fn is_local(&self) -> bool {
        self.local
    }

    pub const fn is_remote(&self) -> bool {
        !self.local
    }

    pub const fn includes_coordinator(&self) -> bool {
        self.coordinator
    }

    pub const fn excludes_coordinator(&self) -> bool {
        !self.coordinator
    }

    pub const fn includes_mirrors(&self) -> bool {
        self.mirrors
    }

    pub const fn excludes_mirrors(&self) -> bool {
        !self.mirrors
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {} coordinator, {} mirrors",
            if self.per_host { "hosts" } else { "segments" },
            if self.local { "local" } else { "remote" },
            if self.coordinator { "include" } else { "exclude" },
            if self.mirrors { "include" } else { "exclude" },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scope() {
        let scope = Scope::default();
        assert_eq!(scope, Scope::segments());
        assert!(scope.is_segments());
        assert!(scope.is_remote());
        assert!(scope.excludes_coordinator());
        assert!(scope.excludes_mirrors());
    }

    #[test]
    fn test_axes_are_independent() {
        let scope = Scope::segments().include_mirrors();
        assert!(scope.is_segments());
        assert!(scope.is_remote());
        assert!(scope.excludes_coordinator());
        assert!(scope.includes_mirrors());

        let scope = Scope::hosts().on_local().include_coordinator();
        assert!(scope.is_hosts());
        assert!(scope.is_local());
        assert!(scope.includes_coordinator());
        assert!(scope.excludes_mirrors());
    }

    #[test]
    fn test_axes_can_be_reset() {
        let scope = Scope::hosts()
            .on_local()
            .include_coordinator()
            .include_mirrors()
            .on_segments()
            .on_remote()
            .exclude_coordinator()
            .exclude_mirrors();
        assert_eq!(scope, Scope::default());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Scope::hosts().include_coordinator().to_string(),
            "hosts, remote, include coordinator, exclude mirrors"
        );
    }
}
