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

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_PATH;

#[derive(Parser, Debug)]
#[command(
    name = "clusterexec",
    version,
    about = "Parallel command execution across the segments and hosts of a database cluster",
    long_about = "clusterexec reads the segment configuration of a coordinator/segment database cluster\nand fans shell commands out to every segment or every host in parallel.\nCommands on the coordinator host run through bash, all others through ssh.\nFailed commands are retried and reported in a single summary.",
    after_help = "EXAMPLES:\n  List primaries:                  clusterexec -d /data/coordinator/gpseg-1 list\n  List every host:                 clusterexec list --hosts --include-mirrors\n  Check each segment directory:    clusterexec exec -- ls {datadir}\n  Run once per host:               clusterexec exec --hosts --include-coordinator -- uptime"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(
        long,
        global = true,
        default_value = DEFAULT_CONFIG_PATH,
        help = "Configuration file path\nConfig loading priority:\n  1. This flag's value (if the file exists)\n  2. Current directory (./clusterexec.yaml)\n  3. $XDG_CONFIG_HOME/clusterexec/config.yaml\n  4. Platform config directory"
    )]
    pub config: PathBuf,

    #[arg(
        short = 'd',
        long,
        global = true,
        help = "Coordinator data directory containing gpsegconfig_dump\nFalls back to the config file, then COORDINATOR_DATA_DIRECTORY and MASTER_DATA_DIRECTORY"
    )]
    pub coordinator_data_dir: Option<PathBuf>,

    #[arg(
        short = 'u',
        long,
        global = true,
        help = "Login user for ssh [default: current user]"
    )]
    pub user: Option<String>,

    #[arg(
        short = 'v',
        long,
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Show the cluster topology",
        long_about = "Reads the segment configuration dump from the coordinator data directory\nand prints one line per segment, or the distinct host list with --hosts."
    )]
    List {
        #[arg(long, help = "Also show mirrors and the standby coordinator")]
        include_mirrors: bool,

        #[arg(long, help = "Print distinct hostnames instead of segments")]
        hosts: bool,
    },

    #[command(
        about = "Run a command on every segment or host",
        long_about = "Runs the command once per segment (default) or once per host (--hosts).\nPer segment, the command may use {content}, {dbid}, {host}, {port} and {datadir},\nwhich are replaced with the values of the primary at that content.\nPer host, {host} is replaced with the hostname.\n\nExit codes: 0 (all succeed, or --no-fatal), 1 (any failures)",
        after_help = "Examples:\n  clusterexec exec -- du -sh {datadir}\n  clusterexec exec --hosts --include-mirrors -- df -h\n  clusterexec exec --attempts 3 --retry-delay-ms 500 -- test -d {datadir}"
    )]
    Exec(ExecArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ExecArgs {
    #[arg(long, help = "Run once per host instead of once per segment")]
    pub hosts: bool,

    #[arg(long, help = "Include the coordinator")]
    pub include_coordinator: bool,

    #[arg(long, help = "Include mirror hosts and the standby coordinator host")]
    pub include_mirrors: bool,

    #[arg(long, help = "Run every command through local bash instead of ssh")]
    pub local: bool,

    #[arg(long, help = "Attempts per command [default: from config, or 5]")]
    pub attempts: Option<u32>,

    #[arg(long, help = "Delay between attempts in milliseconds [default: from config, or 1000]")]
    pub retry_delay_ms: Option<u64>,

    #[arg(
        short = 'p',
        long,
        help = "Maximum commands running at once, 0 for no limit [default: from config, or 0]"
    )]
    pub parallel: Option<usize>,

    #[arg(long, help = "Report failures but exit with status 0")]
    pub no_fatal: bool,

    #[arg(
        trailing_var_arg = true,
        required = true,
        help = "Command to execute"
    )]
    pub command: Vec<String>,
}

impl ExecArgs {
    /// The command words joined back into one shell string.
    pub fn command_string(&self) -> String {
        self.command.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exec() {
        let cli = Cli::parse_from([
            "clusterexec",
            "-vv",
            "-d",
            "/data/coordinator",
            "exec",
            "--hosts",
            "--include-coordinator",
            "-p",
            "4",
            "--",
            "ls",
            "-l",
            "{host}",
        ]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(
            cli.coordinator_data_dir,
            Some(PathBuf::from("/data/coordinator"))
        );
        let Commands::Exec(args) = cli.command else {
            panic!("expected exec");
        };
        assert!(args.hosts);
        assert!(args.include_coordinator);
        assert!(!args.include_mirrors);
        assert_eq!(args.parallel, Some(4));
        assert_eq!(args.attempts, None);
        assert_eq!(args.command_string(), "ls -l {host}");
    }

    #[test]
    fn test_parse_list() {
        let cli = Cli::parse_from(["clusterexec", "list", "--hosts"]);
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_PATH));
        assert!(matches!(
            cli.command,
            Commands::List {
                hosts: true,
                include_mirrors: false
            }
        ));
    }

    #[test]
    fn test_exec_requires_command() {
        assert!(Cli::try_parse_from(["clusterexec", "exec", "--hosts"]).is_err());
    }
}
