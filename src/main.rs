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

use anyhow::Result;
use clap::Parser;
use owo_colors::OwoColorize;

use clusterexec::{
    Cluster,
    cli::{Cli, Commands},
    commands::{
        exec::{ExecuteCommandParams, execute_command},
        list::list_topology,
        load_segments,
    },
    config::Config,
    utils::init_logging,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        eprintln!("{} {err:#}", "Error:".red().bold());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load_with_priority(&cli.config).await?;
    let log_file = config.log_file();
    init_logging(cli.verbose, log_file.as_deref())?;

    let data_dir = config.coordinator_data_dir(cli.coordinator_data_dir.as_deref());
    tracing::debug!("Coordinator data directory: {:?}", data_dir);

    match cli.command {
        Commands::List {
            include_mirrors,
            hosts,
        } => {
            let segments = load_segments(data_dir.as_deref(), include_mirrors).await?;
            list_topology(&Cluster::new(segments), hosts);
        }
        Commands::Exec(args) => {
            let segments = load_segments(data_dir.as_deref(), args.include_mirrors).await?;
            let params = ExecuteCommandParams {
                segments,
                args: &args,
                user: config.user(cli.user.as_deref()),
                retry_policy: config.retry_policy(args.attempts, args.retry_delay_ms),
                max_parallel: config.parallel(args.parallel),
                log_location: log_file,
            };
            execute_command(params).await?;
        }
    }

    Ok(())
}
