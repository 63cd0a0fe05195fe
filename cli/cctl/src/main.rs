//! cctl
//!
//! Bootstraps and manages a small on-premises Kubernetes cluster whose hosts
//! are reached over SSH:
//! - create/delete: declare credentials, secrets, the cluster, hosts and machines,
//!   deploying machines as they are declared
//! - get: inspect the state file
//! - snapshot/recover: save etcd and rebuild it from a snapshot
//! - backup/restore: archive the state file with a snapshot
//! - migrate: bring an older state file to the current schema
//!
//! The state file is the system of record; every command loads it, works on the
//! in-memory store and writes it back.

mod actuator;
mod cli;
mod commands;
mod context;
mod error;
mod etcd;
#[cfg(test)]
mod etcd_test;
mod logging;
mod settings;
#[cfg(test)]
mod test_utils;

use clap::Parser;
use cli::Cli;
use error::CctlError;
use settings::Settings;
use ssh_client::SshConnector;
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.global.log_level);
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CctlError> {
    let settings = Settings::try_from(&cli.global)?;
    commands::run(cli.command, &settings, &SshConnector).await
}
