//! `cctl snapshot etcd` and `cctl recover etcd`

use super::Session;
use crate::cli::{RecoverCommand, SnapshotCommand};
use crate::context::Context;
use crate::error::CctlError;
use crate::etcd;
use crate::settings::Settings;
use ssh_client::Connector;
use state::{ObjectStore, push_to_store};

/// Take a snapshot; the state file is only read
pub async fn snapshot(command: SnapshotCommand, settings: &Settings, connector: &dyn Connector) -> Result<(), CctlError> {
    let SnapshotCommand::Etcd(args) = command;
    let mut store = ObjectStore::new();
    push_to_store(&settings.state_path, &mut store)?;
    let ctx = Context::new(&mut store, connector, settings);
    etcd::snapshot(&ctx, &args.ip, &args.snapshot).await
}

pub async fn recover(command: RecoverCommand, settings: &Settings, connector: &dyn Connector) -> Result<(), CctlError> {
    let RecoverCommand::Etcd(args) = command;
    let mut session = Session::open(&settings.state_path)?;
    let mut ctx = Context::new(&mut session.store, connector, settings);
    let result = etcd::recover(&mut ctx, &args.snapshot).await;
    session.close(result)
}
