//! `cctl delete ...`

use super::Session;
use crate::actuator;
use crate::cli::DeleteCommand;
use crate::context::Context;
use crate::error::CctlError;
use crate::settings::Settings;
use objects::{DEFAULT_NAMESPACE, Object, ProvisionedMachine, SSH_CREDENTIAL_SECRET, Secret};
use ssh_client::Connector;
use state::ObjectStore;
use tracing::info;

pub async fn run(command: DeleteCommand, settings: &Settings, connector: &dyn Connector) -> Result<(), CctlError> {
    let mut session = Session::open(&settings.state_path)?;
    let result = match command {
        DeleteCommand::Credential => credential(&mut session.store),
        DeleteCommand::Machine(args) => {
            let mut ctx = Context::new(&mut session.store, connector, settings);
            actuator::delete_machine(&mut ctx, &args.name).await
        }
    };
    session.close(result)
}

/// Remove the SSH credential unless a host still logs in with it
pub(crate) fn credential(store: &mut ObjectStore) -> Result<(), CctlError> {
    let users: Vec<String> = store
        .list::<ProvisionedMachine>(DEFAULT_NAMESPACE)
        .into_iter()
        .filter(|pm| pm.spec.ssh_config.credential_secret == SSH_CREDENTIAL_SECRET)
        .map(|pm| pm.name().to_string())
        .collect();
    if !users.is_empty() {
        return Err(CctlError::Validation(format!(
            "credential is used by provisioned machines {}",
            users.join(", ")
        )));
    }
    store.delete::<Secret>(DEFAULT_NAMESPACE, SSH_CREDENTIAL_SECRET)?;
    info!("Deleted credential");
    Ok(())
}
