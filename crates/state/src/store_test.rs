//! Unit tests for the object store

#[cfg(test)]
mod tests {
    use crate::error::StoreError;
    use crate::store::ObjectStore;
    use objects::*;

    fn provisioned(name: &str) -> ProvisionedMachine {
        ProvisionedMachine::new(
            name,
            ProvisionedMachineSpec {
                ssh_config: SshConfig::new(name),
                vip_network_interface: None,
            },
        )
    }

    fn credential() -> Secret {
        SshCredential {
            username: "root".to_string(),
            private_key: "KEY".to_string(),
        }
        .into_secret(SSH_CREDENTIAL_SECRET)
    }

    #[test]
    fn test_create_stamps_identity() {
        let mut store = ObjectStore::new();
        let created = store.create(credential()).unwrap();

        assert!(created.metadata.uid.is_some());
        assert!(created.metadata.creation_timestamp.is_some());
        assert_eq!(created.kind, "Secret");
    }

    #[test]
    fn test_create_twice_is_already_exists() {
        let mut store = ObjectStore::new();
        store.create(credential()).unwrap();

        let err = store.create(credential()).unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { kind: "Secret", .. }));
        assert_eq!(store.list::<Secret>(DEFAULT_NAMESPACE).len(), 1);
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let store = ObjectStore::new();
        let err = store.get::<Machine>(DEFAULT_NAMESPACE, "10.0.0.1").unwrap_err();
        assert_eq!(err.to_string(), "Machine default/10.0.0.1 not found");
    }

    #[test]
    fn test_list_is_name_ascending_and_namespaced() {
        let mut store = ObjectStore::new();
        for name in ["10.0.0.3", "10.0.0.1", "10.0.0.2"] {
            store.create(provisioned(name)).unwrap();
        }
        let mut other = provisioned("10.0.0.0");
        other.metadata.namespace = "other".to_string();
        store.create(other).unwrap();

        let names: Vec<String> = store
            .list::<ProvisionedMachine>(DEFAULT_NAMESPACE)
            .into_iter()
            .map(|pm| pm.metadata.name)
            .collect();
        assert_eq!(names, vec!["10.0.0.1", "10.0.0.2", "10.0.0.3"]);
        assert_eq!(store.list_all::<ProvisionedMachine>().len(), 4);
    }

    #[test]
    fn test_update_keeps_status() {
        let mut store = ObjectStore::new();
        let mut pm = store.create(provisioned("10.0.0.1")).unwrap();
        pm.status.machine_ref = Some("10.0.0.1".to_string());
        store.update_status(&pm).unwrap();

        let mut changed = provisioned("10.0.0.1");
        changed.spec.vip_network_interface = Some("eth1".to_string());
        let updated = store.update(changed).unwrap();

        assert_eq!(updated.status.machine_ref.as_deref(), Some("10.0.0.1"));
        assert_eq!(updated.spec.vip_network_interface.as_deref(), Some("eth1"));
        assert_eq!(updated.metadata.uid, pm.metadata.uid);
    }

    #[test]
    fn test_update_status_keeps_spec() {
        let mut store = ObjectStore::new();
        store.create(provisioned("10.0.0.1")).unwrap();

        let mut pm = provisioned("10.0.0.1");
        pm.spec.ssh_config.port = 2222;
        pm.status.machine_ref = Some("m".to_string());
        let updated = store.update_status(&pm).unwrap();

        assert_eq!(updated.spec.ssh_config.port, 22);
        assert_eq!(updated.status.machine_ref.as_deref(), Some("m"));
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let mut store = ObjectStore::new();
        assert!(matches!(
            store.update(provisioned("nope")),
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            store.update_status(&provisioned("nope")),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_delete() {
        let mut store = ObjectStore::new();
        store.create(provisioned("10.0.0.1")).unwrap();

        let removed = store
            .delete::<ProvisionedMachine>(DEFAULT_NAMESPACE, "10.0.0.1")
            .unwrap();
        assert_eq!(removed.metadata.name, "10.0.0.1");
        assert!(!store.contains::<ProvisionedMachine>(DEFAULT_NAMESPACE, "10.0.0.1"));
        assert!(matches!(
            store.delete::<ProvisionedMachine>(DEFAULT_NAMESPACE, "10.0.0.1"),
            Err(StoreError::NotFound { .. })
        ));
    }
}
