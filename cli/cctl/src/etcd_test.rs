//! Unit tests for etcd lifecycle operations

#[cfg(test)]
mod tests {
    use crate::context::Context;
    use crate::error::CctlError;
    use crate::etcd::{RESTORE_SNAPSHOT_PATH, recover, snapshot};
    use crate::test_utils::*;
    use objects::{Cluster, DEFAULT_NAMESPACE, Machine, MachineRole, MachineSpec};
    use ssh_client::{CommandOutput, MockConnector, RecordedOp};
    use state::ObjectStore;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const MASTERS: [&str; 3] = ["10.0.0.1", "10.0.0.2", "10.0.0.3"];

    /// Three masters whose members were recorded before the quorum was lost
    fn store_with_masters() -> ObjectStore {
        let mut store = seeded_store();
        let mut cluster = store.list::<Cluster>(DEFAULT_NAMESPACE).remove(0);
        for (i, host) in MASTERS.iter().enumerate() {
            let mut machine = declare_machine(&mut store, host, MachineRole::Master);
            let member = etcd_member(i as u64 + 1, host);
            machine.status.etcd_member = Some(member.clone());
            store.update_status(&machine).unwrap();
            cluster.status.etcd_members.insert(member);
        }
        store.update_status(&cluster).unwrap();
        store
    }

    fn index_of(commands: &[(String, String)], host: &str, prefix: &str) -> usize {
        commands
            .iter()
            .position(|(h, c)| h == host && c.starts_with(prefix))
            .unwrap_or_else(|| panic!("{} never ran {:?}", host, prefix))
    }

    #[tokio::test]
    async fn test_snapshot_copies_and_cleans_up() {
        let mut store = seeded_store();
        declare_machine(&mut store, "10.0.0.1", MachineRole::Master);
        let connector = MockConnector::new();
        connector.respond_creating_file("10.0.0.1", "/opt/bin/etcdctl.sh snapshot save", "SNAPSHOT");
        let settings = test_settings(Path::new("/unused"));
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("etcd.db");

        let ctx = Context::new(&mut store, &connector, &settings);
        snapshot(&ctx, "10.0.0.1", &dest).await.unwrap();

        assert_eq!(fs::read(&dest).unwrap(), b"SNAPSHOT");
        let commands = connector.commands("10.0.0.1");
        assert_eq!(commands.len(), 2);
        let remote = commands[0].rsplit(' ').next().unwrap().to_string();
        assert!(remote.starts_with("/tmp/etcd-snapshot-"));
        assert!(remote.ends_with(".db"));
        assert_eq!(commands[1], format!("rm -f {}", remote));
        assert!(connector.file("10.0.0.1", &remote).is_none());
    }

    #[tokio::test]
    async fn test_snapshot_selects_master_by_name_or_host() {
        let mut store = seeded_store();
        let pm = store.create(provisioned_machine("10.0.0.2")).unwrap();
        crate::actuator::binding::bind(
            &mut store,
            Machine::new("master-a", MachineSpec::with_role(MachineRole::Master)),
            pm,
        )
        .unwrap();
        declare_machine(&mut store, "10.0.0.5", MachineRole::Node);
        let connector = MockConnector::new();
        connector.respond_creating_file("10.0.0.2", "/opt/bin/etcdctl.sh snapshot save", "S");
        let settings = test_settings(Path::new("/unused"));
        let dir = TempDir::new().unwrap();
        let ctx = Context::new(&mut store, &connector, &settings);

        snapshot(&ctx, "master-a", &dir.path().join("a.db")).await.unwrap();
        snapshot(&ctx, "10.0.0.2", &dir.path().join("b.db")).await.unwrap();
        assert_eq!(connector.connections(), vec!["10.0.0.2", "10.0.0.2"]);

        // Nodes carry no etcd
        let err = snapshot(&ctx, "10.0.0.5", &dir.path().join("c.db"))
            .await
            .unwrap_err();
        assert!(matches!(err, CctlError::NotFound(_)), "{:?}", err);
    }

    #[tokio::test]
    async fn test_failed_snapshot_writes_nothing_locally() {
        let mut store = seeded_store();
        declare_machine(&mut store, "10.0.0.1", MachineRole::Master);
        let connector = MockConnector::new();
        connector.respond_on(
            "10.0.0.1",
            "/opt/bin/etcdctl.sh",
            CommandOutput::failed(2, "context deadline exceeded"),
        );
        let settings = test_settings(Path::new("/unused"));
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("etcd.db");

        let ctx = Context::new(&mut store, &connector, &settings);
        assert!(snapshot(&ctx, "10.0.0.1", &dest).await.is_err());
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_recover_rebuilds_etcd_from_first_master() {
        let mut store = store_with_masters();
        let connector = MockConnector::new();
        for (i, host) in MASTERS.iter().enumerate() {
            script_host(&connector, host, 2001 + i as u64);
        }
        connector.respond_on(
            "10.0.0.1",
            "docker ps",
            CommandOutput::ok("abc123\n"),
        );
        let settings = test_settings(Path::new("/unused"));
        let dir = TempDir::new().unwrap();
        let snapshot_path = dir.path().join("etcd.snapshot");
        fs::write(&snapshot_path, "SNAPSHOT").unwrap();

        let mut ctx = Context::new(&mut store, &connector, &settings);
        recover(&mut ctx, &snapshot_path).await.unwrap();

        let commands = connector.all_commands();
        let init = index_of(
            &commands,
            "10.0.0.1",
            "/opt/bin/etcdadm init --snapshot /tmp/etcd.snapshot --version 3.3.8",
        );
        for host in MASTERS {
            assert!(index_of(&commands, host, "/opt/bin/etcdadm reset --skip-remove-member") < init);
            assert_eq!(
                connector.file(host, "/etc/etcd/pki/ca.crt").unwrap(),
                b"etcd-ca cert"
            );
        }
        let join_2 = index_of(&commands, "10.0.0.2", "/opt/bin/etcdadm join https://10.0.0.1:2379");
        let join_3 = index_of(&commands, "10.0.0.3", "/opt/bin/etcdadm join https://10.0.0.1:2379");
        assert!(init < join_2 && join_2 < join_3);
        assert!(
            !commands
                .iter()
                .any(|(h, c)| h == "10.0.0.1" && c.starts_with("/opt/bin/etcdadm join"))
        );

        let uploaded = connector.calls().into_iter().any(|call| {
            call.host == "10.0.0.1"
                && call.op
                    == RecordedOp::WriteFile {
                        path: RESTORE_SNAPSHOT_PATH.to_string(),
                        mode: 0o600,
                        contents: b"SNAPSHOT".to_vec(),
                    }
        });
        assert!(uploaded);
        assert!(connector.file("10.0.0.1", RESTORE_SNAPSHOT_PATH).is_none());

        assert!(commands.contains(&("10.0.0.1".to_string(), "docker stop abc123".to_string())));
        assert!(commands.contains(&("10.0.0.1".to_string(), "docker rm abc123".to_string())));
        assert!(!commands.iter().any(|(h, c)| h == "10.0.0.2" && c.starts_with("docker stop")));

        let cluster = store.list::<Cluster>(DEFAULT_NAMESPACE).remove(0);
        let ids: Vec<u64> = cluster.status.etcd_members.list().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![2001, 2002, 2003]);
        for (i, host) in MASTERS.iter().enumerate() {
            let machine: Machine = store.get(DEFAULT_NAMESPACE, host).unwrap();
            assert_eq!(machine.status.etcd_member.unwrap().id, 2001 + i as u64);
        }
    }

    #[tokio::test]
    async fn test_recover_stops_at_first_failure() {
        let mut store = store_with_masters();
        let connector = MockConnector::new();
        for (i, host) in MASTERS.iter().enumerate() {
            script_host(&connector, host, 2001 + i as u64);
        }
        connector.respond_on(
            "10.0.0.1",
            "/opt/bin/etcdadm init",
            CommandOutput::failed(1, "restore failed"),
        );
        let settings = test_settings(Path::new("/unused"));
        let dir = TempDir::new().unwrap();
        let snapshot_path = dir.path().join("etcd.snapshot");
        fs::write(&snapshot_path, "SNAPSHOT").unwrap();

        let mut ctx = Context::new(&mut store, &connector, &settings);
        assert!(recover(&mut ctx, &snapshot_path).await.is_err());

        assert!(
            !connector
                .all_commands()
                .iter()
                .any(|(_, c)| c.starts_with("/opt/bin/etcdadm join"))
        );
        // The old members were reset away and nothing new was reported
        let cluster = store.list::<Cluster>(DEFAULT_NAMESPACE).remove(0);
        assert!(cluster.status.etcd_members.is_empty());
    }

    #[tokio::test]
    async fn test_recover_needs_a_snapshot_file() {
        let mut store = store_with_masters();
        let connector = MockConnector::new();
        let settings = test_settings(Path::new("/unused"));

        let mut ctx = Context::new(&mut store, &connector, &settings);
        let err = recover(&mut ctx, Path::new("/nonexistent/etcd.snapshot"))
            .await
            .unwrap_err();
        assert!(matches!(err, CctlError::Io { .. }), "{:?}", err);
        assert!(connector.calls().is_empty());
    }

    #[tokio::test]
    async fn test_recover_needs_masters() {
        let mut store = seeded_store();
        store.create(provisioned_machine("10.0.0.5")).unwrap();
        let connector = MockConnector::new();
        let settings = test_settings(Path::new("/unused"));
        let dir = TempDir::new().unwrap();
        let snapshot_path = dir.path().join("etcd.snapshot");
        fs::write(&snapshot_path, "SNAPSHOT").unwrap();

        let mut ctx = Context::new(&mut store, &connector, &settings);
        let err = recover(&mut ctx, &snapshot_path).await.unwrap_err();
        assert!(matches!(err, CctlError::NotFound(_)), "{:?}", err);
        assert!(connector.connections().is_empty());
    }
}
