//! Unit tests for schema migrations

#[cfg(test)]
mod tests {
    use crate::error::MigrationError;
    use crate::migrate::*;
    use crate::state_file::{CURRENT_SCHEMA_VERSION, StateFile};
    use objects::ClusterConfig;
    use std::fs;
    use tempfile::TempDir;

    const V0_STATE: &str = r"secretList:
  items: []
clusterList:
  items:
  - apiVersion: cluster.k8s.io/v1alpha1
    kind: Cluster
    metadata:
      name: test
      namespace: default
    spec:
      clusterNetwork:
        services:
          cidrBlocks: [10.96.0.0/12]
        pods:
          cidrBlocks: [10.244.0.0/16]
        serviceDomain: cluster.local
      providerSpec:
        etcdCaSecret: etcd-ca
        apiServerCaSecret: apiserver-ca
        frontProxyCaSecret: front-proxy-ca
        serviceAccountKeySecret: serviceaccount-key
        bootstrapTokenSecret: bootstrap-token
machineList:
  items: []
provisionedMachineList:
  items: []
";

    #[test]
    fn test_v0_to_v2_attaches_default_cluster_config() {
        let outcome = migrate_bytes(V0_STATE.as_bytes()).unwrap();
        let MigrationOutcome::Migrated { from, state } = outcome else {
            panic!("expected a migration to run");
        };

        assert_eq!(from, 0);
        assert_eq!(state.schema_version, 2);
        assert_eq!(state.cluster_list.items.len(), 1);

        let config = state.cluster_list.items[0]
            .spec
            .provider_spec
            .cluster_config
            .clone()
            .unwrap();
        assert_eq!(config, ClusterConfig::default());
        assert_eq!(config.kube_api_server["allow-privileged"], "true");
        assert_eq!(config.kube_api_server["service-node-port-range"], "80-32767");
        assert_eq!(config.kube_controller_manager["pod-eviction-timeout"], "20s");
        let kubelet = config.kubelet.unwrap();
        assert_eq!(kubelet.fail_swap_on, Some(false));
        assert_eq!(kubelet.kube_api_burst, Some(40));
        assert_eq!(kubelet.kube_api_qps, Some(20));
        assert_eq!(kubelet.max_pods, Some(500));
    }

    #[test]
    fn test_v1_keeps_existing_cluster_config() {
        let v1 = V0_STATE.replace(
            "        bootstrapTokenSecret: bootstrap-token\n",
            "        bootstrapTokenSecret: bootstrap-token\n        clusterConfig:\n          kubeAPIServer:\n            v: '4'\n",
        );
        let v1 = format!("schemaVersion: 1\n{}", v1);

        let outcome = migrate_bytes(v1.as_bytes()).unwrap();
        let config = outcome.state().cluster_list.items[0]
            .spec
            .provider_spec
            .cluster_config
            .clone()
            .unwrap();
        assert_eq!(config.kube_api_server.len(), 1);
        assert_eq!(config.kube_api_server["v"], "4");
        assert!(config.kubelet.is_none());
    }

    #[test]
    fn test_empty_document_migrates_to_empty_state() {
        let outcome = migrate_bytes(b"").unwrap();
        assert!(matches!(outcome, MigrationOutcome::Migrated { from: 0, .. }));
        assert_eq!(outcome.state(), &StateFile::new());
    }

    #[test]
    fn test_newer_version_is_rejected() {
        let newer = format!("schemaVersion: {}\n", CURRENT_SCHEMA_VERSION + 1);
        assert!(matches!(
            migrate_bytes(newer.as_bytes()),
            Err(MigrationError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn test_migrate_file_rewrites_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.yaml");
        fs::write(&path, V0_STATE).unwrap();

        let first = migrate_file(&path).unwrap();
        assert!(matches!(first, MigrationOutcome::Migrated { .. }));
        let migrated = fs::read(&path).unwrap();
        assert_eq!(StateFile::read(&path).unwrap().schema_version, 2);

        let second = migrate_file(&path).unwrap();
        assert!(matches!(second, MigrationOutcome::UpToDate(_)));
        assert_eq!(fs::read(&path).unwrap(), migrated);
        assert_eq!(second.state(), first.state());
    }

    #[test]
    fn test_migrate_missing_file_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.yaml");

        let outcome = migrate_file(&path).unwrap();
        assert!(matches!(outcome, MigrationOutcome::UpToDate(_)));
        assert!(!path.exists());
    }

    #[test]
    fn test_steps_are_contiguous() {
        let steps = migrations();
        for (i, step) in steps.iter().enumerate() {
            assert_eq!(step.from_version() as usize, i, "step {}", step.name());
        }
        assert_eq!(steps.len() as u32, CURRENT_SCHEMA_VERSION);
    }
}
