//! Mock Connector for unit testing
//!
//! This module provides an in-memory implementation of [`Connector`] and
//! [`RemoteExecutor`] that can be used in unit tests without any SSH server.
//!
//! All executors handed out by one [`MockConnector`] share its state: a single
//! ordered log of every remote operation (across hosts), scripted command
//! responses, and a per-host virtual filesystem. The handful of file commands
//! the provided [`RemoteExecutor`] helpers issue (`mv`, `cp`, `rm`, `test -e`,
//! `cat`) are applied to that filesystem.

use crate::error::SshError;
use crate::executor_trait::{CommandOutput, ConnectionTarget, Connector, RemoteExecutor, split_words};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// One recorded remote operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// Host the operation targeted
    pub host: String,
    /// What was done
    pub op: RecordedOp,
}

/// Kind of recorded operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedOp {
    /// `run(command)`
    Run(String),
    /// `write_file(path, mode, contents)`
    WriteFile {
        /// Destination
        path: String,
        /// Mode
        mode: u32,
        /// Bytes written
        contents: Vec<u8>,
    },
    /// `read_file(path)`
    ReadFile(String),
}

#[derive(Debug, Clone)]
struct ScriptedResponse {
    host: Option<String>,
    prefix: String,
    output: CommandOutput,
    creates: Option<Vec<u8>>,
}

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<RecordedCall>,
    responses: Vec<ScriptedResponse>,
    files: HashMap<String, BTreeMap<String, Vec<u8>>>,
    connections: Vec<String>,
    unreachable: Vec<String>,
}

/// Mock Connector for testing
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    state: Arc<Mutex<MockState>>,
}

impl MockConnector {
    /// Create a new mock connector
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Answer commands starting with `prefix` with `output` on every host
    ///
    /// Later registrations take precedence over earlier ones.
    pub fn respond(&self, prefix: &str, output: CommandOutput) {
        self.push_response(None, prefix, output, None);
    }

    /// Answer commands starting with `prefix` with `output` on `host` only
    pub fn respond_on(&self, host: &str, prefix: &str, output: CommandOutput) {
        self.push_response(Some(host), prefix, output, None);
    }

    /// Answer commands starting with `prefix` on `host` by succeeding and
    /// creating a file at the command's last argument
    pub fn respond_creating_file(&self, host: &str, prefix: &str, contents: impl Into<Vec<u8>>) {
        self.push_response(Some(host), prefix, CommandOutput::default(), Some(contents.into()));
    }

    fn push_response(
        &self,
        host: Option<&str>,
        prefix: &str,
        output: CommandOutput,
        creates: Option<Vec<u8>>,
    ) {
        self.lock().responses.push(ScriptedResponse {
            host: host.map(str::to_string),
            prefix: prefix.to_string(),
            output,
            creates,
        });
    }

    /// Refuse connections to `host` (for test setup)
    pub fn set_unreachable(&self, host: &str) {
        self.lock().unreachable.push(host.to_string());
    }

    /// Put a file on `host` (for test setup)
    pub fn add_file(&self, host: &str, path: &str, contents: impl Into<Vec<u8>>) {
        self.lock()
            .files
            .entry(host.to_string())
            .or_default()
            .insert(path.to_string(), contents.into());
    }

    /// Current contents of `path` on `host`
    pub fn file(&self, host: &str, path: &str) -> Option<Vec<u8>> {
        self.lock()
            .files
            .get(host)
            .and_then(|files| files.get(path))
            .cloned()
    }

    /// Every recorded operation, in issue order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    /// Commands run on `host`, in issue order
    pub fn commands(&self, host: &str) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.host == host)
            .filter_map(|c| match &c.op {
                RecordedOp::Run(command) => Some(command.clone()),
                _ => None,
            })
            .collect()
    }

    /// `(host, command)` for every command run, in issue order
    pub fn all_commands(&self) -> Vec<(String, String)> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match &c.op {
                RecordedOp::Run(command) => Some((c.host.clone(), command.clone())),
                _ => None,
            })
            .collect()
    }

    /// Hosts connected to, in order
    pub fn connections(&self) -> Vec<String> {
        self.lock().connections.clone()
    }
}

#[async_trait::async_trait]
impl Connector for MockConnector {
    async fn connect(&self, target: &ConnectionTarget) -> Result<Box<dyn RemoteExecutor>, SshError> {
        let mut state = self.lock();
        if state.unreachable.contains(&target.host) {
            return Err(SshError::Dial {
                host: target.host.clone(),
                port: target.port,
                message: "connection refused".to_string(),
            });
        }
        state.connections.push(target.host.clone());
        Ok(Box::new(MockRemoteExecutor {
            host: target.host.clone(),
            state: Arc::clone(&self.state),
        }))
    }
}

/// In-memory executor for one host
#[derive(Debug, Clone)]
pub struct MockRemoteExecutor {
    host: String,
    state: Arc<Mutex<MockState>>,
}

impl MockRemoteExecutor {
    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MockState {
    fn files_mut(&mut self, host: &str) -> &mut BTreeMap<String, Vec<u8>> {
        self.files.entry(host.to_string()).or_default()
    }

    fn scripted(&self, host: &str, command: &str) -> Option<ScriptedResponse> {
        self.responses
            .iter()
            .rev()
            .find(|r| {
                r.host.as_deref().is_none_or(|h| h == host) && command.starts_with(&r.prefix)
            })
            .cloned()
    }

    /// Apply the file commands the executor helpers emit
    fn builtin(&mut self, host: &str, command: &str) -> Option<CommandOutput> {
        let words = split_words(command);
        let args: Vec<&str> = words.iter().map(String::as_str).collect();
        let files = self.files_mut(host);
        match args.as_slice() {
            ["mv", "-f", src, dst] => Some(match files.remove(*src) {
                Some(contents) => {
                    files.insert((*dst).to_string(), contents);
                    CommandOutput::default()
                }
                None => CommandOutput::failed(1, format!("mv: cannot stat '{}'", src)),
            }),
            ["cp", "-f", src, dst] => Some(match files.get(*src).cloned() {
                Some(contents) => {
                    files.insert((*dst).to_string(), contents);
                    CommandOutput::default()
                }
                None => CommandOutput::failed(1, format!("cp: cannot stat '{}'", src)),
            }),
            ["rm", "-f", path] => {
                files.remove(*path);
                Some(CommandOutput::default())
            }
            ["test", "-e", path] => Some(if files.contains_key(*path) {
                CommandOutput::default()
            } else {
                CommandOutput::failed(1, "")
            }),
            ["cat", path] => Some(match files.get(*path) {
                Some(contents) => CommandOutput::ok(contents.clone()),
                None => CommandOutput::failed(1, format!("cat: {}: No such file or directory", path)),
            }),
            ["mkdir", ..] | ["chmod", ..] => Some(CommandOutput::default()),
            _ => None,
        }
    }
}

#[async_trait::async_trait]
impl RemoteExecutor for MockRemoteExecutor {
    fn host(&self) -> &str {
        &self.host
    }

    async fn run(&self, command: &str) -> Result<CommandOutput, SshError> {
        let mut state = self.lock();
        state.calls.push(RecordedCall {
            host: self.host.clone(),
            op: RecordedOp::Run(command.to_string()),
        });

        if let Some(response) = state.scripted(&self.host, command) {
            if let (Some(contents), Some(path)) = (response.creates, split_words(command).pop()) {
                state.files_mut(&self.host).insert(path, contents);
            }
            return Ok(response.output);
        }
        Ok(state
            .builtin(&self.host, command)
            .unwrap_or_default())
    }

    async fn write_file(&self, path: &str, mode: u32, contents: &[u8]) -> Result<(), SshError> {
        let mut state = self.lock();
        state.calls.push(RecordedCall {
            host: self.host.clone(),
            op: RecordedOp::WriteFile {
                path: path.to_string(),
                mode,
                contents: contents.to_vec(),
            },
        });
        state
            .files_mut(&self.host)
            .insert(path.to_string(), contents.to_vec());
        Ok(())
    }

    async fn read_file(&self, path: &str) -> Result<Vec<u8>, SshError> {
        let mut state = self.lock();
        state.calls.push(RecordedCall {
            host: self.host.clone(),
            op: RecordedOp::ReadFile(path.to_string()),
        });
        state
            .files
            .get(&self.host)
            .and_then(|files| files.get(path))
            .cloned()
            .ok_or_else(|| SshError::NotFound {
                host: self.host.clone(),
                path: path.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(host: &str) -> ConnectionTarget {
        ConnectionTarget {
            host: host.to_string(),
            port: 22,
            username: "root".to_string(),
            private_key: String::new(),
            public_keys: Vec::new(),
            insecure_ignore_host_key: true,
        }
    }

    #[tokio::test]
    async fn test_place_file_moves_through_tmp() {
        let connector = MockConnector::new();
        let exec = connector.connect(&target("10.0.0.1")).await.unwrap();

        exec.place_file("/etc/etcd/pki/ca.crt", 0o644, b"CERT")
            .await
            .unwrap();

        assert_eq!(connector.file("10.0.0.1", "/etc/etcd/pki/ca.crt").unwrap(), b"CERT");
        assert!(connector.file("10.0.0.1", "/tmp/ca.crt").is_none());
        assert_eq!(
            connector.commands("10.0.0.1"),
            vec![
                "mkdir -p -m 755 /etc/etcd/pki".to_string(),
                "mv -f /tmp/ca.crt /etc/etcd/pki/ca.crt".to_string(),
            ]
        );
        match &connector.calls()[0].op {
            RecordedOp::WriteFile { path, mode, .. } => {
                assert_eq!(path, "/tmp/ca.crt");
                assert_eq!(*mode, 0o644);
            }
            other => panic!("unexpected first call: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_scripted_failure_surfaces_streams() {
        let connector = MockConnector::new();
        connector.respond_on(
            "10.0.0.1",
            "etcdadm init",
            CommandOutput {
                stdout: b"starting".to_vec(),
                stderr: b"port in use".to_vec(),
                status: 1,
            },
        );
        let exec = connector.connect(&target("10.0.0.1")).await.unwrap();

        let output = exec.run("etcdadm init").await.unwrap();
        assert_eq!(output.status, 1);

        match exec.run_checked("etcdadm init").await {
            Err(SshError::RemoteExit { stdout, stderr, .. }) => {
                assert_eq!(stdout, "starting");
                assert_eq!(stderr, "port in use");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_host_specific_responses() {
        let connector = MockConnector::new();
        connector.respond("hostname", CommandOutput::ok("any"));
        connector.respond_on("10.0.0.2", "hostname", CommandOutput::ok("two"));

        let one = connector.connect(&target("10.0.0.1")).await.unwrap();
        let two = connector.connect(&target("10.0.0.2")).await.unwrap();

        assert_eq!(one.run("hostname").await.unwrap().stdout, b"any");
        assert_eq!(two.run("hostname").await.unwrap().stdout, b"two");
        assert_eq!(connector.connections(), vec!["10.0.0.1", "10.0.0.2"]);
    }

    #[tokio::test]
    async fn test_exists_read_and_remove() {
        let connector = MockConnector::new();
        connector.add_file("10.0.0.1", "/tmp/x", "data");
        let exec = connector.connect(&target("10.0.0.1")).await.unwrap();

        assert!(exec.exists("/tmp/x").await.unwrap());
        assert_eq!(exec.read_file("/tmp/x").await.unwrap(), b"data");

        exec.remove("/tmp/x").await.unwrap();
        assert!(!exec.exists("/tmp/x").await.unwrap());
        assert!(matches!(
            exec.read_file("/tmp/x").await,
            Err(SshError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_creating_response_writes_last_argument() {
        let connector = MockConnector::new();
        connector.respond_creating_file("10.0.0.1", "/opt/bin/etcdctl.sh snapshot save", "SNAP");
        let exec = connector.connect(&target("10.0.0.1")).await.unwrap();

        exec.run_checked("/opt/bin/etcdctl.sh snapshot save /tmp/s.db")
            .await
            .unwrap();
        assert_eq!(connector.file("10.0.0.1", "/tmp/s.db").unwrap(), b"SNAP");
    }

    #[tokio::test]
    async fn test_unreachable_host() {
        let connector = MockConnector::new();
        connector.set_unreachable("10.0.0.9");
        assert!(matches!(
            connector.connect(&target("10.0.0.9")).await,
            Err(SshError::Dial { .. })
        ));
    }
}
