//! RemoteExecutor and Connector traits for mocking
//!
//! The actuator only ever talks to a host through [`RemoteExecutor`], and only
//! ever opens one through [`Connector`]. The russh-backed implementations live in
//! `client.rs`; tests use the in-memory ones in `mock.rs`.

use crate::error::SshError;
use std::fmt;
use std::path::Path;
use tracing::error;

/// Result of one remote command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Captured standard output
    pub stdout: Vec<u8>,
    /// Captured standard error
    pub stderr: Vec<u8>,
    /// Exit status
    pub status: u32,
}

impl CommandOutput {
    /// Successful output carrying `stdout`
    pub fn ok(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: Vec::new(),
            status: 0,
        }
    }

    /// Failed output with `status` and `stderr`
    pub fn failed(status: u32, stderr: impl Into<Vec<u8>>) -> Self {
        Self {
            stdout: Vec::new(),
            stderr: stderr.into(),
            status,
        }
    }

    /// Whether the command exited 0
    pub fn success(&self) -> bool {
        self.status == 0
    }

    /// Standard output as text
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Standard error as text
    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// Turn a failed output into a [`SshError::RemoteExit`]
    pub fn into_remote_exit(self, host: &str, command: &str) -> SshError {
        SshError::RemoteExit {
            host: host.to_string(),
            command: command.to_string(),
            status: self.status,
            stdout: self.stdout_lossy(),
            stderr: self.stderr_lossy(),
        }
    }
}

/// Everything needed to open a session to one host
#[derive(Clone)]
pub struct ConnectionTarget {
    /// Host name or IP
    pub host: String,
    /// SSH port
    pub port: u16,
    /// Login user
    pub username: String,
    /// PEM/OpenSSH private key
    pub private_key: String,
    /// Accepted host keys, `authorized_keys` form
    pub public_keys: Vec<String>,
    /// Skip host key verification entirely
    pub insecure_ignore_host_key: bool,
}

impl fmt::Debug for ConnectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionTarget")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("private_key", &"<redacted>")
            .field("public_keys", &self.public_keys)
            .field("insecure_ignore_host_key", &self.insecure_ignore_host_key)
            .finish()
    }
}

/// Opens [`RemoteExecutor`] handles
#[async_trait::async_trait]
pub trait Connector: Send + Sync {
    /// Open an authenticated, host-key-verified session to `target`
    async fn connect(&self, target: &ConnectionTarget) -> Result<Box<dyn RemoteExecutor>, SshError>;
}

/// A command and file channel to one host
///
/// Commands run through `run` are executed with privilege escalation. Files
/// written with `write_file` are written as the transport user, so privileged
/// destinations go through [`RemoteExecutor::place_file`].
///
/// Nothing here retries; a failure is returned to the caller as-is.
#[async_trait::async_trait]
pub trait RemoteExecutor: Send + Sync {
    /// Host this executor talks to
    fn host(&self) -> &str;

    /// Run `command` as root. Non-zero exits are returned as output, not errors.
    async fn run(&self, command: &str) -> Result<CommandOutput, SshError>;

    /// Write `contents` to `path` as the transport user and set its mode
    async fn write_file(&self, path: &str, mode: u32, contents: &[u8]) -> Result<(), SshError>;

    /// Read `path` as root. Fails with [`SshError::NotFound`] if it does not exist.
    async fn read_file(&self, path: &str) -> Result<Vec<u8>, SshError>;

    /// Run `command` as root, turning a non-zero exit into [`SshError::RemoteExit`]
    async fn run_checked(&self, command: &str) -> Result<CommandOutput, SshError> {
        let output = self.run(command).await?;
        if output.success() {
            return Ok(output);
        }
        error!(
            "Command failed on {} (exit {}): {}\nstdout: {}\nstderr: {}",
            self.host(),
            output.status,
            command,
            output.stdout_lossy(),
            output.stderr_lossy()
        );
        Err(output.into_remote_exit(self.host(), command))
    }

    /// `mkdir -p` with `mode` on the leaf
    async fn mkdir_all(&self, path: &str, mode: u32) -> Result<(), SshError> {
        self.run_checked(&format!("mkdir -p -m {:o} {}", mode, shell_quote(path)))
            .await?;
        Ok(())
    }

    /// Move `src` over `dst`
    async fn move_file(&self, src: &str, dst: &str) -> Result<(), SshError> {
        self.run_checked(&format!("mv -f {} {}", shell_quote(src), shell_quote(dst)))
            .await?;
        Ok(())
    }

    /// Copy `src` over `dst`
    async fn copy_file(&self, src: &str, dst: &str) -> Result<(), SshError> {
        self.run_checked(&format!("cp -f {} {}", shell_quote(src), shell_quote(dst)))
            .await?;
        Ok(())
    }

    /// Whether `path` exists
    async fn exists(&self, path: &str) -> Result<bool, SshError> {
        let command = format!("test -e {}", shell_quote(path));
        let output = self.run(&command).await?;
        match output.status {
            0 => Ok(true),
            1 => Ok(false),
            _ => Err(output.into_remote_exit(self.host(), &command)),
        }
    }

    /// Remove `path`; absent files are not an error
    async fn remove(&self, path: &str) -> Result<(), SshError> {
        self.run_checked(&format!("rm -f {}", shell_quote(path))).await?;
        Ok(())
    }

    /// Put `contents` at a privileged `path`: write `/tmp/<basename>`, then
    /// move it into place as root
    async fn place_file(&self, path: &str, mode: u32, contents: &[u8]) -> Result<(), SshError> {
        let staging = staging_path(path);
        self.write_file(&staging, mode, contents).await?;
        if let Some(parent) = Path::new(path).parent().and_then(Path::to_str) {
            if !parent.is_empty() && parent != "/" && parent != "/tmp" {
                self.mkdir_all(parent, 0o755).await?;
            }
        }
        if staging != path {
            self.move_file(&staging, path).await?;
        }
        Ok(())
    }
}

/// `/tmp/<basename of path>`
pub fn staging_path(path: &str) -> String {
    let name = Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("cctl-upload");
    format!("/tmp/{}", name)
}

/// Quote `arg` for a POSIX shell. Plain words are returned unchanged.
pub fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./:=@,+%".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

/// Split a command line produced with [`shell_quote`] back into words
///
/// Understands single quotes and the `'\''` escape only, which is all
/// [`shell_quote`] emits.
pub fn split_words(command: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quoted = false;
    let mut chars = command.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                quoted = !quoted;
                in_word = true;
            }
            '\\' if !quoted && chars.peek() == Some(&'\'') => {
                current.push('\'');
                chars.next();
                in_word = true;
            }
            c if c.is_whitespace() && !quoted => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                current.push(c);
                in_word = true;
            }
        }
    }
    if in_word {
        words.push(current);
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_quote_plain_words_unchanged() {
        assert_eq!(shell_quote("/etc/etcd/pki/ca.crt"), "/etc/etcd/pki/ca.crt");
        assert_eq!(shell_quote("https://10.0.0.1:2379"), "https://10.0.0.1:2379");
    }

    #[test]
    fn test_shell_quote_special_characters() {
        assert_eq!(shell_quote(""), "''");
        assert_eq!(shell_quote("a b"), "'a b'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(shell_quote("$(reboot)"), "'$(reboot)'");
    }

    #[test]
    fn test_split_words_inverts_quoting() {
        let args = ["mv", "-f", "/tmp/a b", "it's", "", "plain"];
        let line = args.iter().map(|a| shell_quote(a)).collect::<Vec<_>>().join(" ");
        assert_eq!(split_words(&line), args);
    }

    #[test]
    fn test_staging_path_uses_basename() {
        assert_eq!(staging_path("/etc/kubernetes/pki/sa.key"), "/tmp/sa.key");
        assert_eq!(staging_path("/"), "/tmp/cctl-upload");
    }

    #[test]
    fn test_remote_exit_keeps_streams() {
        let output = CommandOutput {
            stdout: b"partial".to_vec(),
            stderr: b"boom".to_vec(),
            status: 2,
        };
        match output.into_remote_exit("10.0.0.1", "etcdadm init") {
            SshError::RemoteExit {
                host,
                command,
                status,
                stdout,
                stderr,
            } => {
                assert_eq!(host, "10.0.0.1");
                assert_eq!(command, "etcdadm init");
                assert_eq!(status, 2);
                assert_eq!(stdout, "partial");
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
