//! Settings shared by every command

use crate::cli::GlobalArgs;
use crate::error::CctlError;
use std::path::PathBuf;

/// Where helpers come from and how hosts are reached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// State file
    pub state_path: PathBuf,
    /// Skip host key verification on every connection
    pub insecure_ignore_host_key: bool,
    /// Root URL of helper downloads
    pub artifact_base_url: String,
}

impl Settings {
    /// Download URL of `tool` at `version`
    ///
    /// `<base>/<tool>/releases/download/v<version>/<tool>`
    pub fn artifact_url(&self, tool: &str, version: &str) -> String {
        format!(
            "{}/{}/releases/download/v{}/{}",
            self.artifact_base_url.trim_end_matches('/'),
            tool,
            version,
            tool
        )
    }
}

impl TryFrom<&GlobalArgs> for Settings {
    type Error = CctlError;

    fn try_from(args: &GlobalArgs) -> Result<Self, Self::Error> {
        let base = &args.artifact_base_url;
        if !(base.starts_with("https://") || base.starts_with("http://")) {
            return Err(CctlError::InvalidConfig(format!(
                "artifact base URL {} is not an http(s) URL",
                base
            )));
        }
        if args.state.as_os_str().is_empty() {
            return Err(CctlError::InvalidConfig("state file path is empty".to_string()));
        }
        Ok(Self {
            state_path: args.state.clone(),
            insecure_ignore_host_key: args.insecure_ignore_host_key,
            artifact_base_url: base.clone(),
        })
    }
}
