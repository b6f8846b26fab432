//! External tool integration for build verification
//!
//! Thin adapters over the binutils and pkg-config tools a cross toolchain
//! ships with. Each adapter locates its executable (explicit path, cross
//! prefix, then PATH), runs it with a timeout, and parses the text output
//! into typed records.

pub mod pkgconfig;
pub mod readelf;
pub mod strings;

pub use pkgconfig::PkgConfig;
pub use readelf::{DynamicSection, Readelf};
pub use strings::Strings;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Tool timeout after {0} seconds")]
    Timeout(u64),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ToolResult<T> = Result<T, ToolError>;

/// An external program located at construction time
pub trait ExternalTool: Send + Sync {
    fn name(&self) -> &str;

    /// Resolved executable, `None` when the tool was not found
    fn executable_path(&self) -> Option<&Path>;
}

/// Tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Explicit tool paths keyed by tool name (`readelf`, `strings`, `pkg-config`)
    pub tool_paths: HashMap<String, PathBuf>,

    /// Cross toolchain prefix, e.g. `aarch64-linux-gnu-`
    pub cross_prefix: Option<String>,

    /// Timeout for each tool invocation (seconds)
    pub timeout_secs: u64,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            tool_paths: HashMap::new(),
            cross_prefix: None,
            timeout_secs: 60,
        }
    }
}

impl ToolConfig {
    /// Locate a tool: explicit path first, then `<cross_prefix><tool>`,
    /// then each fallback name on PATH. An explicit path that does not
    /// exist disables the tool rather than falling back.
    pub fn resolve(&self, tool: &str, fallbacks: &[&str]) -> Option<PathBuf> {
        if let Some(path) = self.tool_paths.get(tool) {
            if path.is_file() {
                return Some(path.clone());
            }
            let found = get_command_path(path.as_os_str());
            if found.is_none() {
                tracing::warn!("Configured path for {} not usable: {}", tool, path.display());
            }
            return found;
        }

        if let Some(prefix) = self.cross_prefix.as_deref().filter(|p| !p.is_empty()) {
            if let Some(found) = get_command_path(format!("{}{}", prefix, tool)) {
                return Some(found);
            }
        }

        std::iter::once(tool)
            .chain(fallbacks.iter().copied())
            .find_map(get_command_path)
    }
}

/// Run a command with timeout
pub async fn run_command<S: AsRef<OsStr>>(
    cmd: &Path,
    args: &[S],
    timeout_secs: u64,
) -> ToolResult<(String, String, i32)> {
    run_command_with_env(cmd, args, &[], timeout_secs).await
}

/// Run a command with extra environment variables and a timeout
pub async fn run_command_with_env<S: AsRef<OsStr>>(
    cmd: &Path,
    args: &[S],
    envs: &[(&str, &OsStr)],
    timeout_secs: u64,
) -> ToolResult<(String, String, i32)> {
    use tokio::process::Command;
    use tokio::time::{timeout, Duration};

    tracing::debug!("Running {}", cmd.display());

    let mut command = Command::new(cmd);
    command.args(args).kill_on_drop(true);
    for (key, value) in envs {
        command.env(key, value);
    }

    let result = timeout(Duration::from_secs(timeout_secs), command.output()).await;

    match result {
        Ok(Ok(output)) => {
            let stdout = String::from_utf8_lossy(&output.stdout).to_string();
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            let code = output.status.code().unwrap_or(-1);
            Ok((stdout, stderr, code))
        }
        Ok(Err(e)) => Err(ToolError::ExecutionFailed(format!("{}: {}", cmd.display(), e))),
        Err(_) => Err(ToolError::Timeout(timeout_secs)),
    }
}

/// Turn a non-zero exit into an error carrying the tool's stderr
pub(crate) fn check_exit(tool: &str, stderr: &str, code: i32) -> ToolResult<()> {
    if code == 0 {
        return Ok(());
    }
    let detail = stderr.lines().next().unwrap_or("").trim();
    Err(ToolError::ExecutionFailed(format!(
        "{} exited with status {}{}{}",
        tool,
        code,
        if detail.is_empty() { "" } else { ": " },
        detail
    )))
}

/// Check if a command exists in PATH
pub fn command_exists<S: AsRef<OsStr>>(cmd: S) -> bool {
    which::which(cmd).is_ok()
}

/// Get command path
pub fn get_command_path<S: AsRef<OsStr>>(cmd: S) -> Option<PathBuf> {
    which::which(cmd).ok()
}
