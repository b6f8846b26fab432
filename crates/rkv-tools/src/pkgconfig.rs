//! pkg-config integration

use crate::{check_exit, run_command_with_env, ExternalTool, ToolConfig, ToolError, ToolResult};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// pkg-config (or pkgconf) wrapper
pub struct PkgConfig {
    config: ToolConfig,
    executable: Option<PathBuf>,
}

impl PkgConfig {
    pub fn new(config: ToolConfig) -> Self {
        // pkg-config is a host tool, the cross prefix does not apply
        let host_only = ToolConfig {
            cross_prefix: None,
            ..config
        };
        let executable = host_only.resolve("pkg-config", &["pkgconf"]);
        Self {
            config: host_only,
            executable,
        }
    }

    /// Query a module's version with the search path restricted to `pc_dir`
    pub async fn modversion(&self, pc_dir: &Path, module: &str) -> ToolResult<String> {
        let exe = self
            .executable
            .as_ref()
            .ok_or_else(|| ToolError::NotFound("pkg-config".to_string()))?;

        let envs = [
            ("PKG_CONFIG_PATH", pc_dir.as_os_str()),
            ("PKG_CONFIG_LIBDIR", pc_dir.as_os_str()),
        ];
        let (stdout, stderr, code) = run_command_with_env(
            exe,
            &[OsStr::new("--modversion"), OsStr::new(module)],
            &envs,
            self.config.timeout_secs,
        )
        .await?;
        check_exit("pkg-config", &stderr, code)?;

        let version = stdout.lines().next().unwrap_or("").trim();
        if version.is_empty() {
            return Err(ToolError::ParseError(format!(
                "pkg-config returned no version for {}",
                module
            )));
        }
        Ok(version.to_string())
    }
}

impl ExternalTool for PkgConfig {
    fn name(&self) -> &str {
        "pkg-config"
    }

    fn executable_path(&self) -> Option<&Path> {
        self.executable.as_deref()
    }
}
