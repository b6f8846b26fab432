//! strings(1) integration

use crate::{check_exit, run_command, ExternalTool, ToolConfig, ToolError, ToolResult};
use once_cell::sync::Lazy;
use regex::Regex;
use rkv_parsers::ExtractedString;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

static OFFSET_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*([0-9a-fA-F]+)\s(.*)$").unwrap());

/// Strings extraction tool
pub struct Strings {
    config: ToolConfig,
    executable: Option<PathBuf>,
}

impl Strings {
    pub fn new(config: ToolConfig) -> Self {
        let executable = config.resolve("strings", &["llvm-strings"]);
        Self { config, executable }
    }

    /// Extract strings with offset information, scanning the whole file
    pub async fn extract(&self, file_path: &Path, min_length: usize) -> ToolResult<Vec<ExtractedString>> {
        let exe = self
            .executable
            .as_ref()
            .ok_or_else(|| ToolError::NotFound("strings".to_string()))?;

        let min_length = min_length.to_string();
        let (stdout, stderr, code) = run_command(
            exe,
            &[
                OsStr::new("-a"),
                OsStr::new("-t"),
                OsStr::new("x"),
                OsStr::new("-n"),
                OsStr::new(&min_length),
                file_path.as_os_str(),
            ],
            self.config.timeout_secs,
        )
        .await?;
        check_exit("strings", &stderr, code)?;

        let strings = parse_offset_output(&stdout);
        tracing::debug!("strings extracted {} entries from {}", strings.len(), file_path.display());
        Ok(strings)
    }
}

impl ExternalTool for Strings {
    fn name(&self) -> &str {
        "strings"
    }

    fn executable_path(&self) -> Option<&Path> {
        self.executable.as_deref()
    }
}

/// Parse `strings -t x` output into offset/value pairs
pub fn parse_offset_output(output: &str) -> Vec<ExtractedString> {
    output
        .lines()
        .filter_map(|line| {
            let caps = OFFSET_LINE.captures(line)?;
            let offset = u64::from_str_radix(&caps[1], 16).ok()?;
            Some(ExtractedString {
                value: caps[2].to_string(),
                offset,
            })
        })
        .collect()
}
