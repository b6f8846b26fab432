//! readelf integration for dynamic section inspection
//!
//! `readelf -d` reads the ELF headers directly, so unlike `ldd` it works on
//! binaries built for another architecture.

use crate::{check_exit, run_command, ExternalTool, ToolConfig, ToolError, ToolResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

static DYNAMIC_ENTRY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\(?(NEEDED|SONAME|RUNPATH|RPATH)\)?\s+[^\[]*\[([^\]]*)\]").unwrap()
});

/// readelf wrapper
pub struct Readelf {
    config: ToolConfig,
    executable: Option<PathBuf>,
}

impl Readelf {
    pub fn new(config: ToolConfig) -> Self {
        let executable = config.resolve("readelf", &["llvm-readelf"]);
        Self { config, executable }
    }

    /// Read the dynamic section of an ELF file
    pub async fn dynamic_section(&self, file_path: &Path) -> ToolResult<DynamicSection> {
        let exe = self
            .executable
            .as_ref()
            .ok_or_else(|| ToolError::NotFound("readelf".to_string()))?;

        let (stdout, stderr, code) = run_command(
            exe,
            &[OsStr::new("-d"), OsStr::new("-W"), file_path.as_os_str()],
            self.config.timeout_secs,
        )
        .await?;
        check_exit("readelf", &stderr, code)?;

        let section = parse_dynamic_section(&stdout);
        tracing::debug!(
            "readelf found {} NEEDED entries in {}",
            section.needed.len(),
            file_path.display()
        );
        Ok(section)
    }
}

impl ExternalTool for Readelf {
    fn name(&self) -> &str {
        "readelf"
    }

    fn executable_path(&self) -> Option<&Path> {
        self.executable.as_deref()
    }
}

/// Entries of interest from an ELF dynamic section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicSection {
    /// False for statically linked binaries
    pub present: bool,
    pub needed: Vec<String>,
    pub soname: Option<String>,
    pub runpath: Vec<String>,
}

impl DynamicSection {
    /// First NEEDED entry containing `pattern`
    pub fn find_needed(&self, pattern: &str) -> Option<&str> {
        self.needed
            .iter()
            .map(String::as_str)
            .find(|lib| lib.contains(pattern))
    }
}

/// Parse `readelf -d` output
pub fn parse_dynamic_section(output: &str) -> DynamicSection {
    let mut section = DynamicSection {
        present: !output.contains("There is no dynamic section"),
        ..Default::default()
    };

    for caps in DYNAMIC_ENTRY.captures_iter(output) {
        let value = caps[2].trim();
        match &caps[1] {
            "NEEDED" => section.needed.push(value.to_string()),
            "SONAME" => section.soname = Some(value.to_string()),
            _ => section.runpath.extend(
                value
                    .split(':')
                    .filter(|p| !p.is_empty())
                    .map(|p| p.to_string()),
            ),
        }
    }

    if !section.needed.is_empty() {
        section.present = true;
    }

    section
}

#[cfg(test)]
mod tests {
    use super::*;

    const FFMPEG_DYNAMIC: &str = "
Dynamic section at offset 0x1f8d0 contains 33 entries:
  Tag        Type                         Name/Value
 0x0000000000000001 (NEEDED)             Shared library: [librockchip_mpp.so.1]
 0x0000000000000001 (NEEDED)             Shared library: [librga.so.2]
 0x0000000000000001 (NEEDED)             Shared library: [libdrm.so.2]
 0x0000000000000001 (NEEDED)             Shared library: [libm.so.6]
 0x0000000000000001 (NEEDED)             Shared library: [libc.so.6]
 0x000000000000001d (RUNPATH)            Library runpath: [$ORIGIN/../lib:/usr/lib/aarch64-linux-gnu]
 0x000000000000000c (INIT)               0x4a000
";

    #[test]
    fn test_parse_needed_and_runpath() {
        let section = parse_dynamic_section(FFMPEG_DYNAMIC);

        assert!(section.present);
        assert_eq!(
            section.needed,
            vec![
                "librockchip_mpp.so.1",
                "librga.so.2",
                "libdrm.so.2",
                "libm.so.6",
                "libc.so.6"
            ]
        );
        assert_eq!(
            section.runpath,
            vec!["$ORIGIN/../lib", "/usr/lib/aarch64-linux-gnu"]
        );
        assert_eq!(section.find_needed("librga"), Some("librga.so.2"));
        assert_eq!(section.find_needed("libvpx"), None);
    }

    #[test]
    fn test_parse_static_binary() {
        let section = parse_dynamic_section("\nThere is no dynamic section in this file.\n");
        assert!(!section.present);
        assert!(section.needed.is_empty());
    }

    #[test]
    fn test_parse_llvm_readelf_output() {
        let output = "
DynamicSection [ (3 entries)
  Tag                Type                 Name/Value
  0x0000000000000001 NEEDED               Shared library: [librockchip_mpp.so.1]
  0x0000000000000001 NEEDED               Shared library: [librga.so.2]
  0x000000000000000f RPATH                Library rpath: [/opt/rk/lib]
]
";
        let section = parse_dynamic_section(output);

        assert!(section.present);
        assert_eq!(section.needed, vec!["librockchip_mpp.so.1", "librga.so.2"]);
        assert_eq!(section.runpath, vec!["/opt/rk/lib"]);
    }

    #[test]
    fn test_parse_soname() {
        let section = parse_dynamic_section(
            " 0x000000000000000e (SONAME)             Library soname: [libavcodec.so.61]\n",
        );
        assert_eq!(section.soname.as_deref(), Some("libavcodec.so.61"));
    }

    #[tokio::test]
    async fn test_unavailable_readelf() {
        let tool = Readelf {
            config: ToolConfig::default(),
            executable: None,
        };
        assert!(tool.executable_path().is_none());
        let err = tool.dynamic_section(Path::new("/tmp/ffmpeg")).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }
}
