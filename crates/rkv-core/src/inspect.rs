//! Binary and metadata introspection
//!
//! Checks never shell out directly; they ask an [`Inspector`] and get typed
//! records back. [`ToolInspector`] is the production implementation built
//! on the in-process parsers and the binutils/pkg-config adapters.

use crate::CoreResult;
use async_trait::async_trait;
use rkv_parsers::elf::{self, MachineInfo, HEADER_READ_LEN};
use rkv_parsers::pkgconfig;
use rkv_tools::{DynamicSection, ExternalTool, PkgConfig, Readelf, Strings, ToolConfig, ToolError};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

/// Where a string scan came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanSource {
    Tool(String),
    /// Built-in extractor, with the reason the tool was not used
    InProcess(String),
}

/// Printable strings of a binary, in file order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringScan {
    pub source: ScanSource,
    pub strings: Vec<String>,
}

/// Where a package version came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VersionSource {
    PkgConfig,
    PcFile,
}

/// Name and version declared by a `.pc` file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PkgVersion {
    pub module: String,
    pub name: String,
    pub version: Option<String>,
    pub source: VersionSource,
}

#[async_trait]
pub trait Inspector: Send + Sync {
    /// Identify the target machine from the ELF header
    async fn machine(&self, binary: &Path) -> CoreResult<MachineInfo>;

    /// Shared libraries and run paths the binary was linked with
    async fn dynamic_section(&self, binary: &Path) -> CoreResult<DynamicSection>;

    /// Embedded printable strings
    async fn strings(&self, binary: &Path) -> CoreResult<StringScan>;

    /// Declared version of a `.pc` file
    async fn pkg_version(&self, pc_file: &Path) -> CoreResult<PkgVersion>;
}

/// Inspector backed by goblin, readelf, strings and pkg-config
pub struct ToolInspector {
    readelf: Readelf,
    strings: Strings,
    pkg_config: PkgConfig,
    min_string_length: usize,
}

impl ToolInspector {
    pub fn new(config: &ToolConfig, min_string_length: usize) -> Self {
        Self {
            readelf: Readelf::new(config.clone()),
            strings: Strings::new(config.clone()),
            pkg_config: PkgConfig::new(config.clone()),
            min_string_length,
        }
    }

    /// Names and paths of the external tools that were found
    pub fn available_tools(&self) -> Vec<(&str, &Path)> {
        let tools: [&dyn ExternalTool; 3] = [&self.readelf, &self.strings, &self.pkg_config];
        tools
            .into_iter()
            .filter_map(|t| t.executable_path().map(|p| (t.name(), p)))
            .collect()
    }
}

#[async_trait]
impl Inspector for ToolInspector {
    async fn machine(&self, binary: &Path) -> CoreResult<MachineInfo> {
        let mut header = Vec::with_capacity(HEADER_READ_LEN);
        std::fs::File::open(binary)?
            .take(HEADER_READ_LEN as u64)
            .read_to_end(&mut header)?;
        Ok(elf::parse_machine(&header)?)
    }

    async fn dynamic_section(&self, binary: &Path) -> CoreResult<DynamicSection> {
        Ok(self.readelf.dynamic_section(binary).await?)
    }

    async fn strings(&self, binary: &Path) -> CoreResult<StringScan> {
        let reason = match self.strings.extract(binary, self.min_string_length).await {
            Ok(found) => {
                return Ok(StringScan {
                    source: ScanSource::Tool(self.strings.name().to_string()),
                    strings: found.into_iter().map(|s| s.value).collect(),
                })
            }
            Err(ToolError::NotFound(_)) => {
                tracing::debug!("strings not found, scanning {} in-process", binary.display());
                "strings tool not found".to_string()
            }
            Err(e) => {
                tracing::warn!("strings failed ({}), scanning {} in-process", e, binary.display());
                format!("strings failed: {}", e)
            }
        };

        let data = std::fs::read(binary)?;
        let found = rkv_parsers::strings::extract_strings(&data, self.min_string_length);
        Ok(StringScan {
            source: ScanSource::InProcess(reason),
            strings: found.into_iter().map(|s| s.value).collect(),
        })
    }

    async fn pkg_version(&self, pc_file: &Path) -> CoreResult<PkgVersion> {
        let parsed = pkgconfig::parse_pc_file(pc_file);
        let module = pc_file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let queried = match pc_file.parent() {
            Some(dir) => match self.pkg_config.modversion(dir, &module).await {
                Ok(version) => Some(version),
                Err(e) => {
                    tracing::debug!("pkg-config --modversion {} unavailable: {}", module, e);
                    None
                }
            },
            None => None,
        };

        match (parsed, queried) {
            (Ok(pc), Some(version)) => Ok(PkgVersion {
                module,
                name: pc.display_name().to_string(),
                version: Some(version),
                source: VersionSource::PkgConfig,
            }),
            (Err(_), Some(version)) => Ok(PkgVersion {
                name: module.clone(),
                module,
                version: Some(version),
                source: VersionSource::PkgConfig,
            }),
            (Ok(pc), None) => Ok(PkgVersion {
                module,
                name: pc.display_name().to_string(),
                version: pc.version,
                source: VersionSource::PcFile,
            }),
            (Err(e), None) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_inspector() -> ToolInspector {
        let mut config = ToolConfig::default();
        for tool in ["readelf", "strings", "pkg-config"] {
            config
                .tool_paths
                .insert(tool.to_string(), "/nonexistent/rkv-tool".into());
        }
        ToolInspector {
            readelf: Readelf::new(config.clone()),
            strings: Strings::new(config.clone()),
            pkg_config: PkgConfig::new(config),
            min_string_length: 4,
        }
    }

    #[tokio::test]
    async fn test_machine_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ffmpeg");
        let mut data = vec![0u8; 64];
        data[..4].copy_from_slice(b"\x7fELF");
        data[4] = 2; // ELFCLASS64
        data[5] = 1; // little-endian
        data[6] = 1;
        data[16..18].copy_from_slice(&3u16.to_le_bytes()); // ET_DYN
        data[18..20].copy_from_slice(&183u16.to_le_bytes()); // EM_AARCH64
        data[20..24].copy_from_slice(&1u32.to_le_bytes());
        data[52..54].copy_from_slice(&64u16.to_le_bytes());
        data.extend_from_slice(b"\0h264_rkmpp\0");
        std::fs::write(&path, &data).unwrap();

        let info = ToolInspector::new(&ToolConfig::default(), 4)
            .machine(&path)
            .await
            .unwrap();
        assert_eq!(info.cpu, rkv_parsers::CpuArchitecture::Arm64);
    }

    #[tokio::test]
    async fn test_non_elf_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ffmpeg");
        std::fs::write(&path, "#!/bin/sh\n").unwrap();

        let err = offline_inspector().machine(&path).await.unwrap_err();
        assert!(matches!(err, crate::CoreError::Parse(_)));
    }

    #[tokio::test]
    async fn test_strings_fall_back_in_process() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ffmpeg");
        std::fs::write(&path, b"\x00\x01h264_rkmpp\x00\x02scale_rkrga\x00").unwrap();

        let scan = offline_inspector().strings(&path).await.unwrap();
        assert_eq!(
            scan.source,
            ScanSource::InProcess("strings tool not found".to_string())
        );
        assert_eq!(scan.strings, vec!["h264_rkmpp", "scale_rkrga"]);
    }

    #[tokio::test]
    async fn test_dynamic_section_without_readelf() {
        let err = offline_inspector()
            .dynamic_section(Path::new("/tmp/ffmpeg"))
            .await
            .unwrap_err();
        assert!(err.is_tool_unavailable());
    }

    #[tokio::test]
    async fn test_pkg_version_from_pc_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("libavutil.pc");
        std::fs::write(&path, "Name: libavutil\nVersion: 59.39.100\n").unwrap();

        let version = offline_inspector().pkg_version(&path).await.unwrap();
        assert_eq!(version.module, "libavutil");
        assert_eq!(version.version.as_deref(), Some("59.39.100"));
        assert_eq!(version.source, VersionSource::PcFile);
    }
}
