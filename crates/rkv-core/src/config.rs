//! Verification configuration
//!
//! One [`VerifyConfig`] is built at startup (defaults, optionally a JSON
//! file, then command-line overrides) and handed to the verifier.

use crate::{CoreError, CoreResult};
use regex::Regex;
use rkv_parsers::CpuArchitecture;
use rkv_tools::ToolConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the install directory
pub const INSTALL_DIR_ENV: &str = "INSTALL_DIR";

/// Install directory used when nothing else is configured
pub const DEFAULT_INSTALL_DIR: &str = "install";

/// A shared library the primary binary should be linked against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryRequirement {
    /// Human-readable role, e.g. "hardware 2D acceleration (RGA)"
    pub label: String,
    /// Substring matched against NEEDED entries, e.g. "librga"
    pub pattern: String,
    /// Remediation shown when the library is missing
    #[serde(default)]
    pub hint: Option<String>,
}

impl LibraryRequirement {
    pub fn new(label: &str, pattern: &str, hint: Option<&str>) -> Self {
        Self {
            label: label.to_string(),
            pattern: pattern.to_string(),
            hint: hint.map(|h| h.to_string()),
        }
    }
}

/// A family of embedded names: `{names}` joined with `suffix`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeaturePattern {
    pub label: String,
    pub names: Vec<String>,
    pub suffix: String,
    #[serde(default)]
    pub hint: Option<String>,
}

impl FeaturePattern {
    pub fn new(label: &str, names: &[&str], suffix: &str, hint: Option<&str>) -> Self {
        Self {
            label: label.to_string(),
            names: names.iter().map(|n| n.to_string()).collect(),
            suffix: suffix.to_string(),
            hint: hint.map(|h| h.to_string()),
        }
    }

    /// Every accepted full name, e.g. `h264_rkmpp`
    pub fn expected(&self) -> Vec<String> {
        self.names
            .iter()
            .map(|n| format!("{}{}", n, self.suffix))
            .collect()
    }

    /// Compile into a regex matching any accepted name
    pub fn regex(&self) -> CoreResult<Regex> {
        if self.names.is_empty() {
            return Err(CoreError::Config(format!(
                "feature pattern '{}' has no names",
                self.label
            )));
        }
        let alternatives: Vec<String> = self.names.iter().map(|n| regex::escape(n)).collect();
        let pattern = format!("(?:{}){}", alternatives.join("|"), regex::escape(&self.suffix));
        Regex::new(&pattern)
            .map_err(|e| CoreError::Config(format!("invalid pattern for '{}': {}", self.label, e)))
    }
}

/// Complete verifier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifyConfig {
    /// Root of the install tree (`bin/`, `lib/`, `lib/pkgconfig/`)
    pub install_dir: PathBuf,
    /// Executable that must be present
    pub primary_binary: String,
    /// Executable whose absence is only a warning
    pub secondary_binary: Option<String>,
    /// Target the binaries must be built for
    pub expected_arch: CpuArchitecture,
    pub required_libraries: Vec<LibraryRequirement>,
    pub optional_libraries: Vec<LibraryRequirement>,
    pub codec_patterns: FeaturePattern,
    pub filter_patterns: FeaturePattern,
    /// Name prefixes of the libraries the build installs into `lib/`
    pub library_prefixes: Vec<String>,
    /// Minimum length for embedded string extraction
    pub min_string_length: usize,
    pub tools: ToolConfig,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            install_dir: PathBuf::from(DEFAULT_INSTALL_DIR),
            primary_binary: "ffmpeg".to_string(),
            secondary_binary: Some("ffprobe".to_string()),
            expected_arch: CpuArchitecture::Arm64,
            required_libraries: vec![
                LibraryRequirement::new(
                    "hardware video codec (MPP)",
                    "librockchip_mpp",
                    Some("configure FFmpeg with --enable-rkmpp and make sure librockchip_mpp is in the sysroot"),
                ),
                LibraryRequirement::new(
                    "hardware 2D acceleration (RGA)",
                    "librga",
                    Some("configure FFmpeg with --enable-rkrga and make sure librga is in the sysroot"),
                ),
            ],
            optional_libraries: vec![LibraryRequirement::new(
                "DRM support",
                "libdrm",
                Some("configure FFmpeg with --enable-libdrm for DRM PRIME frame export"),
            )],
            codec_patterns: FeaturePattern::new(
                "rkmpp codecs",
                &["h264", "hevc", "vp8", "vp9", "av1"],
                "_rkmpp",
                Some("configure FFmpeg with --enable-rkmpp (requires --enable-version3)"),
            ),
            filter_patterns: FeaturePattern::new(
                "rkrga filters",
                &["scale", "vpp", "overlay", "transpose"],
                "_rkrga",
                Some("configure FFmpeg with --enable-rkrga"),
            ),
            library_prefixes: vec![
                "libav".to_string(),
                "libsw".to_string(),
                "libpost".to_string(),
            ],
            min_string_length: rkv_parsers::strings::DEFAULT_MIN_LENGTH,
            tools: ToolConfig::default(),
        }
    }
}

impl VerifyConfig {
    /// Load a JSON config file; missing fields take their defaults
    pub fn from_file(path: &Path) -> CoreResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| CoreError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Reject configurations the checks cannot run with
    pub fn validate(&self) -> CoreResult<()> {
        if self.primary_binary.trim().is_empty() {
            return Err(CoreError::Config("primary binary name is empty".to_string()));
        }
        if self.expected_arch == CpuArchitecture::Unknown {
            return Err(CoreError::Config("expected architecture is unknown".to_string()));
        }
        self.codec_patterns.regex()?;
        self.filter_patterns.regex()?;
        Ok(())
    }
}
