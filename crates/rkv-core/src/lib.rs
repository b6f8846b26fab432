//! Cross-build verification engine
//!
//! This crate runs an ordered checklist against the install tree of a
//! cross-compiled FFmpeg build (Rockchip MPP/RGA enabled) and produces a
//! report with a final pass/fail status and remediation hints.

pub mod checks;
pub mod config;
pub mod inspect;
pub mod layout;
pub mod report;
pub mod sdk;
pub mod verifier;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use checks::{Check, CheckContext, CheckResult, Criticality, StepReport};
pub use config::{FeaturePattern, LibraryRequirement, VerifyConfig};
pub use inspect::{Inspector, ToolInspector};
pub use layout::InstallationLayout;
pub use verifier::{VerificationReport, VerificationStatus, Verifier};

pub use rkv_parsers::CpuArchitecture;
pub use rkv_tools::ToolConfig;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Tool(#[from] rkv_tools::ToolError),

    #[error(transparent)]
    Parse(#[from] rkv_parsers::ParseError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Report error: {0}")]
    Report(String),
}

impl CoreError {
    /// True when the error means an introspection tool could not be found
    pub fn is_tool_unavailable(&self) -> bool {
        matches!(self, CoreError::Tool(rkv_tools::ToolError::NotFound(_)))
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

/// Severity of a single check result
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Pass,
    Warn,
    Fail,
}

impl Severity {
    /// Fixed-width prefix used in the text report
    pub fn glyph(&self) -> &'static str {
        match self {
            Severity::Info => "[INFO]",
            Severity::Pass => "[PASS]",
            Severity::Warn => "[WARN]",
            Severity::Fail => "[FAIL]",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "Info"),
            Severity::Pass => write!(f, "Pass"),
            Severity::Warn => write!(f, "Warn"),
            Severity::Fail => write!(f, "Fail"),
        }
    }
}

/// Categories of verification failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    MissingArtifact,
    WrongArchitecture,
    MissingRequiredDependency,
    MissingRequiredFeature,
    ToolUnavailable,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::MissingArtifact => write!(f, "missing artifact"),
            FailureKind::WrongArchitecture => write!(f, "wrong architecture"),
            FailureKind::MissingRequiredDependency => write!(f, "missing required dependency"),
            FailureKind::MissingRequiredFeature => write!(f, "missing required feature"),
            FailureKind::ToolUnavailable => write!(f, "tool unavailable"),
        }
    }
}
