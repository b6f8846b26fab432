//! Ordered verification checks
//!
//! Each check is a descriptor tagged [`Criticality::Critical`] or
//! [`Criticality::Advisory`]. The verifier runs them in order and stops at
//! the first critical check that produced a failure.

pub mod architecture;
pub mod binaries;
pub mod dependencies;
pub mod features;
pub mod install_dir;
pub mod libraries;
pub mod pkgconfig;

use crate::inspect::Inspector;
use crate::layout::InstallationLayout;
use crate::{FailureKind, Severity, VerifyConfig};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Whether a failing check halts verification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Criticality {
    Critical,
    Advisory,
}

/// One outcome produced by a check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<FailureKind>,
}

impl CheckResult {
    pub fn pass(message: impl Into<String>) -> Self {
        Self::new(Severity::Pass, message, None)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message, None)
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(Severity::Warn, message, None)
    }

    pub fn fail(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::new(Severity::Fail, message, Some(kind))
    }

    fn new(severity: Severity, message: impl Into<String>, kind: Option<FailureKind>) -> Self {
        Self {
            severity,
            message: message.into(),
            hint: None,
            kind,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_optional_hint(mut self, hint: Option<&str>) -> Self {
        self.hint = hint.map(|h| h.to_string());
        self
    }

    pub fn with_kind(mut self, kind: FailureKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn is_fail(&self) -> bool {
        self.severity == Severity::Fail
    }

    /// The same result with a failure reported as a warning
    pub fn downgraded(self) -> Self {
        match self.severity {
            Severity::Fail => Self {
                severity: Severity::Warn,
                ..self
            },
            _ => self,
        }
    }
}

/// Results of one step, in the order the verifier ran it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    pub name: String,
    pub criticality: Criticality,
    pub results: Vec<CheckResult>,
}

impl StepReport {
    pub fn failed(&self) -> bool {
        self.results.iter().any(CheckResult::is_fail)
    }

    pub fn warnings(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.severity == Severity::Warn)
            .count()
    }

    /// Worst severity among the results
    pub fn outcome(&self) -> Severity {
        self.results
            .iter()
            .map(|r| r.severity)
            .max()
            .unwrap_or(Severity::Info)
    }

    /// First remediation hint attached to a failure
    pub fn failure_hint(&self) -> Option<&str> {
        self.results
            .iter()
            .filter(|r| r.is_fail())
            .find_map(|r| r.hint.as_deref())
    }
}

/// State shared between checks during one run
pub struct CheckContext<'a> {
    pub config: &'a VerifyConfig,
    pub layout: &'a InstallationLayout,
    pub inspector: &'a dyn Inspector,
    /// Set by the binary presence check
    pub primary_binary: Option<PathBuf>,
}

impl<'a> CheckContext<'a> {
    pub fn new(
        config: &'a VerifyConfig,
        layout: &'a InstallationLayout,
        inspector: &'a dyn Inspector,
    ) -> Self {
        Self {
            config,
            layout,
            inspector,
            primary_binary: None,
        }
    }

    /// The primary binary, or a failure explaining why a later check cannot run
    pub fn require_primary(&self) -> Result<PathBuf, CheckResult> {
        self.primary_binary.clone().ok_or_else(|| {
            CheckResult::fail(
                FailureKind::MissingArtifact,
                format!(
                    "bin/{} is not available; binary presence check did not pass",
                    self.config.primary_binary
                ),
            )
        })
    }
}

/// A single verification step
#[async_trait]
pub trait Check: Send + Sync {
    /// Step name shown in the report
    fn name(&self) -> &'static str;

    fn criticality(&self) -> Criticality;

    /// Run the step; may record artifacts in the context for later steps
    async fn run(&self, ctx: &mut CheckContext<'_>) -> Vec<CheckResult>;
}

/// The standard checklist, in execution order
pub fn default_checks() -> Vec<Box<dyn Check>> {
    vec![
        Box::new(install_dir::InstallDirCheck),
        Box::new(binaries::BinaryPresenceCheck),
        Box::new(architecture::ArchitectureCheck),
        Box::new(dependencies::DependencyCheck),
        Box::new(features::FeatureScanCheck),
        Box::new(libraries::LibraryInventoryCheck),
        Box::new(pkgconfig::PkgConfigInventoryCheck),
    ]
}

/// Human-readable byte count, e.g. `12.4 MiB`
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
