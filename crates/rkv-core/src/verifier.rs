//! Checklist runner

use crate::checks::{default_checks, Check, CheckContext, CheckResult, Criticality, StepReport};
use crate::inspect::{Inspector, ToolInspector};
use crate::layout::InstallationLayout;
use crate::report::deploy;
use crate::{CoreResult, VerifyConfig};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Overall verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Passed,
    Failed,
}

/// Complete verification result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub install_dir: PathBuf,
    /// Number of checks in the checklist, including any not reached
    pub total_steps: usize,
    pub steps: Vec<StepReport>,
    pub status: VerificationStatus,
    /// Critical step that stopped the run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aborted_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_sha256: Option<String>,
    /// Deployment instructions, only on success
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deployment: Vec<String>,
}

impl VerificationReport {
    pub fn passed(&self) -> bool {
        self.status == VerificationStatus::Passed
    }

    /// Process exit status: warnings never fail the run
    pub fn exit_code(&self) -> i32 {
        if self.passed() {
            0
        } else {
            1
        }
    }

    pub fn warnings(&self) -> usize {
        self.steps.iter().map(StepReport::warnings).sum()
    }

    /// The step that aborted the run, if any
    pub fn failed_step(&self) -> Option<&StepReport> {
        let name = self.aborted_at.as_deref()?;
        self.steps.iter().find(|s| s.name == name)
    }
}

/// Runs the checklist against one install tree
pub struct Verifier {
    config: VerifyConfig,
    inspector: Box<dyn Inspector>,
    checks: Vec<Box<dyn Check>>,
}

impl Verifier {
    /// Verifier backed by the real tools
    pub fn new(config: VerifyConfig) -> Self {
        let inspector = ToolInspector::new(&config.tools, config.min_string_length);
        for (tool, path) in inspector.available_tools() {
            debug!("Using {} at {}", tool, path.display());
        }
        Self::with_inspector(config, Box::new(inspector))
    }

    pub fn with_inspector(config: VerifyConfig, inspector: Box<dyn Inspector>) -> Self {
        Self {
            config,
            inspector,
            checks: default_checks(),
        }
    }

    /// Append a check after the standard ones
    pub fn add_check(&mut self, check: Box<dyn Check>) {
        self.checks.push(check);
    }

    /// Run every check in order, stopping at the first critical failure
    pub async fn run(&self) -> CoreResult<VerificationReport> {
        self.config.validate()?;

        let id = Uuid::new_v4();
        let started_at = Utc::now();
        let layout = InstallationLayout::new(&self.config.install_dir);
        let mut ctx = CheckContext::new(&self.config, &layout, self.inspector.as_ref());

        let mut steps = Vec::with_capacity(self.checks.len());
        let mut aborted_at = None;

        for check in &self.checks {
            info!("Running check: {}", check.name());
            let mut results = check.run(&mut ctx).await;

            if check.criticality() == Criticality::Advisory {
                results = results.into_iter().map(CheckResult::downgraded).collect();
            }

            let step = StepReport {
                name: check.name().to_string(),
                criticality: check.criticality(),
                results,
            };
            let failed = step.failed();
            steps.push(step);

            if failed {
                warn!("Critical check failed: {}", check.name());
                aborted_at = Some(check.name().to_string());
                break;
            }
        }

        let primary_sha256 = ctx.primary_binary.as_deref().and_then(|path| {
            sha256_file(path)
                .map_err(|e| debug!("Cannot hash {}: {}", path.display(), e))
                .ok()
        });

        let status = if aborted_at.is_some() {
            VerificationStatus::Failed
        } else {
            VerificationStatus::Passed
        };
        let deployment = match status {
            VerificationStatus::Passed => deploy::guidance(&self.config, &layout),
            VerificationStatus::Failed => Vec::new(),
        };

        Ok(VerificationReport {
            id,
            started_at,
            completed_at: Utc::now(),
            install_dir: self.config.install_dir.clone(),
            total_steps: self.checks.len(),
            steps,
            status,
            aborted_at,
            primary_sha256,
            deployment,
        })
    }
}

fn sha256_file(path: &Path) -> std::io::Result<String> {
    let data = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testing::{full_install_tree, install_tree, FakeInspector};
    use crate::{FailureKind, Severity};
    use async_trait::async_trait;
    use rkv_parsers::CpuArchitecture;

    fn verifier(root: &Path, inspector: FakeInspector) -> Verifier {
        let config = VerifyConfig {
            install_dir: root.to_path_buf(),
            ..Default::default()
        };
        Verifier::with_inspector(config, Box::new(inspector))
    }

    fn step_names(report: &VerificationReport) -> Vec<&str> {
        report.steps.iter().map(|s| s.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_healthy_build_passes() {
        let dir = full_install_tree();
        let report = verifier(dir.path(), FakeInspector::healthy()).run().await.unwrap();

        assert!(report.passed());
        assert_eq!(report.exit_code(), 0);
        assert_eq!(report.steps.len(), 7);
        assert_eq!(report.warnings(), 0);
        assert!(report.aborted_at.is_none());
        assert_eq!(report.primary_sha256.as_deref().map(str::len), Some(64));
        assert!(!report.deployment.is_empty());
    }

    #[tokio::test]
    async fn test_missing_primary_aborts_before_later_checks() {
        let dir = install_tree(&[("bin/ffprobe", &b"x"[..])]);
        let report = verifier(dir.path(), FakeInspector::healthy()).run().await.unwrap();

        assert_eq!(report.exit_code(), 1);
        assert_eq!(step_names(&report), vec!["Installation directory", "Binary presence"]);
        let failed = report.failed_step().unwrap();
        assert_eq!(failed.results[0].kind, Some(FailureKind::MissingArtifact));
        assert!(report.deployment.is_empty());
        assert!(report.primary_sha256.is_none());
    }

    #[tokio::test]
    async fn test_missing_install_dir_aborts_first() {
        let dir = tempfile::tempdir().unwrap();
        let report = verifier(&dir.path().join("install"), FakeInspector::healthy())
            .run()
            .await
            .unwrap();

        assert_eq!(report.exit_code(), 1);
        assert_eq!(report.aborted_at.as_deref(), Some("Installation directory"));
        assert_eq!(report.steps.len(), 1);
    }

    #[tokio::test]
    async fn test_wrong_architecture_skips_dependency_and_feature_checks() {
        let dir = full_install_tree();
        let inspector = FakeInspector {
            cpu: CpuArchitecture::X86_64,
            ..FakeInspector::healthy()
        };
        let report = verifier(dir.path(), inspector).run().await.unwrap();

        assert_eq!(report.exit_code(), 1);
        assert_eq!(report.aborted_at.as_deref(), Some("Architecture"));
        assert!(!step_names(&report).contains(&"Dynamic dependencies"));
        assert!(!step_names(&report).contains(&"Feature strings"));
    }

    #[tokio::test]
    async fn test_missing_rga_fails_citing_librga() {
        let dir = full_install_tree();
        let inspector = FakeInspector::healthy().with_needed(&["librockchip_mpp.so.1", "libdrm.so.2"]);
        let report = verifier(dir.path(), inspector).run().await.unwrap();

        assert_eq!(report.exit_code(), 1);
        let failed = report.failed_step().unwrap();
        assert_eq!(failed.name, "Dynamic dependencies");
        let fail = failed.results.iter().find(|r| r.is_fail()).unwrap();
        assert!(fail.message.contains("librga"));
    }

    #[tokio::test]
    async fn test_missing_pkgconfig_dir_only_warns() {
        let dir = install_tree(&[
            ("bin/ffmpeg", &b"x"[..]),
            ("bin/ffprobe", &b"x"[..]),
            ("lib/libavcodec.a", &b"x"[..]),
        ]);
        let report = verifier(dir.path(), FakeInspector::healthy()).run().await.unwrap();

        assert_eq!(report.exit_code(), 0);
        let last = report.steps.last().unwrap();
        assert_eq!(last.name, "Package-config metadata");
        assert_eq!(last.outcome(), Severity::Warn);
    }

    #[tokio::test]
    async fn test_missing_lister_continues() {
        let dir = full_install_tree();
        let report = verifier(dir.path(), FakeInspector::healthy().without_readelf())
            .run()
            .await
            .unwrap();

        assert!(report.passed());
        assert_eq!(report.steps.len(), 7);
        assert_eq!(report.steps[3].results[0].kind, Some(FailureKind::ToolUnavailable));
    }

    #[tokio::test]
    async fn test_repeated_runs_classify_identically() {
        let dir = full_install_tree();
        let inspector = FakeInspector::healthy().with_needed(&["librockchip_mpp.so.1", "librga.so.2"]);
        let verifier = verifier(dir.path(), inspector);

        let severities = |report: &VerificationReport| -> Vec<Vec<Severity>> {
            report
                .steps
                .iter()
                .map(|s| s.results.iter().map(|r| r.severity).collect())
                .collect()
        };
        let first = verifier.run().await.unwrap();
        let second = verifier.run().await.unwrap();

        assert_eq!(severities(&first), severities(&second));
        assert_eq!(first.status, second.status);
        assert_ne!(first.id, second.id);
    }

    struct AlwaysFails;

    #[async_trait]
    impl Check for AlwaysFails {
        fn name(&self) -> &'static str {
            "Always fails"
        }

        fn criticality(&self) -> Criticality {
            Criticality::Advisory
        }

        async fn run(&self, _ctx: &mut CheckContext<'_>) -> Vec<CheckResult> {
            vec![CheckResult::fail(FailureKind::MissingArtifact, "nothing here")]
        }
    }

    #[tokio::test]
    async fn test_advisory_failure_is_downgraded() {
        let dir = full_install_tree();
        let mut verifier = verifier(dir.path(), FakeInspector::healthy());
        verifier.add_check(Box::new(AlwaysFails));

        let report = verifier.run().await.unwrap();
        assert!(report.passed());
        assert_eq!(report.steps.len(), 8);
        assert_eq!(report.steps[7].results[0].severity, Severity::Warn);
    }

    #[tokio::test]
    async fn test_invalid_config_is_error() {
        let dir = full_install_tree();
        let mut config = VerifyConfig {
            install_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        config.codec_patterns.names.clear();

        let result = Verifier::with_inspector(config, Box::new(FakeInspector::healthy()))
            .run()
            .await;
        assert!(result.is_err());
    }
}
