//! Install root precondition

use super::{Check, CheckContext, CheckResult, Criticality};
use crate::config::INSTALL_DIR_ENV;
use crate::FailureKind;
use async_trait::async_trait;

pub struct InstallDirCheck;

#[async_trait]
impl Check for InstallDirCheck {
    fn name(&self) -> &'static str {
        "Installation directory"
    }

    fn criticality(&self) -> Criticality {
        Criticality::Critical
    }

    async fn run(&self, ctx: &mut CheckContext<'_>) -> Vec<CheckResult> {
        let root = ctx.layout.root();

        if root.is_dir() {
            return vec![CheckResult::pass(format!("install directory {}", root.display()))];
        }

        let message = if root.exists() {
            format!("{} exists but is not a directory", root.display())
        } else {
            format!("install directory {} not found", root.display())
        };
        vec![CheckResult::fail(FailureKind::MissingArtifact, message).with_hint(format!(
            "run `make install` in the FFmpeg build directory first, or set {} to the install prefix",
            INSTALL_DIR_ENV
        ))]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testing::FakeInspector;
    use crate::{InstallationLayout, Severity, VerifyConfig};

    #[tokio::test]
    async fn test_missing_install_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let layout = InstallationLayout::new(dir.path().join("install"));
        let config = VerifyConfig::default();
        let inspector = FakeInspector::healthy();
        let mut ctx = CheckContext::new(&config, &layout, &inspector);

        let results = InstallDirCheck.run(&mut ctx).await;
        assert_eq!(results[0].severity, Severity::Fail);
        assert_eq!(results[0].kind, Some(FailureKind::MissingArtifact));
        assert!(results[0].hint.as_deref().unwrap().contains("make install"));
    }

    #[tokio::test]
    async fn test_file_instead_of_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("install");
        std::fs::write(&path, "").unwrap();
        let layout = InstallationLayout::new(path);
        let config = VerifyConfig::default();
        let inspector = FakeInspector::healthy();
        let mut ctx = CheckContext::new(&config, &layout, &inspector);

        let results = InstallDirCheck.run(&mut ctx).await;
        assert!(results[0].message.contains("not a directory"));
    }
}
