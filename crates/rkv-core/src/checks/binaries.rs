//! Primary and secondary executable presence

use super::{format_size, Check, CheckContext, CheckResult, Criticality};
use crate::FailureKind;
use async_trait::async_trait;
use std::path::Path;

pub struct BinaryPresenceCheck;

#[async_trait]
impl Check for BinaryPresenceCheck {
    fn name(&self) -> &'static str {
        "Binary presence"
    }

    fn criticality(&self) -> Criticality {
        Criticality::Critical
    }

    async fn run(&self, ctx: &mut CheckContext<'_>) -> Vec<CheckResult> {
        let mut results = Vec::new();
        let primary = ctx.layout.binary(&ctx.config.primary_binary);

        match file_size(&primary) {
            Some(size) => {
                results.push(CheckResult::pass(format!(
                    "bin/{} ({})",
                    ctx.config.primary_binary,
                    format_size(size)
                )));
                if !is_executable(&primary) {
                    results.push(
                        CheckResult::warn(format!(
                            "bin/{} is not marked executable",
                            ctx.config.primary_binary
                        ))
                        .with_hint(format!("chmod +x {}", primary.display())),
                    );
                }
                ctx.primary_binary = Some(primary);
            }
            None => {
                results.push(
                    CheckResult::fail(
                        FailureKind::MissingArtifact,
                        format!("bin/{} not found in {}", ctx.config.primary_binary, ctx.layout.root().display()),
                    )
                    .with_hint("run `make install` in the FFmpeg build directory first"),
                );
                return results;
            }
        }

        if let Some(secondary) = ctx.config.secondary_binary.as_deref() {
            let path = ctx.layout.binary(secondary);
            match file_size(&path) {
                Some(size) => results.push(CheckResult::pass(format!(
                    "bin/{} ({})",
                    secondary,
                    format_size(size)
                ))),
                None => results.push(
                    CheckResult::warn(format!("bin/{} not found", secondary))
                        .with_kind(FailureKind::MissingArtifact)
                        .with_hint(format!("build it with --enable-{}", secondary)),
                ),
            }
        }

        results
    }
}

/// Size of a regular file, `None` if missing or not a file
fn file_size(path: &Path) -> Option<u64> {
    std::fs::metadata(path)
        .ok()
        .filter(|m| m.is_file())
        .map(|m| m.len())
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(_path: &Path) -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testing::{install_tree, FakeInspector};
    use crate::{InstallationLayout, Severity, VerifyConfig};

    #[tokio::test]
    async fn test_missing_primary_fails_without_artifact() {
        let dir = install_tree(&[("bin/ffprobe", &b"x"[..])]);
        let layout = InstallationLayout::new(dir.path());
        let config = VerifyConfig::default();
        let inspector = FakeInspector::healthy();
        let mut ctx = CheckContext::new(&config, &layout, &inspector);

        let results = BinaryPresenceCheck.run(&mut ctx).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].kind, Some(FailureKind::MissingArtifact));
        assert!(results[0].message.contains("bin/ffmpeg"));
        assert!(ctx.primary_binary.is_none());
    }

    #[tokio::test]
    async fn test_missing_secondary_is_warning() {
        let dir = install_tree(&[("bin/ffmpeg", &b"x"[..])]);
        let layout = InstallationLayout::new(dir.path());
        let config = VerifyConfig::default();
        let inspector = FakeInspector::healthy();
        let mut ctx = CheckContext::new(&config, &layout, &inspector);

        let results = BinaryPresenceCheck.run(&mut ctx).await;
        assert!(results.iter().all(|r| r.severity != Severity::Fail));
        assert!(results
            .iter()
            .any(|r| r.severity == Severity::Warn && r.message.contains("bin/ffprobe")));
        assert_eq!(ctx.primary_binary, Some(layout.binary("ffmpeg")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_executable_primary_warns() {
        use std::os::unix::fs::PermissionsExt;

        let dir = install_tree(&[("bin/ffmpeg", &b"x"[..]), ("bin/ffprobe", &b"x"[..])]);
        let path = dir.path().join("bin/ffmpeg");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        let layout = InstallationLayout::new(dir.path());
        let config = VerifyConfig::default();
        let inspector = FakeInspector::healthy();
        let mut ctx = CheckContext::new(&config, &layout, &inspector);

        let results = BinaryPresenceCheck.run(&mut ctx).await;
        assert!(results.iter().any(|r| r.message.contains("not marked executable")));
    }
}
