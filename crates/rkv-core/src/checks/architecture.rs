//! Target architecture of the primary binary

use super::{Check, CheckContext, CheckResult, Criticality};
use crate::{CoreError, FailureKind};
use async_trait::async_trait;
use tracing::debug;

pub struct ArchitectureCheck;

#[async_trait]
impl Check for ArchitectureCheck {
    fn name(&self) -> &'static str {
        "Architecture"
    }

    fn criticality(&self) -> Criticality {
        Criticality::Critical
    }

    async fn run(&self, ctx: &mut CheckContext<'_>) -> Vec<CheckResult> {
        let binary = match ctx.require_primary() {
            Ok(path) => path,
            Err(missing) => return vec![missing],
        };
        let expected = ctx.config.expected_arch;
        let shown = ctx.layout.display_relative(&binary);

        match ctx.inspector.machine(&binary).await {
            Ok(info) => {
                debug!("{}: {:?}", shown, info);
                if info.matches(expected) {
                    vec![CheckResult::pass(format!("{}: {}", shown, info.describe()))]
                } else {
                    vec![CheckResult::fail(
                        FailureKind::WrongArchitecture,
                        format!(
                            "{} is {} ({}-bit), expected {} ({})",
                            shown,
                            info.cpu,
                            info.class.bits(),
                            expected,
                            expected.triple()
                        ),
                    )
                    .with_hint(format!(
                        "configure with --enable-cross-compile --arch={} and source the SDK environment (`eval \"$(rkv env)\"`) before building",
                        expected
                    ))]
                }
            }
            Err(CoreError::Parse(e)) => vec![CheckResult::fail(
                FailureKind::WrongArchitecture,
                format!("{} is not an ELF executable: {}", shown, e),
            )
            .with_hint("the install step may have copied a wrapper script; rebuild and reinstall")],
            Err(e) => vec![CheckResult::fail(
                FailureKind::MissingArtifact,
                format!("cannot read {}: {}", shown, e),
            )],
        }
    }
}
