//! Hardware codec and filter names embedded in the primary binary

use super::{Check, CheckContext, CheckResult, Criticality};
use crate::config::FeaturePattern;
use crate::inspect::ScanSource;
use crate::FailureKind;
use async_trait::async_trait;
use tracing::debug;

pub struct FeatureScanCheck;

#[async_trait]
impl Check for FeatureScanCheck {
    fn name(&self) -> &'static str {
        "Feature strings"
    }

    fn criticality(&self) -> Criticality {
        Criticality::Critical
    }

    async fn run(&self, ctx: &mut CheckContext<'_>) -> Vec<CheckResult> {
        let binary = match ctx.require_primary() {
            Ok(path) => path,
            Err(missing) => return vec![missing],
        };

        let scan = match ctx.inspector.strings(&binary).await {
            Ok(scan) => scan,
            Err(e) => {
                return vec![CheckResult::fail(
                    FailureKind::MissingArtifact,
                    format!("cannot read {}: {}", ctx.layout.display_relative(&binary), e),
                )]
            }
        };
        debug!("{} strings scanned", scan.strings.len());

        let mut results = Vec::new();
        if let ScanSource::InProcess(reason) = &scan.source {
            results.push(CheckResult::info(format!(
                "scanned the binary in-process ({})",
                reason
            )));
        }

        for pattern in [&ctx.config.codec_patterns, &ctx.config.filter_patterns] {
            results.push(scan_family(pattern, &scan.strings));
        }
        results
    }
}

/// Every match of one feature family, in scan order
pub fn find_features(pattern: &FeaturePattern, strings: &[String]) -> crate::CoreResult<Vec<String>> {
    let re = pattern.regex()?;
    Ok(strings
        .iter()
        .flat_map(|s| re.find_iter(s).map(|m| m.as_str().to_string()))
        .collect())
}

fn scan_family(pattern: &FeaturePattern, strings: &[String]) -> CheckResult {
    let found = match find_features(pattern, strings) {
        Ok(found) => found,
        Err(e) => {
            return CheckResult::fail(FailureKind::MissingRequiredFeature, e.to_string())
        }
    };

    if found.is_empty() {
        CheckResult::fail(
            FailureKind::MissingRequiredFeature,
            format!(
                "no {} found (expected one of {})",
                pattern.label,
                pattern.expected().join(", ")
            ),
        )
        .with_optional_hint(pattern.hint.as_deref())
    } else {
        CheckResult::pass(format!("{}: {}", pattern.label, found.join(", ")))
    }
}
