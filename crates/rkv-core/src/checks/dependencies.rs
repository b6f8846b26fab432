//! Shared library linkage of the primary binary

use super::{Check, CheckContext, CheckResult, Criticality};
use crate::FailureKind;
use async_trait::async_trait;
use tracing::{debug, warn};

pub struct DependencyCheck;

#[async_trait]
impl Check for DependencyCheck {
    fn name(&self) -> &'static str {
        "Dynamic dependencies"
    }

    fn criticality(&self) -> Criticality {
        Criticality::Critical
    }

    async fn run(&self, ctx: &mut CheckContext<'_>) -> Vec<CheckResult> {
        let binary = match ctx.require_primary() {
            Ok(path) => path,
            Err(missing) => return vec![missing],
        };

        let section = match ctx.inspector.dynamic_section(&binary).await {
            Ok(section) => section,
            Err(e) => {
                warn!("Dependency listing unavailable: {}", e);
                let prefix = ctx
                    .config
                    .tools
                    .cross_prefix
                    .clone()
                    .unwrap_or_else(|| format!("{}-", ctx.config.expected_arch.triple()));
                return vec![CheckResult::warn(format!(
                    "cannot list dynamic dependencies: {}",
                    e
                ))
                .with_kind(FailureKind::ToolUnavailable)
                .with_hint(format!(
                    "install binutils for the target (e.g. binutils-aarch64-linux-gnu) or set CROSS_COMPILE so {}readelf is found",
                    prefix
                ))];
            }
        };
        debug!("{} NEEDED entries", section.needed.len());

        let mut results = Vec::new();
        if !section.present {
            results.push(CheckResult::info("no dynamic section (statically linked)"));
        } else if section.needed.is_empty() {
            results.push(CheckResult::info("dynamic section has no NEEDED entries"));
        } else {
            results.push(CheckResult::info(format!(
                "NEEDED: {}",
                section.needed.join(", ")
            )));
        }
        if !section.runpath.is_empty() {
            results.push(CheckResult::info(format!(
                "RUNPATH: {}",
                section.runpath.join(":")
            )));
        }

        for req in &ctx.config.required_libraries {
            match section.find_needed(&req.pattern) {
                Some(lib) => results.push(CheckResult::pass(format!("{}: {}", req.label, lib))),
                None => results.push(
                    CheckResult::fail(
                        FailureKind::MissingRequiredDependency,
                        format!("{}: {} not linked", req.label, req.pattern),
                    )
                    .with_optional_hint(req.hint.as_deref()),
                ),
            }
        }

        for opt in &ctx.config.optional_libraries {
            match section.find_needed(&opt.pattern) {
                Some(lib) => results.push(CheckResult::pass(format!("{}: {}", opt.label, lib))),
                None => results.push(
                    CheckResult::warn(format!("{}: {} not linked", opt.label, opt.pattern))
                        .with_optional_hint(opt.hint.as_deref()),
                ),
            }
        }

        results
    }
}
