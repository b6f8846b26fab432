//! Generated `.pc` files

use super::{Check, CheckContext, CheckResult, Criticality};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

pub struct PkgConfigInventoryCheck;

#[async_trait]
impl Check for PkgConfigInventoryCheck {
    fn name(&self) -> &'static str {
        "Package-config metadata"
    }

    fn criticality(&self) -> Criticality {
        Criticality::Advisory
    }

    async fn run(&self, ctx: &mut CheckContext<'_>) -> Vec<CheckResult> {
        let dir = ctx.layout.pkgconfig_dir();
        let files = match pc_files(&dir) {
            Ok(files) => files,
            Err(e) => {
                return vec![CheckResult::warn(format!("cannot read lib/pkgconfig: {}", e))
                    .with_hint("downstream builds will not find the libraries through pkg-config")]
            }
        };

        if files.is_empty() {
            return vec![CheckResult::warn("no .pc files in lib/pkgconfig")];
        }

        let mut results = Vec::with_capacity(files.len());
        for file in files {
            let shown = ctx.layout.display_relative(&file);
            match ctx.inspector.pkg_version(&file).await {
                Ok(pkg) => {
                    debug!("{}: {:?} from {:?}", shown, pkg.version, pkg.source);
                    match pkg.version {
                        Some(version) => {
                            results.push(CheckResult::info(format!("{} {}", pkg.name, version)))
                        }
                        None => results.push(CheckResult::warn(format!(
                            "{} declares no version",
                            shown
                        ))),
                    }
                }
                Err(e) => results.push(CheckResult::warn(format!("{}: {}", shown, e))),
            }
        }
        results
    }
}

/// `*.pc` files in a directory, sorted
fn pc_files(dir: &std::path::Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().map_or(false, |ext| ext == "pc") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
