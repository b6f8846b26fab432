//! Installed FFmpeg libraries

use super::{format_size, Check, CheckContext, CheckResult, Criticality};
use async_trait::async_trait;
use std::path::Path;

pub struct LibraryInventoryCheck;

#[async_trait]
impl Check for LibraryInventoryCheck {
    fn name(&self) -> &'static str {
        "Static libraries"
    }

    fn criticality(&self) -> Criticality {
        Criticality::Advisory
    }

    async fn run(&self, ctx: &mut CheckContext<'_>) -> Vec<CheckResult> {
        let lib_dir = ctx.layout.lib_dir();
        let entries = match sorted_entries(&lib_dir) {
            Ok(entries) => entries,
            Err(e) => {
                return vec![CheckResult::warn(format!("cannot read lib/: {}", e))
                    .with_hint("static libraries are only installed with --enable-static")]
            }
        };

        let prefixes = &ctx.config.library_prefixes;
        let mut archives = 0usize;
        let mut archive_bytes = 0u64;
        let mut shared = Vec::new();

        for (name, size) in entries {
            if !prefixes.iter().any(|p| name.starts_with(p.as_str())) {
                continue;
            }
            if name.ends_with(".a") {
                archives += 1;
                archive_bytes += size;
            } else if name.ends_with(".so") || name.contains(".so.") {
                shared.push(name);
            }
        }

        let mut results = Vec::new();
        if archives == 0 {
            results.push(
                CheckResult::warn(format!(
                    "no static archives matching {} in lib/",
                    prefixes.join(", ")
                ))
                .with_hint("static libraries are only installed with --enable-static"),
            );
        } else {
            results.push(CheckResult::pass(format!(
                "{} static archives ({})",
                archives,
                format_size(archive_bytes)
            )));
        }
        if !shared.is_empty() {
            results.push(CheckResult::info(format!(
                "shared libraries: {}",
                shared.join(", ")
            )));
        }
        results
    }
}

/// Regular files in a directory as (name, size), sorted by name
fn sorted_entries(dir: &Path) -> std::io::Result<Vec<(String, u64)>> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let meta = match std::fs::metadata(entry.path()) {
            Ok(meta) if meta.is_file() => meta,
            _ => continue,
        };
        entries.push((entry.file_name().to_string_lossy().into_owned(), meta.len()));
    }
    entries.sort();
    Ok(entries)
}
