//! Cross-compilation environment for a vendor SDK
//!
//! Resolves the toolchain and sysroot inside an SDK directory, checks that
//! the Rockchip MPP and RGA libraries and headers are in the sysroot, and
//! renders `export` lines for `eval "$(rkv env)"`.

use rkv_parsers::CpuArchitecture;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming the SDK root
pub const SDK_PATH_ENV: &str = "SDK_PATH";

/// Hardware libraries the sysroot must provide
const SDK_LIBRARIES: [&str; 2] = ["librockchip_mpp", "librga"];

/// Header directories the sysroot must provide
const SDK_HEADER_DIRS: [&str; 2] = ["usr/include/rockchip", "usr/include/rga"];

/// Where to look for the SDK pieces
#[derive(Debug, Clone)]
pub struct SdkOptions {
    pub sdk: PathBuf,
    /// Defaults to `<sdk>/sysroot`
    pub sysroot: Option<PathBuf>,
    /// Defaults to `<sdk>/bin`
    pub toolchain_bin: Option<PathBuf>,
    pub arch: CpuArchitecture,
}

/// Resolved SDK layout and anything found missing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SdkEnvironment {
    pub sysroot: PathBuf,
    pub toolchain_bin: PathBuf,
    pub triple: String,
    pub problems: Vec<String>,
}

impl SdkEnvironment {
    /// Inspect the SDK named by the options
    pub fn resolve(opts: &SdkOptions) -> Self {
        let sysroot = opts
            .sysroot
            .clone()
            .unwrap_or_else(|| opts.sdk.join("sysroot"));
        let toolchain_bin = opts
            .toolchain_bin
            .clone()
            .unwrap_or_else(|| opts.sdk.join("bin"));
        let triple = opts.arch.triple().to_string();

        let mut env = Self {
            sysroot,
            toolchain_bin,
            triple,
            problems: Vec::new(),
        };
        env.check();
        env
    }

    pub fn is_complete(&self) -> bool {
        self.problems.is_empty()
    }

    /// `<toolchain_bin>/<triple>-`
    pub fn cross_prefix(&self) -> String {
        format!("{}/{}-", self.toolchain_bin.display(), self.triple)
    }

    fn check(&mut self) {
        if !self.sysroot.is_dir() {
            self.problems
                .push(format!("sysroot not found: {}", self.sysroot.display()));
            return;
        }

        let lib_dirs = self.lib_dirs();
        for lib in SDK_LIBRARIES {
            let found = lib_dirs.iter().find(|dir| has_library(dir, lib));
            match found {
                Some(dir) => debug!("{} found in {}", lib, dir.display()),
                None => self.problems.push(format!(
                    "{} not found in {}",
                    lib,
                    lib_dirs
                        .iter()
                        .map(|d| d.display().to_string())
                        .collect::<Vec<_>>()
                        .join(" or ")
                )),
            }
        }

        for headers in SDK_HEADER_DIRS {
            let dir = self.sysroot.join(headers);
            if !dir.is_dir() {
                self.problems
                    .push(format!("headers not found: {}", dir.display()));
            }
        }

        let cc = PathBuf::from(format!("{}gcc", self.cross_prefix()));
        if !cc.is_file() {
            self.problems
                .push(format!("cross compiler not found: {}", cc.display()));
        }
    }

    fn lib_dirs(&self) -> Vec<PathBuf> {
        vec![
            self.sysroot.join("usr/lib"),
            self.sysroot.join("usr/lib").join(&self.triple),
        ]
    }

    /// Shell `export` lines plus a suggested configure invocation
    pub fn exports(&self) -> Vec<String> {
        let prefix = self.cross_prefix();
        let pc_path = [
            self.sysroot.join("usr/lib/pkgconfig"),
            self.sysroot.join("usr/lib").join(&self.triple).join("pkgconfig"),
            self.sysroot.join("usr/share/pkgconfig"),
        ]
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(":");
        let sysroot = self.sysroot.display().to_string();

        let mut lines: Vec<String> = [
            ("SYSROOT", sysroot.clone()),
            ("CROSS_COMPILE", prefix.clone()),
            ("CC", format!("{}gcc", prefix)),
            ("CXX", format!("{}g++", prefix)),
            ("AR", format!("{}ar", prefix)),
            ("PKG_CONFIG_PATH", pc_path.clone()),
            ("PKG_CONFIG_LIBDIR", pc_path),
            ("PKG_CONFIG_SYSROOT_DIR", sysroot),
        ]
        .iter()
        .map(|(key, value)| format!("export {}={}", key, shell_quote(value)))
        .collect();

        lines.push(format!(
            "export PATH=\"{}:$PATH\"",
            self.toolchain_bin.display()
        ));
        lines.push(format!(
            "# ./configure --enable-cross-compile --arch={} --target-os=linux --cross-prefix=\"$CROSS_COMPILE\" --sysroot=\"$SYSROOT\" --pkg-config=pkg-config --enable-version3 --enable-rkmpp --enable-rkrga --enable-libdrm --prefix=\"$PWD/install\"",
            self.triple.split('-').next().unwrap_or("aarch64")
        ));
        lines
    }
}

/// True if `dir` holds `<name>.so*` or `<name>.a`
fn has_library(dir: &Path, name: &str) -> bool {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return false;
    };
    entries.flatten().any(|entry| {
        let file = entry.file_name();
        let file = file.to_string_lossy();
        file.strip_prefix(name)
            .map_or(false, |rest| rest.starts_with(".so") || rest == ".a")
    })
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}
