//! Expected shape of an install tree

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Install tree produced by `make install`: `bin/`, `lib/`, `lib/pkgconfig/`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallationLayout {
    root: PathBuf,
}

impl InstallationLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.root.join("bin")
    }

    pub fn lib_dir(&self) -> PathBuf {
        self.root.join("lib")
    }

    pub fn pkgconfig_dir(&self) -> PathBuf {
        self.lib_dir().join("pkgconfig")
    }

    pub fn binary(&self, name: &str) -> PathBuf {
        self.bin_dir().join(name)
    }

    /// Path relative to the root, for messages
    pub fn display_relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_paths() {
        let layout = InstallationLayout::new("/opt/ffmpeg-rk");

        assert_eq!(layout.binary("ffmpeg"), PathBuf::from("/opt/ffmpeg-rk/bin/ffmpeg"));
        assert_eq!(layout.pkgconfig_dir(), PathBuf::from("/opt/ffmpeg-rk/lib/pkgconfig"));
        assert_eq!(layout.display_relative(&layout.binary("ffprobe")), "bin/ffprobe");
        assert_eq!(layout.display_relative(Path::new("/elsewhere")), "/elsewhere");
    }
}
