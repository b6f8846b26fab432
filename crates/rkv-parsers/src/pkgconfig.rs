//! pkg-config metadata (`.pc`) parser

use crate::{ParseError, ParseResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Parsed `.pc` file with variables already expanded into the fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PkgConfigFile {
    /// Module name, i.e. the file stem (`libavcodec` for `libavcodec.pc`)
    pub module: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
    pub url: Option<String>,
    pub requires: Option<String>,
    pub requires_private: Option<String>,
    pub libs: Option<String>,
    pub libs_private: Option<String>,
    pub cflags: Option<String>,
    pub variables: BTreeMap<String, String>,
}

impl PkgConfigFile {
    /// Display name, falling back to the module name
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.module)
    }
}

/// Read and parse a `.pc` file; the module name is taken from the file stem
pub fn parse_pc_file(path: &Path) -> ParseResult<PkgConfigFile> {
    let contents = std::fs::read_to_string(path)?;
    let module = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    parse_pc(&module, &contents)
}

/// Parse the contents of a `.pc` file
pub fn parse_pc(module: &str, contents: &str) -> ParseResult<PkgConfigFile> {
    let mut pc = PkgConfigFile {
        module: module.to_string(),
        ..Default::default()
    };

    for line in logical_lines(contents) {
        let line = strip_comment(&line);
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let key_len = line
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '.'))
            .unwrap_or(line.len());
        let (key, rest) = line.split_at(key_len);
        let rest = rest.trim_start();
        if key.is_empty() {
            continue;
        }

        if let Some(value) = rest.strip_prefix('=') {
            let context = format!("{}.pc variable {}", module, key);
            let expanded = expand(value.trim(), &pc.variables, &context)?;
            pc.variables.insert(key.to_string(), expanded);
        } else if let Some(value) = rest.strip_prefix(':') {
            let context = format!("{}.pc field {}", module, key);
            let expanded = expand(value.trim(), &pc.variables, &context)?;
            let slot = match key {
                "Name" => &mut pc.name,
                "Description" => &mut pc.description,
                "Version" => &mut pc.version,
                "URL" => &mut pc.url,
                "Requires" => &mut pc.requires,
                "Requires.private" => &mut pc.requires_private,
                "Libs" => &mut pc.libs,
                "Libs.private" => &mut pc.libs_private,
                "Cflags" | "CFlags" => &mut pc.cflags,
                _ => continue,
            };
            *slot = Some(expanded);
        }
    }

    Ok(pc)
}

/// Join backslash-continued lines
fn logical_lines(contents: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for raw in contents.lines() {
        if let Some(stripped) = raw.strip_suffix('\\') {
            current.push_str(stripped);
            continue;
        }
        current.push_str(raw);
        lines.push(std::mem::take(&mut current));
    }
    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

fn strip_comment(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'#') => {
                out.push('#');
                chars.next();
            }
            '#' => break,
            _ => out.push(c),
        }
    }

    out
}

/// Expand `${var}` references; `$$` is a literal dollar sign
fn expand(value: &str, vars: &BTreeMap<String, String>, context: &str) -> ParseResult<String> {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if let Some(after) = tail.strip_prefix("$$") {
            out.push('$');
            rest = after;
        } else if let Some(after) = tail.strip_prefix("${") {
            let end = after.find('}').ok_or_else(|| {
                ParseError::InvalidStructure(format!("unterminated variable reference in {}", context))
            })?;
            let name = &after[..end];
            let resolved = vars.get(name).ok_or_else(|| ParseError::UndefinedVariable {
                variable: name.to_string(),
                context: context.to_string(),
            })?;
            out.push_str(resolved);
            rest = &after[end + 1..];
        } else {
            out.push('$');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIBAVCODEC_PC: &str = "\
prefix=/opt/ffmpeg-rk/install
exec_prefix=${prefix}
libdir=/opt/ffmpeg-rk/install/lib
includedir=/opt/ffmpeg-rk/install/include

Name: libavcodec
Description: FFmpeg codec library
Version: 61.19.100
Requires: libswresample >= 5.3.100, libavutil >= 59.39.100
Requires.private: rockchip_mpp
Conflicts:
Libs: -L${libdir}  -lavcodec
Libs.private: -pthread -lm -ldrm -lrockchip_mpp
Cflags: -I${includedir}
";

    #[test]
    fn test_parse_ffmpeg_pc() {
        let pc = parse_pc("libavcodec", LIBAVCODEC_PC).unwrap();

        assert_eq!(pc.display_name(), "libavcodec");
        assert_eq!(pc.version.as_deref(), Some("61.19.100"));
        assert_eq!(pc.libs.as_deref(), Some("-L/opt/ffmpeg-rk/install/lib  -lavcodec"));
        assert_eq!(pc.cflags.as_deref(), Some("-I/opt/ffmpeg-rk/install/include"));
        assert_eq!(pc.requires_private.as_deref(), Some("rockchip_mpp"));
        assert_eq!(pc.variables["exec_prefix"], "/opt/ffmpeg-rk/install");
    }

    #[test]
    fn test_version_expands_variables() {
        let pc = parse_pc("librga", "major=2\nminor=1\nVersion: ${major}.${minor}.0\n").unwrap();
        assert_eq!(pc.version.as_deref(), Some("2.1.0"));
        assert_eq!(pc.display_name(), "librga");
    }

    #[test]
    fn test_undefined_variable_is_an_error() {
        let err = parse_pc("broken", "Version: ${missing}\n").unwrap_err();
        assert!(matches!(err, ParseError::UndefinedVariable { ref variable, .. } if variable == "missing"));
    }

    #[test]
    fn test_comments_and_continuations() {
        let pc = parse_pc(
            "x",
            "# generated\nName: x # trailing\nLibs: -la \\\n -lb\nDescription: a \\# b\n",
        )
        .unwrap();
        assert_eq!(pc.name.as_deref(), Some("x"));
        assert_eq!(pc.libs.as_deref(), Some("-la  -lb"));
        assert_eq!(pc.description.as_deref(), Some("a # b"));
        assert!(pc.version.is_none());
    }

    #[test]
    fn test_parse_pc_file_uses_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("libswscale.pc");
        std::fs::write(&path, "Version: 8.3.100\n").unwrap();

        let pc = parse_pc_file(&path).unwrap();
        assert_eq!(pc.module, "libswscale");
        assert_eq!(pc.version.as_deref(), Some("8.3.100"));
    }
}
