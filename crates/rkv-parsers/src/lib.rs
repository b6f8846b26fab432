//! Build artifact parsers
//!
//! This crate provides the in-process parsers used when verifying a
//! cross-compiled install tree: ELF header identification, printable string
//! extraction, and pkg-config metadata files.

pub mod elf;
pub mod pkgconfig;
pub mod strings;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use elf::{CpuArchitecture, ElfClass, MachineInfo};
pub use pkgconfig::PkgConfigFile;
pub use strings::ExtractedString;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid magic bytes: expected {expected}, got {actual}")]
    InvalidMagic { expected: String, actual: String },

    #[error("Truncated data: expected {expected} bytes, got {actual}")]
    TruncatedData { expected: usize, actual: usize },

    #[error("Invalid structure: {0}")]
    InvalidStructure(String),

    #[error("Undefined variable '{variable}' in {context}")]
    UndefinedVariable { variable: String, context: String },

    #[error("Unknown architecture: {0}")]
    UnknownArchitecture(String),
}

pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Endianness {
    Little,
    Big,
}

impl std::fmt::Display for Endianness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Endianness::Little => write!(f, "little-endian"),
            Endianness::Big => write!(f, "big-endian"),
        }
    }
}
