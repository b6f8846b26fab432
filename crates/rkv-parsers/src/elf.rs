//! ELF header identification
//!
//! Only the file header is needed to decide whether a binary was built for
//! the expected target, so callers can pass the first [`HEADER_READ_LEN`]
//! bytes instead of the whole executable.

use crate::{Endianness, ParseError, ParseResult};
use goblin::elf::header::{self, Header};
use goblin::elf::Elf;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Enough bytes for both ELF32 and ELF64 file headers
pub const HEADER_READ_LEN: usize = 64;

const ELF_MAGIC: [u8; 4] = [0x7F, b'E', b'L', b'F'];

/// CPU architecture of a binary or of a build target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CpuArchitecture {
    #[serde(rename = "x86", alias = "i686")]
    X86,
    #[serde(rename = "x86_64", alias = "amd64")]
    X86_64,
    #[serde(rename = "arm", alias = "armhf")]
    Arm,
    #[serde(rename = "aarch64", alias = "arm64")]
    Arm64,
    #[serde(rename = "mips")]
    Mips,
    #[serde(rename = "mips64")]
    Mips64,
    #[serde(rename = "powerpc")]
    PowerPc,
    #[serde(rename = "powerpc64")]
    PowerPc64,
    #[serde(rename = "riscv32")]
    RiscV32,
    #[serde(rename = "riscv64")]
    RiscV64,
    #[serde(rename = "unknown")]
    Unknown,
}

impl CpuArchitecture {
    /// GNU target triple used by cross toolchains for this architecture
    pub fn triple(&self) -> &'static str {
        match self {
            CpuArchitecture::X86 => "i686-linux-gnu",
            CpuArchitecture::X86_64 => "x86_64-linux-gnu",
            CpuArchitecture::Arm => "arm-linux-gnueabihf",
            CpuArchitecture::Arm64 => "aarch64-linux-gnu",
            CpuArchitecture::Mips => "mips-linux-gnu",
            CpuArchitecture::Mips64 => "mips64-linux-gnuabi64",
            CpuArchitecture::PowerPc => "powerpc-linux-gnu",
            CpuArchitecture::PowerPc64 => "powerpc64-linux-gnu",
            CpuArchitecture::RiscV32 => "riscv32-linux-gnu",
            CpuArchitecture::RiscV64 => "riscv64-linux-gnu",
            CpuArchitecture::Unknown => "unknown",
        }
    }

    pub fn word_size(&self) -> Option<u8> {
        match self {
            CpuArchitecture::X86
            | CpuArchitecture::Arm
            | CpuArchitecture::Mips
            | CpuArchitecture::PowerPc
            | CpuArchitecture::RiscV32 => Some(32),
            CpuArchitecture::X86_64
            | CpuArchitecture::Arm64
            | CpuArchitecture::Mips64
            | CpuArchitecture::PowerPc64
            | CpuArchitecture::RiscV64 => Some(64),
            CpuArchitecture::Unknown => None,
        }
    }
}

impl std::fmt::Display for CpuArchitecture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CpuArchitecture::X86 => "x86",
            CpuArchitecture::X86_64 => "x86_64",
            CpuArchitecture::Arm => "arm",
            CpuArchitecture::Arm64 => "aarch64",
            CpuArchitecture::Mips => "mips",
            CpuArchitecture::Mips64 => "mips64",
            CpuArchitecture::PowerPc => "powerpc",
            CpuArchitecture::PowerPc64 => "powerpc64",
            CpuArchitecture::RiscV32 => "riscv32",
            CpuArchitecture::RiscV64 => "riscv64",
            CpuArchitecture::Unknown => "unknown",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for CpuArchitecture {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accept a bare arch name or the first component of a triple
        let arch = s.trim().split('-').next().unwrap_or("").to_lowercase();
        match arch.as_str() {
            "x86" | "i386" | "i686" => Ok(CpuArchitecture::X86),
            "x86_64" | "amd64" => Ok(CpuArchitecture::X86_64),
            "arm" | "armv7" | "armv7l" | "armhf" => Ok(CpuArchitecture::Arm),
            "aarch64" | "arm64" => Ok(CpuArchitecture::Arm64),
            "mips" | "mipsel" => Ok(CpuArchitecture::Mips),
            "mips64" | "mips64el" => Ok(CpuArchitecture::Mips64),
            "powerpc" | "ppc" => Ok(CpuArchitecture::PowerPc),
            "powerpc64" | "ppc64" | "ppc64le" => Ok(CpuArchitecture::PowerPc64),
            "riscv32" => Ok(CpuArchitecture::RiscV32),
            "riscv64" => Ok(CpuArchitecture::RiscV64),
            _ => Err(ParseError::UnknownArchitecture(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElfClass {
    Elf32,
    Elf64,
}

impl ElfClass {
    pub fn bits(&self) -> u8 {
        match self {
            ElfClass::Elf32 => 32,
            ElfClass::Elf64 => 64,
        }
    }
}

/// Identification data from an ELF file header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineInfo {
    pub cpu: CpuArchitecture,
    pub machine: String,
    pub class: ElfClass,
    pub endianness: Endianness,
    pub file_type: String,
    pub os_abi: u8,
}

impl MachineInfo {
    /// Short description in the style of `file(1)`
    pub fn describe(&self) -> String {
        format!(
            "ELF {}-bit {} {}, {}",
            self.class.bits(),
            self.endianness,
            self.file_type,
            self.machine
        )
    }

    /// True when both the machine and the word size match the target
    pub fn matches(&self, target: CpuArchitecture) -> bool {
        self.cpu == target && target.word_size() == Some(self.class.bits())
    }
}

/// Check for the ELF magic bytes
pub fn is_elf(data: &[u8]) -> bool {
    data.len() >= ELF_MAGIC.len() && data[..ELF_MAGIC.len()] == ELF_MAGIC
}

/// Identify the machine of an ELF file from its leading bytes
pub fn parse_machine(data: &[u8]) -> ParseResult<MachineInfo> {
    if data.len() < ELF_MAGIC.len() {
        return Err(ParseError::TruncatedData {
            expected: ELF_MAGIC.len(),
            actual: data.len(),
        });
    }
    if !is_elf(data) {
        return Err(ParseError::InvalidMagic {
            expected: "7f454c46".to_string(),
            actual: data[..ELF_MAGIC.len()]
                .iter()
                .map(|b| format!("{:02x}", b))
                .collect(),
        });
    }

    let ehdr: Header = Elf::parse_header(data)
        .map_err(|e| ParseError::InvalidStructure(format!("ELF header parse error: {}", e)))?;

    let class = match ehdr.e_ident[header::EI_CLASS] {
        header::ELFCLASS32 => ElfClass::Elf32,
        header::ELFCLASS64 => ElfClass::Elf64,
        other => {
            return Err(ParseError::InvalidStructure(format!(
                "unknown ELF class {}",
                other
            )))
        }
    };

    let endianness = if ehdr.e_ident[header::EI_DATA] == header::ELFDATA2MSB {
        Endianness::Big
    } else {
        Endianness::Little
    };

    Ok(MachineInfo {
        cpu: cpu_for_machine(ehdr.e_machine, class),
        machine: machine_to_string(ehdr.e_machine),
        class,
        endianness,
        file_type: file_type_to_string(ehdr.e_type),
        os_abi: ehdr.e_ident[header::EI_OSABI],
    })
}

fn cpu_for_machine(machine: u16, class: ElfClass) -> CpuArchitecture {
    match (machine, class) {
        (header::EM_386, _) => CpuArchitecture::X86,
        (header::EM_X86_64, _) => CpuArchitecture::X86_64,
        (header::EM_ARM, _) => CpuArchitecture::Arm,
        (header::EM_AARCH64, _) => CpuArchitecture::Arm64,
        (header::EM_MIPS, ElfClass::Elf32) => CpuArchitecture::Mips,
        (header::EM_MIPS, ElfClass::Elf64) => CpuArchitecture::Mips64,
        (header::EM_PPC, _) => CpuArchitecture::PowerPc,
        (header::EM_PPC64, _) => CpuArchitecture::PowerPc64,
        (header::EM_RISCV, ElfClass::Elf32) => CpuArchitecture::RiscV32,
        (header::EM_RISCV, ElfClass::Elf64) => CpuArchitecture::RiscV64,
        _ => CpuArchitecture::Unknown,
    }
}

fn machine_to_string(machine: u16) -> String {
    match machine {
        header::EM_NONE => "None".to_string(),
        header::EM_386 => "Intel 80386".to_string(),
        header::EM_X86_64 => "x86-64".to_string(),
        header::EM_ARM => "ARM".to_string(),
        header::EM_AARCH64 => "ARM aarch64".to_string(),
        header::EM_MIPS => "MIPS".to_string(),
        header::EM_PPC => "PowerPC".to_string(),
        header::EM_PPC64 => "64-bit PowerPC".to_string(),
        header::EM_RISCV => "RISC-V".to_string(),
        _ => format!("Unknown({})", machine),
    }
}

fn file_type_to_string(e_type: u16) -> String {
    match e_type {
        header::ET_REL => "relocatable".to_string(),
        header::ET_EXEC => "executable".to_string(),
        header::ET_DYN => "shared object".to_string(),
        header::ET_CORE => "core file".to_string(),
        _ => format!("type 0x{:x}", e_type),
    }
}
