//! Target classification from container-format metadata.
//!
//! The sniffer reads a file and branches purely on byte patterns (magic
//! numbers and header fields). File names and extensions are never
//! consulted, and instruction content is never inspected.

use std::fs;
use std::path::{Path, PathBuf};

use goblin::elf;
use goblin::pe;
use thiserror::Error;

/// Magic number identifying DARPA Decree (CGC) challenge binaries.
const CGC_MAGIC: &[u8; 4] = b"\x7fCGC";

/// Error type for target sniffing.
///
/// An unrecognized format is *not* an error; it classifies as
/// [`TargetFormat::Unknown`].
#[derive(Debug, Error)]
pub enum SniffError {
    /// The target file could not be opened or read.
    #[error("unable to read target {path}: {source}")]
    UnreadableFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Executable container format of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetFormat {
    /// Linux ELF executable or shared object.
    Elf,
    /// Windows PE executable.
    PeExe,
    /// Windows PE dynamic-link library (`IMAGE_FILE_DLL` set).
    PeDll,
    /// DARPA Decree (Cyber Grand Challenge) binary.
    Cgc,
    /// No recognized magic.
    Unknown,
}

/// Word size of the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bits {
    Bits32,
    Bits64,
}

/// Link mode of an ELF target. PE, CGC, and unknown targets report
/// `NotApplicable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkMode {
    Static,
    Dynamic,
    NotApplicable,
}

/// Immutable classification of one target file.
///
/// Created once per [`classify`] call and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetClassification {
    pub format: TargetFormat,
    pub bits: Bits,
    pub link_mode: LinkMode,
    pub path: PathBuf,
}

impl TargetClassification {
    /// Guest architecture string for this target, as used by image
    /// descriptors and launch scripts.
    pub fn guest_arch(&self) -> &'static str {
        match self.bits {
            Bits::Bits32 => "i386",
            Bits::Bits64 => "x86_64",
        }
    }

    /// Short human-readable label used in messages.
    pub fn describe(&self) -> String {
        let format = match self.format {
            TargetFormat::Elf => "ELF",
            TargetFormat::PeExe => "PE executable",
            TargetFormat::PeDll => "PE DLL",
            TargetFormat::Cgc => "Decree (CGC)",
            TargetFormat::Unknown => return "unrecognized file format".to_string(),
        };
        let bits = match self.bits {
            Bits::Bits32 => "32-bit",
            Bits::Bits64 => "64-bit",
        };
        format!("{bits} {format}")
    }
}

/// Classify the file at `path`.
///
/// Fails only if the file cannot be read; a file whose bytes match no
/// recognized container format yields `format: Unknown`.
pub fn classify(path: &Path) -> Result<TargetClassification, SniffError> {
    let bytes = fs::read(path)
        .map_err(|source| SniffError::UnreadableFile { path: path.to_path_buf(), source })?;
    Ok(classify_bytes(path, &bytes))
}

fn classify_bytes(path: &Path, bytes: &[u8]) -> TargetClassification {
    let unknown = TargetClassification {
        format: TargetFormat::Unknown,
        bits: Bits::Bits32,
        link_mode: LinkMode::NotApplicable,
        path: path.to_path_buf(),
    };

    if bytes.starts_with(CGC_MAGIC) {
        // Decree binaries are 32-bit ELF derivatives with their own magic.
        return TargetClassification {
            format: TargetFormat::Cgc,
            bits: Bits::Bits32,
            link_mode: LinkMode::NotApplicable,
            path: path.to_path_buf(),
        };
    }

    if bytes.starts_with(elf::header::ELFMAG) {
        // A file with ELF magic but a malformed structure is unrecognized,
        // not an error.
        return match elf::Elf::parse(bytes) {
            Ok(parsed) => classify_elf(path, &parsed),
            Err(_) => unknown,
        };
    }

    if bytes.starts_with(b"MZ") {
        // Header-window parse only; sections and imports are irrelevant
        // here. An MZ file without the PE signature (plain DOS binary) is
        // unrecognized.
        return match pe::header::Header::parse(bytes) {
            Ok(header) if header.signature == pe::header::PE_MAGIC => classify_pe(path, &header),
            _ => unknown,
        };
    }

    unknown
}

fn classify_elf(path: &Path, parsed: &elf::Elf) -> TargetClassification {
    // Dynamic linking is signalled by a PT_INTERP or PT_DYNAMIC program
    // header, mirroring how the guest OS decides to involve a loader.
    let dynamic = parsed.program_headers.iter().any(|ph| {
        ph.p_type == elf::program_header::PT_INTERP || ph.p_type == elf::program_header::PT_DYNAMIC
    });

    TargetClassification {
        format: TargetFormat::Elf,
        bits: if parsed.is_64 { Bits::Bits64 } else { Bits::Bits32 },
        link_mode: if dynamic { LinkMode::Dynamic } else { LinkMode::Static },
        path: path.to_path_buf(),
    }
}

fn classify_pe(path: &Path, header: &pe::header::Header) -> TargetClassification {
    let coff = &header.coff_header;

    let bits = match coff.machine {
        pe::header::COFF_MACHINE_X86_64 => Bits::Bits64,
        pe::header::COFF_MACHINE_X86 => Bits::Bits32,
        // Fall back to the optional-header magic for unusual machines.
        _ => match &header.optional_header {
            Some(opt) if opt.standard_fields.magic == pe::optional_header::MAGIC_64 => Bits::Bits64,
            _ => Bits::Bits32,
        },
    };

    let is_dll = coff.characteristics & pe::characteristic::IMAGE_FILE_DLL != 0;

    TargetClassification {
        format: if is_dll { TargetFormat::PeDll } else { TargetFormat::PeExe },
        bits,
        link_mode: LinkMode::NotApplicable,
        path: path.to_path_buf(),
    }
}
