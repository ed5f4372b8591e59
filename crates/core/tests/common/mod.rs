//! Hand-assembled executable headers used as sniffer fixtures.
//!
//! Building the bytes directly keeps every header field under test
//! control, e.g. a PE with the DLL characteristic set but an `.exe`
//! extension.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

pub const EM_386: u16 = 3;
pub const EM_X86_64: u16 = 62;

pub const COFF_MACHINE_X86: u16 = 0x14c;
pub const COFF_MACHINE_X86_64: u16 = 0x8664;
pub const IMAGE_FILE_DLL: u16 = 0x2000;
pub const IMAGE_FILE_EXECUTABLE_IMAGE: u16 = 0x0002;

fn u16le(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn u32le(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn u64le(out: &mut Vec<u8>, value: u64) {
    out.extend_from_slice(&value.to_le_bytes());
}

/// Minimal 64-bit little-endian ELF executable. When `interp` is given, a
/// `PT_INTERP` program header (the dynamic-link marker) is emitted;
/// otherwise a single `PT_LOAD`.
pub fn elf64(machine: u16, interp: Option<&[u8]>) -> Vec<u8> {
    const EHSIZE: u64 = 64;
    const PHENTSIZE: u64 = 56;
    let content_off = EHSIZE + PHENTSIZE;

    let mut b = Vec::new();
    b.extend_from_slice(b"\x7fELF");
    b.push(2); // ELFCLASS64
    b.push(1); // ELFDATA2LSB
    b.push(1); // EV_CURRENT
    b.push(0); // ELFOSABI_NONE
    b.extend_from_slice(&[0u8; 8]);
    u16le(&mut b, 2); // e_type = ET_EXEC
    u16le(&mut b, machine);
    u32le(&mut b, 1); // e_version
    u64le(&mut b, 0x40_0000); // e_entry
    u64le(&mut b, EHSIZE); // e_phoff
    u64le(&mut b, 0); // e_shoff
    u32le(&mut b, 0); // e_flags
    u16le(&mut b, EHSIZE as u16);
    u16le(&mut b, PHENTSIZE as u16);
    u16le(&mut b, 1); // e_phnum
    u16le(&mut b, 0); // e_shentsize
    u16le(&mut b, 0); // e_shnum
    u16le(&mut b, 0); // e_shstrndx

    match interp {
        Some(interp) => {
            u32le(&mut b, 3); // p_type = PT_INTERP
            u32le(&mut b, 4); // p_flags = R
            u64le(&mut b, content_off); // p_offset
            u64le(&mut b, 0x40_0000 + content_off); // p_vaddr
            u64le(&mut b, 0x40_0000 + content_off); // p_paddr
            u64le(&mut b, interp.len() as u64); // p_filesz
            u64le(&mut b, interp.len() as u64); // p_memsz
            u64le(&mut b, 1); // p_align
            b.extend_from_slice(interp);
        }
        None => {
            u32le(&mut b, 1); // p_type = PT_LOAD
            u32le(&mut b, 5); // p_flags = R+X
            u64le(&mut b, 0); // p_offset
            u64le(&mut b, 0x40_0000); // p_vaddr
            u64le(&mut b, 0x40_0000); // p_paddr
            u64le(&mut b, content_off); // p_filesz
            u64le(&mut b, content_off); // p_memsz
            u64le(&mut b, 0x1000); // p_align
        }
    }
    b
}

/// Minimal 32-bit little-endian ELF executable with one `PT_LOAD` (static)
/// or `PT_INTERP` (dynamic) program header.
pub fn elf32(machine: u16, interp: Option<&[u8]>) -> Vec<u8> {
    const EHSIZE: u32 = 52;
    const PHENTSIZE: u32 = 32;
    let content_off = EHSIZE + PHENTSIZE;

    let mut b = Vec::new();
    b.extend_from_slice(b"\x7fELF");
    b.push(1); // ELFCLASS32
    b.push(1); // ELFDATA2LSB
    b.push(1); // EV_CURRENT
    b.push(0); // ELFOSABI_NONE
    b.extend_from_slice(&[0u8; 8]);
    u16le(&mut b, 2); // e_type = ET_EXEC
    u16le(&mut b, machine);
    u32le(&mut b, 1); // e_version
    u32le(&mut b, 0x804_8000); // e_entry
    u32le(&mut b, EHSIZE); // e_phoff
    u32le(&mut b, 0); // e_shoff
    u32le(&mut b, 0); // e_flags
    u16le(&mut b, EHSIZE as u16);
    u16le(&mut b, PHENTSIZE as u16);
    u16le(&mut b, 1); // e_phnum
    u16le(&mut b, 0); // e_shentsize
    u16le(&mut b, 0); // e_shnum
    u16le(&mut b, 0); // e_shstrndx

    match interp {
        Some(interp) => {
            u32le(&mut b, 3); // p_type = PT_INTERP
            u32le(&mut b, content_off); // p_offset
            u32le(&mut b, 0x804_8000 + content_off); // p_vaddr
            u32le(&mut b, 0x804_8000 + content_off); // p_paddr
            u32le(&mut b, interp.len() as u32); // p_filesz
            u32le(&mut b, interp.len() as u32); // p_memsz
            u32le(&mut b, 4); // p_flags = R
            u32le(&mut b, 1); // p_align
            b.extend_from_slice(interp);
        }
        None => {
            u32le(&mut b, 1); // p_type = PT_LOAD
            u32le(&mut b, 0); // p_offset
            u32le(&mut b, 0x804_8000); // p_vaddr
            u32le(&mut b, 0x804_8000); // p_paddr
            u32le(&mut b, content_off); // p_filesz
            u32le(&mut b, content_off); // p_memsz
            u32le(&mut b, 5); // p_flags = R+X
            u32le(&mut b, 0x1000); // p_align
        }
    }
    b
}

/// Minimal PE image: DOS header, PE signature, COFF header, no optional
/// header and no sections.
pub fn pe(machine: u16, characteristics: u16) -> Vec<u8> {
    let mut b = vec![0u8; 0x40];
    b[0] = b'M';
    b[1] = b'Z';
    b[0x3c..0x40].copy_from_slice(&0x40u32.to_le_bytes());

    b.extend_from_slice(b"PE\0\0");
    u16le(&mut b, machine);
    u16le(&mut b, 0); // number_of_sections
    u32le(&mut b, 0); // time_date_stamp
    u32le(&mut b, 0); // pointer_to_symbol_table
    u32le(&mut b, 0); // number_of_symbols
    u16le(&mut b, 0); // size_of_optional_header
    u16le(&mut b, characteristics);
    b
}

/// Decree (CGC) challenge binary: CGC magic over an otherwise ELF32-like
/// header.
pub fn cgc() -> Vec<u8> {
    let mut b = elf32(EM_386, None);
    b[..4].copy_from_slice(b"\x7fCGC");
    b
}

pub fn write_fixture(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, bytes).expect("write fixture");
    path
}

/// Image descriptor JSON for tests.
pub fn image_descriptor_json(name: &str, os_name: &str, arch: &str, formats: &[&str]) -> String {
    let formats = formats.iter().map(|f| format!("\"{f}\"")).collect::<Vec<_>>().join(", ");
    format!(
        r#"{{
    "name": "{name}",
    "path": "{name}/image.raw.s2e",
    "memory": "256M",
    "snapshot": "ready",
    "qemu_build": "{arch}",
    "qemu_extra_flags": "",
    "os": {{
        "name": "{os_name}",
        "version": "1.0",
        "arch": "{arch}",
        "binary_formats": [{formats}]
    }}
}}"#
    )
}
