//! Fixtures for CLI end-to-end tests: a minimal ELF target and an image
//! descriptor, enough to drive `new-project` against a scratch
//! environment.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

fn u16le(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn u32le(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn u64le(out: &mut Vec<u8>, value: u64) {
    out.extend_from_slice(&value.to_le_bytes());
}

/// Minimal dynamically linked 64-bit x86-64 ELF executable.
pub fn elf64_dynamic() -> Vec<u8> {
    let interp: &[u8] = b"/lib64/ld-linux-x86-64.so.2\0";
    let content_off: u64 = 64 + 56;

    let mut b = Vec::new();
    b.extend_from_slice(b"\x7fELF");
    b.push(2); // ELFCLASS64
    b.push(1); // ELFDATA2LSB
    b.push(1); // EV_CURRENT
    b.push(0); // ELFOSABI_NONE
    b.extend_from_slice(&[0u8; 8]);
    u16le(&mut b, 2); // e_type = ET_EXEC
    u16le(&mut b, 62); // e_machine = EM_X86_64
    u32le(&mut b, 1); // e_version
    u64le(&mut b, 0x40_0000); // e_entry
    u64le(&mut b, 64); // e_phoff
    u64le(&mut b, 0); // e_shoff
    u32le(&mut b, 0); // e_flags
    u16le(&mut b, 64); // e_ehsize
    u16le(&mut b, 56); // e_phentsize
    u16le(&mut b, 1); // e_phnum
    u16le(&mut b, 0); // e_shentsize
    u16le(&mut b, 0); // e_shnum
    u16le(&mut b, 0); // e_shstrndx

    u32le(&mut b, 3); // p_type = PT_INTERP
    u32le(&mut b, 4); // p_flags = R
    u64le(&mut b, content_off); // p_offset
    u64le(&mut b, 0x40_0000 + content_off); // p_vaddr
    u64le(&mut b, 0x40_0000 + content_off); // p_paddr
    u64le(&mut b, interp.len() as u64); // p_filesz
    u64le(&mut b, interp.len() as u64); // p_memsz
    u64le(&mut b, 1); // p_align
    b.extend_from_slice(interp);
    b
}

/// Install an x86_64 Linux image descriptor into an environment.
pub fn install_linux_image(env_root: &Path, name: &str) -> PathBuf {
    let descriptor = format!(
        r#"{{
    "name": "{name}",
    "path": "{name}/image.raw.s2e",
    "memory": "256M",
    "snapshot": "ready",
    "qemu_build": "x86_64",
    "qemu_extra_flags": "",
    "os": {{
        "name": "debian",
        "version": "12.5",
        "arch": "x86_64",
        "binary_formats": ["elf"]
    }}
}}"#
    );
    let path = env_root.join("images").join(format!("{name}.json"));
    fs::write(&path, descriptor).expect("write image descriptor");
    path
}
