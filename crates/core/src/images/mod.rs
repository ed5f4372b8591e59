//! Virtual machine image descriptors.
//!
//! Each image available to an environment is described by a JSON file
//! `images/<name>.json`. The descriptor records where the disk image
//! lives, how to boot it, and which guest OS it contains; project variants
//! use the OS description to decide whether an image can run a given
//! target.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Error type for image descriptor handling.
#[derive(Debug, Error)]
pub enum ImageError {
    /// The descriptor file could not be read.
    #[error("unable to read image descriptor {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The descriptor file is not valid JSON or misses required fields.
    #[error("malformed image descriptor {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// No descriptor exists for the requested image name.
    #[error("no image named `{name}` in {images_dir}")]
    NoSuchImage { name: String, images_dir: PathBuf },
}

/// Convenience result type for image operations.
pub type ImageResult<T> = Result<T, ImageError>;

/// Guest operating system description embedded in an image descriptor.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OsDesc {
    /// OS family, e.g. "debian" or "windows".
    pub name: String,
    /// OS version string.
    #[serde(default)]
    pub version: String,
    /// Guest architecture, "i386" or "x86_64".
    pub arch: String,
    /// Executable container formats the guest can run, e.g. ["elf"].
    pub binary_formats: Vec<String>,
}

/// Descriptor for one bootable analysis image.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ImageDescriptor {
    /// Image name; matches the descriptor's file stem.
    pub name: String,
    /// Disk image path, relative to the environment's `images/` directory.
    pub path: String,
    /// Guest memory size passed to the emulator, e.g. "256M".
    pub memory: String,
    /// Snapshot name to resume from.
    pub snapshot: String,
    /// QEMU build to boot this image with ("i386" or "x86_64").
    pub qemu_build: String,
    /// Additional emulator flags.
    #[serde(default)]
    pub qemu_extra_flags: String,
    /// Guest operating system description.
    pub os: OsDesc,
}

/// Load a single image descriptor from `path`.
pub fn load_descriptor(path: &Path) -> ImageResult<ImageDescriptor> {
    let body = fs::read_to_string(path)
        .map_err(|source| ImageError::Unreadable { path: path.to_path_buf(), source })?;
    serde_json::from_str(&body)
        .map_err(|source| ImageError::Malformed { path: path.to_path_buf(), source })
}

/// Load the descriptor for a named image from `images_dir`.
pub fn load_named(images_dir: &Path, name: &str) -> ImageResult<ImageDescriptor> {
    let path = images_dir.join(format!("{name}.json"));
    if !path.is_file() {
        return Err(ImageError::NoSuchImage {
            name: name.to_string(),
            images_dir: images_dir.to_path_buf(),
        });
    }
    load_descriptor(&path)
}

/// List every image descriptor under `images_dir`, sorted by name.
///
/// The sort keeps automatic image selection deterministic: when no image
/// is requested explicitly, the first compatible descriptor in this order
/// is chosen. A missing directory is an empty inventory, not an error.
pub fn list_images(images_dir: &Path) -> ImageResult<Vec<ImageDescriptor>> {
    let mut images = Vec::new();
    if !images_dir.is_dir() {
        return Ok(images);
    }

    let entries = fs::read_dir(images_dir)
        .map_err(|source| ImageError::Unreadable { path: images_dir.to_path_buf(), source })?;
    for entry in entries {
        let entry =
            entry.map_err(|source| ImageError::Unreadable { path: images_dir.to_path_buf(), source })?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        images.push(load_descriptor(&path)?);
    }

    images.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(images)
}
