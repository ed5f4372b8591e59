//! Built-in project variant implementations.

mod cgc;
mod linux;
mod windows;

pub use cgc::CgcProject;
pub use linux::LinuxProject;
pub use windows::{WindowsDllProject, WindowsDriverProject, WindowsExeProject};

use crate::images::OsDesc;
use crate::sniff::TargetClassification;

/// Architecture consistency between a target and a candidate image.
///
/// A 64-bit target needs a 64-bit guest; a 32-bit target runs on either.
pub(crate) fn is_valid_arch(classification: &TargetClassification, os: &OsDesc) -> bool {
    !(classification.guest_arch() == "x86_64" && os.arch != "x86_64")
}
