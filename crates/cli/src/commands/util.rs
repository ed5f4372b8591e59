use std::path::Path;

use anyhow::Result;

use s2e_core::env::Environment;

/// Resolve the active environment: explicit `--env` path, the `S2EDIR`
/// environment variable, or an upward walk from the current directory.
pub fn resolve_env(explicit: Option<&Path>) -> Result<Environment> {
    Ok(Environment::locate(explicit)?)
}

/// Helper to print whether a directory exists.
pub fn print_dir_status(label: &str, path: &Path) {
    let exists = path.is_dir();
    println!("- {label}: {} ({})", if exists { "OK" } else { "MISSING" }, path.display());
}
