use std::path::Path;

use anyhow::Result;

use s2e_core::env::Environment;

use crate::canonicalize_or_current;

/// Create a new S2E environment at `path`.
///
/// This will:
/// - Create the `projects`, `images`, `source`, `install`, and `build`
///   directories.
/// - Write the `s2e.yaml` marker file with default settings.
pub fn init_command(path: &Path, force: bool) -> Result<()> {
    let root = canonicalize_or_current(path)?;
    let env = Environment::init(&root, force)?;

    println!("Initialized S2E environment:");
    println!("  Root: {}", env.root().display());
    println!("  Marker: {}", env.marker_path().display());
    println!("  Projects dir: {}", env.projects_dir().display());
    println!("  Images dir: {}", env.images_dir().display());
    println!("  Source dir: {}", env.source_dir().display());
    println!("  Build dir: {}", env.build_dir().display());
    println!();
    println!("Run `s2e build` to build the engine and `s2e new-project <target>`");
    println!("to create your first analysis project.");

    Ok(())
}
