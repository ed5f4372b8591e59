//! Transactional project directory materialization.
//!
//! Artifacts are written to a staging directory created inside the
//! `projects/` tree and moved into place with a single rename once every
//! write succeeded. Any failure before the rename tears the staging
//! directory down, so the final destination either receives a complete
//! project or nothing at all.

use std::fs;
use std::path::{Path, PathBuf};

use super::{ProjectError, ProjectResult};

/// What one artifact materializes into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactKind {
    /// A regular file with the given contents.
    File { contents: String, executable: bool },
    /// An (initially empty) directory, e.g. `seeds/`.
    Dir,
}

/// One fully rendered piece of a project directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Path relative to the project root.
    pub rel_path: PathBuf,
    pub kind: ArtifactKind,
}

impl Artifact {
    pub fn file(rel_path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self {
            rel_path: rel_path.into(),
            kind: ArtifactKind::File { contents: contents.into(), executable: false },
        }
    }

    pub fn executable(rel_path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self {
            rel_path: rel_path.into(),
            kind: ArtifactKind::File { contents: contents.into(), executable: true },
        }
    }

    pub fn dir(rel_path: impl Into<PathBuf>) -> Self {
        Self { rel_path: rel_path.into(), kind: ArtifactKind::Dir }
    }
}

/// Writes a single artifact below `root`. Abstracted so tests can inject
/// mid-materialization failures.
pub trait ArtifactWriter {
    fn write(&self, root: &Path, artifact: &Artifact) -> std::io::Result<()>;
}

/// Production writer backed by the filesystem.
pub struct FsWriter;

impl ArtifactWriter for FsWriter {
    fn write(&self, root: &Path, artifact: &Artifact) -> std::io::Result<()> {
        let path = root.join(&artifact.rel_path);
        match &artifact.kind {
            ArtifactKind::Dir => fs::create_dir_all(&path),
            ArtifactKind::File { contents, executable } => {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&path, contents)?;
                if *executable {
                    set_executable(&path)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(unix)]
fn set_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(perms.mode() | 0o755);
    fs::set_permissions(path, perms)
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

/// Materialize `artifacts` as `projects_dir/name`.
///
/// Fails with [`ProjectError::AlreadyExists`] when the destination exists
/// and `force` is false; the existing directory is left untouched. With
/// `force`, the old directory is only removed once the replacement has
/// been fully staged.
pub fn materialize(
    projects_dir: &Path,
    name: &str,
    artifacts: &[Artifact],
    writer: &dyn ArtifactWriter,
    force: bool,
) -> ProjectResult<PathBuf> {
    let dest = projects_dir.join(name);
    if dest.exists() && !force {
        return Err(ProjectError::AlreadyExists { name: name.to_string() });
    }

    fs::create_dir_all(projects_dir)
        .map_err(|source| ProjectError::Io { path: projects_dir.to_path_buf(), source })?;

    // Dropping the TempDir on any error path below removes the staging
    // tree, so a failed attempt leaves no trace under projects/.
    let staging = tempfile::Builder::new()
        .prefix(&format!(".{name}."))
        .tempdir_in(projects_dir)
        .map_err(|source| ProjectError::Io { path: projects_dir.to_path_buf(), source })?;

    for artifact in artifacts {
        writer.write(staging.path(), artifact).map_err(|source| ProjectError::Io {
            path: staging.path().join(&artifact.rel_path),
            source,
        })?;
    }

    if dest.exists() {
        fs::remove_dir_all(&dest)
            .map_err(|source| ProjectError::Io { path: dest.clone(), source })?;
    }

    let staged = staging.keep();
    if let Err(source) = fs::rename(&staged, &dest) {
        // The staging directory is no longer managed; clean it up before
        // surfacing the error.
        let _ = fs::remove_dir_all(&staged);
        return Err(ProjectError::Io { path: dest, source });
    }

    Ok(dest)
}
