//! Analysis project creation.
//!
//! A project variant (Linux application, Windows EXE/DLL/driver, Decree
//! CGC) turns a classified target into a resolved configuration and a set
//! of rendered artifacts, which the materializer writes transactionally
//! under the environment's `projects/` directory.

pub mod materialize;
pub mod registry;
pub mod resolver;
pub mod variants;

use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config::{ConfigError, ProjectConfig};
use crate::env::{EnvError, Environment};
use crate::images::{ImageError, OsDesc};
use crate::sniff::{LinkMode, SniffError, TargetClassification};
use crate::template::{FragmentStore, TemplateError};

use materialize::{Artifact, FsWriter};

/// Error type for project configuration and creation.
///
/// Lower-layer errors (sniffing, templating, configuration, images) pass
/// through with their specific messages; this enum only adds the variants
/// that originate at the project layer itself.
#[derive(Debug, Error)]
pub enum ProjectError {
    /// The target's format is not supported by any registered variant.
    #[error("unsupported target {path}: {details}")]
    UnsupportedTarget { path: PathBuf, details: String },

    /// The requested combination of target, variant, image, and options is
    /// contradictory.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// No available image can run the target.
    #[error("no compatible image for this {arch} {variant} target; add one under images/ or pass --image")]
    NoCompatibleImage { arch: String, variant: String },

    /// The destination project directory already exists.
    #[error("project `{name}` already exists; remove it or pass --force")]
    AlreadyExists { name: String },

    /// Filesystem failure during materialization.
    #[error("project filesystem operation failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("while rendering project artifacts: {0}")]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Sniff(#[from] SniffError),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error(transparent)]
    Env(#[from] EnvError),
}

/// Convenience result type for project operations.
pub type ProjectResult<T> = Result<T, ProjectError>;

/// User-supplied options for `new-project`.
#[derive(Debug, Clone, Default)]
pub struct TargetOptions {
    /// Project name; defaults to the target file stem.
    pub name: Option<String>,
    /// Image name; auto-selected from the inventory when absent.
    pub image: Option<String>,
    /// Arguments passed to the target inside the guest. `@@` marks the
    /// symbolic input file.
    pub target_args: Vec<String>,
    /// Schedule seed files from the project's `seeds/` directory.
    pub use_seeds: bool,
    /// Indices of target arguments to make symbolic.
    pub sym_args: Vec<i64>,
    /// Enable proof-of-vulnerability generation.
    pub enable_pov_generation: bool,
}

/// Keys every variant's templates consume. Validated before rendering so a
/// gap surfaces as a configuration error naming the key.
pub const COMMON_REQUIRED_KEYS: &[&str] = &[
    "project_name",
    "project_dir",
    "env_dir",
    "creation_time",
    "target",
    "target_name",
    "target_args",
    "sym_args",
    "use_symb_input_file",
    "use_seeds",
    "seeds_dir",
    "use_recipes",
    "recipes_dir",
    "enable_pov_generation",
    "use_test_case_generator",
    "use_fault_injection",
    "use_cupa",
    "project_type",
    "dynamically_linked",
    "image",
    "image_arch",
    "image_path",
    "qemu_arch",
    "qemu_memory",
    "qemu_snapshot",
    "qemu_extra_flags",
];

/// One project implementation, selected by target classification (or by
/// name). The capability set is deliberately flat: configure, validate
/// image compatibility, create, and describe.
pub trait ProjectVariant: std::fmt::Debug {
    /// Stable variant name used for `--variant` selection.
    fn name(&self) -> &'static str;

    /// Template family: "linux", "windows", or "cgc".
    fn project_type(&self) -> &'static str;

    /// Root fragment for the plugin configuration artifact.
    fn lua_template(&self) -> &'static str;

    /// Root fragment for the guest bootstrap artifact.
    fn bootstrap_template(&self) -> &'static str;

    /// Whether this variant can analyze the given target classification.
    fn supports_target(&self, classification: &TargetClassification) -> bool;

    /// Whether an image with the given guest OS can run the target.
    fn is_valid_image(&self, classification: &TargetClassification, os: &OsDesc) -> bool;

    /// Build the resolved project configuration for this target.
    ///
    /// Variant-specific rules (forced or rejected options) are applied
    /// here; the result is complete except for the image layer, which the
    /// resolver merges after image selection.
    fn configure(
        &self,
        env: &Environment,
        classification: &TargetClassification,
        options: &TargetOptions,
    ) -> ProjectResult<ProjectConfig>;

    /// Keys that must be present before artifacts are rendered.
    fn required_keys(&self) -> &'static [&'static str] {
        COMMON_REQUIRED_KEYS
    }

    /// Render every artifact for this project.
    ///
    /// All rendering happens before any filesystem write, so a template
    /// error can never leave a half-written project behind.
    fn artifacts(
        &self,
        store: &FragmentStore,
        config: &ProjectConfig,
    ) -> ProjectResult<Vec<Artifact>> {
        let mut artifacts = vec![
            Artifact::executable("launch-s2e.sh", store.render("launch-s2e.sh", config)?),
            Artifact::file("s2e-config.lua", store.render(self.lua_template(), config)?),
            Artifact::executable("bootstrap.sh", store.render(self.bootstrap_template(), config)?),
        ];

        if config.require_bool("use_seeds")? {
            artifacts.push(Artifact::dir("seeds"));
        }
        if config.require_bool("use_recipes")? {
            artifacts.push(Artifact::dir("recipes"));
        }

        // The JSON descriptor lets other commands (and the user) inspect
        // how the project was configured.
        let descriptor = serde_json::to_string_pretty(config)
            .map_err(|source| ProjectError::InvalidConfiguration(source.to_string()))?;
        artifacts.push(Artifact::file("project.json", descriptor + "\n"));

        Ok(artifacts)
    }

    /// Create the project directory, returning its path.
    fn create(
        &self,
        env: &Environment,
        store: &FragmentStore,
        config: &ProjectConfig,
        force: bool,
    ) -> ProjectResult<PathBuf> {
        config.ensure_keys(self.required_keys())?;
        let artifacts = self.artifacts(store, config)?;
        let name = config.require_str("project_name")?;
        materialize::materialize(&env.projects_dir(), name, &artifacts, &FsWriter, force)
    }

    /// Usage instructions shown to the user after creation.
    fn instructions(
        &self,
        store: &FragmentStore,
        config: &ProjectConfig,
    ) -> ProjectResult<String> {
        Ok(store.render("instructions.txt", config)?)
    }
}

/// Configuration layers shared by every variant: environment defaults,
/// values derived from the target classification, then user options, each
/// overwriting the previous layer key by key.
pub(crate) fn base_config(
    env: &Environment,
    classification: &TargetClassification,
    options: &TargetOptions,
    project_type: &'static str,
) -> ProjectResult<ProjectConfig> {
    let target_path = &classification.path;
    let target_name = target_path
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| target_path.display().to_string());

    let project_name = options.name.clone().unwrap_or_else(|| {
        target_path
            .file_stem()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .unwrap_or_else(|| target_name.clone())
    });
    let project_dir = env.project_dir(&project_name);

    let mut derived = ProjectConfig::new();
    derived.insert("project_name", project_name);
    derived.insert("project_dir", project_dir.display().to_string());
    derived.insert("creation_time", chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string());
    derived.insert("project_type", project_type);
    derived.insert("target", target_path.display().to_string());
    derived.insert("target_name", target_name.clone());
    derived.insert("target_sha256", sha256_file(target_path)?);
    derived.insert("image_arch", classification.guest_arch());
    derived.insert("dynamically_linked", classification.link_mode == LinkMode::Dynamic);
    derived.insert("seeds_dir", project_dir.join("seeds").display().to_string());
    derived.insert("recipes_dir", project_dir.join("recipes").display().to_string());
    derived.insert("modules", vec![target_name.clone()]);
    derived.insert("processes", vec![target_name]);
    derived.insert("use_recipes", false);
    derived.insert("use_fault_injection", false);
    derived.insert("warn_seeds", true);
    derived.insert("warn_input_file", true);

    let mut user = ProjectConfig::new();
    user.insert("target_args", options.target_args.clone());
    user.insert("sym_args", options.sym_args.clone());
    user.insert(
        "use_symb_input_file",
        options.target_args.iter().any(|arg| arg == "@@"),
    );
    user.insert("use_seeds", options.use_seeds);
    user.insert("enable_pov_generation", options.enable_pov_generation);

    Ok(env.project_defaults()?.merged(&derived).merged(&user))
}

/// Compute the SHA-256 hash of a file and return it as a hex string.
///
/// Recorded in the project descriptor so later commands can detect a
/// target that changed after project creation.
pub fn sha256_file(path: &Path) -> ProjectResult<String> {
    let file = fs::File::open(path)
        .map_err(|source| ProjectError::Io { path: path.to_path_buf(), source })?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];

    loop {
        let n = reader
            .read(&mut buf)
            .map_err(|source| ProjectError::Io { path: path.to_path_buf(), source })?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
