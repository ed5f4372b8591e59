//! Environment resolution and lifecycle.
//!
//! An environment is a directory tree holding engine sources, builds,
//! images, and projects. The marker file `s2e.yaml` at its root stores
//! environment-local settings and is the sole signal that the directory is
//! a valid environment: deleting the marker invalidates the environment
//! even if every other directory remains.
//!
//! The environment is resolved once per command invocation and threaded
//! through as a value; nothing here is process-global.

use std::collections::BTreeMap;
use std::env as process_env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::{ConfigValue, ProjectConfig};

/// Name of the marker/settings file at the environment root.
pub const MARKER_FILE: &str = "s2e.yaml";

/// Environment variable consulted when no explicit path is given.
pub const ENV_DIR_VAR: &str = "S2EDIR";

/// Engine-wide defaults merged as the lowest-priority configuration layer.
///
/// Environment settings and per-project values override these key by key.
const GLOBAL_DEFAULTS_YAML: &str = r#"
repo_url: https://github.com/S2E
build_command: make -f Makefile.s2e
image_build_command: make -f Makefile.images
qemu_memory: 256M
use_cupa: true
use_test_case_generator: true
"#;

/// Error type for environment resolution and initialization.
#[derive(Debug, Error)]
pub enum EnvError {
    /// No environment could be located (explicit path, `S2EDIR`, and the
    /// upward walk from the working directory all failed).
    #[error("no S2E environment: {details}")]
    NoEnvironment { details: String },

    /// The marker file exists but cannot be read.
    #[error("unable to read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The marker file or embedded defaults are not a valid YAML mapping.
    #[error("malformed environment configuration {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `init` refused to take over a non-empty directory.
    #[error("{path} is not empty; pass --force to initialize it anyway")]
    NotEmpty { path: PathBuf },

    /// Filesystem failure while creating the environment tree.
    #[error("unable to create environment at {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience result type for environment operations.
pub type EnvResult<T> = Result<T, EnvError>;

/// Settings stored in the `s2e.yaml` marker file.
///
/// Known keys are typed; everything else (disassembler paths, build
/// command overrides) is kept verbatim and merged into the project
/// configuration as the environment layer.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EnvSettings {
    /// Tool version that created this environment.
    pub version: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl Default for EnvSettings {
    fn default() -> Self {
        Self { version: env!("CARGO_PKG_VERSION").to_string(), extra: BTreeMap::new() }
    }
}

/// A resolved environment: root directory plus parsed settings.
#[derive(Debug, Clone)]
pub struct Environment {
    root: PathBuf,
    settings: EnvSettings,
}

impl Environment {
    /// Resolve the active environment.
    ///
    /// Resolution order: explicit path, the `S2EDIR` environment variable,
    /// then an upward walk from the current directory to the first
    /// ancestor containing the marker file.
    pub fn locate(explicit: Option<&Path>) -> EnvResult<Self> {
        if let Some(path) = explicit {
            return Self::open(path);
        }

        if let Some(dir) = process_env::var_os(ENV_DIR_VAR) {
            return Self::open(Path::new(&dir));
        }

        let cwd = process_env::current_dir().map_err(|source| EnvError::Unreadable {
            path: PathBuf::from("."),
            source,
        })?;
        for ancestor in cwd.ancestors() {
            if ancestor.join(MARKER_FILE).is_file() {
                return Self::open(ancestor);
            }
        }

        Err(EnvError::NoEnvironment {
            details: format!(
                "no {MARKER_FILE} in {} or any parent; pass --env or set {ENV_DIR_VAR}",
                cwd.display()
            ),
        })
    }

    /// Open the environment rooted at `root`, requiring the marker file.
    pub fn open(root: &Path) -> EnvResult<Self> {
        let marker = root.join(MARKER_FILE);
        if !marker.is_file() {
            return Err(EnvError::NoEnvironment {
                details: format!("{} does not contain {MARKER_FILE}", root.display()),
            });
        }

        let body = fs::read_to_string(&marker)
            .map_err(|source| EnvError::Unreadable { path: marker.clone(), source })?;
        let settings: EnvSettings = serde_yaml::from_str(&body)
            .map_err(|source| EnvError::Malformed { path: marker, source })?;

        Ok(Self { root: root.to_path_buf(), settings })
    }

    /// Create a new environment at `root`: the directory tree plus the
    /// marker file. Refuses a non-empty directory unless `force` is set.
    pub fn init(root: &Path, force: bool) -> EnvResult<Self> {
        if root.is_dir() && !force {
            let mut entries = fs::read_dir(root)
                .map_err(|source| EnvError::Unreadable { path: root.to_path_buf(), source })?;
            if entries.next().is_some() {
                return Err(EnvError::NotEmpty { path: root.to_path_buf() });
            }
        }

        for dir in ["projects", "images", "source", "install", "build"] {
            let path = root.join(dir);
            fs::create_dir_all(&path).map_err(|source| EnvError::Create { path, source })?;
        }

        let settings = EnvSettings::default();
        let marker = root.join(MARKER_FILE);
        let body = serde_yaml::to_string(&settings)
            .map_err(|source| EnvError::Malformed { path: marker.clone(), source })?;
        fs::write(&marker, body)
            .map_err(|source| EnvError::Create { path: marker, source })?;

        Ok(Self { root: root.to_path_buf(), settings })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings(&self) -> &EnvSettings {
        &self.settings
    }

    pub fn marker_path(&self) -> PathBuf {
        self.root.join(MARKER_FILE)
    }

    pub fn projects_dir(&self) -> PathBuf {
        self.root.join("projects")
    }

    pub fn project_dir(&self, name: &str) -> PathBuf {
        self.projects_dir().join(name)
    }

    pub fn images_dir(&self) -> PathBuf {
        self.root.join("images")
    }

    pub fn source_dir(&self) -> PathBuf {
        self.root.join("source")
    }

    pub fn install_dir(&self) -> PathBuf {
        self.root.join("install")
    }

    pub fn build_dir(&self) -> PathBuf {
        self.root.join("build")
    }

    /// The two lowest configuration layers for this environment: embedded
    /// global defaults overlaid with the marker file's settings, plus the
    /// environment root itself under `env_dir`.
    pub fn project_defaults(&self) -> EnvResult<ProjectConfig> {
        let raw: serde_yaml::Value = serde_yaml::from_str(GLOBAL_DEFAULTS_YAML).map_err(
            |source| EnvError::Malformed { path: PathBuf::from("<builtin defaults>"), source },
        )?;

        let mut defaults = yaml_mapping_to_config(&raw);
        for (key, value) in &self.settings.extra {
            defaults.insert(key.clone(), config_value_from_yaml(value));
        }
        defaults.insert("env_dir", self.root.display().to_string());
        Ok(defaults)
    }
}

fn yaml_mapping_to_config(value: &serde_yaml::Value) -> ProjectConfig {
    let mut config = ProjectConfig::new();
    if let serde_yaml::Value::Mapping(map) = value {
        for (key, value) in map {
            if let Some(key) = key.as_str() {
                config.insert(key, config_value_from_yaml(value));
            }
        }
    }
    config
}

/// Convert a YAML settings value into a configuration value.
///
/// Floats and other exotic scalars degrade to their string form; the
/// configuration layer only distinguishes the shapes templates care about.
fn config_value_from_yaml(value: &serde_yaml::Value) -> ConfigValue {
    match value {
        serde_yaml::Value::Bool(b) => ConfigValue::Bool(*b),
        serde_yaml::Value::Number(n) => match n.as_i64() {
            Some(i) => ConfigValue::Int(i),
            None => ConfigValue::Str(n.to_string()),
        },
        serde_yaml::Value::String(s) => ConfigValue::Str(s.clone()),
        serde_yaml::Value::Sequence(items) => {
            ConfigValue::List(items.iter().map(config_value_from_yaml).collect())
        }
        serde_yaml::Value::Mapping(map) => {
            let mut out = BTreeMap::new();
            for (key, value) in map {
                if let Some(key) = key.as_str() {
                    out.insert(key.to_string(), config_value_from_yaml(value));
                }
            }
            ConfigValue::Map(out)
        }
        _ => ConfigValue::Str(String::new()),
    }
}
