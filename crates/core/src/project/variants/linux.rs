//! Linux application projects.

use crate::config::ProjectConfig;
use crate::env::Environment;
use crate::images::OsDesc;
use crate::sniff::{TargetClassification, TargetFormat};

use super::is_valid_arch;
use crate::project::{base_config, ProjectResult, ProjectVariant, TargetOptions};

/// Project variant for Linux ELF executables.
#[derive(Debug)]
pub struct LinuxProject;

impl ProjectVariant for LinuxProject {
    fn name(&self) -> &'static str {
        "linux"
    }

    fn project_type(&self) -> &'static str {
        "linux"
    }

    fn lua_template(&self) -> &'static str {
        "s2e-config.linux.lua"
    }

    fn bootstrap_template(&self) -> &'static str {
        "bootstrap.linux.sh"
    }

    fn supports_target(&self, classification: &TargetClassification) -> bool {
        classification.format == TargetFormat::Elf
    }

    fn is_valid_image(&self, classification: &TargetClassification, os: &OsDesc) -> bool {
        is_valid_arch(classification, os) && os.binary_formats.iter().any(|f| f == "elf")
    }

    fn configure(
        &self,
        env: &Environment,
        classification: &TargetClassification,
        options: &TargetOptions,
    ) -> ProjectResult<ProjectConfig> {
        // The base layers already capture everything a Linux target needs;
        // link mode came from classification.
        base_config(env, classification, options, self.project_type())
    }
}
