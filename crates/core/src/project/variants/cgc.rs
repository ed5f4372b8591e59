//! Decree (Cyber Grand Challenge) projects.

use crate::config::ProjectConfig;
use crate::env::Environment;
use crate::images::OsDesc;
use crate::sniff::{TargetClassification, TargetFormat};

use super::is_valid_arch;
use crate::project::{base_config, ProjectError, ProjectResult, ProjectVariant, TargetOptions};

/// Project variant for DARPA Decree challenge binaries.
///
/// Decree targets always run under seed scheduling with recipe-driven PoV
/// generation; the corresponding options are forced on rather than left to
/// the user.
#[derive(Debug)]
pub struct CgcProject;

impl ProjectVariant for CgcProject {
    fn name(&self) -> &'static str {
        "cgc"
    }

    fn project_type(&self) -> &'static str {
        "cgc"
    }

    fn lua_template(&self) -> &'static str {
        "s2e-config.cgc.lua"
    }

    fn bootstrap_template(&self) -> &'static str {
        "bootstrap.cgc.sh"
    }

    fn supports_target(&self, classification: &TargetClassification) -> bool {
        classification.format == TargetFormat::Cgc
    }

    fn is_valid_image(&self, classification: &TargetClassification, os: &OsDesc) -> bool {
        is_valid_arch(classification, os) && os.binary_formats.iter().any(|f| f == "decree")
    }

    fn configure(
        &self,
        env: &Environment,
        classification: &TargetClassification,
        options: &TargetOptions,
    ) -> ProjectResult<ProjectConfig> {
        if !options.target_args.is_empty() {
            return Err(ProjectError::InvalidConfiguration(
                "command line arguments are not supported for Decree binaries".to_string(),
            ));
        }

        let config = base_config(env, classification, options, self.project_type())?;

        Ok(config
            .with("use_seeds", true)
            .with("use_recipes", true)
            .with("enable_pov_generation", true)
            // Decree has its own test case generation pipeline.
            .with("use_test_case_generator", false)
            .with("warn_seeds", false)
            .with("warn_input_file", false))
    }
}
