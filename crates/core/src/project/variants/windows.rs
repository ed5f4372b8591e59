//! Windows executable, DLL, and driver projects.

use crate::config::{ConfigValue, ProjectConfig};
use crate::env::Environment;
use crate::images::OsDesc;
use crate::sniff::{TargetClassification, TargetFormat};

use super::is_valid_arch;
use crate::project::{base_config, ProjectError, ProjectResult, ProjectVariant, TargetOptions};

fn supports_pe_image(classification: &TargetClassification, os: &OsDesc) -> bool {
    is_valid_arch(classification, os) && os.binary_formats.iter().any(|f| f == "pe")
}

/// Windows module names are matched case-insensitively by the guest
/// monitor, so they are stored lower-case in the configuration.
fn lowercase_modules(config: &ProjectConfig) -> ProjectConfig {
    let modules = match config.get("modules").and_then(ConfigValue::as_list) {
        Some(items) => items
            .iter()
            .map(|m| ConfigValue::Str(m.to_string().to_lowercase()))
            .collect::<Vec<_>>(),
        None => Vec::new(),
    };
    config.with("modules", ConfigValue::List(modules))
}

/// Project variant for Windows PE executables.
#[derive(Debug)]
pub struct WindowsExeProject;

impl ProjectVariant for WindowsExeProject {
    fn name(&self) -> &'static str {
        "windows"
    }

    fn project_type(&self) -> &'static str {
        "windows"
    }

    fn lua_template(&self) -> &'static str {
        "s2e-config.windows.lua"
    }

    fn bootstrap_template(&self) -> &'static str {
        "bootstrap.windows.sh"
    }

    fn supports_target(&self, classification: &TargetClassification) -> bool {
        classification.format == TargetFormat::PeExe
    }

    fn is_valid_image(&self, classification: &TargetClassification, os: &OsDesc) -> bool {
        supports_pe_image(classification, os)
    }

    fn configure(
        &self,
        env: &Environment,
        classification: &TargetClassification,
        options: &TargetOptions,
    ) -> ProjectResult<ProjectConfig> {
        let config = base_config(env, classification, options, self.project_type())?;
        Ok(lowercase_modules(&config))
    }
}

/// Project variant for Windows DLLs, driven through an exported entry
/// point.
#[derive(Debug)]
pub struct WindowsDllProject;

impl ProjectVariant for WindowsDllProject {
    fn name(&self) -> &'static str {
        "windows-dll"
    }

    fn project_type(&self) -> &'static str {
        "windows"
    }

    fn lua_template(&self) -> &'static str {
        "s2e-config.windows.lua"
    }

    fn bootstrap_template(&self) -> &'static str {
        "bootstrap.windows_dll.sh"
    }

    fn supports_target(&self, classification: &TargetClassification) -> bool {
        classification.format == TargetFormat::PeDll
    }

    fn is_valid_image(&self, classification: &TargetClassification, os: &OsDesc) -> bool {
        supports_pe_image(classification, os)
    }

    fn configure(
        &self,
        env: &Environment,
        classification: &TargetClassification,
        options: &TargetOptions,
    ) -> ProjectResult<ProjectConfig> {
        let config = base_config(env, classification, options, self.project_type())?;
        let mut config = lowercase_modules(&config);

        // Seed scheduling has no meaning for a DLL entry point.
        if options.use_seeds {
            config = config.with("use_seeds", false).with("warn_seeds", false);
        }

        // Default to the canonical entry point when none was given.
        if options.target_args.is_empty() {
            config = config.with("target_args", vec!["DllEntryPoint".to_string()]);
        }

        Ok(config)
    }
}

/// Project variant for Windows kernel drivers. Never selected by
/// classification alone (a driver is indistinguishable from any other PE
/// image by header); requested explicitly via `--variant windows-driver`.
#[derive(Debug)]
pub struct WindowsDriverProject;

impl ProjectVariant for WindowsDriverProject {
    fn name(&self) -> &'static str {
        "windows-driver"
    }

    fn project_type(&self) -> &'static str {
        "windows"
    }

    fn lua_template(&self) -> &'static str {
        "s2e-config.windows.lua"
    }

    fn bootstrap_template(&self) -> &'static str {
        "bootstrap.windows_driver.sh"
    }

    fn supports_target(&self, classification: &TargetClassification) -> bool {
        matches!(classification.format, TargetFormat::PeExe | TargetFormat::PeDll)
    }

    fn is_valid_image(&self, classification: &TargetClassification, os: &OsDesc) -> bool {
        // Drivers must match the guest kernel's bitness exactly.
        os.name == "windows" && os.arch == classification.guest_arch()
    }

    fn configure(
        &self,
        env: &Environment,
        classification: &TargetClassification,
        options: &TargetOptions,
    ) -> ProjectResult<ProjectConfig> {
        if options.use_seeds {
            return Err(ProjectError::InvalidConfiguration(
                "seeds are not supported for kernel drivers".to_string(),
            ));
        }

        let config = base_config(env, classification, options, self.project_type())?;
        let config = lowercase_modules(&config);

        // Fault injection drives error-path exploration in drivers, and
        // exhaustive searching beats CUPA there.
        Ok(config
            .with("use_fault_injection", true)
            .with("use_cupa", false)
            .with("warn_input_file", false)
            .with("warn_seeds", false))
    }
}
