use std::path::PathBuf;

use anyhow::{Context, Result};

use s2e_core::env::Environment;
use s2e_core::project::registry::VariantRegistry;
use s2e_core::project::{resolver, TargetOptions};
use s2e_core::template::FragmentStore;

use crate::canonicalize_or_current;

/// Parsed arguments for `s2e new-project`.
#[derive(Debug, Clone, Default)]
pub struct NewProjectArgs {
    pub target: PathBuf,
    pub target_args: Vec<String>,
    pub name: Option<String>,
    pub image: Option<String>,
    pub variant: Option<String>,
    pub use_seeds: bool,
    pub sym_args: Vec<i64>,
    pub enable_pov_generation: bool,
    pub force: bool,
}

/// Initialize a new analysis project for a target binary.
///
/// Classifies the target, resolves the project variant and configuration,
/// and materializes the project directory under `projects/`.
pub fn new_project_command(env: &Environment, args: &NewProjectArgs) -> Result<()> {
    let target = canonicalize_or_current(&args.target)?;

    let options = TargetOptions {
        name: args.name.clone(),
        image: args.image.clone(),
        target_args: args.target_args.clone(),
        use_seeds: args.use_seeds,
        sym_args: args.sym_args.clone(),
        enable_pov_generation: args.enable_pov_generation,
    };

    let registry = VariantRegistry::builtin();
    let store = FragmentStore::builtin();

    let (variant, config) =
        resolver::resolve(env, &registry, &target, args.variant.as_deref(), &options)
            .with_context(|| format!("Failed to configure a project for {}", target.display()))?;

    let project_dir = variant
        .create(env, &store, &config, args.force)
        .with_context(|| format!("Failed to create project for {}", target.display()))?;

    print_marker_warnings(&config);

    println!("Created {} project in {}", variant.name(), project_dir.display());
    println!();
    let instructions = variant.instructions(&store, &config)?;
    println!("{instructions}");

    Ok(())
}

/// Warnings about symbolic input, mirrored into the CLI so the user sees
/// them immediately instead of at first launch.
fn print_marker_warnings(config: &s2e_core::config::ProjectConfig) {
    let truthy = |key: &str| config.get(key).is_some_and(|v| v.is_truthy());

    if truthy("warn_input_file") && !truthy("use_symb_input_file") && !truthy("sym_args") {
        eprintln!(
            "warning: you did not specify the input file marker @@, which is \
             automatically substituted by a file with symbolic content. You will \
             have to edit bootstrap.sh to explore more than one path."
        );
    }

    if truthy("warn_seeds") && truthy("use_seeds") && !truthy("use_symb_input_file") {
        eprintln!(
            "warning: seed files are enabled but no input file marker @@ was \
             given; seeds will be fetched but never used. Is this intentional?"
        );
    }
}
