use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

use s2e_env::commands::{
    build_command, image_build_command, info_command, init_command, new_project_command,
    resolve_env, NewProjectArgs,
};
use s2e_env::parse_sym_args;

/// S2E environment and analysis-project manager CLI.
///
/// This CLI is a thin wrapper around `s2e-core` (exposed in code as
/// `s2e_core`). All substantive logic lives in the library so it can be
/// tested thoroughly and reused from other frontends.
#[derive(Parser, Debug)]
#[command(
    name = "s2e",
    version,
    about = "Manage S2E environments and analysis projects",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// Project variant selectable with `--variant`, bypassing target-based
/// selection.
#[derive(ValueEnum, Clone, Copy, Debug)]
enum VariantArg {
    Linux,
    Windows,
    WindowsDll,
    WindowsDriver,
    Cgc,
}

impl VariantArg {
    fn as_str(self) -> &'static str {
        match self {
            VariantArg::Linux => "linux",
            VariantArg::Windows => "windows",
            VariantArg::WindowsDll => "windows-dll",
            VariantArg::WindowsDriver => "windows-driver",
            VariantArg::Cgc => "cgc",
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new S2E environment at the given directory.
    ///
    /// This will:
    /// - Create the `projects`, `images`, `source`, `install`, and
    ///   `build` directories.
    /// - Write the `s2e.yaml` marker file that identifies the environment.
    Init {
        /// Directory to initialize. Created if it does not exist.
        path: PathBuf,

        /// Initialize even if the directory is not empty.
        #[arg(short, long, default_value_t = false)]
        force: bool,
    },

    /// Initialize a new analysis project for a target binary.
    ///
    /// The target's format is detected from its file contents (ELF, PE,
    /// Decree) and the matching project variant is selected unless
    /// `--variant` forces one.
    NewProject {
        /// Path to the target file to analyze.
        target: PathBuf,

        /// Arguments to the target program. Use @@ as an input file marker
        /// that is automatically substituted by a file with symbolic
        /// content.
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        target_args: Vec<String>,

        /// The name of the project. Defaults to the name of the target
        /// program.
        #[arg(short, long)]
        name: Option<String>,

        /// The name of an image in the `images` directory. If missing, the
        /// image will be guessed based on the type of the binary.
        #[arg(short, long)]
        image: Option<String>,

        /// Project variant. Guessed from the target's format if missing.
        #[arg(short = 't', long, value_enum)]
        variant: Option<VariantArg>,

        /// Use seeds for creating concolic files. Place them in the
        /// project's `seeds` directory before launching.
        #[arg(short = 's', long, default_value_t = false)]
        use_seeds: bool,

        /// A space-separated list of target argument indices to make
        /// symbolic.
        #[arg(short = 'a', long, default_value = "")]
        sym_args: String,

        /// Enable PoV generation.
        #[arg(long, default_value_t = false)]
        enable_pov_generation: bool,

        /// If a project with the given name already exists, replace it.
        #[arg(short, long, default_value_t = false)]
        force: bool,

        /// The S2E environment. Only used if the S2EDIR environment
        /// variable is not defined. Defaults to searching upwards from the
        /// current directory.
        #[arg(short, long)]
        env: Option<PathBuf>,
    },

    /// Show a summary of the environment: settings, images, and projects.
    Info {
        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// The S2E environment (see `new-project --env`).
        #[arg(short, long)]
        env: Option<PathBuf>,
    },

    /// Build the engine sources with the configured external build tool.
    Build {
        /// The S2E environment (see `new-project --env`).
        #[arg(short, long)]
        env: Option<PathBuf>,
    },

    /// Build a VM image with the configured external image-build tool.
    ImageBuild {
        /// Name of the image to build.
        name: String,

        /// The S2E environment (see `new-project --env`).
        #[arg(short, long)]
        env: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Single reporting point: every structured error surfaces here
            // with its message and a non-zero exit code.
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Init { path, force } => init_command(&path, force),
        Command::NewProject {
            target,
            target_args,
            name,
            image,
            variant,
            use_seeds,
            sym_args,
            enable_pov_generation,
            force,
            env,
        } => {
            let environment = resolve_env(env.as_deref())?;
            let args = NewProjectArgs {
                target,
                target_args,
                name,
                image,
                variant: variant.map(|v| v.as_str().to_string()),
                use_seeds,
                sym_args: parse_sym_args(&sym_args)?,
                enable_pov_generation,
                force,
            };
            new_project_command(&environment, &args)
        }
        Command::Info { json, env } => {
            let environment = resolve_env(env.as_deref())?;
            info_command(&environment, json)
        }
        Command::Build { env } => {
            let environment = resolve_env(env.as_deref())?;
            build_command(&environment)
        }
        Command::ImageBuild { name, env } => {
            let environment = resolve_env(env.as_deref())?;
            image_build_command(&environment, &name)
        }
    }
}
