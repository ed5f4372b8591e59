use std::fs;
use std::path::Path;
use std::process::Command;

use anyhow::{anyhow, Context, Result};

use s2e_core::env::Environment;

/// Build the engine sources with the configured external build tool.
///
/// The tool is taken from the `build_command` key (global defaults,
/// overridable in `s2e.yaml`) and awaited synchronously; a non-zero exit
/// becomes a reported error. Incremental/resumable behavior is the
/// external tool's responsibility.
pub fn build_command(env: &Environment) -> Result<()> {
    let build_dir = env.build_dir();
    run_external(env, "build_command", &build_dir, &[])
}

/// Build the named VM image with the configured external image tool.
pub fn image_build_command(env: &Environment, name: &str) -> Result<()> {
    let images_dir = env.images_dir();
    run_external(env, "image_build_command", &images_dir, &[name])
}

fn run_external(env: &Environment, key: &str, cwd: &Path, extra_args: &[&str]) -> Result<()> {
    let defaults = env.project_defaults()?;
    let command_line = defaults
        .require_str(key)
        .map_err(|_| anyhow!("No `{key}` configured; set it in {}", env.marker_path().display()))?
        .to_string();

    let mut words = command_line.split_whitespace();
    let program = words
        .next()
        .ok_or_else(|| anyhow!("`{key}` in {} is empty", env.marker_path().display()))?;

    fs::create_dir_all(cwd).with_context(|| format!("Failed to create {}", cwd.display()))?;

    println!("Running `{command_line}{}{}` in {}",
        if extra_args.is_empty() { "" } else { " " },
        extra_args.join(" "),
        cwd.display()
    );

    let status = Command::new(program)
        .args(words)
        .args(extra_args)
        .current_dir(cwd)
        .status()
        .with_context(|| format!("Failed to spawn `{program}`"))?;

    if !status.success() {
        return Err(anyhow!(
            "`{command_line}` failed with {}",
            status
                .code()
                .map(|code| format!("exit code {code}"))
                .unwrap_or_else(|| "a signal".to_string())
        ));
    }

    Ok(())
}
