use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

pub mod commands;

/// Canonicalize a path if possible, falling back to joining it onto the
/// current working directory (e.g. for paths that do not exist yet).
pub fn canonicalize_or_current(path: &Path) -> Result<PathBuf> {
    if path == Path::new(".") {
        return env::current_dir().context("Failed to get current directory");
    }
    match path.canonicalize() {
        Ok(p) => Ok(p),
        Err(_) => {
            let cwd = env::current_dir().context("Failed to get current directory")?;
            Ok(cwd.join(path))
        }
    }
}

/// Parse a list of argument indices to make symbolic.
///
/// The input is a string of space-separated integers, each naming a target
/// argument position. E.g. "1 3" makes the first and third arguments
/// symbolic.
pub fn parse_sym_args(sym_args: &str) -> Result<Vec<i64>> {
    let mut indices = Vec::new();
    for token in sym_args.split_whitespace() {
        let index: i64 =
            token.parse().map_err(|_| anyhow!("'{token}' is not a valid argument index"))?;
        indices.push(index);
    }
    Ok(indices)
}
