use std::fs;
use std::path::Path;

use s2e_env::{canonicalize_or_current, parse_sym_args};
use tempfile::tempdir;

#[test]
fn canonicalize_or_current_returns_cwd_for_dot() {
    let cwd = std::env::current_dir().expect("cwd");
    let result = canonicalize_or_current(Path::new(".")).expect("canonicalize");
    assert_eq!(result, cwd);
}

#[test]
fn canonicalize_or_current_resolves_existing_path() {
    let tmp = tempdir().expect("tempdir");
    let subdir = tmp.path().join("nested");
    fs::create_dir_all(&subdir).expect("create nested");

    let result = canonicalize_or_current(&subdir).expect("canonicalize nested");
    assert_eq!(result, subdir.canonicalize().expect("canonicalize subdir"));
}

#[test]
fn canonicalize_or_current_joins_missing_paths_onto_cwd() {
    let missing = Path::new("does/not/exist/yet");
    let result = canonicalize_or_current(missing).expect("canonicalize missing");
    assert!(result.is_absolute());
    assert!(result.ends_with(missing));
}

#[test]
fn parse_sym_args_accepts_space_separated_indices() {
    assert_eq!(parse_sym_args("").unwrap(), Vec::<i64>::new());
    assert_eq!(parse_sym_args("1").unwrap(), vec![1]);
    assert_eq!(parse_sym_args("1 3").unwrap(), vec![1, 3]);
    assert_eq!(parse_sym_args("  2   4 ").unwrap(), vec![2, 4]);
}

#[test]
fn parse_sym_args_rejects_non_integers() {
    let err = parse_sym_args("1 two").unwrap_err();
    assert!(err.to_string().contains("'two' is not a valid argument index"));
}
