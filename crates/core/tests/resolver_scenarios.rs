mod common;

use std::fs;
use std::path::Path;

use tempfile::tempdir;

use s2e_core::env::Environment;
use s2e_core::project::registry::VariantRegistry;
use s2e_core::project::{resolver, ProjectError, TargetOptions};
use s2e_core::template::FragmentStore;

/// Create an environment with the given image descriptors installed.
fn env_with_images(root: &Path, images: &[(&str, &str, &str, &[&str])]) -> Environment {
    let env = Environment::init(root, true).expect("init env");
    for &(name, os_name, arch, formats) in images {
        fs::write(
            env.images_dir().join(format!("{name}.json")),
            common::image_descriptor_json(name, os_name, arch, formats),
        )
        .expect("write image descriptor");
    }
    env
}

fn linux_images<'a>() -> Vec<(&'a str, &'a str, &'a str, &'a [&'a str])> {
    vec![
        ("debian-12.5-i386", "debian", "i386", &["elf"] as &[&str]),
        ("debian-12.5-x86_64", "debian", "x86_64", &["elf"]),
        ("windows-10-x86_64", "windows", "x86_64", &["pe"]),
    ]
}

#[test]
fn elf64_dynamic_resolves_to_linux_variant_with_required_keys() {
    let dir = tempdir().expect("tempdir");
    let env = env_with_images(dir.path(), &linux_images());
    let target = common::write_fixture(
        dir.path(),
        "server",
        &common::elf64(common::EM_X86_64, Some(b"/lib64/ld-linux-x86-64.so.2\0")),
    );

    let registry = VariantRegistry::builtin();
    let (variant, config) =
        resolver::resolve(&env, &registry, &target, None, &TargetOptions::default())
            .expect("resolve");

    assert_eq!(variant.name(), "linux");
    assert_eq!(config.require_str("target").unwrap(), target.display().to_string());
    assert!(config.require_list("target_args").unwrap().is_empty());
    assert!(!config.require_bool("use_seeds").unwrap());
    assert_eq!(config.require_str("image_arch").unwrap(), "x86_64");
    assert!(config.require_bool("dynamically_linked").unwrap());
    // 64-bit target must skip the i386 image and pick the x86_64 one.
    assert_eq!(config.require_str("image").unwrap(), "debian-12.5-x86_64");
}

#[test]
fn auto_image_selection_is_deterministic_first_by_name() {
    let dir = tempdir().expect("tempdir");
    // Both images are compatible with a 32-bit ELF; selection must take
    // the lexicographically first.
    let env = env_with_images(
        dir.path(),
        &[
            ("debian-zeta-i386", "debian", "i386", &["elf"] as &[&str]),
            ("debian-alpha-i386", "debian", "i386", &["elf"]),
        ],
    );
    let target = common::write_fixture(dir.path(), "legacy", &common::elf32(common::EM_386, None));

    let registry = VariantRegistry::builtin();
    for _ in 0..3 {
        let (_, config) =
            resolver::resolve(&env, &registry, &target, None, &TargetOptions::default())
                .expect("resolve");
        assert_eq!(config.require_str("image").unwrap(), "debian-alpha-i386");
    }
}

#[test]
fn no_compatible_image_is_a_structured_error() {
    let dir = tempdir().expect("tempdir");
    // Only a 32-bit image is installed; a 64-bit target cannot use it.
    let env = env_with_images(
        dir.path(),
        &[("debian-12.5-i386", "debian", "i386", &["elf"] as &[&str])],
    );
    let target =
        common::write_fixture(dir.path(), "server", &common::elf64(common::EM_X86_64, None));

    let registry = VariantRegistry::builtin();
    let err = resolver::resolve(&env, &registry, &target, None, &TargetOptions::default())
        .unwrap_err();
    assert!(matches!(err, ProjectError::NoCompatibleImage { .. }), "unexpected error: {err}");
}

#[test]
fn explicit_incompatible_image_is_rejected_before_rendering() {
    let dir = tempdir().expect("tempdir");
    let env = env_with_images(dir.path(), &linux_images());
    let target =
        common::write_fixture(dir.path(), "server", &common::elf64(common::EM_X86_64, None));

    let registry = VariantRegistry::builtin();
    let options =
        TargetOptions { image: Some("windows-10-x86_64".to_string()), ..Default::default() };
    let err = resolver::resolve(&env, &registry, &target, None, &options).unwrap_err();
    assert!(matches!(err, ProjectError::InvalidConfiguration(_)), "unexpected error: {err}");
}

#[test]
fn cgc_target_with_driver_hint_fails_configuration_not_rendering() {
    let dir = tempdir().expect("tempdir");
    let env = env_with_images(dir.path(), &linux_images());
    let target = common::write_fixture(dir.path(), "challenge", &common::cgc());

    let registry = VariantRegistry::builtin();
    let err = resolver::resolve(
        &env,
        &registry,
        &target,
        Some("windows-driver"),
        &TargetOptions::default(),
    )
    .unwrap_err();

    match err {
        ProjectError::InvalidConfiguration(message) => {
            assert!(message.contains("windows-driver"), "message should name the variant: {message}");
        }
        other => panic!("expected InvalidConfiguration, got: {other}"),
    }
}

#[test]
fn unknown_target_without_hint_is_unsupported() {
    let dir = tempdir().expect("tempdir");
    let env = env_with_images(dir.path(), &linux_images());
    let target = common::write_fixture(dir.path(), "script.sh", b"#!/bin/sh\nexit 0\n");

    let registry = VariantRegistry::builtin();
    let err = resolver::resolve(&env, &registry, &target, None, &TargetOptions::default())
        .unwrap_err();
    assert!(matches!(err, ProjectError::UnsupportedTarget { .. }), "unexpected error: {err}");
}

#[test]
fn unknown_variant_hint_is_rejected_with_the_available_list() {
    let dir = tempdir().expect("tempdir");
    let env = env_with_images(dir.path(), &linux_images());
    let target =
        common::write_fixture(dir.path(), "server", &common::elf64(common::EM_X86_64, None));

    let registry = VariantRegistry::builtin();
    let err = resolver::resolve(&env, &registry, &target, Some("beos"), &TargetOptions::default())
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("beos") && message.contains("linux"), "unexpected error: {message}");
}

#[test]
fn cgc_target_forces_seeds_and_pov_generation() {
    let dir = tempdir().expect("tempdir");
    let env = env_with_images(
        dir.path(),
        &[("cgc-debian-9.2.1-i386", "cgc_debian", "i386", &["elf", "decree"] as &[&str])],
    );
    let target = common::write_fixture(dir.path(), "challenge", &common::cgc());

    let registry = VariantRegistry::builtin();
    let (variant, config) =
        resolver::resolve(&env, &registry, &target, None, &TargetOptions::default())
            .expect("resolve");

    assert_eq!(variant.name(), "cgc");
    assert!(config.require_bool("use_seeds").unwrap());
    assert!(config.require_bool("use_recipes").unwrap());
    assert!(config.require_bool("enable_pov_generation").unwrap());
    assert!(!config.require_bool("use_test_case_generator").unwrap());
}

#[test]
fn cgc_target_rejects_target_arguments() {
    let dir = tempdir().expect("tempdir");
    let env = env_with_images(
        dir.path(),
        &[("cgc-debian-9.2.1-i386", "cgc_debian", "i386", &["decree"] as &[&str])],
    );
    let target = common::write_fixture(dir.path(), "challenge", &common::cgc());

    let registry = VariantRegistry::builtin();
    let options =
        TargetOptions { target_args: vec!["--flag".to_string()], ..Default::default() };
    let err = resolver::resolve(&env, &registry, &target, None, &options).unwrap_err();
    assert!(matches!(err, ProjectError::InvalidConfiguration(_)), "unexpected error: {err}");
}

#[test]
fn new_project_creates_directory_and_instructions() {
    let dir = tempdir().expect("tempdir");
    let env = env_with_images(dir.path(), &linux_images());
    let target = common::write_fixture(
        dir.path(),
        "server",
        &common::elf64(common::EM_X86_64, Some(b"/lib64/ld-linux-x86-64.so.2\0")),
    );

    let registry = VariantRegistry::builtin();
    let store = FragmentStore::builtin();
    let options = TargetOptions { target_args: vec!["@@".to_string()], ..Default::default() };

    let (project_dir, instructions) =
        resolver::new_project(&env, &registry, &store, &target, None, &options, false)
            .expect("new_project");

    assert_eq!(project_dir, env.project_dir("server"));
    for artifact in ["launch-s2e.sh", "s2e-config.lua", "bootstrap.sh", "project.json"] {
        assert!(project_dir.join(artifact).is_file(), "missing artifact {artifact}");
    }
    assert!(instructions.contains("server"), "instructions should name the project");

    // The descriptor round-trips as JSON and records the resolved image.
    let descriptor: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(project_dir.join("project.json")).unwrap())
            .unwrap();
    assert_eq!(descriptor["image"], "debian-12.5-x86_64");
    assert_eq!(descriptor["use_symb_input_file"], true);

    // A second creation without force must fail and leave the project.
    let err = resolver::new_project(&env, &registry, &store, &target, None, &options, false)
        .unwrap_err();
    assert!(matches!(err, ProjectError::AlreadyExists { .. }), "unexpected error: {err}");
    assert!(project_dir.join("launch-s2e.sh").is_file());
}
