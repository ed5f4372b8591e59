//! Target-to-project resolution pipeline.
//!
//! `resolve` is the single entry point joining the sniffer, the variant
//! registry, image selection, and configuration layering. It performs
//! every validation step before any artifact is rendered or written, so a
//! contradictory request fails as a configuration error rather than a
//! template or filesystem error.

use std::path::{Path, PathBuf};

use crate::config::{ConfigValue, ProjectConfig};
use crate::env::Environment;
use crate::images::{self, ImageDescriptor};
use crate::sniff::{self, TargetClassification, TargetFormat};
use crate::template::FragmentStore;

use super::registry::VariantRegistry;
use super::{ProjectError, ProjectResult, ProjectVariant, TargetOptions};

/// Resolve a target into a project variant and a complete, validated
/// configuration.
///
/// Steps: classify the target, select the variant (predicate match, or
/// `variant_hint` bypassing predicates), cross-check variant against
/// classification, build the layered configuration, select a compatible
/// image, and verify every template-required key is present.
pub fn resolve(
    env: &Environment,
    registry: &VariantRegistry,
    target_path: &Path,
    variant_hint: Option<&str>,
    options: &TargetOptions,
) -> ProjectResult<(Box<dyn ProjectVariant>, ProjectConfig)> {
    let classification = sniff::classify(target_path)?;

    if classification.format == TargetFormat::Unknown {
        return Err(ProjectError::UnsupportedTarget {
            path: target_path.to_path_buf(),
            details: "no recognized executable format (ELF, PE, or Decree)".to_string(),
        });
    }

    let variant = match variant_hint {
        Some(name) => registry.by_name(name).ok_or_else(|| {
            ProjectError::InvalidConfiguration(format!(
                "unknown project variant `{name}` (available: {})",
                registry.names().join(", ")
            ))
        })?,
        None => registry.resolve(&classification).ok_or_else(|| {
            ProjectError::UnsupportedTarget {
                path: target_path.to_path_buf(),
                details: format!(
                    "no registered variant accepts a {} target",
                    classification.describe()
                ),
            }
        })?,
    };

    // Semantic cross-check before any configuration or template work: a
    // hint cannot force a variant onto a target it cannot analyze.
    if !variant.supports_target(&classification) {
        return Err(ProjectError::InvalidConfiguration(format!(
            "target {} is a {} but variant `{}` was requested",
            target_path.display(),
            classification.describe(),
            variant.name()
        )));
    }

    let config = variant.configure(env, &classification, options)?;

    let image = select_image(env, variant.as_ref(), &classification, options.image.as_deref())?;
    let config = config.merged(&image_layer(&image));

    config.ensure_keys(variant.required_keys())?;

    Ok((variant, config))
}

/// Resolve and create in one step; returns the project directory and the
/// variant's usage instructions. This is the programmatic equivalent of
/// `s2e new-project`.
pub fn new_project(
    env: &Environment,
    registry: &VariantRegistry,
    store: &FragmentStore,
    target_path: &Path,
    variant_hint: Option<&str>,
    options: &TargetOptions,
    force: bool,
) -> ProjectResult<(PathBuf, String)> {
    let (variant, config) = resolve(env, registry, target_path, variant_hint, options)?;
    let project_dir = variant.create(env, store, &config, force)?;
    let instructions = variant.instructions(store, &config)?;
    Ok((project_dir, instructions))
}

/// Pick the image for a project: the named one (validated), or the first
/// compatible descriptor in stable name order.
fn select_image(
    env: &Environment,
    variant: &dyn ProjectVariant,
    classification: &TargetClassification,
    requested: Option<&str>,
) -> ProjectResult<ImageDescriptor> {
    let images_dir = env.images_dir();

    if let Some(name) = requested {
        let descriptor = images::load_named(&images_dir, name)?;
        if !variant.is_valid_image(classification, &descriptor.os) {
            return Err(ProjectError::InvalidConfiguration(format!(
                "image `{}` ({} {}) cannot run this {} target",
                descriptor.name,
                descriptor.os.arch,
                descriptor.os.name,
                classification.describe()
            )));
        }
        return Ok(descriptor);
    }

    // Stable sort by name makes auto-selection deterministic across runs.
    images::list_images(&images_dir)?
        .into_iter()
        .find(|descriptor| variant.is_valid_image(classification, &descriptor.os))
        .ok_or_else(|| ProjectError::NoCompatibleImage {
            arch: classification.guest_arch().to_string(),
            variant: variant.name().to_string(),
        })
}

/// Configuration layer contributed by the selected image.
fn image_layer(descriptor: &ImageDescriptor) -> ProjectConfig {
    let mut layer = ProjectConfig::new();
    layer.insert("image", descriptor.name.clone());
    layer.insert("image_path", descriptor.path.clone());
    layer.insert("qemu_arch", descriptor.qemu_build.clone());
    layer.insert("qemu_memory", descriptor.memory.clone());
    layer.insert("qemu_snapshot", descriptor.snapshot.clone());
    layer.insert("qemu_extra_flags", descriptor.qemu_extra_flags.clone());
    layer.insert(
        "image_os",
        ConfigValue::Map(
            [
                ("name".to_string(), ConfigValue::Str(descriptor.os.name.clone())),
                ("arch".to_string(), ConfigValue::Str(descriptor.os.arch.clone())),
            ]
            .into_iter()
            .collect(),
        ),
    );
    layer
}
