//! Variant selection by classification predicate.
//!
//! Predicates are evaluated in registration order and the first match
//! wins. There is no specificity ranking: built-ins are registered first,
//! and a custom variant that should shadow one must be registered on a
//! fresh registry ahead of the built-ins. `by_name` bypasses predicate
//! matching entirely for explicit `--variant` selection.

use crate::sniff::TargetClassification;

use super::variants::{
    CgcProject, LinuxProject, WindowsDllProject, WindowsDriverProject, WindowsExeProject,
};
use super::ProjectVariant;

/// Instantiates a registered variant.
pub type VariantFactory = fn() -> Box<dyn ProjectVariant>;

struct RegistryEntry {
    matches: Box<dyn Fn(&TargetClassification) -> bool>,
    factory: VariantFactory,
}

/// Ordered list of registered project variants.
#[derive(Default)]
pub struct VariantRegistry {
    entries: Vec<RegistryEntry>,
}

impl VariantRegistry {
    /// An empty registry. Useful for embedding code that wants custom
    /// variants to shadow the built-ins: register them first, then call
    /// [`VariantRegistry::register_builtin`].
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry with only the built-in variants.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register_builtin();
        registry
    }

    /// Append the built-in variants in their canonical order.
    ///
    /// The driver variant is appended with a never-matching predicate:
    /// a PE header cannot reveal that an image is a driver, so drivers are
    /// only reachable by name.
    pub fn register_builtin(&mut self) {
        self.register(
            |c| CgcProject.supports_target(c),
            || Box::new(CgcProject),
        );
        self.register(
            |c| LinuxProject.supports_target(c),
            || Box::new(LinuxProject),
        );
        self.register(
            |c| WindowsDllProject.supports_target(c),
            || Box::new(WindowsDllProject),
        );
        self.register(
            |c| WindowsExeProject.supports_target(c),
            || Box::new(WindowsExeProject),
        );
        self.register(|_| false, || Box::new(WindowsDriverProject));
    }

    /// Append a variant with its selection predicate.
    pub fn register(
        &mut self,
        matches: impl Fn(&TargetClassification) -> bool + 'static,
        factory: VariantFactory,
    ) {
        self.entries.push(RegistryEntry { matches: Box::new(matches), factory });
    }

    /// Select a variant for `classification`: first matching predicate in
    /// registration order, or `None` if nothing matches.
    pub fn resolve(&self, classification: &TargetClassification) -> Option<Box<dyn ProjectVariant>> {
        self.entries
            .iter()
            .find(|entry| (entry.matches)(classification))
            .map(|entry| (entry.factory)())
    }

    /// Select a variant by its stable name, ignoring predicates.
    pub fn by_name(&self, name: &str) -> Option<Box<dyn ProjectVariant>> {
        self.entries
            .iter()
            .map(|entry| (entry.factory)())
            .find(|variant| variant.name() == name)
    }

    /// Registered variant names in registration order, for error messages.
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|entry| (entry.factory)().name()).collect()
    }
}
