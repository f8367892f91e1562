//! Data model types for component pruning.
//!
//! This module contains the value types the engine passes around:
//! - Property keys (plain, option-level, dependency-marked)
//! - Property definitions and descriptors
//! - The enabled map
//! - Variant display names

pub mod descriptor;
pub mod enabled;
pub mod key;
pub mod variant_name;

pub use descriptor::{PropertyDefinition, PropertyDescriptor, PropertyKind, PropertyValue, TreePath};
pub use enabled::EnabledMap;
pub use key::{
    option_key, DependencyMarker, PropertyKey, INSTANCE_SWAP_DEPENDENCY_GLYPH, OPTION_SEPARATOR,
    TEXT_DEPENDENCY_GLYPH,
};
pub use variant_name::VariantName;
