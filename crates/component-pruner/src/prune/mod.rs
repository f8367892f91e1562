//! Destructive pruning passes over a cloned component set.
//!
//! The two passes partition the enabled map: variant axes and their option
//! keys belong to [`variant`], everything else to [`property`]. Run variants
//! first.

pub mod property;
pub mod variant;

pub use property::{prune_properties, PropertyPruneReport};
pub use variant::{plan_axis, prune_variants, AxisPlan, VariantPruneReport};
