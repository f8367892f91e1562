//! Component pruning: clone a design-system component set with only the
//! variants and properties the user chose to keep.
//!
//! # Overview
//!
//! A component set declares variant axes (`size ∈ {sm, lg}`) and other
//! properties (booleans, text, instance swaps). Given a flat enabled map of
//! keep/remove flags, a build:
//! - validates the map, failing closed on bad input
//! - makes sure the source component is still live, refreshing it if not
//! - clones the source, so the original is never modified
//! - prunes variant axes, then non-variant properties, from the clone
//! - places the clone on the canvas and notifies the user once
//!
//! # Quick Start
//!
//! ```rust
//! use component_pruner::build::{BuildOrchestrator, NoRefresh};
//! use component_pruner::document::{MemoryDocument, NodeSpec};
//! use component_pruner::model::PropertyDefinition;
//! use component_pruner::report::TracingSink;
//!
//! let mut doc = MemoryDocument::new();
//! let source = doc.load(
//!     &NodeSpec::new("Button")
//!         .definition("size", PropertyDefinition::variant("sm", ["sm", "lg"]))
//!         .child(NodeSpec::new("size=sm"))
//!         .child(NodeSpec::new("size=lg")),
//! );
//!
//! let rt = tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap();
//! let result = rt.block_on(async {
//!     let mut builder = BuildOrchestrator::new(&mut doc, NoRefresh, &TracingSink);
//!     builder.build(source, &serde_json::json!({ "size": false })).await
//! }).unwrap();
//!
//! assert_eq!(result.variants_removed, 1);
//! ```
//!
//! # Modules
//!
//! - [`model`]: Keys, definitions, descriptors, the enabled map, variant names
//! - [`document`]: Ports onto the host document, plus an in-memory host
//! - [`reader`]: Reads a component set's property graph
//! - [`dependency`]: Name-based dependents and structural nesting
//! - [`prune`]: The variant and property pruning passes
//! - [`validate`]: Enabled map sanitization
//! - [`build`]: The build state machine and refresh protocol
//! - [`report`]: The diagnostics sink
//! - [`error`]: Error types
//! - [`limits`]: Input bounds and layout constants

pub mod build;
pub mod dependency;
pub mod document;
pub mod error;
pub mod limits;
pub mod model;
pub mod prune;
pub mod reader;
pub mod report;
pub mod validate;

// Re-export commonly used types at crate root
pub use build::{BuildOptions, BuildOrchestrator, BuildResult, BuildStage, SourceRefresher};
pub use dependency::{children_of, is_dependent};
pub use document::{DocumentPort, HostSurface, MemoryDocument, NodeId, NodeSpec};
pub use error::{BuildError, DocumentError, ErrorCode, PruneItemError, ValidationError};
pub use model::{
    EnabledMap, PropertyDefinition, PropertyDescriptor, PropertyKey, PropertyKind, TreePath,
    VariantName,
};
pub use prune::{prune_properties, prune_variants};
pub use reader::{read_properties, PropertyGraph};
pub use report::{ErrorSink, Severity};
pub use validate::validate_enabled_map;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
