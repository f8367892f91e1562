//! Non-variant property pruning.
//!
//! Each disabled key loses its definition and every node bound to it. Keys
//! marked as dependents of the same base name lose their definitions too.
//! Variant axes and their option keys are left to the variant pruner.

use rustc_hash::FxHashSet;

use crate::dependency::dependents_of;
use crate::document::{DocumentError, DocumentPort, NodeId};
use crate::error::PruneItemError;
use crate::model::{EnabledMap, PropertyKey};
use crate::report::{ErrorSink, Severity};

const OPERATION: &str = "prune_properties";

/// Outcome of a property pruning pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyPruneReport {
    /// Disabled keys whose definition or bound nodes were removed.
    pub processed: Vec<String>,
    /// Disabled keys that failed part-way.
    pub skipped: Vec<String>,
    /// Dependent keys whose definitions were deleted alongside their base.
    pub dependents_removed: Vec<String>,
    /// Nodes removed because they were bound to a pruned property.
    pub deleted_elements: usize,
    pub errors: Vec<PruneItemError>,
}

/// What happened to one disabled key.
#[derive(Debug, Default)]
struct KeyOutcome {
    touched: bool,
    deleted_elements: usize,
    dependents: Vec<String>,
}

/// Prunes every non-variant property in `disabled_keys` from `component`.
///
/// `enabled` is the full map the keys came from; it is scanned for
/// dependents of each pruned base name.
pub fn prune_properties<D: DocumentPort>(
    doc: &mut D,
    component: NodeId,
    enabled: &EnabledMap,
    disabled_keys: &[String],
    sink: &dyn ErrorSink,
) -> PropertyPruneReport {
    let mut report = PropertyPruneReport::default();

    for raw in disabled_keys {
        match prune_key(doc, component, enabled, raw) {
            Ok(None) => {}
            Ok(Some(outcome)) => {
                if outcome.touched {
                    report.processed.push(raw.clone());
                }
                report.deleted_elements += outcome.deleted_elements;
                report.dependents_removed.extend(outcome.dependents);
            }
            Err(e) => {
                let err = PruneItemError::new(raw.clone(), e);
                tracing::warn!(key = %raw, error = %err, "skipping property");
                sink.report(Severity::Warning, OPERATION, &err.to_string());
                report.skipped.push(raw.clone());
                report.errors.push(err);
            }
        }
    }

    report
}

/// Resolves the definition name a key refers to, if it is still declared.
///
/// The key is tried as given first, then without its dependency marker.
fn live_definition_name<D: DocumentPort>(
    doc: &D,
    component: NodeId,
    key: &PropertyKey<'_>,
) -> Result<Option<(String, bool)>, DocumentError> {
    for name in [key.raw(), key.definition_name()] {
        if let Some(definition) = doc.property_definition(component, name)? {
            return Ok(Some((name.to_string(), definition.kind.is_variant())));
        }
    }
    Ok(None)
}

/// Returns Ok(None) for keys owned by the variant pruner.
fn prune_key<D: DocumentPort>(
    doc: &mut D,
    component: NodeId,
    enabled: &EnabledMap,
    raw: &str,
) -> Result<Option<KeyOutcome>, DocumentError> {
    let key = PropertyKey::parse(raw);
    let base = key.base();

    let live = live_definition_name(doc, component, &key)?;
    if matches!(live, Some((_, true))) {
        return Ok(None);
    }
    if live.is_none() && key.option().is_some() && !key.is_marked() {
        // An `axis#option` toggle, for an axis that may already be gone.
        let axis = doc.property_definition(component, base)?;
        if axis.is_some_and(|d| d.kind.is_variant()) {
            return Ok(None);
        }
    }

    // With the definition already gone (e.g. deleted as a dependent of an
    // earlier key), nodes may be bound under either spelling.
    let bound_names: Vec<&str> = match &live {
        Some((name, _)) => vec![name.as_str()],
        None if key.is_marked() => vec![key.raw(), key.definition_name()],
        None => vec![key.raw()],
    };
    let bound = doc.find_nodes_where(component, |d, node| {
        d.property_references(node)
            .is_ok_and(|refs| refs.values().any(|p| bound_names.contains(&p.as_str())))
    })?;

    let mut outcome = KeyOutcome::default();

    if let Some((name, _)) = &live {
        doc.delete_definition(component, name)?;
        outcome.touched = true;
    }

    if !bound.is_empty() {
        let removed = remove_outermost(doc, component, &bound)?;
        tracing::debug!(key = %raw, bound = bound.len(), removed, "removed bound nodes");
        outcome.deleted_elements = bound.len();
        outcome.touched = true;
    }

    for dependent in dependents_of(enabled.keys(), base) {
        let dependent_key = PropertyKey::parse(dependent);
        // Only the definition goes; nodes bound to the dependent are not searched.
        if let Some((name, _)) = live_definition_name(doc, component, &dependent_key)? {
            doc.delete_definition(component, &name)?;
            outcome.dependents.push(dependent.to_string());
        }
    }

    Ok(Some(outcome))
}

/// Removes every node in `nodes` that has no ancestor in `nodes`.
///
/// Nested matches leave with their ancestor. Returns the number of
/// `remove_node` calls made.
fn remove_outermost<D: DocumentPort>(
    doc: &mut D,
    component: NodeId,
    nodes: &[NodeId],
) -> Result<usize, DocumentError> {
    let matched: FxHashSet<NodeId> = nodes.iter().copied().collect();
    let mut outermost = Vec::with_capacity(nodes.len());
    for &node in nodes {
        let mut ancestor = doc.parent(node)?;
        let mut nested = false;
        while let Some(current) = ancestor {
            if current == component {
                break;
            }
            if matched.contains(&current) {
                nested = true;
                break;
            }
            ancestor = doc.parent(current)?;
        }
        if !nested {
            outermost.push(node);
        }
    }

    for &node in &outermost {
        doc.remove_node(node)?;
    }
    Ok(outermost.len())
}
