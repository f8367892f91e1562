//! Variant axis pruning.
//!
//! For each variant axis declared on the component set, the enabled map
//! decides one of three outcomes:
//! - axis disabled: collapse to the declared default and drop the axis
//! - exactly one option kept: collapse to that option and drop the axis
//! - some but not all options kept: remove variants outside the kept set
//!
//! Anything else leaves the axis untouched. A failing axis is skipped and
//! recorded; the remaining axes are still processed.

use crate::document::{DocumentError, DocumentPort, NodeId};
use crate::error::PruneItemError;
use crate::model::{EnabledMap, PropertyDefinition, VariantName};
use crate::report::{ErrorSink, Severity};

const OPERATION: &str = "prune_variants";

/// What pruning decided to do with one axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AxisPlan {
    /// Keep only variants assigned this value, strip the axis from their
    /// names, and delete the axis definition.
    Collapse(String),
    /// Keep only variants assigned one of these values. The axis stays declared.
    Restrict(Vec<String>),
    Untouched,
}

/// Outcome of a variant pruning pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariantPruneReport {
    /// Axes that were collapsed or restricted.
    pub processed: Vec<String>,
    /// Axes that failed and were left as far as they got.
    pub skipped: Vec<String>,
    pub errors: Vec<PruneItemError>,
    /// Variant nodes removed across all axes.
    pub variants_removed: usize,
}

/// Decides how to prune `axis` from the enabled map.
///
/// `kept` holds the option values flagged to keep for this axis.
pub fn plan_axis(
    axis: &str,
    definition: &PropertyDefinition,
    enabled: &EnabledMap,
    kept: &[String],
) -> Result<AxisPlan, &'static str> {
    if !enabled.is_enabled(axis) {
        let default = definition
            .default_value
            .as_text()
            .ok_or("variant default is not text")?;
        return Ok(AxisPlan::Collapse(default.to_string()));
    }

    let mut survivors: Vec<String> = Vec::new();
    for option in &definition.variant_options {
        if kept.contains(option) && !survivors.contains(option) {
            survivors.push(option.clone());
        }
    }

    Ok(match survivors.len() {
        0 => AxisPlan::Untouched,
        n if n >= definition.variant_options.len() => AxisPlan::Untouched,
        1 => AxisPlan::Collapse(survivors.remove(0)),
        _ => AxisPlan::Restrict(survivors),
    })
}

/// Prunes every variant axis of `component` according to `enabled`.
pub fn prune_variants<D: DocumentPort>(
    doc: &mut D,
    component: NodeId,
    enabled: &EnabledMap,
    sink: &dyn ErrorSink,
) -> VariantPruneReport {
    let mut report = VariantPruneReport::default();

    let definitions = match doc.property_definitions(component) {
        Ok(Some(definitions)) => definitions,
        Ok(None) => {
            let err = PruneItemError::new(
                component.to_string(),
                DocumentError::MissingDefinitions(component),
            );
            sink.report(Severity::Error, OPERATION, &err.to_string());
            report.errors.push(err);
            return report;
        }
        Err(e) => {
            let err = PruneItemError::new(component.to_string(), e);
            sink.report(Severity::Error, OPERATION, &err.to_string());
            report.errors.push(err);
            return report;
        }
    };

    let kept_options = enabled.kept_options();

    for (axis, definition) in definitions.iter().filter(|(_, d)| d.kind.is_variant()) {
        let kept = kept_options.get(axis).map(Vec::as_slice).unwrap_or_default();
        let outcome = plan_axis(axis, definition, enabled, kept)
            .map_err(|problem| PruneItemError::new(axis.clone(), problem))
            .and_then(|plan| {
                apply_plan(doc, component, axis, &plan, sink)
                    .map(|removed| (plan, removed))
                    .map_err(|e| PruneItemError::new(axis.clone(), e))
            });

        match outcome {
            Ok((AxisPlan::Untouched, _)) => {}
            Ok((plan, removed)) => {
                tracing::debug!(axis = %axis, ?plan, removed, "pruned variant axis");
                report.variants_removed += removed;
                report.processed.push(axis.clone());
            }
            Err(err) => {
                tracing::warn!(axis = %axis, error = %err, "skipping variant axis");
                sink.report(Severity::Warning, OPERATION, &err.to_string());
                report.skipped.push(axis.clone());
                report.errors.push(err);
            }
        }
    }

    report
}

fn apply_plan<D: DocumentPort>(
    doc: &mut D,
    component: NodeId,
    axis: &str,
    plan: &AxisPlan,
    sink: &dyn ErrorSink,
) -> Result<usize, DocumentError> {
    match plan {
        AxisPlan::Untouched => Ok(0),
        AxisPlan::Collapse(value) => collapse_axis(doc, component, axis, value, sink),
        AxisPlan::Restrict(survivors) => {
            retain_variants(doc, component, |name| {
                name.get(axis).is_some_and(|v| survivors.iter().any(|s| s == v))
            })
        }
    }
}

/// Keeps only variants assigned `value` on `axis`, strips the axis from their
/// names, and deletes the axis definition if it is still declared.
fn collapse_axis<D: DocumentPort>(
    doc: &mut D,
    component: NodeId,
    axis: &str,
    value: &str,
    sink: &dyn ErrorSink,
) -> Result<usize, DocumentError> {
    let mut removed = 0;
    let mut remaining = 0;
    for variant in doc.children(component)? {
        let mut name = VariantName::parse(&doc.name(variant)?);
        if name.get(axis) == Some(value) {
            name.remove(axis);
            doc.set_name(variant, &name.to_string())?;
            remaining += 1;
        } else {
            doc.remove_node(variant)?;
            removed += 1;
        }
    }

    if remaining == 0 {
        sink.report(
            Severity::Info,
            OPERATION,
            &format!("{axis}={value}: 0 variants left after removing {removed}"),
        );
    }

    if doc.property_definition(component, axis)?.is_some() {
        doc.delete_definition(component, axis)?;
    }
    Ok(removed)
}

/// Removes every variant whose parsed name fails `keep`. Names are not rewritten.
fn retain_variants<D, F>(doc: &mut D, component: NodeId, keep: F) -> Result<usize, DocumentError>
where
    D: DocumentPort,
    F: Fn(&VariantName) -> bool,
{
    let mut removed = 0;
    for variant in doc.children(component)? {
        let name = VariantName::parse(&doc.name(variant)?);
        if !keep(&name) {
            doc.remove_node(variant)?;
            removed += 1;
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{MemoryDocument, NodeSpec};
    use crate::report::CollectingSink;

    fn button() -> NodeSpec {
        let mut spec = NodeSpec::new("Button")
            .definition("size", PropertyDefinition::variant("sm", ["sm", "lg"]))
            .definition("color", PropertyDefinition::variant("red", ["red", "green", "blue"]))
            .definition("Label#1:0", PropertyDefinition::text("OK"));
        for size in ["sm", "lg"] {
            for color in ["red", "green", "blue"] {
                spec = spec.child(NodeSpec::new(format!("size={size}, color={color}")));
            }
        }
        spec
    }

    fn map(entries: &[(&str, bool)]) -> EnabledMap {
        entries.iter().copied().collect()
    }

    #[test]
    fn test_plan_axis() {
        let def = PropertyDefinition::variant("red", ["red", "green", "blue"]);
        let all = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        let off = map(&[("color", false)]);
        assert_eq!(plan_axis("color", &def, &off, &[]), Ok(AxisPlan::Collapse("red".into())));
        assert_eq!(
            plan_axis("color", &def, &EnabledMap::new(), &[]),
            Ok(AxisPlan::Collapse("red".into()))
        );

        let on = map(&[("color", true)]);
        assert_eq!(plan_axis("color", &def, &on, &[]), Ok(AxisPlan::Untouched));
        assert_eq!(
            plan_axis("color", &def, &on, &all(&["blue"])),
            Ok(AxisPlan::Collapse("blue".into()))
        );
        assert_eq!(
            plan_axis("color", &def, &on, &all(&["blue", "red"])),
            Ok(AxisPlan::Restrict(all(&["red", "blue"])))
        );
        assert_eq!(
            plan_axis("color", &def, &on, &all(&["red", "green", "blue"])),
            Ok(AxisPlan::Untouched)
        );
        assert_eq!(
            plan_axis("color", &def, &on, &all(&["purple"])),
            Ok(AxisPlan::Untouched)
        );
    }

    #[test]
    fn test_disabled_axis_collapses_to_default() {
        let mut doc = MemoryDocument::new();
        let root = doc.load(&button());
        let enabled = map(&[("size", false), ("color", true)]);

        let report = prune_variants(&mut doc, root, &enabled, &CollectingSink::new());
        assert_eq!(report.processed, vec!["size"]);
        assert_eq!(report.variants_removed, 3);
        assert!(report.errors.is_empty());
        assert_eq!(
            doc.child_names(root),
            vec!["color=red", "color=green", "color=blue"]
        );
        assert!(doc.property_definition(root, "size").unwrap().is_none());
        assert!(doc.property_definition(root, "color").unwrap().is_some());
    }

    #[test]
    fn test_single_kept_option_collapses() {
        let mut doc = MemoryDocument::new();
        let root = doc.load(&button());
        let enabled = map(&[
            ("size", true),
            ("color", true),
            ("color#red", false),
            ("color#green", true),
            ("color#blue", false),
        ]);

        let report = prune_variants(&mut doc, root, &enabled, &CollectingSink::new());
        assert_eq!(report.processed, vec!["color"]);
        assert_eq!(doc.child_names(root), vec!["size=sm", "size=lg"]);
        assert!(doc.property_definition(root, "color").unwrap().is_none());
    }

    #[test]
    fn test_restrict_keeps_axis_and_names() {
        let mut doc = MemoryDocument::new();
        let root = doc.load(&button());
        let enabled = map(&[
            ("size", true),
            ("color", true),
            ("color#red", true),
            ("color#green", false),
            ("color#blue", true),
        ]);

        let report = prune_variants(&mut doc, root, &enabled, &CollectingSink::new());
        assert_eq!(report.variants_removed, 2);
        assert_eq!(
            doc.child_names(root),
            vec![
                "size=sm, color=red",
                "size=sm, color=blue",
                "size=lg, color=red",
                "size=lg, color=blue"
            ]
        );
        assert!(doc.property_definition(root, "color").unwrap().is_some());
    }

    #[test]
    fn test_failing_axis_does_not_block_others() {
        let mut doc = MemoryDocument::new();
        let root = doc.load(&button());
        let locked = doc.find_by_name(root, "size=sm, color=green").unwrap();
        doc.fail_removal_of(locked);

        // "color" is processed first and trips over the locked node.
        let enabled = map(&[("size", false), ("color", true), ("color#red", true)]);
        let sink = CollectingSink::new();
        let report = prune_variants(&mut doc, root, &enabled, &sink);

        assert_eq!(report.skipped, vec!["color"]);
        assert_eq!(report.processed, vec!["size"]);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].item, "color");
        assert!(doc.property_definition(root, "size").unwrap().is_none());
        assert_eq!(sink.at_least(Severity::Warning).len(), 1);
    }

    #[test]
    fn test_zero_survivors_is_not_an_error() {
        let mut doc = MemoryDocument::new();
        let root = doc.load(
            &NodeSpec::new("Set")
                .definition("size", PropertyDefinition::variant("md", ["sm", "md"]))
                .child(NodeSpec::new("size=sm")),
        );
        let sink = CollectingSink::new();
        let report = prune_variants(&mut doc, root, &map(&[("size", false)]), &sink);
        assert!(report.errors.is_empty());
        assert_eq!(report.variants_removed, 1);
        assert!(doc.child_names(root).is_empty());
        assert!(doc.property_definition(root, "size").unwrap().is_none());
        assert_eq!(sink.reports()[0].severity, Severity::Info);
    }

    #[test]
    fn test_missing_definitions_is_reported() {
        let mut doc = MemoryDocument::new();
        let root = doc.load(&NodeSpec::new("Frame"));
        let report = prune_variants(&mut doc, root, &map(&[("size", false)]), &CollectingSink::new());
        assert_eq!(report.errors.len(), 1);
        assert!(report.processed.is_empty());
    }
}
