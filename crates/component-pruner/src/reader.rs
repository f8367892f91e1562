//! Reads the property graph of a component set.
//!
//! The reader never fails past its boundary: a component it cannot make
//! sense of yields an empty graph and a report to the sink.

use rustc_hash::FxHashMap;

use crate::document::{DocumentPort, NodeId};
use crate::model::{EnabledMap, PropertyDescriptor, TreePath};
use crate::report::{ErrorSink, Severity};

const OPERATION: &str = "read_properties";

/// Descriptors of a component set, split into variant axes and other properties.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyGraph {
    /// Variant axes, sorted by name.
    pub variants: Vec<PropertyDescriptor>,
    /// Boolean, text and instance-swap properties, sorted case-insensitively.
    pub properties: Vec<PropertyDescriptor>,
}

impl PropertyGraph {
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty() && self.properties.is_empty()
    }

    /// Variant axes first, then the other properties.
    pub fn iter(&self) -> impl Iterator<Item = &PropertyDescriptor> {
        self.variants.iter().chain(self.properties.iter())
    }

    /// Looks up a descriptor by its definition name.
    pub fn get(&self, key: &str) -> Option<&PropertyDescriptor> {
        self.iter().find(|d| d.key == key)
    }

    /// The all-enabled map a UI starts from.
    pub fn enabled_map(&self) -> EnabledMap {
        EnabledMap::from_descriptors(self.iter())
    }
}

/// Reads every declared property of `component`.
pub fn read_properties<D: DocumentPort>(
    doc: &D,
    component: NodeId,
    sink: &dyn ErrorSink,
) -> PropertyGraph {
    let definitions = match doc.property_definitions(component) {
        Ok(Some(definitions)) => definitions,
        Ok(None) => {
            sink.report(
                Severity::Error,
                OPERATION,
                &format!("node {component} has no property definitions; is it a component set?"),
            );
            return PropertyGraph::default();
        }
        Err(e) => {
            sink.report(Severity::Error, OPERATION, &e.to_string());
            return PropertyGraph::default();
        }
    };

    let default_variant = match doc.default_variant(component) {
        Ok(Some(node)) => node,
        Ok(None) => {
            sink.report(
                Severity::Error,
                OPERATION,
                &format!("component set {component} has no default variant"),
            );
            return PropertyGraph::default();
        }
        Err(e) => {
            sink.report(Severity::Error, OPERATION, &e.to_string());
            return PropertyGraph::default();
        }
    };

    let paths = index_reference_paths(doc, default_variant, sink);

    let mut graph = PropertyGraph::default();
    for (key, definition) in &definitions {
        if let Some(problem) = definition.validate() {
            sink.report(Severity::Warning, OPERATION, &format!("{key}: {problem}"));
        }
        if definition.kind.is_variant() {
            graph
                .variants
                .push(PropertyDescriptor::new(key, definition, TreePath::root()));
        } else {
            let path = paths.get(key.as_str()).cloned().unwrap_or_default();
            graph
                .properties
                .push(PropertyDescriptor::new(key, definition, path));
        }
    }

    graph.variants.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.key.cmp(&b.key)));
    graph.properties.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.key.cmp(&b.key))
    });

    tracing::debug!(
        %component,
        variants = graph.variants.len(),
        properties = graph.properties.len(),
        "read property graph"
    );
    graph
}

/// Maps each referenced property name to the path of the first node, in
/// pre-order, that references it.
fn index_reference_paths<D: DocumentPort>(
    doc: &D,
    root: NodeId,
    sink: &dyn ErrorSink,
) -> FxHashMap<String, TreePath> {
    let mut paths: FxHashMap<String, TreePath> = FxHashMap::default();
    let mut stack: Vec<(NodeId, Vec<usize>)> = vec![(root, Vec::new())];

    while let Some((node, path)) = stack.pop() {
        match doc.property_references(node) {
            Ok(references) => {
                for property in references.into_values() {
                    paths
                        .entry(property)
                        .or_insert_with(|| TreePath::from(path.clone()));
                }
            }
            Err(e) => sink.report(Severity::Warning, OPERATION, &e.to_string()),
        }

        match doc.children(node) {
            Ok(children) => {
                for (index, child) in children.into_iter().enumerate().rev() {
                    let mut child_path = path.clone();
                    child_path.push(index);
                    stack.push((child, child_path));
                }
            }
            Err(e) => sink.report(Severity::Warning, OPERATION, &e.to_string()),
        }
    }

    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{MemoryDocument, NodeSpec};
    use crate::model::{PropertyDefinition, PropertyKind};
    use crate::report::CollectingSink;

    fn card() -> NodeSpec {
        NodeSpec::new("Card")
            .definition("size", PropertyDefinition::variant("sm", ["sm", "lg"]))
            .definition("Theme", PropertyDefinition::variant("light", ["light", "dark"]))
            .definition("title#1:0", PropertyDefinition::text("Title"))
            .definition("Show icon#2:0", PropertyDefinition::boolean(true))
            .definition("Icon#3:0", PropertyDefinition::instance_swap("icon-star"))
            .definition("Unused#4:0", PropertyDefinition::boolean(false))
            .child(
                NodeSpec::new("size=sm, Theme=light")
                    .child(NodeSpec::new("Title").reference("characters", "title#1:0"))
                    .child(
                        NodeSpec::new("Icon wrapper")
                            .reference("visible", "Show icon#2:0")
                            .child(NodeSpec::new("Icon").reference("mainComponent", "Icon#3:0")),
                    ),
            )
            .child(NodeSpec::new("size=lg, Theme=light"))
    }

    #[test]
    fn test_reads_and_sorts() {
        let mut doc = MemoryDocument::new();
        let root = doc.load(&card());
        let sink = CollectingSink::new();
        let graph = read_properties(&doc, root, &sink);

        let variant_names: Vec<&str> = graph.variants.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(variant_names, vec!["Theme", "size"]);
        assert_eq!(graph.variants[1].variant_options, vec!["sm", "lg"]);

        let keys: Vec<&str> = graph.properties.iter().map(|d| d.key.as_str()).collect();
        assert_eq!(keys, vec!["Icon#3:0", "Show icon#2:0", "title#1:0", "Unused#4:0"]);
        assert!(sink.at_least(Severity::Warning).is_empty());
    }

    #[test]
    fn test_tree_paths() {
        let mut doc = MemoryDocument::new();
        let root = doc.load(&card());
        let graph = read_properties(&doc, root, &CollectingSink::new());

        assert_eq!(graph.get("title#1:0").unwrap().tree_path, TreePath::from(vec![0]));
        assert_eq!(graph.get("Show icon#2:0").unwrap().tree_path, TreePath::from(vec![1]));
        assert_eq!(graph.get("Icon#3:0").unwrap().tree_path, TreePath::from(vec![1, 0]));
        assert!(graph.get("Unused#4:0").unwrap().tree_path.is_empty());
        assert_eq!(graph.get("Icon#3:0").unwrap().kind, PropertyKind::InstanceSwap);
    }

    #[test]
    fn test_not_a_component_set() {
        let mut doc = MemoryDocument::new();
        let root = doc.load(&NodeSpec::new("Frame").child(NodeSpec::new("Child")));
        let sink = CollectingSink::new();
        let graph = read_properties(&doc, root, &sink);
        assert!(graph.is_empty());
        assert_eq!(sink.at_least(Severity::Error).len(), 1);
    }

    #[test]
    fn test_no_default_variant() {
        let mut doc = MemoryDocument::new();
        let root = doc.load(
            &NodeSpec::new("Empty").definition("size", PropertyDefinition::variant("sm", ["sm"])),
        );
        let sink = CollectingSink::new();
        assert!(read_properties(&doc, root, &sink).is_empty());
        assert!(sink.reports()[0].message.contains("no default variant"));
    }

    #[test]
    fn test_inconsistent_definition_is_warned_not_dropped() {
        let mut doc = MemoryDocument::new();
        let root = doc.load(
            &NodeSpec::new("Set")
                .definition("size", PropertyDefinition::variant("xl", ["sm", "lg"]))
                .child(NodeSpec::new("size=sm")),
        );
        let sink = CollectingSink::new();
        let graph = read_properties(&doc, root, &sink);
        assert_eq!(graph.variants.len(), 1);
        assert_eq!(sink.at_least(Severity::Warning).len(), 1);
    }

    #[test]
    fn test_enabled_map_covers_options() {
        let mut doc = MemoryDocument::new();
        let root = doc.load(&card());
        let map = read_properties(&doc, root, &CollectingSink::new()).enabled_map();
        assert!(map.is_enabled("size#lg"));
        assert!(map.is_enabled("Theme#dark"));
        assert!(map.is_enabled("Icon#3:0"));
        assert_eq!(map.len(), 2 + 4 + 4);
    }
}
