//! In-memory document host.
//!
//! Models a component set as an arena of named nodes with `key=value`
//! variant names, property bindings and a definition table on the root.
//! Fault injection hooks let callers exercise the failure paths of a build.

use std::collections::BTreeMap;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::document::{
    Definitions, DocumentError, DocumentPort, HostSurface, NodeId, NotifyOptions, Point,
    PropertyReferences, Size,
};
use crate::model::PropertyDefinition;

/// Serializable description of a node subtree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub references: PropertyReferences,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definitions: Option<Definitions>,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSpec>,
}

impl NodeSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds a definition, turning this node into a component set.
    pub fn definition(mut self, name: impl Into<String>, definition: PropertyDefinition) -> Self {
        self.definitions
            .get_or_insert_with(Definitions::new)
            .insert(name.into(), definition);
        self
    }

    /// Binds one of this node's attributes to a property.
    pub fn reference(mut self, attribute: impl Into<String>, property: impl Into<String>) -> Self {
        self.references.insert(attribute.into(), property.into());
        self
    }

    pub fn size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn child(mut self, child: NodeSpec) -> Self {
        self.children.push(child);
        self
    }
}

/// A component plus the viewport it is being edited in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentFixture {
    pub component: NodeSpec,
    #[serde(default)]
    pub viewport: Point,
}

/// A message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub error: bool,
}

#[derive(Debug, Clone)]
struct NodeData {
    key: String,
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    references: PropertyReferences,
    definitions: Option<Definitions>,
    size: Size,
    position: Point,
    removed: bool,
}

/// Arena-backed document implementing [`DocumentPort`] and [`HostSurface`].
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    nodes: Vec<NodeData>,
    canvas: Vec<NodeId>,
    selection: Option<NodeId>,
    viewport_center: Point,
    focused: Option<NodeId>,
    notifications: Vec<Notification>,
    invalidated: FxHashSet<NodeId>,
    failing_removals: FxHashSet<NodeId>,
    fail_next_clone: bool,
    fail_append: bool,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a fixture, selecting its component.
    pub fn from_fixture(fixture: &DocumentFixture) -> (Self, NodeId) {
        let mut doc = Self::new();
        doc.viewport_center = fixture.viewport;
        let root = doc.load(&fixture.component);
        (doc, root)
    }

    /// Inserts a detached subtree and returns its root.
    ///
    /// The first subtree loaded becomes the selection.
    pub fn load(&mut self, spec: &NodeSpec) -> NodeId {
        let root = self.insert(spec, None);
        if self.selection.is_none() {
            self.selection = Some(root);
        }
        root
    }

    fn insert(&mut self, spec: &NodeSpec, parent: Option<NodeId>) -> NodeId {
        let id = self.alloc(NodeData {
            key: String::new(),
            name: spec.name.clone(),
            parent,
            children: Vec::new(),
            references: spec.references.clone(),
            definitions: spec.definitions.clone(),
            size: Size {
                width: spec.width,
                height: spec.height,
            },
            position: Point::default(),
            removed: false,
        });
        for child in &spec.children {
            let child_id = self.insert(child, Some(id));
            self.nodes[id.0 as usize].children.push(child_id);
        }
        id
    }

    fn alloc(&mut self, mut data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u64);
        data.key = format!("1:{}", id.0);
        self.nodes.push(data);
        id
    }

    /// Exports a live subtree.
    pub fn snapshot(&self, node: NodeId) -> Result<NodeSpec, DocumentError> {
        let data = self.node(node)?;
        let children = data
            .children
            .iter()
            .map(|child| self.snapshot(*child))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(NodeSpec {
            name: data.name.clone(),
            references: data.references.clone(),
            definitions: data.definitions.clone(),
            width: data.size.width,
            height: data.size.height,
            children,
        })
    }

    pub fn select(&mut self, node: Option<NodeId>) {
        self.selection = node;
    }

    pub fn set_viewport_center(&mut self, center: Point) {
        self.viewport_center = center;
    }

    /// Returns true if the node exists and has not been removed.
    pub fn contains(&self, node: NodeId) -> bool {
        self.node(node).is_ok()
    }

    /// First live descendant of `root` with the given name.
    pub fn find_by_name(&self, root: NodeId, name: &str) -> Option<NodeId> {
        self.find_nodes_where(root, |doc, n| doc.name(n).is_ok_and(|nm| nm == name))
            .ok()?
            .into_iter()
            .next()
    }

    /// Names of the node's live children, in order.
    pub fn child_names(&self, node: NodeId) -> Vec<String> {
        self.node(node)
            .map(|data| {
                data.children
                    .iter()
                    .filter_map(|c| self.node(*c).ok())
                    .map(|c| c.name.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn canvas(&self) -> &[NodeId] {
        &self.canvas
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    pub fn position(&self, node: NodeId) -> Result<Point, DocumentError> {
        Ok(self.node(node)?.position)
    }

    // =========================================================================
    // Fault injection
    // =========================================================================

    /// Makes the node unreadable, as if the host had deleted it behind our back.
    pub fn invalidate(&mut self, node: NodeId) {
        self.invalidated.insert(node);
    }

    /// Makes every later `remove_node` on this node fail.
    pub fn fail_removal_of(&mut self, node: NodeId) {
        self.failing_removals.insert(node);
    }

    /// Makes the next `clone_node` produce nothing.
    pub fn fail_next_clone(&mut self) {
        self.fail_next_clone = true;
    }

    pub fn fail_append(&mut self, fail: bool) {
        self.fail_append = fail;
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn node(&self, node: NodeId) -> Result<&NodeData, DocumentError> {
        let data = self
            .nodes
            .get(node.0 as usize)
            .ok_or(DocumentError::NodeNotFound(node))?;
        if data.removed || self.invalidated.contains(&node) {
            return Err(DocumentError::NodeRemoved(node));
        }
        Ok(data)
    }

    fn node_mut(&mut self, node: NodeId) -> Result<&mut NodeData, DocumentError> {
        self.node(node)?;
        Ok(&mut self.nodes[node.0 as usize])
    }

    fn copy_subtree(&mut self, node: NodeId, parent: Option<NodeId>) -> Result<NodeId, DocumentError> {
        let source = self.node(node)?.clone();
        let id = self.alloc(NodeData {
            parent,
            children: Vec::new(),
            position: Point::default(),
            ..source.clone()
        });
        for child in &source.children {
            let child_id = self.copy_subtree(*child, Some(id))?;
            self.nodes[id.0 as usize].children.push(child_id);
        }
        Ok(id)
    }

    fn mark_removed(&mut self, node: NodeId) {
        let children = std::mem::take(&mut self.nodes[node.0 as usize].children);
        self.nodes[node.0 as usize].removed = true;
        for child in children {
            self.mark_removed(child);
        }
    }
}

impl DocumentPort for MemoryDocument {
    fn node_key(&self, node: NodeId) -> Result<String, DocumentError> {
        Ok(self.node(node)?.key.clone())
    }

    fn name(&self, node: NodeId) -> Result<String, DocumentError> {
        Ok(self.node(node)?.name.clone())
    }

    fn set_name(&mut self, node: NodeId, name: &str) -> Result<(), DocumentError> {
        self.node_mut(node)?.name = name.to_string();
        Ok(())
    }

    fn children(&self, node: NodeId) -> Result<Vec<NodeId>, DocumentError> {
        Ok(self.node(node)?.children.clone())
    }

    fn parent(&self, node: NodeId) -> Result<Option<NodeId>, DocumentError> {
        Ok(self.node(node)?.parent)
    }

    fn property_references(&self, node: NodeId) -> Result<PropertyReferences, DocumentError> {
        Ok(self.node(node)?.references.clone())
    }

    fn property_definitions(&self, node: NodeId) -> Result<Option<Definitions>, DocumentError> {
        Ok(self.node(node)?.definitions.clone())
    }

    fn default_variant(&self, node: NodeId) -> Result<Option<NodeId>, DocumentError> {
        let data = self.node(node)?;
        if data.definitions.is_none() {
            return Ok(None);
        }
        Ok(data.children.first().copied())
    }

    fn clone_node(&mut self, node: NodeId) -> Result<Option<NodeId>, DocumentError> {
        if std::mem::take(&mut self.fail_next_clone) {
            return Ok(None);
        }
        self.copy_subtree(node, None).map(Some)
    }

    fn delete_definition(&mut self, node: NodeId, name: &str) -> Result<(), DocumentError> {
        let definitions = self
            .node_mut(node)?
            .definitions
            .as_mut()
            .ok_or(DocumentError::MissingDefinitions(node))?;
        definitions.remove(name);
        Ok(())
    }

    fn remove_node(&mut self, node: NodeId) -> Result<(), DocumentError> {
        if self.failing_removals.contains(&node) {
            return Err(DocumentError::Host(format!("node {node} is locked")));
        }
        let parent = self.node(node)?.parent;
        if let Some(parent) = parent {
            self.nodes[parent.0 as usize].children.retain(|c| *c != node);
        }
        self.canvas.retain(|c| *c != node);
        self.mark_removed(node);
        Ok(())
    }
}

impl HostSurface for MemoryDocument {
    fn current_selection(&self) -> Option<NodeId> {
        self.selection
    }

    fn append_to_canvas(&mut self, node: NodeId) -> Result<(), DocumentError> {
        if self.fail_append {
            return Err(DocumentError::Host("canvas rejected the node".to_string()));
        }
        let parent = self.node(node)?.parent;
        if let Some(parent) = parent {
            self.nodes[parent.0 as usize].children.retain(|c| *c != node);
            self.nodes[node.0 as usize].parent = None;
        }
        if !self.canvas.contains(&node) {
            self.canvas.push(node);
        }
        Ok(())
    }

    fn viewport_center(&self) -> Point {
        self.viewport_center
    }

    fn size(&self, node: NodeId) -> Result<Size, DocumentError> {
        Ok(self.node(node)?.size)
    }

    fn set_position(&mut self, node: NodeId, position: Point) -> Result<(), DocumentError> {
        self.node_mut(node)?.position = position;
        Ok(())
    }

    fn focus_viewport(&mut self, node: NodeId) -> Result<(), DocumentError> {
        self.node(node)?;
        self.focused = Some(node);
        Ok(())
    }

    fn notify_user(&mut self, message: &str, options: NotifyOptions) {
        self.notifications.push(Notification {
            message: message.to_string(),
            error: options.error,
        });
    }
}
