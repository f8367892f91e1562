//! Ports onto the host-owned component document.
//!
//! The engine never touches the host's object graph directly. Everything it
//! needs is expressed through two traits:
//! - [`DocumentPort`]: query and mutate a component tree
//! - [`HostSurface`]: the canvas, viewport, selection and notifications
//!
//! [`memory::MemoryDocument`] implements both over an in-memory tree.

pub mod memory;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub use crate::error::DocumentError;
use crate::model::PropertyDefinition;

pub use memory::{DocumentFixture, MemoryDocument, NodeSpec, Notification};

/// Opaque handle to a node in the host document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Property definition table of a component set, keyed by definition name.
pub type Definitions = BTreeMap<String, PropertyDefinition>;

/// Node attribute mapped to the property name it is bound to.
pub type PropertyReferences = BTreeMap<String, String>;

/// A canvas coordinate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Width and height of a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// Query and mutation operations on a component tree.
pub trait DocumentPort {
    /// Reads the node's identifying field.
    ///
    /// Fails for any node that no longer exists; callers treat failure as staleness.
    fn node_key(&self, node: NodeId) -> Result<String, DocumentError>;

    fn name(&self, node: NodeId) -> Result<String, DocumentError>;

    fn set_name(&mut self, node: NodeId, name: &str) -> Result<(), DocumentError>;

    /// Children in document order.
    fn children(&self, node: NodeId) -> Result<Vec<NodeId>, DocumentError>;

    fn parent(&self, node: NodeId) -> Result<Option<NodeId>, DocumentError>;

    /// The node's property bindings. Empty for unbound nodes.
    fn property_references(&self, node: NodeId) -> Result<PropertyReferences, DocumentError>;

    /// The node's definition table, or None if it is not a component set.
    fn property_definitions(&self, node: NodeId) -> Result<Option<Definitions>, DocumentError>;

    /// The variant the host treats as the component set's default.
    fn default_variant(&self, node: NodeId) -> Result<Option<NodeId>, DocumentError>;

    /// Deep-copies a subtree. Ok(None) means the host produced nothing.
    fn clone_node(&mut self, node: NodeId) -> Result<Option<NodeId>, DocumentError>;

    /// Deletes one definition. Deleting an absent name is a no-op.
    fn delete_definition(&mut self, node: NodeId, name: &str) -> Result<(), DocumentError>;

    /// Detaches a node and its subtree from the document.
    fn remove_node(&mut self, node: NodeId) -> Result<(), DocumentError>;

    /// Looks up a single definition.
    fn property_definition(
        &self,
        node: NodeId,
        name: &str,
    ) -> Result<Option<PropertyDefinition>, DocumentError> {
        Ok(self
            .property_definitions(node)?
            .and_then(|mut defs| defs.remove(name)))
    }

    /// Returns true if the node can still be read.
    fn is_live(&self, node: NodeId) -> bool {
        self.node_key(node).is_ok()
    }

    /// Collects every descendant of `root` (excluding `root`) matching `predicate`,
    /// in pre-order.
    fn find_nodes_where<P>(&self, root: NodeId, mut predicate: P) -> Result<Vec<NodeId>, DocumentError>
    where
        Self: Sized,
        P: FnMut(&Self, NodeId) -> bool,
    {
        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root)?.into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            if predicate(self, node) {
                found.push(node);
            }
            stack.extend(self.children(node)?.into_iter().rev());
        }
        Ok(found)
    }
}

/// How a user notification should be presented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyOptions {
    pub error: bool,
}

/// Host services around the document: canvas, viewport and user messages.
pub trait HostSurface: DocumentPort {
    /// The node the user currently has selected as the build source.
    fn current_selection(&self) -> Option<NodeId>;

    /// Hands a detached node over to the canvas.
    fn append_to_canvas(&mut self, node: NodeId) -> Result<(), DocumentError>;

    fn viewport_center(&self) -> Point;

    fn size(&self, node: NodeId) -> Result<Size, DocumentError>;

    fn set_position(&mut self, node: NodeId, position: Point) -> Result<(), DocumentError>;

    /// Scrolls and zooms the viewport onto a node.
    fn focus_viewport(&mut self, node: NodeId) -> Result<(), DocumentError>;

    fn notify_user(&mut self, message: &str, options: NotifyOptions);
}
