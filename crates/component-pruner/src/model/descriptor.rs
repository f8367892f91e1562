//! Property definitions and the descriptors read from them.
//!
//! Definitions live on a component set's root and are the source of truth
//! for which properties exist. Descriptors are the normalized, read-only view
//! the UI and the pruners work from.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::key::PropertyKey;

/// Kinds of component property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PropertyKind {
    Variant,
    Boolean,
    Text,
    InstanceSwap,
}

impl PropertyKind {
    /// Returns the host's name for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            PropertyKind::Variant => "VARIANT",
            PropertyKind::Boolean => "BOOLEAN",
            PropertyKind::Text => "TEXT",
            PropertyKind::InstanceSwap => "INSTANCE_SWAP",
        }
    }

    pub fn is_variant(self) -> bool {
        self == PropertyKind::Variant
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default value of a property.
///
/// Boolean properties default to a bool; everything else (variant option,
/// text content, instance-swap component id) is text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Text(String),
}

impl PropertyValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            PropertyValue::Bool(_) => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Bool(b) => write!(f, "{b}"),
            PropertyValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Bool(b)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::Text(s.to_string())
    }
}

/// A property declaration on a component set's root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDefinition {
    #[serde(rename = "type")]
    pub kind: PropertyKind,
    pub default_value: PropertyValue,
    /// Declared options, in declaration order. Only variant axes have them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variant_options: Vec<String>,
}

impl PropertyDefinition {
    /// Declares a variant axis.
    pub fn variant<I, S>(default: &str, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: PropertyKind::Variant,
            default_value: default.into(),
            variant_options: options.into_iter().map(Into::into).collect(),
        }
    }

    pub fn boolean(default: bool) -> Self {
        Self {
            kind: PropertyKind::Boolean,
            default_value: default.into(),
            variant_options: Vec::new(),
        }
    }

    pub fn text(default: &str) -> Self {
        Self {
            kind: PropertyKind::Text,
            default_value: default.into(),
            variant_options: Vec::new(),
        }
    }

    pub fn instance_swap(default_component: &str) -> Self {
        Self {
            kind: PropertyKind::InstanceSwap,
            default_value: default_component.into(),
            variant_options: Vec::new(),
        }
    }

    /// Checks the declaration for internal consistency.
    ///
    /// Returns an error description if inconsistent, None if valid.
    pub fn validate(&self) -> Option<&'static str> {
        match self.kind {
            PropertyKind::Variant => {
                if self.variant_options.is_empty() {
                    return Some("variant axis declares no options");
                }
                match self.default_value.as_text() {
                    Some(default) if self.variant_options.iter().any(|o| o == default) => {}
                    Some(_) => return Some("variant default is not one of its options"),
                    None => return Some("variant default must be text"),
                }
            }
            PropertyKind::Boolean => {
                if !matches!(self.default_value, PropertyValue::Bool(_)) {
                    return Some("boolean property has a non-boolean default");
                }
            }
            PropertyKind::Text | PropertyKind::InstanceSwap => {
                if !self.variant_options.is_empty() {
                    return Some("only variant axes may declare options");
                }
            }
        }
        None
    }
}

/// Child indices leading from the default variant to a node.
///
/// The empty path means the property is referenced at the root, or that no
/// referencing node was found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TreePath(pub Vec<usize>);

impl TreePath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    /// Returns true if `self` is strictly shorter than `other` and a prefix of it.
    pub fn is_strict_prefix_of(&self, other: &TreePath) -> bool {
        other.0.len() > self.0.len() && other.0[..self.0.len()] == self.0[..]
    }
}

impl From<Vec<usize>> for TreePath {
    fn from(path: Vec<usize>) -> Self {
        TreePath(path)
    }
}

impl fmt::Display for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("/")?;
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{index}")?;
        }
        Ok(())
    }
}

/// Normalized view of one declared property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDescriptor {
    /// The definition's full name, e.g. `Label#12:0` or `size`.
    pub key: String,
    /// The base name, without any option suffix.
    pub name: String,
    pub kind: PropertyKind,
    pub default_value: PropertyValue,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variant_options: Vec<String>,
    pub tree_path: TreePath,
}

impl PropertyDescriptor {
    /// Builds a descriptor from a definition and the path to its exemplar node.
    pub fn new(key: &str, definition: &PropertyDefinition, tree_path: TreePath) -> Self {
        Self {
            key: key.to_string(),
            name: PropertyKey::parse(key).base().to_string(),
            kind: definition.kind,
            default_value: definition.default_value.clone(),
            variant_options: definition.variant_options.clone(),
            tree_path,
        }
    }

    pub fn is_variant(&self) -> bool {
        self.kind.is_variant()
    }
}
