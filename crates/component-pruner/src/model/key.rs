//! Property keys as they appear in an enabled map.
//!
//! A key takes one of these shapes:
//! - `name` for a whole property or a whole variant axis
//! - `name#option` for one option of a variant axis (or a host-suffixed
//!   property id such as `Label#12:0`)
//! - `<marker> name#...` for a property that depends on the base `name`

use std::fmt;

/// Separates a base name from an option value or host suffix.
pub const OPTION_SEPARATOR: char = '#';

/// Glyph prefixed to keys of text properties that depend on a parent.
pub const TEXT_DEPENDENCY_GLYPH: char = '↳';

/// Glyph prefixed to keys of instance-swap properties that depend on a parent.
pub const INSTANCE_SWAP_DEPENDENCY_GLYPH: char = '⇄';

/// Kind of dependency a marked key expresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyMarker {
    Text,
    InstanceSwap,
}

impl DependencyMarker {
    /// Every recognized marker.
    pub const ALL: [DependencyMarker; 2] = [DependencyMarker::Text, DependencyMarker::InstanceSwap];

    /// Returns the glyph written in front of a dependent key.
    pub fn glyph(self) -> char {
        match self {
            DependencyMarker::Text => TEXT_DEPENDENCY_GLYPH,
            DependencyMarker::InstanceSwap => INSTANCE_SWAP_DEPENDENCY_GLYPH,
        }
    }

    pub fn from_glyph(c: char) -> Option<DependencyMarker> {
        match c {
            TEXT_DEPENDENCY_GLYPH => Some(DependencyMarker::Text),
            INSTANCE_SWAP_DEPENDENCY_GLYPH => Some(DependencyMarker::InstanceSwap),
            _ => None,
        }
    }

    /// Builds the marked key for a dependent property, e.g. `↳ Label#4:2`.
    pub fn mark(self, key: &str) -> String {
        format!("{} {}", self.glyph(), key)
    }

    /// The prefix every dependent of `base` starts with, e.g. `↳ Icon#`.
    pub fn dependent_prefix(self, base: &str) -> String {
        format!("{} {}{}", self.glyph(), base, OPTION_SEPARATOR)
    }
}

/// A parsed view over an enabled-map key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyKey<'a> {
    raw: &'a str,
    marker: Option<DependencyMarker>,
    name: &'a str,
}

impl<'a> PropertyKey<'a> {
    /// Parses a key. Never fails: anything without a marker is a plain key.
    pub fn parse(raw: &'a str) -> Self {
        let mut chars = raw.chars();
        if let Some(marker) = chars.next().and_then(DependencyMarker::from_glyph) {
            if let Some(rest) = chars.as_str().strip_prefix(' ') {
                return Self {
                    raw,
                    marker: Some(marker),
                    name: rest,
                };
            }
        }
        Self {
            raw,
            marker: None,
            name: raw,
        }
    }

    /// The key exactly as it was given.
    pub fn raw(&self) -> &'a str {
        self.raw
    }

    pub fn marker(&self) -> Option<DependencyMarker> {
        self.marker
    }

    pub fn is_marked(&self) -> bool {
        self.marker.is_some()
    }

    /// The name the document uses for this property's definition.
    ///
    /// Markers exist only in the UI, so they are stripped.
    pub fn definition_name(&self) -> &'a str {
        self.name
    }

    /// Text before the option separator, or the whole unmarked name.
    pub fn base(&self) -> &'a str {
        match self.name.split_once(OPTION_SEPARATOR) {
            Some((base, _)) => base,
            None => self.name,
        }
    }

    /// Text after the option separator, if any.
    pub fn option(&self) -> Option<&'a str> {
        self.name.split_once(OPTION_SEPARATOR).map(|(_, option)| option)
    }
}

impl fmt::Display for PropertyKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.raw)
    }
}

/// Builds the key toggling one option of a variant axis.
pub fn option_key(axis: &str, option: &str) -> String {
    format!("{axis}{OPTION_SEPARATOR}{option}")
}
