//! The `key=value, key=value` display-name format of variant nodes.
//!
//! Hosts encode a variant's axis assignments in its display name. The
//! pruners parse a name once, work on the parsed pairs, and only format it
//! back when a name has to be rewritten.

use std::fmt;

/// Axis assignments parsed from a variant's display name, in name order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariantName {
    pairs: Vec<(String, String)>,
}

impl VariantName {
    /// Parses a display name.
    ///
    /// Whitespace around keys and values is trimmed. Segments without `=`
    /// carry no assignment and are dropped. A repeated key keeps its first value.
    pub fn parse(name: &str) -> Self {
        let mut pairs: Vec<(String, String)> = Vec::new();
        for segment in name.split(',') {
            let Some((key, value)) = segment.split_once('=') else {
                continue;
            };
            let key = key.trim();
            if key.is_empty() || pairs.iter().any(|(k, _)| k == key) {
                continue;
            }
            pairs.push((key.to_string(), value.trim().to_string()));
        }
        Self { pairs }
    }

    /// Returns the value assigned to `axis`, if any.
    pub fn get(&self, axis: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == axis)
            .map(|(_, v)| v.as_str())
    }

    /// Removes the assignment for `axis`, returning its value.
    pub fn remove(&mut self, axis: &str) -> Option<String> {
        let index = self.pairs.iter().position(|(k, _)| k == axis)?;
        Some(self.pairs.remove(index).1)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for VariantName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.pairs.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}
