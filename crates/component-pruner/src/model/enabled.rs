//! The flat keep/remove record driving a build.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::descriptor::PropertyDescriptor;
use crate::model::key::{option_key, PropertyKey, OPTION_SEPARATOR};

/// Property keys mapped to "keep this" flags.
///
/// Iteration is in key order, so every pass over the map is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnabledMap {
    entries: BTreeMap<String, bool>,
}

impl EnabledMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the initial all-enabled map for a set of descriptors.
    ///
    /// Every property key is present, and every variant axis additionally
    /// gets one `axis#option` entry per declared option.
    pub fn from_descriptors<'a, I>(descriptors: I) -> Self
    where
        I: IntoIterator<Item = &'a PropertyDescriptor>,
    {
        let mut map = Self::new();
        for descriptor in descriptors {
            map.insert(descriptor.key.clone(), true);
            if descriptor.is_variant() {
                for option in &descriptor.variant_options {
                    map.insert(option_key(&descriptor.key, option), true);
                }
            }
        }
        map
    }

    /// Sets a flag, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, enabled: bool) -> Option<bool> {
        self.entries.insert(key.into(), enabled)
    }

    pub fn get(&self, key: &str) -> Option<bool> {
        self.entries.get(key).copied()
    }

    /// True only when the key is present and set to keep.
    pub fn is_enabled(&self, key: &str) -> bool {
        self.get(key) == Some(true)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Every key whose flag is false, in key order.
    pub fn disabled_keys(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, enabled)| !**enabled)
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Option values flagged to keep, grouped by axis name.
    ///
    /// Only unmarked `axis#option` keys set to true contribute.
    pub fn kept_options(&self) -> BTreeMap<String, Vec<String>> {
        let mut kept: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (raw, enabled) in self.iter() {
            if !enabled || !raw.contains(OPTION_SEPARATOR) {
                continue;
            }
            let key = PropertyKey::parse(raw);
            if key.is_marked() {
                continue;
            }
            if let Some(option) = key.option() {
                kept.entry(key.base().to_string())
                    .or_default()
                    .push(option.to_string());
            }
        }
        kept
    }
}

impl FromIterator<(String, bool)> for EnabledMap {
    fn from_iter<T: IntoIterator<Item = (String, bool)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> FromIterator<(&'a str, bool)> for EnabledMap {
    fn from_iter<T: IntoIterator<Item = (&'a str, bool)>>(iter: T) -> Self {
        iter.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }
}

impl IntoIterator for EnabledMap {
    type Item = (String, bool);
    type IntoIter = std::collections::btree_map::IntoIter<String, bool>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
