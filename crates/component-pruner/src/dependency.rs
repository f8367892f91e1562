//! Relationships between properties.
//!
//! Two unrelated mechanisms live here and must stay separate:
//! - name-based dependency ([`is_dependent`]): a marked key tied to a base
//!   name. The property pruner deletes these along with their base.
//! - structural nesting ([`children_of`]): tree-path prefixes. Only the
//!   interactive toggle ([`set_with_children`]) cascades along these.

use crate::model::{DependencyMarker, EnabledMap, PropertyDescriptor, OPTION_SEPARATOR};

/// Returns true if `candidate` is a dependent key of the property `base`.
///
/// That is, it starts with `"<marker> <base>#"` for a recognized marker.
pub fn is_dependent(candidate: &str, base: &str) -> bool {
    DependencyMarker::ALL.iter().any(|marker| {
        candidate
            .strip_prefix(marker.glyph())
            .and_then(|rest| rest.strip_prefix(' '))
            .and_then(|rest| rest.strip_prefix(base))
            .is_some_and(|rest| rest.starts_with(OPTION_SEPARATOR))
    })
}

/// Keys in `keys` that depend on `base`.
pub fn dependents_of<'a, I>(keys: I, base: &str) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    keys.into_iter().filter(|k| is_dependent(k, base)).collect()
}

/// Descriptors nested below `parent` in the default variant's tree.
pub fn children_of<'a>(
    parent: &PropertyDescriptor,
    all: &'a [PropertyDescriptor],
) -> Vec<&'a PropertyDescriptor> {
    all.iter()
        .filter(|d| parent.tree_path.is_strict_prefix_of(&d.tree_path))
        .collect()
}

/// Sets a property's flag and cascades it to every structural child.
///
/// Used by interactive toggling only; pruning never follows tree paths.
pub fn set_with_children(
    map: &mut EnabledMap,
    parent: &PropertyDescriptor,
    all: &[PropertyDescriptor],
    enabled: bool,
) {
    map.insert(parent.key.clone(), enabled);
    for child in children_of(parent, all) {
        if child.key != parent.key {
            map.insert(child.key.clone(), enabled);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PropertyDefinition, TreePath};

    fn descriptor(key: &str, path: Vec<usize>) -> PropertyDescriptor {
        PropertyDescriptor::new(key, &PropertyDefinition::boolean(true), TreePath::from(path))
    }

    #[test]
    fn test_is_dependent() {
        assert!(is_dependent("↳ Label#4:2", "Label"));
        assert!(is_dependent("⇄ Label#9:0", "Label"));
        assert!(!is_dependent("Label#4:2", "Label"));
        assert!(!is_dependent("↳ Labels#4:2", "Label"));
        assert!(!is_dependent("↳ Label", "Label"));
        assert!(!is_dependent("↳Label#4:2", "Label"));
        assert!(!is_dependent("* Label#4:2", "Label"));
    }

    #[test]
    fn test_dependents_of() {
        let map: EnabledMap = [
            ("Icon#1:0", false),
            ("⇄ Icon#2:0", true),
            ("↳ Icon#3:0", true),
            ("↳ Label#4:0", true),
        ]
        .into_iter()
        .collect();
        assert_eq!(dependents_of(map.keys(), "Icon"), vec!["↳ Icon#3:0", "⇄ Icon#2:0"]);
    }

    #[test]
    fn test_children_of_uses_strict_prefix() {
        let all = vec![
            descriptor("A#1", vec![0]),
            descriptor("B#2", vec![0, 1]),
            descriptor("C#3", vec![0, 1, 2]),
            descriptor("D#4", vec![1, 0]),
            descriptor("E#5", vec![0]),
        ];
        let children: Vec<&str> = children_of(&all[0], &all).iter().map(|d| d.key.as_str()).collect();
        assert_eq!(children, vec!["B#2", "C#3"]);

        let root = descriptor("R#0", vec![]);
        assert_eq!(children_of(&root, &all).len(), 5);
    }

    #[test]
    fn test_set_with_children_cascades() {
        let all = vec![
            descriptor("Wrapper#1", vec![1]),
            descriptor("Icon#2", vec![1, 0]),
            descriptor("Title#3", vec![0]),
        ];
        let mut map = EnabledMap::from_descriptors(&all);
        set_with_children(&mut map, &all[0], &all, false);
        assert_eq!(map.get("Wrapper#1"), Some(false));
        assert_eq!(map.get("Icon#2"), Some(false));
        assert_eq!(map.get("Title#3"), Some(true));
    }
}
