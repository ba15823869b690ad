//! Record layouts: which columns each field of a record kind occupies.
//!
//! Layouts can be authored in two shapes:
//! - **Canonical**: kind -> ordered list of [`FieldDescriptor`]s
//! - **Declarative**: kind -> (field name -> inclusive column range)
//!
//! [`LayoutSpec::into_canonical`] turns either shape into the canonical one,
//! with each kind's fields sorted by start column.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

/// One field of a record kind.
///
/// `start` is a column number interpreted relative to the file's logical
/// first column (1 by default). Overlapping fields are allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub start: usize,
    pub len: usize,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, start: usize, len: usize) -> Self {
        Self {
            name: name.into(),
            start,
            len,
        }
    }

    /// Build a descriptor from an inclusive column range, e.g. `4..=5`.
    pub fn from_columns(name: impl Into<String>, columns: &RangeInclusive<usize>) -> Self {
        let len = (columns.end() + 1).saturating_sub(*columns.start());
        Self::new(name, *columns.start(), len)
    }

    /// Last column covered by this field (inclusive).
    pub fn end(&self) -> usize {
        self.start + self.len.saturating_sub(1)
    }
}

/// Canonical layout: kind -> fields sorted by start column.
pub type CanonicalLayout = BTreeMap<String, Vec<FieldDescriptor>>;

/// Declarative layout: kind -> field name -> inclusive column range.
pub type DeclarativeLayout = BTreeMap<String, BTreeMap<String, RangeInclusive<usize>>>;

/// A layout in either accepted shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutSpec {
    Canonical(CanonicalLayout),
    Declarative(DeclarativeLayout),
}

impl LayoutSpec {
    /// Normalize into the canonical shape.
    ///
    /// Declarative fields become `{start = first, len = last - first + 1}`.
    /// A kind with no fields yields an empty list. Canonical input is passed
    /// through unchanged.
    pub fn into_canonical(self) -> CanonicalLayout {
        match self {
            LayoutSpec::Canonical(layout) => layout,
            LayoutSpec::Declarative(layout) => layout
                .into_iter()
                .map(|(kind, fields)| {
                    let mut descriptors: Vec<FieldDescriptor> = fields
                        .iter()
                        .map(|(name, columns)| FieldDescriptor::from_columns(name.as_str(), columns))
                        .collect();
                    descriptors.sort_by_key(|f| f.start);
                    (kind, descriptors)
                })
                .collect(),
        }
    }
}

impl From<CanonicalLayout> for LayoutSpec {
    fn from(layout: CanonicalLayout) -> Self {
        LayoutSpec::Canonical(layout)
    }
}

impl From<DeclarativeLayout> for LayoutSpec {
    fn from(layout: DeclarativeLayout) -> Self {
        LayoutSpec::Declarative(layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn declarative(kind: &str, fields: &[(&str, RangeInclusive<usize>)]) -> DeclarativeLayout {
        let mut layout = DeclarativeLayout::new();
        layout.insert(
            kind.to_string(),
            fields
                .iter()
                .map(|(n, r)| (n.to_string(), r.clone()))
                .collect(),
        );
        layout
    }

    #[test]
    fn test_declarative_lengths() {
        let layout = LayoutSpec::from(declarative("A", &[("x", 1..=3), ("y", 4..=5)])).into_canonical();
        assert_eq!(
            layout["A"],
            vec![FieldDescriptor::new("x", 1, 3), FieldDescriptor::new("y", 4, 2)]
        );
    }

    #[test]
    fn test_declarative_sorted_by_start() {
        let layout =
            LayoutSpec::from(declarative("A", &[("a_last", 10..=12), ("z_first", 1..=2)])).into_canonical();
        let names: Vec<&str> = layout["A"].iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["z_first", "a_last"]);
    }

    #[test]
    fn test_empty_kind_is_legal() {
        let layout = LayoutSpec::from(declarative("A", &[])).into_canonical();
        assert!(layout["A"].is_empty());
    }

    #[test]
    fn test_canonical_passthrough() {
        let mut canonical = CanonicalLayout::new();
        canonical.insert("B".to_string(), vec![FieldDescriptor::new("v", 7, 4)]);
        assert_eq!(LayoutSpec::from(canonical.clone()).into_canonical(), canonical);
    }

    #[test]
    fn test_field_end() {
        assert_eq!(FieldDescriptor::new("v", 7, 4).end(), 10);
        assert_eq!(FieldDescriptor::from_columns("w", &(3..=3)).len, 1);
    }
}
