// Filter strings for list endpoints.
//
// The REST API takes `filter=field:"value",field2:"value2"`. `Filters`
// keeps fields in insertion order; an absent value is carried but never
// rendered, so optional criteria can be passed straight through.

use std::fmt;

use indexmap::IndexMap;

/// Insertion-ordered field → value criteria for a list query.
///
/// Re-inserting a field replaces its value but keeps its original
/// position, so a base set of criteria can be overridden by a caller's
/// set without reordering the rendered string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    entries: IndexMap<String, Option<String>>,
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `field` to `value`.
    pub fn with(mut self, field: impl Into<String>, value: impl fmt::Display) -> Self {
        self.insert(field, value);
        self
    }

    /// Set `field` to `value`, or record it as absent.
    pub fn with_optional<V: fmt::Display>(
        mut self,
        field: impl Into<String>,
        value: Option<V>,
    ) -> Self {
        self.entries
            .insert(field.into(), value.map(|v| v.to_string()));
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl fmt::Display) {
        self.entries.insert(field.into(), Some(value.to_string()));
    }

    /// Merge `other` over `self`: every field of `other` wins.
    pub fn merge(mut self, other: &Filters) -> Self {
        for (field, value) in &other.entries {
            self.entries.insert(field.clone(), value.clone());
        }
        self
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.entries.get(field).and_then(Option::as_deref)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render as a filter string. See [`build_filter`].
    pub fn build(&self) -> String {
        build_filter(self)
    }
}

impl<K, V> FromIterator<(K, V)> for Filters
where
    K: Into<String>,
    V: fmt::Display,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut filters = Self::new();
        for (field, value) in iter {
            filters.insert(field, value);
        }
        filters
    }
}

/// Render criteria as `field:"value"` pairs joined by commas.
///
/// Absent values are dropped; no criteria yields an empty string.
pub fn build_filter(filters: &Filters) -> String {
    filters
        .entries
        .iter()
        .filter_map(|(field, value)| value.as_ref().map(|v| format!("{field}:\"{v}\"")))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn absent_values_are_dropped() {
        let filters = Filters::new()
            .with("a", "x")
            .with_optional("b", None::<&str>)
            .with_optional("c", None::<u64>);
        assert_eq!(build_filter(&filters), "a:\"x\"");
    }

    #[test]
    fn empty_filters_render_empty() {
        assert_eq!(build_filter(&Filters::new()), "");
        assert!(Filters::new().is_empty());
    }

    #[test]
    fn insertion_order_is_kept() {
        let filters = Filters::new()
            .with("severity", "critical")
            .with("cleared", false)
            .with("acked", "false");
        assert_eq!(
            filters.build(),
            "severity:\"critical\",cleared:\"false\",acked:\"false\""
        );
    }

    #[test]
    fn merge_overrides_in_place() {
        let base = Filters::new().with("resourceId", 5).with("cleared", false);
        let extra = Filters::new().with("severity", "critical").with("resourceId", 9);
        let merged = base.merge(&extra);
        assert_eq!(
            merged.build(),
            "resourceId:\"9\",cleared:\"false\",severity:\"critical\""
        );
        assert_eq!(merged.get("resourceId"), Some("9"));
    }

    #[test]
    fn collects_from_pairs() {
        let filters: Filters = [("name", "eth0"), ("displayName", "eth0")]
            .into_iter()
            .collect();
        assert_eq!(filters.build(), "name:\"eth0\",displayName:\"eth0\"");
    }
}
