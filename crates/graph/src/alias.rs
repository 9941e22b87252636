//! Ephemeral alias table.
//!
//! Maps alternate spellings of a reference (case folds, the `-dataset`
//! qualifier stripped or added, the default split omitted) to the canonical
//! reference actually present as a node. Rebuilt alongside every graph and
//! discarded with it; it exists only to feed the resolver's fallback chain.

use bomref_protocol::{add_name_qualifier, strip_name_qualifier, strip_split, DATA_SCHEME};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct AliasTable {
    exact: HashMap<String, String>,
    folded: HashMap<String, String>,
}

impl AliasTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node's canonical reference and every alternate spelling of
    /// it. The canonical spelling always wins over a variant derived from
    /// some other node.
    pub fn register(&mut self, canonical: &str) {
        self.insert_primary(canonical);
        for variant in variants(canonical) {
            self.insert_variant(&variant, canonical);
        }
    }

    fn insert_primary(&mut self, canonical: &str) {
        self.exact
            .insert(canonical.to_string(), canonical.to_string());
        self.folded
            .insert(canonical.to_lowercase(), canonical.to_string());
    }

    fn insert_variant(&mut self, spelling: &str, canonical: &str) {
        self.exact
            .entry(spelling.to_string())
            .or_insert_with(|| canonical.to_string());
        self.folded
            .entry(spelling.to_lowercase())
            .or_insert_with(|| canonical.to_string());
    }

    #[must_use]
    pub fn resolve_exact(&self, spelling: &str) -> Option<&str> {
        self.exact.get(spelling).map(String::as_str)
    }

    /// Case-insensitive lookup.
    #[must_use]
    pub fn resolve_folded(&self, spelling: &str) -> Option<&str> {
        self.folded.get(&spelling.to_lowercase()).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.exact.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.exact.is_empty()
    }
}

/// Alternate spellings a producer might have written for `canonical`.
/// Only dataset references drift in practice: the qualifier convention and
/// the optional split segment.
fn variants(canonical: &str) -> Vec<String> {
    if !canonical.starts_with(DATA_SCHEME) {
        return Vec::new();
    }
    let mut out = Vec::new();
    let bases = match strip_split(canonical) {
        Some(splitless) => vec![splitless, canonical.to_string()],
        None => vec![canonical.to_string()],
    };
    for base in bases {
        if base != canonical {
            out.push(base.clone());
        }
        if let Some(stripped) = strip_name_qualifier(&base) {
            out.push(stripped);
        }
        if let Some(qualified) = add_name_qualifier(&base) {
            out.push(qualified);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn registers_qualifier_and_split_variants() {
        let mut table = AliasTable::new();
        table.register("data://sales-dataset/1.0/train");

        for spelling in [
            "data://sales-dataset/1.0/train",
            "data://sales-dataset/1.0",
            "data://sales/1.0",
            "data://sales/1.0/train",
        ] {
            assert_eq!(
                table.resolve_exact(spelling),
                Some("data://sales-dataset/1.0/train"),
                "spelling {spelling}"
            );
        }
    }

    #[test]
    fn folded_lookup_ignores_case() {
        let mut table = AliasTable::new();
        table.register("data://sales-dataset/1.0");
        assert_eq!(
            table.resolve_folded("data://Sales/1.0"),
            Some("data://sales-dataset/1.0")
        );
        assert!(table.resolve_exact("data://Sales/1.0").is_none());
    }

    #[test]
    fn model_references_register_canonical_only() {
        let mut table = AliasTable::new();
        table.register("models://net/1.0");
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn canonical_spelling_beats_derived_variant() {
        let mut table = AliasTable::new();
        // The variant of the qualified node collides with the real node below.
        table.register("data://sales-dataset/1.0");
        table.register("data://sales/1.0");
        assert_eq!(table.resolve_exact("data://sales/1.0"), Some("data://sales/1.0"));
        // Registration order must not matter for canonical spellings.
        let mut reversed = AliasTable::new();
        reversed.register("data://sales/1.0");
        reversed.register("data://sales-dataset/1.0");
        assert_eq!(
            reversed.resolve_exact("data://sales/1.0"),
            Some("data://sales/1.0")
        );
    }
}
