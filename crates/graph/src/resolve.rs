//! Reference resolver.
//!
//! Documents are produced independently over time and naming drifts between
//! producer runs. The resolver reconnects a raw pointer to a node through an
//! ordered, finite fallback chain; case-only and suffix-only transforms are
//! the only tolerated drift, so it never guesses across unrelated entities.

use crate::alias::AliasTable;
use bomref_protocol::{append_default_split, strip_name_qualifier};

/// Which fallback step produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStep {
    Exact,
    CaseFold,
    QualifierStripped,
    DefaultSplit,
}

#[derive(Debug, Clone)]
pub struct Resolved {
    pub node_id: String,
    pub step: ResolutionStep,
}

/// A pointer no fallback step could match. Carries every attempted form for
/// the caller's diagnostic; the edge is dropped, never fabricated.
#[derive(Debug, Clone)]
pub struct Unresolved {
    pub raw: String,
    pub attempted: Vec<String>,
}

pub struct Resolver<'a> {
    aliases: &'a AliasTable,
}

impl<'a> Resolver<'a> {
    #[must_use]
    pub const fn new(aliases: &'a AliasTable) -> Self {
        Self { aliases }
    }

    /// Ordered fallback chain, first match wins:
    /// exact → case-insensitive → qualifier-stripped → default-split.
    pub fn resolve(&self, raw: &str) -> std::result::Result<Resolved, Unresolved> {
        let mut attempted = vec![raw.to_string()];

        if let Some(id) = self.aliases.resolve_exact(raw) {
            return Ok(Resolved {
                node_id: id.to_string(),
                step: ResolutionStep::Exact,
            });
        }

        attempted.push(raw.to_lowercase());
        if let Some(id) = self.aliases.resolve_folded(raw) {
            return Ok(Resolved {
                node_id: id.to_string(),
                step: ResolutionStep::CaseFold,
            });
        }

        if let Some(stripped) = strip_name_qualifier(raw) {
            attempted.push(stripped.clone());
            if let Some(id) = self
                .aliases
                .resolve_exact(&stripped)
                .or_else(|| self.aliases.resolve_folded(&stripped))
            {
                return Ok(Resolved {
                    node_id: id.to_string(),
                    step: ResolutionStep::QualifierStripped,
                });
            }
        }

        if let Some(with_split) = append_default_split(raw) {
            attempted.push(with_split.clone());
            if let Some(id) = self
                .aliases
                .resolve_exact(&with_split)
                .or_else(|| self.aliases.resolve_folded(&with_split))
            {
                return Ok(Resolved {
                    node_id: id.to_string(),
                    step: ResolutionStep::DefaultSplit,
                });
            }
        }

        Err(Unresolved {
            raw: raw.to_string(),
            attempted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn table(ids: &[&str]) -> AliasTable {
        let mut table = AliasTable::new();
        for id in ids {
            table.register(id);
        }
        table
    }

    #[test]
    fn exact_match_wins_first() {
        let table = table(&["models://net/1.0"]);
        let resolved = Resolver::new(&table).resolve("models://net/1.0").unwrap();
        assert_eq!(resolved.step, ResolutionStep::Exact);
        assert_eq!(resolved.node_id, "models://net/1.0");
    }

    #[test]
    fn case_drift_resolves_via_fold() {
        let table = table(&["models://net/1.0"]);
        let resolved = Resolver::new(&table).resolve("models://Net/1.0").unwrap();
        assert_eq!(resolved.step, ResolutionStep::CaseFold);
    }

    #[test]
    fn qualifier_stripping_reaches_unqualified_node() {
        // Producer wrote the qualified spelling; the node is unqualified.
        let table = table(&["data://sales/1.0"]);
        let resolved = Resolver::new(&table)
            .resolve("data://sales-dataset/1.0")
            .unwrap();
        // Exact variant registration covers this before the transform runs.
        assert_eq!(resolved.node_id, "data://sales/1.0");
    }

    #[test]
    fn case_and_qualifier_drift_resolve_together() {
        let table = table(&["data://sales-dataset/1.0"]);
        let resolved = Resolver::new(&table).resolve("data://Sales/1.0").unwrap();
        assert_eq!(resolved.node_id, "data://sales-dataset/1.0");
        assert_eq!(resolved.step, ResolutionStep::CaseFold);
    }

    #[test]
    fn default_split_reconnects_older_producers() {
        let table = table(&["data://demo/1.0/train"]);
        let resolved = Resolver::new(&table).resolve("data://demo/1.0").unwrap();
        assert_eq!(resolved.node_id, "data://demo/1.0/train");
    }

    #[test]
    fn unrelated_entities_never_resolve() {
        let table = table(&["data://sales-dataset/1.0"]);
        let err = Resolver::new(&table).resolve("data://Sales2/1.0").unwrap_err();
        assert_eq!(err.raw, "data://Sales2/1.0");
        assert!(err.attempted.contains(&"data://sales2/1.0".to_string()));
        assert!(err.attempted.contains(&"data://Sales2/1.0/train".to_string()));
    }

    #[test]
    fn library_local_ids_stay_opaque() {
        let table = table(&["data://demo/1.0"]);
        assert!(Resolver::new(&table).resolve("lib:numpy@1.26").is_err());
    }
}
