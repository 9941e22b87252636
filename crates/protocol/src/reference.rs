//! Canonical identifier scheme.
//!
//! Every entity maps to one stable reference string, independent of which
//! document emitted it. The resolver treats references as opaque except for
//! the segment transforms defined here, so producer and consumer share one
//! implementation.

use crate::Entity;

pub const MODEL_SCHEME: &str = "models://";
pub const DATA_SCHEME: &str = "data://";

/// Serialized in place of an empty entity name; documents must stay
/// emittable for partial or fake data.
pub const NAME_PLACEHOLDER: &str = "unknown";

/// Split segment assumed when an older producer omitted it.
pub const DEFAULT_SPLIT: &str = "train";

/// Trailing name qualifier tolerated across producer runs
/// (`sales` vs `sales-dataset`).
pub const DATASET_QUALIFIER: &str = "-dataset";

/// Entity name as it appears in references and documents.
#[must_use]
pub fn display_name(name: &str) -> &str {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        NAME_PLACEHOLDER
    } else {
        trimmed
    }
}

/// Canonical reference for an entity. Pure and total: any input yields a
/// reference, never a panic.
///
/// Two entities with equal `(kind, name, version, split)` always produce the
/// same string. Libraries get an in-document local identifier instead of a
/// scheme-prefixed reference; they are never pointed at from other documents.
#[must_use]
pub fn reference(entity: &Entity) -> String {
    match entity {
        Entity::Model { name, version } => join(MODEL_SCHEME, name, version, None),
        Entity::Dataset {
            name,
            version,
            split,
        } => join(DATA_SCHEME, name, version, split.as_deref()),
        Entity::Library { name, version } => library_local_id(name, version),
    }
}

/// Local identifier for an embedded library descriptor.
#[must_use]
pub fn library_local_id(name: &str, version: &str) -> String {
    let name = display_name(name);
    let version = version.trim();
    if version.is_empty() {
        format!("lib:{name}")
    } else {
        format!("lib:{name}@{version}")
    }
}

fn join(scheme: &str, name: &str, version: &str, split: Option<&str>) -> String {
    let mut out = format!("{scheme}{}", display_name(name));
    let version = version.trim();
    if !version.is_empty() {
        out.push('/');
        out.push_str(version);
        if let Some(split) = split.map(str::trim).filter(|s| !s.is_empty()) {
            out.push('/');
            out.push_str(split);
        }
    }
    out
}

/// Split a reference into its scheme and path segments. `None` for strings
/// outside the scheme (library local ids included).
#[must_use]
pub fn split_reference(reference: &str) -> Option<(&str, Vec<&str>)> {
    for scheme in [MODEL_SCHEME, DATA_SCHEME] {
        if let Some(rest) = reference.strip_prefix(scheme) {
            if rest.is_empty() {
                return None;
            }
            return Some((scheme, rest.split('/').collect()));
        }
    }
    None
}

/// Rebuild a reference with the `-dataset` qualifier stripped from the name
/// segment. `None` when the name carries no qualifier.
#[must_use]
pub fn strip_name_qualifier(reference: &str) -> Option<String> {
    transform_name(reference, |name| {
        name.strip_suffix(DATASET_QUALIFIER)
            .filter(|stripped| !stripped.is_empty())
            .map(str::to_string)
    })
}

/// Rebuild a reference with the `-dataset` qualifier appended to the name
/// segment. `None` when the name already carries it.
#[must_use]
pub fn add_name_qualifier(reference: &str) -> Option<String> {
    transform_name(reference, |name| {
        if name.ends_with(DATASET_QUALIFIER) {
            None
        } else {
            Some(format!("{name}{DATASET_QUALIFIER}"))
        }
    })
}

/// Append the default split segment to a `data://name/version` reference
/// that omits it.
#[must_use]
pub fn append_default_split(reference: &str) -> Option<String> {
    let (scheme, segments) = split_reference(reference)?;
    if scheme != DATA_SCHEME || segments.len() != 2 {
        return None;
    }
    Some(format!("{reference}/{DEFAULT_SPLIT}"))
}

/// Drop the split segment from a `data://name/version/split` reference.
#[must_use]
pub fn strip_split(reference: &str) -> Option<String> {
    let (scheme, segments) = split_reference(reference)?;
    if scheme != DATA_SCHEME || segments.len() != 3 {
        return None;
    }
    Some(format!("{scheme}{}/{}", segments[0], segments[1]))
}

fn transform_name<F>(reference: &str, transform: F) -> Option<String>
where
    F: FnOnce(&str) -> Option<String>,
{
    let (scheme, segments) = split_reference(reference)?;
    let name = transform(segments.first()?)?;
    let mut out = format!("{scheme}{name}");
    for segment in &segments[1..] {
        out.push('/');
        out.push_str(segment);
    }
    Some(out)
}
