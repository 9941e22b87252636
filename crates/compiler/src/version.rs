/// One dot-separated segment of a version string. Numeric segments order
/// numerically; anything else falls back to string order, numbers first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum VersionPart {
    Number(u64),
    Text(String),
}

/// Sort key for version strings: `1.10.0` orders after `1.2.0`, while
/// date-like or free-form versions keep a stable lexicographic order.
#[must_use]
pub fn version_key(version: &str) -> Vec<VersionPart> {
    version
        .split('.')
        .map(|part| {
            part.parse::<u64>()
                .map_or_else(|_| VersionPart::Text(part.to_string()), VersionPart::Number)
        })
        .collect()
}
