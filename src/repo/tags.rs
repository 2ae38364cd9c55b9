//! Release tag filtering and ordering.

use crate::models::TagOrder;

/// Naming pattern shared by all shippable NG firmware releases.
pub const RELEASE_TAG_PREFIX: &str = "release/ng-v";

/// Filter a tag list down to release tags, sorted descending per `order`.
///
/// The newest release comes first, so menu entry 1 is the latest version.
pub fn release_versions<I>(tags: I, order: TagOrder) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut versions: Vec<String> = tags
        .into_iter()
        .filter(|tag| tag.starts_with(RELEASE_TAG_PREFIX))
        .collect();

    match order {
        TagOrder::Lexical => versions.sort_by(|a, b| b.cmp(a)),
        TagOrder::Semantic => versions.sort_by(|a, b| {
            version_key(b)
                .cmp(&version_key(a))
                // Equal numeric keys fall back to the lexical rule
                .then_with(|| b.cmp(a))
        }),
    }

    versions
}

/// Extract a numeric version key from a release tag for semantic comparison.
///
/// Handles the release naming in use:
/// - "release/ng-v1.2.3" -> (1, 2, 3)
/// - "release/ng-v2"     -> (2, 0, 0)
///
/// Missing components are treated as zero.
fn version_key(tag: &str) -> (u32, u32, u32) {
    let rest = tag.strip_prefix(RELEASE_TAG_PREFIX).unwrap_or(tag);

    let mut parts = rest
        .split(|c: char| !c.is_ascii_digit())
        .filter(|s| !s.is_empty());

    let major: u32 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);
    let minor: u32 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);
    let patch: u32 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);

    (major, minor, patch)
}
