use std::cmp::Ordering;

/// Compares two version strings component-wise.
///
/// Normalization: a leading case-insensitive `v` is stripped, the remainder
/// is split on `.`, and each component drops everything from the first `-`
/// (pre-release and build metadata never participate in ordering, so
/// `2.0.0-beta` compares equal to `2.0.0`). Shorter versions are zero-padded
/// before comparison. A version with any component that does not parse as an
/// integer collapses to a single zero component rather than erroring; callers
/// that care about malformed input must validate separately.
pub fn compare_versions(left: &str, right: &str) -> Ordering {
    let mut a = normalize_components(left);
    let mut b = normalize_components(right);
    let len = a.len().max(b.len());
    a.resize(len, 0);
    b.resize(len, 0);
    a.cmp(&b)
}

/// True when `candidate` orders strictly after `current`.
pub fn is_newer_version(candidate: &str, current: &str) -> bool {
    compare_versions(candidate, current) == Ordering::Greater
}

/// Strips a leading `v`/`V` from a release tag when it is followed by a
/// digit, yielding a bare comparable version ("v1.2.0" -> "1.2.0" but a tag
/// like "vanguard" passes through unchanged).
pub fn strip_release_prefix(tag: &str) -> &str {
    let trimmed = tag.trim();
    let mut chars = trimmed.chars();
    match (chars.next(), chars.next()) {
        (Some('v') | Some('V'), Some(next)) if next.is_ascii_digit() => &trimmed[1..],
        _ => trimmed,
    }
}

fn normalize_components(version: &str) -> Vec<u64> {
    let trimmed = version.trim();
    let bare = match trimmed.chars().next() {
        Some('v') | Some('V') => &trimmed[1..],
        _ => trimmed,
    };
    if bare.is_empty() {
        return vec![0];
    }

    let mut components = Vec::new();
    for component in bare.split('.') {
        let numeric = component.split('-').next().unwrap_or(component);
        match numeric.parse::<u64>() {
            Ok(value) => components.push(value),
            Err(_) => return vec![0],
        }
    }
    components
}
