//! Taxpayer name matching

/// Characters ignored when comparing names
pub const IGNORED_CHARS: &[char] = &[' ', '/', '\\', '-', '_', '.', ','];

/// Lower-case and drop [`IGNORED_CHARS`]
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| !IGNORED_CHARS.contains(c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Whether a claimed name matches the stored one
///
/// An empty normalized claim never matches.
pub fn names_match(claimed: &str, stored: &str) -> bool {
    let claimed = normalize_name(claimed);
    !claimed.is_empty() && claimed == normalize_name(stored)
}
