//! Job slug derivation. The slug names both the working directory and the
//! remote repository, so it must be a valid path segment and repository name.

/// Upper bound for the name part. Keeps `<name>-<13 digit millis>` well
/// under the 100 character repository name limit.
pub const MAX_NAME_LEN: usize = 60;

/// Used when nothing of the full name survives sanitizing (e.g. a CJK-only name).
const FALLBACK_NAME: &str = "portfolio";

/// Lowercases the name and reduces it to `[a-z0-9]` runs joined by single hyphens.
pub fn sanitize_name(full_name: &str) -> String {
    let mut out = String::with_capacity(full_name.len());
    for c in full_name.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            out.push(c);
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }

    // Only ASCII survives the loop above, so byte truncation is char-safe.
    out.truncate(MAX_NAME_LEN);
    while out.ends_with('-') {
        out.pop();
    }

    if out.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        out
    }
}

/// `<sanitized-name>-<timestamp_millis>`.
pub fn derive_slug(full_name: &str, timestamp_millis: u64) -> String {
    format!("{}-{}", sanitize_name(full_name), timestamp_millis)
}
