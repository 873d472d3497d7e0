//! Slug derivation
//!
//! A slug is the filename stem and primary key of a record. It contains only
//! ASCII letters and digits, CJK ideographs and single interior hyphens.

use chrono::{DateTime, Utc};

/// Derive a slug from a title
///
/// Pure apart from the empty-title fallback, which uses the current time.
pub fn derive_slug(title: &str) -> String {
    derive_slug_at(title, Utc::now())
}

/// Derive a slug from a title, using `now` for the empty fallback
pub fn derive_slug_at(title: &str, now: DateTime<Utc>) -> String {
    let lowered = title.trim().to_lowercase();

    let mut slug = String::with_capacity(lowered.len());
    let mut in_whitespace = false;
    for c in lowered.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                slug.push('-');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        if is_slug_char(c) {
            slug.push(c);
        }
    }

    let slug = collapse_hyphens(&slug);
    if slug.is_empty() {
        now.timestamp_millis().to_string()
    } else {
        slug
    }
}

/// Check that a slug is well formed: allowed characters, no leading, trailing or
/// doubled hyphens, not empty
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug.chars().all(is_slug_char)
}

/// Characters allowed in a slug
pub fn is_slug_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || is_cjk_ideograph(c)
}

/// CJK unified ideographs (basic block and extension A)
pub fn is_cjk_ideograph(c: char) -> bool {
    matches!(c, '\u{4e00}'..='\u{9fff}' | '\u{3400}'..='\u{4dbf}')
}

/// Collapse hyphen runs to one and trim hyphens from both ends
pub(crate) fn collapse_hyphens(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c == '-' && (out.is_empty() || out.ends_with('-')) {
            continue;
        }
        out.push(c);
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}
