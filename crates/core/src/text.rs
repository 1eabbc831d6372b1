//! Small string normalizations shared across passes.

/// Lowercase ASCII alphanumerics only, for tolerant header and lookup-name
/// matching ("Lookup Type" == "lookup_type" == "LOOKUPTYPE").
pub fn norm_key(s: &str) -> String {
    s.trim()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// URL-style slug: `&` becomes "and", every other non-alphanumeric run
/// collapses to a single `-`. Never empty.
pub fn slugify(s: &str) -> String {
    let lowered = s.trim().to_lowercase().replace('&', " and ");
    let mut slug = String::with_capacity(lowered.len());
    for ch in lowered.chars() {
        if ch.is_alphanumeric() {
            slug.push(ch);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "item".to_owned()
    } else {
        slug.to_owned()
    }
}

/// Title-case every word: a letter following a non-letter is uppercased,
/// every other letter is lowercased.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_is_letter = false;
    for ch in s.trim().chars() {
        if ch.is_alphabetic() {
            if prev_is_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(ch);
            prev_is_letter = false;
        }
    }
    out
}

/// First `max` characters of `s`, on a char boundary.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
