//! Slug derivation for pages and attachment filenames.
//!
//! Slugs are URL-safe, lowercase, hyphen-separated identifiers derived from
//! titles or filenames. The rules match the store's historical behavior:
//! word characters (including `_`) survive, whitespace and hyphen runs
//! collapse to a single `-`, everything else is dropped.

use deunicode::deunicode;

/// Derives a URL-safe slug from arbitrary text.
///
/// Returns an empty string when nothing slug-worthy remains (symbols-only
/// input); callers pick their own fallback for that case.
pub fn slugify(raw: &str) -> String {
    // transliterate into the 26-letter English alphabet using `deunicode`.
    let s = deunicode(raw.trim()).to_ascii_lowercase();

    let mut out = String::with_capacity(s.len());
    let mut pending_sep = false;
    for ch in s.chars() {
        match ch {
            'a'..='z' | '0'..='9' | '_' => {
                if pending_sep && !out.is_empty() {
                    out.push('-');
                }
                pending_sep = false;
                out.push(ch);
            }
            '-' => pending_sep = true,
            c if c.is_whitespace() => pending_sep = true,
            _ => {}
        }
    }

    out.trim_matches(['-', '_']).to_string()
}

/// Disambiguates a base slug with a numeric suffix until `taken` clears it.
///
/// `taken` answers whether a candidate slug is already in use. An empty base
/// falls back to `page` before disambiguation.
pub fn unique_slug(base: &str, mut taken: impl FnMut(&str) -> bool) -> String {
    let base = if base.is_empty() { "page" } else { base };
    if !taken(base) {
        return base.to_string();
    }
    let mut counter = 1u32;
    loop {
        let candidate = format!("{base}-{counter}");
        if !taken(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// Splits `name` into (stem, extension-with-dot).
///
/// A lone leading dot is part of the stem (`.hidden` has no extension), and
/// only the final dot starts the extension (`archive.tar.gz` → `.gz`).
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    }
}
