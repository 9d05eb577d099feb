//! Scanners for the three link syntaxes and document-wide target collection.
//!
//! Grammars, matched leftmost-first like the rest of the pipeline:
//! - wikilink: `[[Target]]` / `[[Display|Target]]`, body free of `]`, split
//!   on the LAST pipe
//! - standard link: `[Display](Target)` / `[Display](Target "Title")`, not
//!   preceded by `!`; the target holds no whitespace and no `)`
//! - image: `![Alt](Target)` / `![Alt](Target "Title")`; alt runs to the
//!   first `](`, the target may contain spaces but no newline
//!
//! Titles accept single or double quotes; the closing quote must be followed
//! directly by `)`. Anything that fails these shapes is left as plain text.

use std::collections::HashSet;

use super::{Segment, find_byte};

/// `[[Target]]` or `[[Display|Target]]`. Offsets are byte positions in the
/// scanned text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wikilink<'a> {
    pub display: Option<&'a str>,
    pub target: &'a str,
    pub start: usize,
    pub end: usize,
}

/// `[Display](Target)` with optional quoted title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineLink<'a> {
    pub display: &'a str,
    pub target: &'a str,
    pub title: Option<&'a str>,
    pub start: usize,
    pub end: usize,
}

/// `![Alt](Target)` with optional quoted title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageEmbed<'a> {
    pub alt: &'a str,
    pub target: &'a str,
    pub title: Option<&'a str>,
    pub start: usize,
    pub end: usize,
}

/// External and absolute targets pass through untouched and are never
/// collected for lookup.
pub fn is_external_target(target: &str) -> bool {
    target.starts_with("http://")
        || target.starts_with("https://")
        || target.starts_with("//")
        || target.starts_with('/')
}

/// Parses a wikilink starting exactly at `start`, or None.
pub fn wikilink_at(text: &str, start: usize) -> Option<Wikilink<'_>> {
    let bytes = text.as_bytes();
    if !text[start..].starts_with("[[") {
        return None;
    }
    let body_start = start + 2;
    let close = find_byte(bytes, b']', body_start)?;
    if close == body_start || bytes.get(close + 1) != Some(&b']') {
        return None;
    }
    let body = &text[body_start..close];

    // display sits before the LAST pipe; an empty side degrades to
    // target-only.
    let (display, target) = match body.rfind('|') {
        Some(p) if !body[p + 1..].is_empty() => {
            let display = &body[..p];
            let target = &body[p + 1..];
            (if display.is_empty() { None } else { Some(display) }, target)
        }
        _ => (None, body),
    };

    Some(Wikilink {
        display,
        target,
        start,
        end: close + 2,
    })
}

/// Parses a standard link starting exactly at `start` (the `[`), or None.
/// The caller is responsible for the not-preceded-by-`!` rule.
pub fn link_at(text: &str, start: usize) -> Option<InlineLink<'_>> {
    let bytes = text.as_bytes();
    if bytes.get(start) != Some(&b'[') {
        return None;
    }
    let close = find_byte(bytes, b']', start + 1)?;
    if close == start + 1 || bytes.get(close + 1) != Some(&b'(') {
        return None;
    }
    let display = &text[start + 1..close];

    let target_start = close + 2;
    let mut k = target_start;
    while k < bytes.len() {
        match bytes[k] {
            b')' => {
                if k == target_start {
                    return None;
                }
                return Some(InlineLink {
                    display,
                    target: &text[target_start..k],
                    title: None,
                    start,
                    end: k + 1,
                });
            }
            b if b.is_ascii_whitespace() => {
                if k == target_start {
                    return None;
                }
                let (title, end) = parse_title(text, k)?;
                return Some(InlineLink {
                    display,
                    target: &text[target_start..k],
                    title: Some(title),
                    start,
                    end,
                });
            }
            _ => k += 1,
        }
    }
    None
}

/// Parses an image embed starting exactly at `start` (the `!`), or None.
pub fn image_at(text: &str, start: usize) -> Option<ImageEmbed<'_>> {
    let bytes = text.as_bytes();
    if !text[start..].starts_with("![") {
        return None;
    }

    // alt ends at the first `](` and cannot span lines.
    let mut j = start + 2;
    loop {
        match bytes.get(j) {
            None | Some(b'\n') => return None,
            Some(b']') if bytes.get(j + 1) == Some(&b'(') => break,
            Some(_) => j += 1,
        }
    }
    let alt = &text[start + 2..j];

    // the target grows until a `)`, trying a quoted title at every
    // whitespace run; it never crosses a newline.
    let target_start = j + 2;
    let mut k = target_start;
    while k < bytes.len() {
        match bytes[k] {
            b')' => {
                return Some(ImageEmbed {
                    alt,
                    target: &text[target_start..k],
                    title: None,
                    start,
                    end: k + 1,
                });
            }
            b'\n' => {
                let (title, end) = parse_title(text, k)?;
                return Some(ImageEmbed {
                    alt,
                    target: &text[target_start..k],
                    title: Some(title),
                    start,
                    end,
                });
            }
            b if b.is_ascii_whitespace() => {
                if let Some((title, end)) = parse_title(text, k) {
                    return Some(ImageEmbed {
                        alt,
                        target: &text[target_start..k],
                        title: Some(title),
                        start,
                        end,
                    });
                }
                k += 1;
            }
            _ => k += 1,
        }
    }
    None
}

/// Whitespace, then a quote, then title text up to the first same quote that
/// is directly followed by `)`. Returns the title slice and the position
/// after the closing paren.
fn parse_title(text: &str, ws_start: usize) -> Option<(&str, usize)> {
    let bytes = text.as_bytes();
    let mut q = ws_start;
    while q < bytes.len() && bytes[q].is_ascii_whitespace() {
        q += 1;
    }
    let quote = *bytes.get(q)?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let title_start = q + 1;
    let mut i = title_start;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => return None,
            b if b == quote && bytes.get(i + 1) == Some(&b')') => {
                return Some((&text[title_start..i], i + 2));
            }
            _ => i += 1,
        }
    }
    None
}

/// All wikilinks in `text`, leftmost first, non-overlapping.
pub fn find_wikilinks(text: &str) -> Vec<Wikilink<'_>> {
    let bytes = text.as_bytes();
    let mut found = Vec::new();
    let mut i = 0;
    while i + 1 < bytes.len() {
        if bytes[i] == b'[' && bytes[i + 1] == b'[' {
            if let Some(m) = wikilink_at(text, i) {
                i = m.end;
                found.push(m);
                continue;
            }
        }
        i += 1;
    }
    found
}

/// All standard links in `text`, skipping any `[` directly preceded by `!`.
pub fn find_links(text: &str) -> Vec<InlineLink<'_>> {
    let bytes = text.as_bytes();
    let mut found = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'[' && (i == 0 || bytes[i - 1] != b'!') {
            if let Some(m) = link_at(text, i) {
                i = m.end;
                found.push(m);
                continue;
            }
        }
        i += 1;
    }
    found
}

/// All image embeds in `text`.
pub fn find_images(text: &str) -> Vec<ImageEmbed<'_>> {
    let bytes = text.as_bytes();
    let mut found = Vec::new();
    let mut i = 0;
    while i + 1 < bytes.len() {
        if bytes[i] == b'!' && bytes[i + 1] == b'[' {
            if let Some(m) = image_at(text, i) {
                i = m.end;
                found.push(m);
                continue;
            }
        }
        i += 1;
    }
    found
}

/// The three candidate target sets of a document, deduplicated and stripped.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TargetSets {
    pub wikilinks: HashSet<String>,
    pub links: HashSet<String>,
    pub images: HashSet<String>,
}

impl TargetSets {
    /// Raw strings that may name a page: wikilink plus standard-link targets.
    pub fn page_candidates(&self) -> impl Iterator<Item = &String> {
        self.wikilinks.iter().chain(self.links.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.wikilinks.is_empty() && self.links.is_empty() && self.images.is_empty()
    }
}

/// Collects every candidate target from the non-code segments of a document.
/// External/absolute targets are not candidates and are skipped here.
pub fn collect_targets(segments: &[Segment<'_>]) -> TargetSets {
    let mut sets = TargetSets::default();
    for seg in segments.iter().filter(|s| !s.is_code()) {
        for m in find_wikilinks(seg.text) {
            let target = m.target.trim();
            if !target.is_empty() {
                sets.wikilinks.insert(target.to_string());
            }
        }
        for m in find_links(seg.text) {
            let target = m.target.trim();
            if !target.is_empty() && !is_external_target(target) {
                sets.links.insert(target.to_string());
            }
        }
        for m in find_images(seg.text) {
            let target = m.target.trim();
            if !target.is_empty() && !is_external_target(target) {
                sets.images.insert(target.to_string());
            }
        }
    }
    sets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::split_segments;

    #[test]
    fn wikilink_without_display() {
        let m = wikilink_at("[[Home]]", 0).expect("should match");
        assert_eq!(m.display, None);
        assert_eq!(m.target, "Home");
        assert_eq!(m.end, 8);
    }

    #[test]
    fn wikilink_splits_on_last_pipe() {
        let m = wikilink_at("[[a|b|c]]", 0).expect("should match");
        assert_eq!(m.display, Some("a|b"));
        assert_eq!(m.target, "c");
    }

    #[test]
    fn wikilink_empty_tail_degrades_to_target_only() {
        let m = wikilink_at("[[a|]]", 0).expect("should match");
        assert_eq!(m.display, None);
        assert_eq!(m.target, "a|");
    }

    #[test]
    fn wikilink_rejects_empty_and_unclosed() {
        assert!(wikilink_at("[[]]", 0).is_none());
        assert!(wikilink_at("[[a]", 0).is_none());
        assert!(wikilink_at("[[a]b]]", 0).is_none());
    }

    #[test]
    fn wikilink_body_may_open_with_bracket() {
        let m = wikilink_at("[[[a]]", 0).expect("should match");
        assert_eq!(m.target, "[a");
        assert_eq!(m.end, 6);
    }

    #[test]
    fn link_basic_and_titled() {
        let m = link_at("[docs](guide)", 0).expect("should match");
        assert_eq!((m.display, m.target, m.title), ("docs", "guide", None));

        let m = link_at("[docs](guide \"The Guide\")", 0).expect("should match");
        assert_eq!(m.title, Some("The Guide"));
        assert_eq!(m.target, "guide");

        let m = link_at("[docs](guide 'single')", 0).expect("should match");
        assert_eq!(m.title, Some("single"));
    }

    #[test]
    fn link_target_cannot_hold_whitespace() {
        assert!(link_at("[a](b c)", 0).is_none());
        assert!(link_at("[a]()", 0).is_none());
        assert!(link_at("[](x)", 0).is_none());
    }

    #[test]
    fn link_title_may_span_a_whitespace_newline_gap() {
        let m = link_at("[a](b\n\"t\")", 0).expect("should match");
        assert_eq!(m.target, "b");
        assert_eq!(m.title, Some("t"));
    }

    #[test]
    fn find_links_skips_images() {
        let links = find_links("pre ![alt](img.png) and [a](b)");
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].display, "a");
    }

    #[test]
    fn image_alt_runs_to_bracket_paren() {
        let m = image_at("![a]b](c)", 0).expect("should match");
        assert_eq!(m.alt, "a]b");
        assert_eq!(m.target, "c");
    }

    #[test]
    fn image_target_may_contain_spaces() {
        let m = image_at("![a](my file.png)", 0).expect("should match");
        assert_eq!(m.target, "my file.png");
        assert_eq!(m.title, None);
    }

    #[test]
    fn image_failed_title_is_swallowed_into_target() {
        // no closing quote followed by `)`, so the quotes are target text.
        let m = image_at("![a](b \"c\" d)", 0).expect("should match");
        assert_eq!(m.target, "b \"c\" d");
        assert_eq!(m.title, None);
    }

    #[test]
    fn image_title_keeps_inner_quote_when_backtracking() {
        let m = image_at("![a](b \"t\"x\")", 0).expect("should match");
        assert_eq!(m.target, "b");
        assert_eq!(m.title, Some("t\"x"));
    }

    #[test]
    fn image_empty_alt_and_target_are_legal() {
        let m = image_at("![]()", 0).expect("should match");
        assert_eq!(m.alt, "");
        assert_eq!(m.target, "");
    }

    #[test]
    fn external_target_detection() {
        assert!(is_external_target("http://x"));
        assert!(is_external_target("https://x"));
        assert!(is_external_target("//cdn/x"));
        assert!(is_external_target("/media/x"));
        assert!(!is_external_target("httpfoo"));
        assert!(!is_external_target("guide.pdf"));
    }

    #[test]
    fn collect_skips_code_and_externals_and_dedupes() {
        let doc = "\
[[Home]] and [[Home]] again, [[Other|Home]]
[ext](https://example.com) [doc](guide.pdf)
![pic](diagram.png) ![ext](/media/raw.png)
```
[[InFence]] [x](y.pdf)
```
`[[InSpan]]`";
        let segments = split_segments(doc);
        let sets = collect_targets(&segments);

        assert_eq!(sets.wikilinks.len(), 1, "got: {:?}", sets.wikilinks);
        assert!(sets.wikilinks.contains("Home"));
        assert_eq!(sets.links.len(), 1);
        assert!(sets.links.contains("guide.pdf"));
        assert_eq!(sets.images.len(), 1);
        assert!(sets.images.contains("diagram.png"));
    }

    #[test]
    fn collect_strips_surrounding_whitespace() {
        let segments = split_segments("[[ Home ]] ![p]( diagram.png )");
        let sets = collect_targets(&segments);
        assert!(sets.wikilinks.contains("Home"));
        assert!(sets.images.contains("diagram.png"));
    }
}
