//! Navigation menu extracted from a designated wiki page.
//!
//! The menu page holds a JSON array somewhere in its Markdown: inside the
//! first fenced code block when one exists, otherwise anywhere in the raw
//! text. The array is found by bracket balancing, validated by parsing, and
//! resolved into sections and items. Malformed sections and items are
//! skipped, never errors.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::Routes;
use crate::scan;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuSection {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_url: Option<String>,
    pub section_is_external: bool,
    pub items: Vec<MenuItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuItem {
    pub text: String,
    pub url: String,
    pub is_external: bool,
    pub login_required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub circle_color: Option<String>,
}

/// Parses the menu page's Markdown into resolved sections. Anything that is
/// not a well-formed section or item is dropped.
pub fn parse_menu(content: &str, routes: &Routes) -> Vec<MenuSection> {
    let Some(json) = extract_json_array(content) else {
        debug!("no JSON array found in menu page");
        return Vec::new();
    };
    let Ok(Value::Array(sections)) = serde_json::from_str(&json) else {
        return Vec::new();
    };
    sections.iter().filter_map(|s| parse_section(s, routes)).collect()
}

/// The first JSON array in `text`: the first fenced code block's content is
/// preferred, falling back to the raw text. Found by scanning for a
/// bracket-balanced span starting at the first `[`; the span must parse as
/// JSON or the extraction fails.
pub fn extract_json_array(text: &str) -> Option<String> {
    let content = first_fence_content(text).unwrap_or(text);
    let start = content.find('[')?;
    let mut depth = 0usize;
    for (i, ch) in content[start..].char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    let candidate = &content[start..start + i + 1];
                    return serde_json::from_str::<Value>(candidate)
                        .ok()
                        .map(|_| candidate.to_string());
                }
            }
            _ => {}
        }
    }
    None
}

/// Content of the first fenced block, opening and closing fence lines
/// stripped. Inline code spans do not count.
fn first_fence_content(text: &str) -> Option<&str> {
    let segment = scan::split_segments(text)
        .into_iter()
        .find(|s| s.is_code() && (s.text.starts_with("```") || s.text.starts_with("~~~")))?;
    let body = segment.text;
    let open_end = body.find('\n')?;
    let close_start = body.rfind('\n')?;
    (open_end < close_start).then(|| &body[open_end + 1..=close_start])
}

fn parse_section(value: &Value, routes: &Routes) -> Option<MenuSection> {
    let obj = value.as_object()?;
    let title = obj.get("title")?.as_str()?.trim().to_string();
    if title.is_empty() {
        return None;
    }

    let items: Vec<MenuItem> = obj
        .get("items")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(|i| parse_item(i, routes)).collect())
        .unwrap_or_default();

    // section destination: explicit external URL, explicit page slug, or
    // the first item's destination.
    let (section_url, section_is_external) = if let Some(url) = str_field(obj, "section_link_url") {
        (Some(url), true)
    } else if let Some(slug) = str_field(obj, "section_link_slug") {
        (Some(routes.page_url(&slug)), false)
    } else {
        match items.first() {
            Some(first) if first.url != "#" => (Some(first.url.clone()), first.is_external),
            _ => (None, false),
        }
    };

    Some(MenuSection {
        title,
        title_color: str_field(obj, "title_color"),
        section_url,
        section_is_external,
        items,
    })
}

fn parse_item(value: &Value, routes: &Routes) -> Option<MenuItem> {
    let obj = value.as_object()?;
    let text = obj.get("text")?.as_str()?.to_string();
    let slug = str_field(obj, "slug");

    let (url, is_external) = if let Some(url) = str_field(obj, "url") {
        (url, true)
    } else if let Some(s) = slug.as_deref() {
        (routes.page_url(s), false)
    } else {
        ("#".to_string(), false)
    };

    Some(MenuItem {
        text,
        url,
        is_external,
        login_required: obj.get("login_required").and_then(Value::as_bool).unwrap_or(false),
        slug,
        circle_color: str_field(obj, "circle_color"),
    })
}

fn str_field(obj: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}
