//! Markdown-to-HTML finalization.
//!
//! The last pipeline stage hands the fully link-resolved text to
//! `pulldown-cmark` with tables enabled, then post-processes the event
//! stream: headings get slug-derived ids (duplicates disambiguated with a
//! numeric suffix), single newlines become hard breaks, and plain external
//! links gain `rel="nofollow"`. The raw HTML fragments the replacers emitted
//! pass through the converter untouched.

use std::collections::HashMap;

use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, TagEnd, html};

use crate::escape;
use crate::slug::slugify;

pub fn to_html(markdown: &str) -> String {
    let events: Vec<Event<'_>> = Parser::new_ext(markdown, Options::ENABLE_TABLES).collect();
    let events = assign_heading_ids(events);
    let events = rewrite_inline_events(events);

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, events.into_iter());
    out
}

fn is_external_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Gives every heading an id slugified from its text. Headings that slugify
/// to the same id get `-1`, `-2`, ... suffixes in document order; headings
/// with no slug-worthy text fall back to `section`.
fn assign_heading_ids(events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut ids = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut heading_text: Option<String> = None;

    for event in &events {
        match event {
            Event::Start(Tag::Heading { .. }) => heading_text = Some(String::new()),
            Event::End(TagEnd::Heading(_)) => {
                if let Some(text) = heading_text.take() {
                    let base = match slugify(&text) {
                        s if s.is_empty() => "section".to_string(),
                        s => s,
                    };
                    let count = seen.entry(base.clone()).or_insert(0);
                    let id = if *count == 0 { base } else { format!("{base}-{count}") };
                    *count += 1;
                    ids.push(id);
                }
            }
            Event::Text(t) | Event::Code(t) => {
                if let Some(buf) = heading_text.as_mut() {
                    buf.push_str(t);
                }
            }
            _ => {}
        }
    }

    let mut next_id = ids.into_iter();
    events
        .into_iter()
        .map(|event| match event {
            Event::Start(Tag::Heading { level, classes, attrs, .. }) => Event::Start(Tag::Heading {
                level,
                id: next_id.next().map(CowStr::from),
                classes,
                attrs,
            }),
            other => other,
        })
        .collect()
}

/// Newline-to-hard-break and nofollow on external links. Links cannot nest
/// in CommonMark, so one flag pairs the rewritten open tag with its close.
fn rewrite_inline_events(events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut out = Vec::with_capacity(events.len());
    let mut in_rewritten_link = false;

    for event in events {
        match event {
            Event::SoftBreak => out.push(Event::HardBreak),
            Event::Start(Tag::Link { dest_url, title, .. }) if is_external_url(&dest_url) => {
                let mut anchor = format!("<a href=\"{}\"", escape::attr(&dest_url));
                if !title.is_empty() {
                    anchor.push_str(&format!(" title=\"{}\"", escape::attr(&title)));
                }
                anchor.push_str(" rel=\"nofollow\">");
                out.push(Event::InlineHtml(anchor.into()));
                in_rewritten_link = true;
            }
            Event::End(TagEnd::Link) if in_rewritten_link => {
                out.push(Event::InlineHtml("</a>".into()));
                in_rewritten_link = false;
            }
            other => out.push(other),
        }
    }
    out
}
