use std::cell::Cell;

use time::macros::datetime;
use wikimark::cache::MemoryCache;
use wikimark::config::RenderConfig;
use wikimark::model::{Page, PageRef};
use wikimark::render::Renderer;
use wikimark::store::{MemoryFiles, MemoryStore, PageStore};

const T0: time::OffsetDateTime = datetime!(2024-01-01 0:00 UTC);

/// Wraps a [`MemoryStore`] and records every lookup it answers.
struct CountingStore {
    inner: MemoryStore,
    calls: Cell<usize>,
    last_slug_count: Cell<usize>,
}

impl CountingStore {
    fn new(inner: MemoryStore) -> CountingStore {
        CountingStore {
            inner,
            calls: Cell::new(0),
            last_slug_count: Cell::new(0),
        }
    }
}

impl PageStore for CountingStore {
    fn lookup(&self, slugs: &[String], titles_lower: &[String]) -> Vec<PageRef> {
        self.calls.set(self.calls.get() + 1);
        self.last_slug_count.set(slugs.len());
        self.inner.lookup(slugs, titles_lower)
    }
}

fn current_page() -> Page {
    Page {
        id: 100,
        slug: "current".to_string(),
        title: "Current".to_string(),
        content: String::new(),
        updated_at: T0,
        attachments: Vec::new(),
    }
}

fn render_counted(store: &CountingStore, markdown: &str) -> String {
    let files = MemoryFiles::new();
    let cache = MemoryCache::new();
    let config = RenderConfig::default();
    Renderer::new(store, &files, &cache, &config).render(markdown, &current_page())
}

#[test]
fn repeated_targets_cost_one_query_with_one_candidate() {
    let mut inner = MemoryStore::new();
    inner.insert("Home", "", T0);
    let store = CountingStore::new(inner);

    let html = render_counted(&store, "[[Home]] [[Home]] [[home]] [[Home]] [[Home]]");
    assert_eq!(store.calls.get(), 1);
    assert_eq!(store.last_slug_count.get(), 1, "slug candidates must dedupe");
    assert_eq!(html.matches("class=\"wikilink\"").count(), 5, "{html}");
}

#[test]
fn plain_text_issues_no_query() {
    let store = CountingStore::new(MemoryStore::new());
    render_counted(&store, "No links here, just **bold** text.");
    assert_eq!(store.calls.get(), 0);
}

#[test]
fn code_only_links_issue_no_query() {
    let store = CountingStore::new(MemoryStore::new());
    render_counted(&store, "`[[Home]]`\n\n```\n[other](page)\n```\n");
    assert_eq!(store.calls.get(), 0);
}

#[test]
fn mixed_targets_still_cost_one_query() {
    let mut inner = MemoryStore::new();
    inner.insert("Home", "", T0);
    inner.insert("Guide", "", T0);
    let store = CountingStore::new(inner);

    render_counted(&store, "[[Home]] and [go](Guide) and [[Missing Page]]");
    assert_eq!(store.calls.get(), 1);
    assert_eq!(store.last_slug_count.get(), 3);
}

#[test]
fn image_targets_never_hit_the_page_store() {
    let store = CountingStore::new(MemoryStore::new());
    render_counted(&store, "![a](one.png) ![b](two.png)");
    assert_eq!(store.calls.get(), 0, "images resolve against attachments only");
}
