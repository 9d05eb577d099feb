//! Batched resolution of collected targets into lookup tables.
//!
//! One render pass issues at most one store query: every candidate slug and
//! lowercased title goes out together, and the answers land in render-scoped
//! maps the replacers read. Attachment tables cover the current page's files
//! only; linking a file attached to some other page is not supported.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::model::{Attachment, Page, PageRef};
use crate::scan::links::TargetSets;
use crate::slug::{slugify, split_extension};
use crate::store::PageStore;

/// Render-scoped lookup tables. Built once per render, dropped with it.
pub struct Resolver<'a> {
    pages_by_slug: HashMap<String, PageRef>,
    pages_by_title: HashMap<String, PageRef>,
    files_by_name: HashMap<String, &'a Attachment>,
    files_by_slug: HashMap<String, &'a Attachment>,
    files_by_stem: HashMap<String, &'a Attachment>,
}

impl<'a> Resolver<'a> {
    /// Issues the batched lookup for `targets` and indexes `page`'s
    /// attachments. No candidates means no query at all.
    pub fn build(store: &dyn PageStore, page: &'a Page, targets: &TargetSets) -> Resolver<'a> {
        let mut slugs: HashSet<String> = HashSet::new();
        let mut titles: HashSet<String> = HashSet::new();
        for raw in targets.page_candidates() {
            let slug = slugify(raw);
            if !slug.is_empty() {
                slugs.insert(slug);
            }
            titles.insert(raw.to_lowercase());
        }

        let hits = if slugs.is_empty() && titles.is_empty() {
            Vec::new()
        } else {
            let slugs: Vec<String> = slugs.into_iter().collect();
            let titles: Vec<String> = titles.into_iter().collect();
            store.lookup(&slugs, &titles)
        };

        let mut pages_by_slug = HashMap::new();
        let mut pages_by_title = HashMap::new();
        for hit in hits {
            insert_newest(&mut pages_by_slug, hit.slug.clone(), hit.clone());
            insert_newest(&mut pages_by_title, hit.title.to_lowercase(), hit);
        }

        let mut files_by_name = HashMap::new();
        let mut files_by_slug = HashMap::new();
        let mut files_by_stem = HashMap::new();
        for att in &page.attachments {
            let display = att.display_name().to_lowercase();
            let (stem, _) = split_extension(&display);
            files_by_stem.insert(stem.to_string(), att);
            files_by_name.insert(display, att);
            files_by_slug.insert(att.filename_slug.to_lowercase(), att);
        }

        debug!(
            pages = pages_by_slug.len(),
            files = files_by_name.len(),
            images = targets.images.len(),
            "resolver tables built"
        );

        Resolver {
            pages_by_slug,
            pages_by_title,
            files_by_name,
            files_by_slug,
            files_by_stem,
        }
    }

    /// Page lookup: the slugified target first, then the lowercased title.
    /// A slug match always beats a title match on another page.
    pub fn resolve_page(&self, target: &str) -> Option<&PageRef> {
        let target = target.trim();
        self.pages_by_slug
            .get(&slugify(target))
            .or_else(|| self.pages_by_title.get(&target.to_lowercase()))
    }

    /// Attachment lookup with the four match strategies, in order:
    /// exact display name; extensionless target against the filename slug;
    /// extensionless target against the display-name stem; target with an
    /// extension against slug + stored extension.
    pub fn resolve_file(&self, target: &str) -> Option<&'a Attachment> {
        let target = target.trim();
        let lower = target.to_lowercase();
        if let Some(att) = self.files_by_name.get(&lower) {
            return Some(att);
        }

        let (stem, ext) = split_extension(target);
        if ext.is_empty() {
            if let Some(att) = self.files_by_slug.get(&lower) {
                return Some(att);
            }
            if let Some(att) = self.files_by_stem.get(&lower) {
                return Some(att);
            }
        } else if let Some(att) = self.files_by_slug.get(&stem.to_lowercase())
            && att.extension.eq_ignore_ascii_case(ext)
        {
            return Some(att);
        }
        None
    }
}

/// Keeps the most-recently-updated page when two hits claim the same key.
fn insert_newest(map: &mut HashMap<String, PageRef>, key: String, page: PageRef) {
    match map.get(&key) {
        Some(existing) if existing.updated_at >= page.updated_at => {}
        _ => {
            map.insert(key, page);
        }
    }
}
