//! The page-store and attachment-blob seams.
//!
//! The renderer needs two capabilities: a batched lookup answering "which of
//! these slugs or titles exist?", and a way to read the bytes behind an
//! attachment when an archive must be inspected. Anything richer (full CRUD,
//! persistence) lives behind the implementations, out of the renderer's
//! sight. [`MemoryStore`] and [`MemoryFiles`] are the in-process
//! implementations used by tests; the CLI uses the directory-backed ones
//! from [`crate::pages`].

use std::collections::HashMap;
use std::io;

use time::OffsetDateTime;

use crate::model::{Attachment, Page, PageRef};
use crate::slug::{slugify, unique_slug};

/// Batched page lookup. One call answers all candidates for a render pass.
pub trait PageStore {
    /// Returns every page whose slug is in `slugs` or whose lowercased
    /// title is in `titles_lower`. Order is unspecified; duplicates are the
    /// caller's problem to tie-break.
    fn lookup(&self, slugs: &[String], titles_lower: &[String]) -> Vec<PageRef>;
}

/// Access to the byte blob behind an attachment.
pub trait AttachmentSource {
    fn read(&self, page_slug: &str, attachment: &Attachment) -> io::Result<Vec<u8>>;
}

/// Attachment blobs held in memory, keyed by attachment id.
#[derive(Debug, Default)]
pub struct MemoryFiles {
    blobs: HashMap<u64, Vec<u8>>,
}

impl MemoryFiles {
    pub fn new() -> MemoryFiles {
        MemoryFiles::default()
    }

    pub fn insert(&mut self, attachment_id: u64, bytes: Vec<u8>) {
        self.blobs.insert(attachment_id, bytes);
    }
}

impl AttachmentSource for MemoryFiles {
    fn read(&self, _page_slug: &str, attachment: &Attachment) -> io::Result<Vec<u8>> {
        self.blobs.get(&attachment.id).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no blob for attachment {}", attachment.id),
            )
        })
    }
}

/// Pages held in memory, in insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pages: Vec<Page>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    /// Inserts a page by title, deriving a collision-free slug. Returns the
    /// slug that was assigned.
    pub fn insert(&mut self, title: &str, content: &str, updated_at: OffsetDateTime) -> String {
        let base = slugify(title);
        let slug = unique_slug(&base, |s| self.pages.iter().any(|p| p.slug == s));
        let id = self.next_id();
        self.pages.push(Page {
            id,
            slug: slug.clone(),
            title: title.to_string(),
            content: content.to_string(),
            updated_at,
            attachments: Vec::new(),
        });
        slug
    }

    /// Inserts a fully-built page; the caller owns slug and id uniqueness.
    pub fn insert_page(&mut self, page: Page) {
        self.pages.push(page);
    }

    pub fn get(&self, slug: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.slug == slug)
    }

    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        self.pages.iter()
    }

    pub fn next_id(&self) -> u64 {
        self.pages.iter().map(|p| p.id).max().unwrap_or(0) + 1
    }
}

impl PageStore for MemoryStore {
    fn lookup(&self, slugs: &[String], titles_lower: &[String]) -> Vec<PageRef> {
        self.pages
            .iter()
            .filter(|p| {
                slugs.iter().any(|s| *s == p.slug)
                    || titles_lower.iter().any(|t| *t == p.title.to_lowercase())
            })
            .map(Page::page_ref)
            .collect()
    }
}
