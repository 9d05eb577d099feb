//! Entities the renderer reads: pages and their attached files.
//!
//! The pipeline never mutates these; stores hand out owned copies or
//! references and the renderer only reads.

use time::OffsetDateTime;

use crate::slug;

/// A wiki page with its raw Markdown and attached files.
#[derive(Debug, Clone)]
pub struct Page {
    pub id: u64,
    /// URL-safe unique identifier, derived from the title.
    pub slug: String,
    /// Unique title; matched case-insensitively during link resolution.
    pub title: String,
    pub content: String,
    pub updated_at: OffsetDateTime,
    pub attachments: Vec<Attachment>,
}

impl Page {
    /// The lightweight view the resolver tables hold.
    pub fn page_ref(&self) -> PageRef {
        PageRef {
            id: self.id,
            slug: self.slug.clone(),
            title: self.title.clone(),
            updated_at: self.updated_at,
        }
    }
}

/// A store lookup answer: just enough to build an anchor and tie-break
/// duplicate matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRef {
    pub id: u64,
    pub slug: String,
    pub title: String,
    pub updated_at: OffsetDateTime,
}

/// A file uploaded to exactly one page.
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub id: u64,
    /// Extensionless URL-safe identifier used for in-text reference.
    pub filename_slug: String,
    /// Stored extension with leading dot, lowercase; empty when the upload
    /// had none.
    pub extension: String,
    pub uploaded_at: OffsetDateTime,
}

impl Attachment {
    /// Builds an attachment from an uploaded filename: the slug defaults to
    /// the slugified stem (fallback `file`), the extension is kept lowercase.
    pub fn from_filename(id: u64, filename: &str, uploaded_at: OffsetDateTime) -> Attachment {
        let (stem, ext) = slug::split_extension(filename);
        let filename_slug = match slug::slugify(stem) {
            s if s.is_empty() => "file".to_string(),
            s => s,
        };
        Attachment {
            id,
            filename_slug,
            extension: ext.to_ascii_lowercase(),
            uploaded_at,
        }
    }

    /// Display name shown to users and used in download URLs.
    pub fn display_name(&self) -> String {
        format!("{}{}", self.filename_slug, self.extension)
    }

    /// Cache key for this attachment's archive listing; the upload timestamp
    /// makes re-uploads invalidate automatically.
    pub fn gallery_cache_key(&self) -> String {
        format!("wiki-gallery-{}-{}", self.id, self.uploaded_at.unix_timestamp())
    }
}
