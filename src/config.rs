//! Render-time configuration: extension sets, cache TTL, and URL routes.
//!
//! One immutable value constructed at startup and passed by reference into
//! the pipeline; nothing in here is global or mutable.

use std::time::Duration;

use url::form_urlencoded;

/// Slug of the wiki's root page.
pub const ROOT_PAGE_SLUG: &str = "home";

/// Slug of the page whose content carries the navigation menu JSON.
pub const MENU_PAGE_SLUG: &str = "menu-config";

/// Extensions that read as "this was meant to be a file, not a page" when a
/// link target fails to resolve.
const DOCUMENT_EXTENSIONS: &[&str] = &[
    ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".txt", ".md", ".markdown", ".csv",
    ".rtf", ".odt", ".ods", ".odp", ".zip", ".tar", ".gz", ".rar", ".7z", ".jpg", ".jpeg", ".png",
    ".gif", ".svg", ".webp", ".heic", ".html", ".htm", ".css", ".js", ".json", ".xml", ".py",
    ".java", ".c", ".cpp", ".h", ".php", ".rb", ".ipynb", ".mp3", ".mp4", ".avi", ".mov", ".mkv",
    ".webm",
];

/// Extensions rendered as gallery items when found inside an archive.
const PICTURE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".svg", ".webp", ".heic"];

/// Attachment extensions inspected as potential galleries.
const ARCHIVE_EXTENSIONS: &[&str] = &[".zip"];

/// Everything the rendering pipeline needs to know besides the page itself.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Known document extensions (with leading dot, lowercase).
    pub document_extensions: Vec<String>,
    /// Image extensions recognized inside archives (with leading dot).
    pub picture_extensions: Vec<String>,
    /// Attachment extensions treated as archives (with leading dot).
    pub archive_extensions: Vec<String>,
    /// How long a cached archive listing stays valid.
    pub gallery_ttl: Duration,
    pub routes: Routes,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            document_extensions: DOCUMENT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            picture_extensions: PICTURE_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            archive_extensions: ARCHIVE_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            gallery_ttl: Duration::from_secs(3600),
            routes: Routes::default(),
        }
    }
}

impl RenderConfig {
    pub fn is_document_ext(&self, ext: &str) -> bool {
        self.document_extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }

    pub fn is_picture_ext(&self, ext: &str) -> bool {
        self.picture_extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }

    pub fn is_archive_ext(&self, ext: &str) -> bool {
        self.archive_extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }
}

/// URL builders for the four route families the renderer emits.
///
/// Prefixes end with `/` (or, for `create_path`, the full path); builders
/// append identifiers and query strings.
#[derive(Debug, Clone)]
pub struct Routes {
    pub page_prefix: String,
    pub create_path: String,
    pub media_prefix: String,
    pub archive_image_prefix: String,
}

impl Default for Routes {
    fn default() -> Self {
        Routes {
            page_prefix: "/wiki/".to_string(),
            create_path: "/wiki/create/".to_string(),
            media_prefix: "/media/wiki_files/".to_string(),
            archive_image_prefix: "/wiki/view-image-in-archive/".to_string(),
        }
    }
}

impl Routes {
    /// Canonical view URL for a page slug.
    pub fn page_url(&self, slug: &str) -> String {
        format!("{}{}/", self.page_prefix, slug)
    }

    /// Page-creation URL pre-filled with the would-be title.
    pub fn page_create_url(&self, title: &str) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("initial_title_str", title)
            .finish();
        format!("{}?{}", self.create_path, query)
    }

    /// Download URL for an attachment of the given page.
    pub fn file_url(&self, page_slug: &str, display_name: &str) -> String {
        format!("{}{}/{}", self.media_prefix, page_slug, display_name)
    }

    /// Proxy URL serving one image entry out of an archive attachment.
    pub fn archive_image_url(&self, attachment_id: u64, entry_path: &str) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("path", entry_path)
            .finish();
        format!("{}{}/?{}", self.archive_image_prefix, attachment_id, query)
    }
}
