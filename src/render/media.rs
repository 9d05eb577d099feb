//! HTML fragments for resolved image embeds.
//!
//! Dispatch is on the attachment's stored extension, not on whatever the
//! author typed: archives become galleries (listing cached), `.pdf` becomes
//! an inline frame with an allow-listed URL fragment, everything else a
//! plain `<img>`. Fragments are single-line so the finalizer reads them as
//! inline HTML.

use tracing::{debug, warn};
use url::form_urlencoded;

use crate::archive;
use crate::cache::GalleryCache;
use crate::config::RenderConfig;
use crate::escape;
use crate::model::Attachment;
use crate::store::AttachmentSource;

/// The only query keys forwarded into a PDF frame's URL fragment.
const PDF_PARAM_KEYS: &[&str] = &["page", "zoom", "view", "toolbar", "navpanes", "scrollbar"];

/// Per-render collaborators the media fragments need.
pub(crate) struct MediaContext<'a> {
    pub page_slug: &'a str,
    pub config: &'a RenderConfig,
    pub cache: &'a dyn GalleryCache,
    pub files: &'a dyn AttachmentSource,
}

/// Fragment for `![alt](target "title")` once `target` resolved to `att`.
/// `alt` and `title` arrive raw; escaping happens here.
pub(crate) fn embed_fragment(
    ctx: &MediaContext<'_>,
    att: &Attachment,
    alt: &str,
    title: Option<&str>,
) -> String {
    let file_url = ctx.config.routes.file_url(ctx.page_slug, &att.display_name());
    if ctx.config.is_archive_ext(&att.extension) {
        gallery_fragment(ctx, att, alt, &file_url)
    } else if att.extension.eq_ignore_ascii_case(".pdf") {
        pdf_fragment(&file_url, alt, title)
    } else {
        image_fragment(&file_url, alt, title)
    }
}

/// Gallery of proxy-URL images, or a download anchor when the archive holds
/// no recognizable images (or cannot be read).
fn gallery_fragment(ctx: &MediaContext<'_>, att: &Attachment, alt: &str, file_url: &str) -> String {
    let key = att.gallery_cache_key();
    let entries = match ctx.cache.get(&key) {
        Some(entries) => {
            debug!(key, entries = entries.len(), "gallery listing cache hit");
            entries
        }
        None => {
            let listed = match ctx.files.read(ctx.page_slug, att) {
                Ok(bytes) => archive::list_image_entries(&bytes, &att.extension, ctx.config),
                Err(err) => {
                    warn!(attachment = %att.display_name(), error = %err, "archive unreadable");
                    Vec::new()
                }
            };
            ctx.cache.put(&key, listed.clone(), ctx.config.gallery_ttl);
            listed
        }
    };

    if entries.is_empty() {
        let display = att.display_name();
        let text = if alt.is_empty() { escape::anchor_text(&display) } else { escape::anchor_text(alt) };
        return format!(
            "<a href=\"{}\" class=\"filelink\" target=\"_blank\" title=\"Download archive: {}\">{}</a>",
            escape::attr(file_url),
            escape::attr(&display),
            text,
        );
    }

    let mut out = String::from("<div class=\"archive-gallery\">");
    for entry in &entries {
        let url = ctx.config.routes.archive_image_url(att.id, entry);
        let name = entry.rsplit('/').next().unwrap_or(entry);
        out.push_str(&format!(
            "<a href=\"{0}\" class=\"archive-gallery-item\" target=\"_blank\"><img src=\"{0}\" alt=\"{1}\" loading=\"lazy\"></a>",
            escape::attr(&url),
            escape::attr(name),
        ));
    }
    out.push_str("</div>");
    out
}

fn pdf_fragment(file_url: &str, alt: &str, title: Option<&str>) -> String {
    let params = restrict_pdf_params(title.unwrap_or(""));
    let src = if params.is_empty() {
        file_url.to_string()
    } else {
        format!("{file_url}#{params}")
    };
    format!(
        "<div class=\"pdf-embed-container\"><iframe src=\"{}\" title=\"Embedded PDF: {}\"></iframe></div>",
        escape::attr(&src),
        escape::attr(alt),
    )
}

fn image_fragment(file_url: &str, alt: &str, title: Option<&str>) -> String {
    let title_part = match title {
        Some(t) if !t.is_empty() => format!(" title=\"{}\"", escape::attr(t)),
        _ => String::new(),
    };
    format!(
        "<img src=\"{}\" alt=\"{}\"{}>",
        escape::attr(file_url),
        escape::attr(alt),
        title_part,
    )
}

/// Re-serializes a query string keeping only the allow-listed keys, in
/// first-appearance order with the last value per key winning.
fn restrict_pdf_params(raw: &str) -> String {
    let mut kept: Vec<(String, String)> = Vec::new();
    for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
        if !PDF_PARAM_KEYS.contains(&key.as_ref()) {
            continue;
        }
        match kept.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value.into_owned(),
            None => kept.push((key.into_owned(), value.into_owned())),
        }
    }
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in &kept {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}
