//! The rendering pipeline: raw wiki Markdown in, HTML out.
//!
//! One [`Renderer::render`] call walks the five stages in order: split the
//! text into code/non-code segments, collect every candidate link target
//! across the whole document, build the batched [`Resolver`] tables, run the
//! three replacers over each non-code segment (wikilinks, then images, then
//! standard links, as the syntaxes shadow each other in that order), rejoin,
//! and finalize through the CommonMark converter. Code segments pass through
//! untouched.
//!
//! Rendering is infallible: every bad reference degrades to a visible
//! `-missing` marker, never an error.

mod html;
mod media;

use tracing::debug;

use crate::cache::GalleryCache;
use crate::config::RenderConfig;
use crate::escape;
use crate::model::{Page, PageRef};
use crate::resolve::Resolver;
use crate::scan::links::{self, ImageEmbed, InlineLink, Wikilink};
use crate::scan::{self, Segment};
use crate::slug::split_extension;
use crate::store::{AttachmentSource, PageStore};

use self::media::MediaContext;

/// The pipeline plus its four injected collaborators. Cheap to construct;
/// the per-render state lives in the [`Resolver`] built inside `render`.
pub struct Renderer<'a> {
    store: &'a dyn PageStore,
    files: &'a dyn AttachmentSource,
    cache: &'a dyn GalleryCache,
    config: &'a RenderConfig,
}

impl<'a> Renderer<'a> {
    pub fn new(
        store: &'a dyn PageStore,
        files: &'a dyn AttachmentSource,
        cache: &'a dyn GalleryCache,
        config: &'a RenderConfig,
    ) -> Renderer<'a> {
        Renderer { store, files, cache, config }
    }

    /// Renders `markdown` in the context of `page` (whose attachments are
    /// the only files links can resolve to).
    pub fn render(&self, markdown: &str, page: &Page) -> String {
        let segments = scan::split_segments(markdown);
        let targets = links::collect_targets(&segments);
        debug!(
            segments = segments.len(),
            wikilinks = targets.wikilinks.len(),
            links = targets.links.len(),
            images = targets.images.len(),
            page = %page.slug,
            "render pass"
        );
        let resolver = Resolver::build(self.store, page, &targets);

        let mut resolved = String::with_capacity(markdown.len() + markdown.len() / 4);
        for segment in &segments {
            if segment.is_code() {
                resolved.push_str(segment.text);
            } else {
                resolved.push_str(&self.replace_segment(segment, &resolver, page));
            }
        }
        html::to_html(&resolved)
    }

    fn replace_segment(&self, segment: &Segment<'_>, resolver: &Resolver<'_>, page: &Page) -> String {
        let pass = self.apply_wikilinks(segment.text, resolver);
        let pass = self.apply_images(&pass, resolver, page);
        self.apply_links(&pass, resolver, page)
    }

    fn apply_wikilinks(&self, text: &str, resolver: &Resolver<'_>) -> String {
        let matches = links::find_wikilinks(text);
        if matches.is_empty() {
            return text.to_string();
        }
        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for m in matches {
            out.push_str(&text[last..m.start]);
            out.push_str(&self.wikilink_fragment(&m, resolver));
            last = m.end;
        }
        out.push_str(&text[last..]);
        out
    }

    fn apply_images(&self, text: &str, resolver: &Resolver<'_>, page: &Page) -> String {
        let matches = links::find_images(text);
        if matches.is_empty() {
            return text.to_string();
        }
        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for m in matches {
            out.push_str(&text[last..m.start]);
            match self.image_fragment(&m, resolver, page) {
                Some(fragment) => out.push_str(&fragment),
                // external embeds pass through byte-identical.
                None => out.push_str(&text[m.start..m.end]),
            }
            last = m.end;
        }
        out.push_str(&text[last..]);
        out
    }

    fn apply_links(&self, text: &str, resolver: &Resolver<'_>, page: &Page) -> String {
        let matches = links::find_links(text);
        if matches.is_empty() {
            return text.to_string();
        }
        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for m in matches {
            out.push_str(&text[last..m.start]);
            match self.link_fragment(&m, resolver, page) {
                Some(fragment) => out.push_str(&fragment),
                None => out.push_str(&text[m.start..m.end]),
            }
            last = m.end;
        }
        out.push_str(&text[last..]);
        out
    }

    /// `[[T]]` / `[[D|T]]`: page lookup, slug table before title table.
    fn wikilink_fragment(&self, m: &Wikilink<'_>, resolver: &Resolver<'_>) -> String {
        let target = m.target.trim();
        let display_raw = match m.display.map(str::trim) {
            Some(d) if !d.is_empty() => d,
            _ => target,
        };
        let display = escape::anchor_text(display_raw);
        match resolver.resolve_page(target) {
            Some(page) => self.page_anchor(page, &display),
            None => self.create_anchor(target, &display),
        }
    }

    /// `[D](T)`: external pass-through, then page, then attachment, then a
    /// missing marker whose flavor depends on whether T looks like a file.
    fn link_fragment(&self, m: &InlineLink<'_>, resolver: &Resolver<'_>, page: &Page) -> Option<String> {
        let target = m.target.trim();
        if links::is_external_target(target) {
            return None;
        }
        let display = escape::anchor_text(m.display);

        if let Some(hit) = resolver.resolve_page(target) {
            return Some(self.page_anchor(hit, &display));
        }
        if let Some(att) = resolver.resolve_file(target) {
            let name = att.display_name();
            let url = self.config.routes.file_url(&page.slug, &name);
            return Some(format!(
                "<a href=\"{}\" class=\"filelink\" target=\"_blank\" title=\"View file: {}\">{}</a>",
                escape::attr(&url),
                escape::attr(&name),
                display,
            ));
        }

        let (_, ext) = split_extension(target);
        if !ext.is_empty() && self.config.is_document_ext(ext) {
            Some(format!(
                "<span class=\"filelink-missing\" title=\"File not found on this page: {}\">{} (file not found)</span>",
                escape::attr(target),
                display,
            ))
        } else {
            Some(self.create_anchor(target, &display))
        }
    }

    /// `![A](T "Title")`: external pass-through, then attachment resolution
    /// and media dispatch.
    fn image_fragment(&self, m: &ImageEmbed<'_>, resolver: &Resolver<'_>, page: &Page) -> Option<String> {
        let target = m.target.trim();
        if links::is_external_target(target) {
            return None;
        }
        let Some(att) = resolver.resolve_file(target) else {
            return Some(format!(
                "<span class=\"filelink-missing\" title=\"File not found on page: {}\">Image: {} (not found)</span>",
                escape::attr(target),
                escape::anchor_text(m.alt),
            ));
        };
        let ctx = MediaContext {
            page_slug: &page.slug,
            config: self.config,
            cache: self.cache,
            files: self.files,
        };
        Some(media::embed_fragment(&ctx, att, m.alt, m.title))
    }

    fn page_anchor(&self, page: &PageRef, display: &str) -> String {
        format!(
            "<a href=\"{}\" class=\"wikilink\">{}</a>",
            escape::attr(&self.config.routes.page_url(&page.slug)),
            display,
        )
    }

    fn create_anchor(&self, target: &str, display: &str) -> String {
        let create_url = self.config.routes.page_create_url(target);
        format!(
            "<a href=\"{}\" class=\"wikilink-missing\" title=\"Create page: {}\">{} (create)</a>",
            escape::attr(&create_url),
            escape::attr(target),
            display,
        )
    }
}
