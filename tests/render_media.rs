use std::io::Write;

use scraper::{Html, Selector};
use time::macros::datetime;
use wikimark::cache::{GalleryCache, MemoryCache};
use wikimark::config::RenderConfig;
use wikimark::model::{Attachment, Page};
use wikimark::render::Renderer;
use wikimark::store::{MemoryFiles, MemoryStore};

const T0: time::OffsetDateTime = datetime!(2024-01-01 0:00 UTC);

fn page_with_attachments(attachments: Vec<Attachment>) -> Page {
    Page {
        id: 100,
        slug: "current".to_string(),
        title: "Current".to_string(),
        content: String::new(),
        updated_at: T0,
        attachments,
    }
}

fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options =
        zip::write::SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, data) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn render(files: &MemoryFiles, cache: &MemoryCache, page: &Page, markdown: &str) -> String {
    let store = MemoryStore::new();
    let config = RenderConfig::default();
    Renderer::new(&store, files, cache, &config).render(markdown, page)
}

#[test]
fn plain_image_embed() {
    let page = page_with_attachments(vec![Attachment::from_filename(1, "diagram.png", T0)]);
    let html = render(
        &MemoryFiles::new(),
        &MemoryCache::new(),
        &page,
        "![My Diagram](diagram.png)",
    );
    assert!(
        html.contains("<img src=\"/media/wiki_files/current/diagram.png\" alt=\"My Diagram\">"),
        "{html}"
    );
}

#[test]
fn image_title_lands_in_title_attribute() {
    let page = page_with_attachments(vec![Attachment::from_filename(1, "diagram.png", T0)]);
    let html = render(
        &MemoryFiles::new(),
        &MemoryCache::new(),
        &page,
        "![d](diagram.png \"The Diagram\")",
    );
    assert!(html.contains("title=\"The Diagram\""), "{html}");
}

#[test]
fn missing_image_becomes_marker_span() {
    let page = page_with_attachments(Vec::new());
    let html = render(
        &MemoryFiles::new(),
        &MemoryCache::new(),
        &page,
        "![lost pic](nowhere.png)",
    );
    assert!(html.contains("class=\"filelink-missing\""), "{html}");
    assert!(html.contains("Image: lost pic (not found)"), "{html}");
}

#[test]
fn external_image_passes_through() {
    let page = page_with_attachments(Vec::new());
    let html = render(
        &MemoryFiles::new(),
        &MemoryCache::new(),
        &page,
        "![cdn](https://cdn.example.com/x.png)",
    );
    assert!(html.contains("src=\"https://cdn.example.com/x.png\""), "{html}");
    assert!(!html.contains("filelink-missing"), "{html}");
}

#[test]
fn zip_of_images_renders_a_gallery() {
    let att = Attachment::from_filename(7, "photos.zip", T0);
    let mut files = MemoryFiles::new();
    files.insert(7, zip_bytes(&[("b.png", b"png"), ("a.jpg", b"jpg")]));
    let page = page_with_attachments(vec![att]);

    let html = render(&files, &MemoryCache::new(), &page, "![Holiday](photos.zip)");
    let doc = Html::parse_fragment(&html);
    let item = Selector::parse("div.archive-gallery a.archive-gallery-item").unwrap();
    let hrefs: Vec<_> = doc
        .select(&item)
        .filter_map(|a| a.value().attr("href"))
        .collect();
    // entries come out sorted, through the archive-image proxy route.
    assert_eq!(
        hrefs,
        vec![
            "/wiki/view-image-in-archive/7/?path=a.jpg",
            "/wiki/view-image-in-archive/7/?path=b.png",
        ],
        "{html}"
    );

    let img = Selector::parse("div.archive-gallery img").unwrap();
    let alts: Vec<_> = doc.select(&img).filter_map(|i| i.value().attr("alt")).collect();
    assert_eq!(alts, vec!["a.jpg", "b.png"]);
}

#[test]
fn mixed_archive_keeps_only_images() {
    let att = Attachment::from_filename(3, "bundle.zip", T0);
    let mut files = MemoryFiles::new();
    files.insert(
        3,
        zip_bytes(&[("readme.txt", b"hi"), ("shot.png", b"png"), ("__MACOSX/x.jpg", b"junk")]),
    );
    let page = page_with_attachments(vec![att]);

    let html = render(&files, &MemoryCache::new(), &page, "![b](bundle.zip)");
    assert!(html.contains("path=shot.png"), "{html}");
    assert!(!html.contains("readme.txt"), "{html}");
    assert!(!html.contains("__MACOSX"), "{html}");
}

#[test]
fn imageless_archive_falls_back_to_download_anchor() {
    let att = Attachment::from_filename(4, "data.zip", T0);
    let mut files = MemoryFiles::new();
    files.insert(4, zip_bytes(&[("numbers.csv", b"1,2,3")]));
    let page = page_with_attachments(vec![att]);

    let html = render(&files, &MemoryCache::new(), &page, "![Data Dump](data.zip)");
    assert!(html.contains("class=\"filelink\""), "{html}");
    assert!(html.contains("title=\"Download archive: data.zip\""), "{html}");
    assert!(html.contains(">Data Dump</a>"), "{html}");
    assert!(!html.contains("archive-gallery"), "{html}");
}

#[test]
fn corrupt_archive_falls_back_to_download_anchor() {
    let att = Attachment::from_filename(5, "broken.zip", T0);
    let mut files = MemoryFiles::new();
    files.insert(5, b"this is not a zip".to_vec());
    let page = page_with_attachments(vec![att]);

    let html = render(&files, &MemoryCache::new(), &page, "![x](broken.zip)");
    assert!(html.contains("title=\"Download archive: broken.zip\""), "{html}");
}

#[test]
fn primed_cache_serves_gallery_without_reading_the_blob() {
    let att = Attachment::from_filename(8, "cached.zip", T0);
    let cache = MemoryCache::new();
    cache.put(
        &att.gallery_cache_key(),
        vec!["x.png".to_string()],
        std::time::Duration::from_secs(3600),
    );
    // no blob in the files store: a cache miss would fall back to the
    // download anchor, so a gallery proves the cache answered.
    let page = page_with_attachments(vec![att]);

    let html = render(&MemoryFiles::new(), &cache, &page, "![c](cached.zip)");
    assert!(html.contains("archive-gallery"), "{html}");
    assert!(html.contains("path=x.png"), "{html}");
}

#[test]
fn pdf_embed_filters_fragment_params() {
    let att = Attachment::from_filename(9, "manual.pdf", T0);
    let page = page_with_attachments(vec![att]);

    let html = render(
        &MemoryFiles::new(),
        &MemoryCache::new(),
        &page,
        "![manual](manual.pdf \"page=3&evil=1\")",
    );
    assert!(html.contains("class=\"pdf-embed-container\""), "{html}");
    assert!(
        html.contains("src=\"/media/wiki_files/current/manual.pdf#page=3\""),
        "{html}"
    );
    assert!(!html.contains("evil"), "{html}");
    assert!(html.contains("title=\"Embedded PDF: manual\""), "{html}");
}

#[test]
fn pdf_embed_without_title_has_no_fragment() {
    let att = Attachment::from_filename(9, "manual.pdf", T0);
    let page = page_with_attachments(vec![att]);

    let html = render(&MemoryFiles::new(), &MemoryCache::new(), &page, "![m](manual.pdf)");
    assert!(
        html.contains("src=\"/media/wiki_files/current/manual.pdf\""),
        "{html}"
    );
    assert!(!html.contains("manual.pdf#"), "{html}");
}
