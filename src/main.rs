use std::error::Error;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use wikimark::cache::MemoryCache;
use wikimark::config::{MENU_PAGE_SLUG, RenderConfig};
use wikimark::model::Page;
use wikimark::pages::{self, DirWiki};
use wikimark::render::Renderer;
use wikimark::{archive, menu};

#[derive(Parser)]
#[command(name = "wikimark", about = "Render a directory wiki's Markdown to HTML")]
struct Cli {
    /// Wiki root directory (pages as *.md, attachments under files/).
    #[arg(long, default_value = ".", global = true)]
    dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render one page to HTML.
    Render {
        /// Slug of the page to render.
        slug: String,
        /// Write HTML here instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List every page slug and title.
    Pages,
    /// Print the navigation menu as JSON.
    Menu,
    /// Extract one entry from an archive attachment.
    Extract {
        /// Slug of the page owning the archive.
        page: String,
        /// Archive attachment filename.
        archive: String,
        /// Entry path inside the archive.
        entry: String,
        /// Write the entry bytes here instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let wiki = pages::load_dir(&cli.dir)?;

    match cli.command {
        Commands::Render { slug, out } => render_page(&wiki, &slug, out),
        Commands::Pages => {
            for page in wiki.store.pages() {
                println!("{}\t{}", page.slug, page.title);
            }
            Ok(())
        }
        Commands::Menu => print_menu(&wiki),
        Commands::Extract { page, archive, entry, out } => {
            extract_entry(&wiki, &page, &archive, &entry, out)
        }
    }
}

fn render_page(wiki: &DirWiki, slug: &str, out: Option<PathBuf>) -> Result<(), Box<dyn Error>> {
    let page = find_page(wiki, slug)?;
    let config = RenderConfig::default();
    let cache = MemoryCache::new();
    let renderer = Renderer::new(&wiki.store, &wiki.files, &cache, &config);
    let html = renderer.render(&page.content, page);
    emit(out, html.as_bytes())
}

fn print_menu(wiki: &DirWiki) -> Result<(), Box<dyn Error>> {
    let config = RenderConfig::default();
    let sections = match wiki.store.get(MENU_PAGE_SLUG) {
        Some(page) => menu::parse_menu(&page.content, &config.routes),
        None => Vec::new(),
    };
    println!("{}", serde_json::to_string_pretty(&sections)?);
    Ok(())
}

fn extract_entry(
    wiki: &DirWiki,
    page_slug: &str,
    archive_name: &str,
    entry: &str,
    out: Option<PathBuf>,
) -> Result<(), Box<dyn Error>> {
    use wikimark::store::AttachmentSource;

    let page = find_page(wiki, page_slug)?;
    let attachment = page
        .attachments
        .iter()
        .find(|a| {
            a.display_name().eq_ignore_ascii_case(archive_name)
                || a.filename_slug.eq_ignore_ascii_case(archive_name)
        })
        .ok_or_else(|| format!("no attachment named {archive_name:?} on page {page_slug:?}"))?;

    let bytes = wiki.files.read(&page.slug, attachment)?;
    let content = archive::read_entry(&bytes, &attachment.extension, entry)
        .ok_or_else(|| format!("entry {entry:?} not found in {archive_name:?}"))?;
    emit(out, &content)
}

fn find_page<'a>(wiki: &'a DirWiki, slug: &str) -> Result<&'a Page, Box<dyn Error>> {
    wiki.store
        .get(slug)
        .ok_or_else(|| format!("page not found: {slug:?}").into())
}

fn emit(out: Option<PathBuf>, bytes: &[u8]) -> Result<(), Box<dyn Error>> {
    match out {
        Some(path) => fs::write(path, bytes)?,
        None => std::io::stdout().write_all(bytes)?,
    }
    Ok(())
}
