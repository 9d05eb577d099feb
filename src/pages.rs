//! Directory-backed wiki loading.
//!
//! Layout: `{slug}.md` files at the root (optional YAML frontmatter with
//! `title` and `slug` overrides), attachment blobs under
//! `files/{page slug}/`. Timestamps come from file mtimes, so a touched
//! attachment invalidates its cached gallery listing automatically.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::debug;
use walkdir::WalkDir;

use crate::model::{Attachment, Page};
use crate::slug::{slugify, unique_slug};
use crate::store::{AttachmentSource, MemoryStore};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("wiki root not found: {0}")]
    RootNotFound(PathBuf),
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("bad frontmatter in {path}: {source}")]
    Frontmatter {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Optional per-page YAML header.
#[derive(Debug, Default, Deserialize)]
struct FrontMatter {
    title: Option<String>,
    slug: Option<String>,
}

/// A loaded wiki: the page store plus the filesystem attachment source.
#[derive(Debug)]
pub struct DirWiki {
    pub store: MemoryStore,
    pub files: DirFiles,
}

/// Serves attachment bytes from the paths recorded at load time.
#[derive(Debug, Default)]
pub struct DirFiles {
    paths: HashMap<u64, PathBuf>,
}

impl AttachmentSource for DirFiles {
    fn read(&self, _page_slug: &str, attachment: &Attachment) -> io::Result<Vec<u8>> {
        match self.paths.get(&attachment.id) {
            Some(path) => fs::read(path),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("attachment {} has no backing file", attachment.id),
            )),
        }
    }
}

/// Loads every page and attachment under `root`.
pub fn load_dir(root: &Path) -> Result<DirWiki, LoadError> {
    if !root.is_dir() {
        return Err(LoadError::RootNotFound(root.to_path_buf()));
    }

    let mut page_files: Vec<_> = WalkDir::new(root)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && e.path().extension().is_some_and(|x| x == "md"))
        .collect();
    page_files.sort_by(|a, b| a.path().cmp(b.path()));

    let mut store = MemoryStore::new();
    let mut files = DirFiles::default();
    let mut next_attachment_id = 1u64;
    let mut attachment_count = 0usize;

    for entry in page_files {
        let path = entry.path();
        let raw = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let (front, body) = split_frontmatter(&raw, path)?;

        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("page");
        let base = front.slug.map(|s| slugify(&s)).unwrap_or_else(|| slugify(stem));
        let slug = unique_slug(&base, |s| store.pages().any(|p| p.slug == s));
        let title = front.title.unwrap_or_else(|| stem.replace('-', " "));

        let mut attachments = Vec::new();
        let files_dir = root.join("files").join(&slug);
        if files_dir.is_dir() {
            for blob_path in sorted_files(&files_dir)? {
                let Some(filename) = blob_path.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                let attachment =
                    Attachment::from_filename(next_attachment_id, filename, mtime(&blob_path)?);
                files.paths.insert(attachment.id, blob_path.clone());
                attachments.push(attachment);
                next_attachment_id += 1;
                attachment_count += 1;
            }
        }

        let id = store.next_id();
        store.insert_page(Page {
            id,
            slug,
            title,
            content: body.to_string(),
            updated_at: mtime(path)?,
            attachments,
        });
    }

    debug!(
        pages = store.pages().count(),
        attachments = attachment_count,
        root = %root.display(),
        "wiki loaded"
    );
    Ok(DirWiki { store, files })
}

fn sorted_files(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let entries = fs::read_dir(dir).map_err(|source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    paths.sort();
    Ok(paths)
}

fn mtime(path: &Path) -> Result<OffsetDateTime, LoadError> {
    let map_err = |source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    };
    let modified = fs::metadata(path).map_err(map_err)?.modified().map_err(map_err)?;
    Ok(OffsetDateTime::from(modified))
}

fn split_frontmatter<'a>(text: &'a str, path: &Path) -> Result<(FrontMatter, &'a str), LoadError> {
    let Some((yaml, body)) = split_yaml(text) else {
        return Ok((FrontMatter::default(), text));
    };
    if yaml.trim().is_empty() {
        return Ok((FrontMatter::default(), body));
    }
    let front = serde_yaml::from_str(yaml).map_err(|source| LoadError::Frontmatter {
        path: path.to_path_buf(),
        source,
    })?;
    Ok((front, body))
}

/// Splits `---` delimited frontmatter; the opening marker must be the first
/// line and the closing marker on its own line. Accepts `\r\n`.
fn split_yaml(text: &str) -> Option<(&str, &str)> {
    let rest = text.strip_prefix("---")?;
    let rest = rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n'))?;
    let mut pos = 0usize;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == "---" {
            return Some((&rest[..pos], &rest[pos + line.len()..]));
        }
        pos += line.len();
    }
    None
}
