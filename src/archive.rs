//! Archive inspection for gallery rendering and entry extraction.
//!
//! `.zip` attachments are read with the `zip` crate; `.tar`, `.gz` and
//! `.bz2` go through `tar` with the matching decompression adapter. A
//! malformed or unrecognized archive never propagates an error: listing
//! degrades to an empty vec ("not a gallery") and extraction to `None`.

use std::io::{Cursor, Read};

use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use tracing::debug;

use crate::config::RenderConfig;
use crate::slug::split_extension;

/// Image-type entry names inside an archive attachment, sorted. Directory
/// entries and `__MACOSX` metadata are skipped; non-image entries are
/// filtered out. Empty means "not a gallery", whether because the archive
/// holds no images or because it could not be read at all.
pub fn list_image_entries(bytes: &[u8], extension: &str, config: &RenderConfig) -> Vec<String> {
    let Some(entries) = list_entries(bytes, extension) else {
        debug!(extension, "archive unreadable, treating as non-gallery");
        return Vec::new();
    };
    let mut images: Vec<String> = entries
        .into_iter()
        .filter(|name| !name.ends_with('/') && !name.starts_with("__MACOSX"))
        .filter(|name| {
            let (_, ext) = split_extension(name);
            config.is_picture_ext(ext)
        })
        .collect();
    images.sort();
    images
}

/// Bytes of one named entry, or `None` when the entry is missing or the
/// archive cannot be read.
pub fn read_entry(bytes: &[u8], extension: &str, entry_path: &str) -> Option<Vec<u8>> {
    match extension.to_ascii_lowercase().as_str() {
        ".zip" => {
            let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).ok()?;
            let mut file = archive.by_name(entry_path).ok()?;
            let mut buf = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut buf).ok()?;
            Some(buf)
        }
        ext @ (".tar" | ".gz" | ".bz2") => {
            let mut archive = tar::Archive::new(tar_reader(bytes, ext));
            for entry in archive.entries().ok()? {
                let mut entry = entry.ok()?;
                if !entry.header().entry_type().is_file() {
                    continue;
                }
                if entry.path().ok()?.to_string_lossy() == entry_path {
                    let mut buf = Vec::new();
                    entry.read_to_end(&mut buf).ok()?;
                    return Some(buf);
                }
            }
            None
        }
        _ => None,
    }
}

fn list_entries(bytes: &[u8], extension: &str) -> Option<Vec<String>> {
    match extension.to_ascii_lowercase().as_str() {
        ".zip" => {
            let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).ok()?;
            let mut names = Vec::with_capacity(archive.len());
            for i in 0..archive.len() {
                let entry = archive.by_index(i).ok()?;
                if entry.is_dir() {
                    continue;
                }
                names.push(entry.name().to_string());
            }
            Some(names)
        }
        ext @ (".tar" | ".gz" | ".bz2") => {
            let mut archive = tar::Archive::new(tar_reader(bytes, ext));
            let mut names = Vec::new();
            for entry in archive.entries().ok()? {
                let entry = entry.ok()?;
                if !entry.header().entry_type().is_file() {
                    continue;
                }
                names.push(entry.path().ok()?.to_string_lossy().into_owned());
            }
            Some(names)
        }
        _ => None,
    }
}

fn tar_reader<'a>(bytes: &'a [u8], extension: &str) -> Box<dyn Read + 'a> {
    match extension {
        ".gz" => Box::new(GzDecoder::new(bytes)),
        ".bz2" => Box::new(BzDecoder::new(bytes)),
        _ => Box::new(bytes),
    }
}
