//! Resident image store snapshot.
//!
//! Composition never performs I/O, so the image store must be fully loaded
//! before a pass starts. [`ImageStore::load_dir`] builds a snapshot from a
//! directory of image files:
//!
//! ```text
//! images/
//! ├── abc.png          → token id "abc"
//! ├── hero-bg.jpg      → token id "hero-bg"
//! └── team/
//!     └── jane.webp    → token id "jane"
//! ```
//!
//! Each file becomes a `data:` URI, so the rendered page is self-contained.
//! Files are read and encoded in parallel; the format is sniffed from the
//! file's bytes with an extension fallback for formats the sniffer does not
//! know (SVG).

use crate::asset::ImageLookup;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image directory not readable: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("duplicate image id {id:?}: {first} and {second}")]
    DuplicateId {
        id: String,
        first: PathBuf,
        second: PathBuf,
    },
}

/// Snapshot of the image store: token id → displayable source.
#[derive(Debug, Clone, Default)]
pub struct ImageStore {
    sources: HashMap<String, String>,
}

impl ImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, source: impl Into<String>) {
        self.sources.insert(id.into(), source.into());
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    /// Load every image under `dir`. A missing directory yields an empty store.
    ///
    /// Files that are not recognizable images are skipped. Two files with the
    /// same stem anywhere in the tree are an error, since the token id would
    /// be ambiguous.
    pub fn load_dir(dir: &Path) -> Result<Self, StoreError> {
        if !dir.exists() {
            return Ok(Self::new());
        }

        let mut files: Vec<(String, PathBuf)> = Vec::new();
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.into_path();
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if stem.starts_with('.') {
                continue;
            }
            if let Some((_, first)) = files.iter().find(|(id, _)| id == stem) {
                return Err(StoreError::DuplicateId {
                    id: stem.to_string(),
                    first: first.clone(),
                    second: path,
                });
            }
            files.push((stem.to_string(), path));
        }

        let encoded: Vec<(String, Option<String>)> = files
            .into_par_iter()
            .map(|(id, path)| -> Result<_, StoreError> {
                let bytes = fs::read(&path)?;
                Ok((id, data_uri(&bytes, &path)))
            })
            .collect::<Result<_, _>>()?;

        let mut store = Self::new();
        for (id, uri) in encoded {
            match uri {
                Some(uri) => store.insert(id, uri),
                None => log::debug!("skipping non-image file for id {}", id),
            }
        }
        Ok(store)
    }
}

impl ImageLookup for ImageStore {
    fn lookup(&self, id: &str) -> Option<&str> {
        self.sources.get(id).map(String::as_str)
    }
}

/// Encode image bytes as a `data:` URI, or `None` if the type is unknown.
pub fn data_uri(bytes: &[u8], path: &Path) -> Option<String> {
    let mime = sniff_mime(bytes, path)?;
    Some(format!("data:{};base64,{}", mime, STANDARD.encode(bytes)))
}

fn sniff_mime(bytes: &[u8], path: &Path) -> Option<&'static str> {
    if let Ok(format) = image::guess_format(bytes) {
        let mime = match format {
            image::ImageFormat::Png => "image/png",
            image::ImageFormat::Jpeg => "image/jpeg",
            image::ImageFormat::Gif => "image/gif",
            image::ImageFormat::WebP => "image/webp",
            image::ImageFormat::Avif => "image/avif",
            image::ImageFormat::Bmp => "image/bmp",
            image::ImageFormat::Ico => "image/x-icon",
            image::ImageFormat::Tiff => "image/tiff",
            _ => return None,
        };
        return Some(mime);
    }
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}
