//! Corpus loading from an on-disk layout
//!
//! Expected layout under the data directory:
//! - `docs/`   documentation (`.md` / `.txt`)
//! - `forums/` forum threads, one post per blank-line-separated block
//! - `blogs/`  blog posts
//!
//! Only the top level of each folder is read. Passages come back in the order
//! docs, forums, blogs, and by file name within a folder.

mod chunking;

pub use chunking::{chunk, chunk_posts, chunk_sections, BLOG_WINDOW, DOCS_WINDOW};

use crate::corpus::{Passage, SourceClass};
use crate::error::{ConcordError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Folder load order
pub const LOAD_ORDER: [SourceClass; 3] = [SourceClass::Docs, SourceClass::Forum, SourceClass::Blog];

const EXTENSIONS: [&str; 2] = ["md", "txt"];

/// Load and chunk every supported file under `base`
pub fn load_corpus(base: &Path) -> Result<Vec<Passage>> {
    if !base.is_dir() {
        return Err(ConcordError::Io {
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
            context: format!("Corpus directory {:?} is missing", base),
        });
    }

    let mut passages = Vec::new();
    for class in LOAD_ORDER {
        let loaded = load_source(base, class)?;
        info!("Loaded {} {} passages", loaded.len(), class);
        passages.extend(loaded);
    }

    info!("Total passages loaded: {}", passages.len());
    Ok(passages)
}

/// Load the folder for one source class; a missing folder yields nothing
pub fn load_source(base: &Path, class: SourceClass) -> Result<Vec<Passage>> {
    let folder = base.join(class.dir_name());
    if !folder.is_dir() {
        warn!("Source folder {:?} not found, skipping", folder);
        return Ok(Vec::new());
    }

    let mut passages = Vec::new();
    for path in list_files(&folder)? {
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Cannot read {:?}: {}", path, e);
                continue;
            }
        };

        let origin = path.to_string_lossy();
        let chunks = chunk(class, &raw, &origin);
        debug!("{:?}: {} passages", path, chunks.len());
        passages.extend(chunks);
    }

    Ok(passages)
}

fn list_files(folder: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(folder).map_err(|e| ConcordError::Io {
        source: e,
        context: format!("Failed to list {:?}", folder),
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_supported_extension(path))
        .collect();

    files.sort();
    Ok(files)
}

fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| EXTENSIONS.contains(&ext.trim().to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
