//! Image discovery for batch classification
//!
//! A batch folder may nest images in subfolders, so each image is named by
//! its path relative to the folder. `a/100.jpg` and `b/100.jpg` stay
//! distinct in the audit log.

use std::fs;
use std::path::{Path, PathBuf};

use notecheck_types::{Error, Result};
use walkdir::{DirEntry, WalkDir};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "bmp"];

/// One image found by [`scan_directory`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedImage {
    pub path: PathBuf,
    /// Path relative to the scanned folder, `/`-separated
    pub source_name: String,
}

pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

fn relative_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Find images under `dir`, ordered by relative path.
///
/// Hidden entries are skipped, as is `skip_dir` (normally the upload
/// directory, so stored copies are never classified twice).
pub fn scan_directory(dir: &Path, skip_dir: Option<&Path>) -> Result<Vec<ScannedImage>> {
    if !dir.is_dir() {
        return Err(Error::FileNotFound(format!(
            "{} is not a directory",
            dir.display()
        )));
    }
    let skip = skip_dir.and_then(|d| fs::canonicalize(d).ok());

    let walker = WalkDir::new(dir).follow_links(true).into_iter().filter_entry(|entry| {
        if is_hidden(entry) {
            return false;
        }
        match (&skip, entry.file_type().is_dir()) {
            (Some(skip), true) => fs::canonicalize(entry.path()).ok().as_ref() != Some(skip),
            _ => true,
        }
    });

    let mut images = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                continue;
            }
        };
        let path = entry.path();
        if entry.file_type().is_file() && is_supported_image(path) {
            images.push(ScannedImage {
                source_name: relative_name(dir, path),
                path: path.to_path_buf(),
            });
        }
    }

    images.sort_by(|a, b| a.source_name.cmp(&b.source_name));
    Ok(images)
}
