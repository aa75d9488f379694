use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::Result;

/// Extensions the pipeline hands to a metadata source. Everything else is
/// reported as an unsupported type.
const SUPPORTED_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "tif", "tiff", "webp", "heic", "heif", "dng", "cr2", "nef", "arw",
];

/// Recursively collect every regular file under `root`.
///
/// Symlinks are followed. Broken links and unreadable subtrees are dropped
/// rather than failing the walk; only a failure on the root itself aborts.
pub fn scan_directory(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => return Err(err.into()),
            Err(_) => continue,
        };
        if entry.file_type().is_file() {
            files.push(entry.path().to_path_buf());
        }
    }
    Ok(files)
}

pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
        .unwrap_or(false)
}
