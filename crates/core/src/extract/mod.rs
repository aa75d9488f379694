mod exif_file;
mod exiftool;

pub use exif_file::FileExifSource;
pub use exiftool::{ExifToolSource, BATCH_LIMIT};

use std::path::PathBuf;

use crate::error::Result;

/// Untyped tag mapping produced by a metadata source. Consumed immediately
/// by the normalizer, never propagated further.
pub type TagMap = serde_json::Map<String, serde_json::Value>;

/// A provider of raw photo metadata.
///
/// Implementations return one result per input path, in input order. A
/// mapping without GPS keys is a normal outcome, never an error; an error
/// means the file's metadata could not be read at all.
pub trait MetadataSource: Send + Sync {
    fn extract(&self, paths: &[PathBuf]) -> Vec<Result<TagMap>>;

    /// Short human-readable name for status output.
    fn name(&self) -> &'static str;
}

/// Look up a tag by bare name: the `EXIF:` group wins, then an ungrouped
/// key, then any other group prefix (exiftool output is group-qualified,
/// `Composite:GPSLatitude` and the like).
pub fn tag<'a>(tags: &'a TagMap, name: &str) -> Option<&'a serde_json::Value> {
    if let Some(value) = tags.get(&format!("EXIF:{name}")) {
        return Some(value);
    }
    if let Some(value) = tags.get(name) {
        return Some(value);
    }
    let suffix = format!(":{name}");
    tags.iter()
        .find(|(key, _)| key.ends_with(&suffix))
        .map(|(_, value)| value)
}

/// Pick the best available source: exiftool reads more container formats,
/// the built-in reader needs no external binary.
pub fn detect_source() -> Box<dyn MetadataSource> {
    if ExifToolSource::is_available() {
        Box::new(ExifToolSource::new())
    } else {
        Box::new(FileExifSource::new())
    }
}
