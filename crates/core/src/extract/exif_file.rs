use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use exif::{In, Tag, Value};
use rayon::prelude::*;

use super::{MetadataSource, TagMap};
use crate::error::Error;

/// Metadata source backed by the in-process EXIF parser. Needs no external
/// binary; the GPS and timestamp tags it finds are re-exported under
/// exiftool's group-qualified names so the rest of the pipeline sees a
/// single tag dialect.
#[derive(Default)]
pub struct FileExifSource;

impl FileExifSource {
    pub fn new() -> Self {
        Self
    }

    fn read_one(path: &Path) -> crate::error::Result<TagMap> {
        let file = File::open(path).map_err(|err| Error::Extraction {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        let mut reader = BufReader::new(file);
        match exif::Reader::new().read_from_container(&mut reader) {
            Ok(exif) => Ok(tags_from(&exif)),
            // A readable image with no EXIF segment at all is a normal
            // no-GPS case, not an extraction failure.
            Err(exif::Error::NotFound(_)) => Ok(TagMap::new()),
            Err(err) => Err(Error::Extraction {
                path: path.to_path_buf(),
                message: err.to_string(),
            }),
        }
    }
}

impl MetadataSource for FileExifSource {
    fn extract(&self, paths: &[PathBuf]) -> Vec<crate::error::Result<TagMap>> {
        paths.par_iter().map(|path| Self::read_one(path)).collect()
    }

    fn name(&self) -> &'static str {
        "built-in EXIF reader"
    }
}

fn tags_from(exif: &exif::Exif) -> TagMap {
    let mut tags = TagMap::new();
    insert_rationals(&mut tags, exif, Tag::GPSLatitude, "EXIF:GPSLatitude");
    insert_text(&mut tags, exif, Tag::GPSLatitudeRef, "EXIF:GPSLatitudeRef");
    insert_rationals(&mut tags, exif, Tag::GPSLongitude, "EXIF:GPSLongitude");
    insert_text(&mut tags, exif, Tag::GPSLongitudeRef, "EXIF:GPSLongitudeRef");
    insert_first_rational(&mut tags, exif, Tag::GPSAltitude, "EXIF:GPSAltitude");
    insert_byte(&mut tags, exif, Tag::GPSAltitudeRef, "EXIF:GPSAltitudeRef");
    insert_text(&mut tags, exif, Tag::DateTimeOriginal, "EXIF:DateTimeOriginal");
    insert_text(&mut tags, exif, Tag::DateTimeDigitized, "EXIF:CreateDate");
    tags
}

fn insert_rationals(tags: &mut TagMap, exif: &exif::Exif, tag: Tag, key: &str) {
    let Some(field) = exif.get_field(tag, In::PRIMARY) else {
        return;
    };
    if let Value::Rational(parts) = &field.value {
        let parts: Vec<serde_json::Value> = parts
            .iter()
            .filter_map(|rational| serde_json::Number::from_f64(rational.to_f64()))
            .map(serde_json::Value::Number)
            .collect();
        if !parts.is_empty() {
            tags.insert(key.to_string(), serde_json::Value::Array(parts));
        }
    }
}

fn insert_first_rational(tags: &mut TagMap, exif: &exif::Exif, tag: Tag, key: &str) {
    let Some(field) = exif.get_field(tag, In::PRIMARY) else {
        return;
    };
    if let Value::Rational(parts) = &field.value {
        let number = parts
            .first()
            .and_then(|rational| serde_json::Number::from_f64(rational.to_f64()));
        if let Some(number) = number {
            tags.insert(key.to_string(), serde_json::Value::Number(number));
        }
    }
}

fn insert_text(tags: &mut TagMap, exif: &exif::Exif, tag: Tag, key: &str) {
    let Some(field) = exif.get_field(tag, In::PRIMARY) else {
        return;
    };
    if let Value::Ascii(parts) = &field.value {
        if let Some(first) = parts.first() {
            let text = String::from_utf8_lossy(first);
            let text = text.trim_matches(char::from(0)).trim();
            if !text.is_empty() {
                tags.insert(key.to_string(), serde_json::Value::String(text.to_string()));
            }
        }
    }
}

fn insert_byte(tags: &mut TagMap, exif: &exif::Exif, tag: Tag, key: &str) {
    let Some(field) = exif.get_field(tag, In::PRIMARY) else {
        return;
    };
    if let Value::Byte(parts) = &field.value {
        if let Some(first) = parts.first() {
            tags.insert(key.to_string(), serde_json::Value::Number((*first).into()));
        }
    }
}
