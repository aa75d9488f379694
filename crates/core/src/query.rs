use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::BoundingBox;
use crate::error::Error;
use crate::repo::Repository;

/// One map pin, the projection of a stored record a viewer needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub id: String,
    pub lat: f64,
    pub lon: f64,
    pub path: PathBuf,
    pub taken_at: Option<DateTime<Utc>>,
    pub album: Option<String>,
}

/// Errors the query surface exposes. Storage details never cross this
/// boundary; callers see a missing photo or an opaque internal failure.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("photo not found: {0}")]
    NotFound(String),

    #[error("query failed: {0}")]
    Internal(String),
}

/// Markers for every photo inside the box, path-ordered.
pub fn markers(repo: &Repository, bbox: &BoundingBox) -> Result<Vec<Marker>, QueryError> {
    let records = repo
        .query_bounding_box(bbox)
        .map_err(|err| QueryError::Internal(err.to_string()))?;
    Ok(records
        .into_iter()
        .map(|record| Marker {
            id: record.id,
            lat: record.lat,
            lon: record.lon,
            path: record.path,
            taken_at: record.taken_at,
            album: record.album,
        })
        .collect())
}

/// Original image bytes plus the MIME type implied by the extension.
pub fn photo_bytes(repo: &Repository, id: &str) -> Result<(Vec<u8>, &'static str), QueryError> {
    let record = repo.get(id).map_err(|err| match err {
        Error::PhotoNotFound(id) => QueryError::NotFound(id),
        other => QueryError::Internal(other.to_string()),
    })?;
    let bytes = std::fs::read(&record.path)
        .map_err(|err| QueryError::Internal(format!("{}: {err}", record.path.display())))?;
    Ok((bytes, mime_for_path(&record.path)))
}

fn mime_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase());
    match extension.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("tif" | "tiff") => "image/tiff",
        Some("webp") => "image/webp",
        Some("heic" | "heif") => "image/heic",
        Some("dng") => "image/x-adobe-dng",
        _ => "application/octet-stream",
    }
}
