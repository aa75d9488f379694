use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// A photograph indexed by the GPS coordinates found in its metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhotoRecord {
    /// Stable identity: lowercase hex SHA-256 of the normalized absolute path.
    pub id: String,
    pub path: PathBuf,
    /// Latitude in decimal degrees, within [-90, 90].
    pub lat: f64,
    /// Longitude in decimal degrees, within [-180, 180].
    pub lon: f64,
    /// Altitude in meters, negative below sea level.
    pub altitude: Option<f64>,
    /// Capture time. EXIF datetimes carry no zone and are read as UTC.
    pub taken_at: Option<DateTime<Utc>>,
    /// Name of the directory containing the file.
    pub album: Option<String>,
}

impl PhotoRecord {
    /// Derive the stable identity for a photo path.
    pub fn identity(path: &Path) -> String {
        let mut hasher = Sha256::new();
        hasher.update(path.to_string_lossy().as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// A rectangular geographic query region.
///
/// `east < west` is legal and denotes a box crossing the antimeridian,
/// answered as the union of the two longitude sub-ranges [west, 180]
/// and [-180, east].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Result<Self> {
        for (name, value) in [("south", south), ("north", north)] {
            if !(-90.0..=90.0).contains(&value) {
                return Err(Error::InvalidCoordinate(format!(
                    "{name} bound {value} outside [-90, 90]"
                )));
            }
        }
        for (name, value) in [("west", west), ("east", east)] {
            if !(-180.0..=180.0).contains(&value) {
                return Err(Error::InvalidCoordinate(format!(
                    "{name} bound {value} outside [-180, 180]"
                )));
            }
        }
        if south > north {
            return Err(Error::InvalidCoordinate(format!(
                "south bound {south} exceeds north bound {north}"
            )));
        }
        Ok(Self {
            south,
            west,
            north,
            east,
        })
    }

    pub fn crosses_antimeridian(&self) -> bool {
        self.east < self.west
    }

    /// Closed-interval containment on all four edges.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        if lat < self.south || lat > self.north {
            return false;
        }
        if self.crosses_antimeridian() {
            lon >= self.west || lon <= self.east
        } else {
            lon >= self.west && lon <= self.east
        }
    }
}

/// Per-file result of an ingestion run.
#[derive(Debug)]
pub enum IngestOutcome {
    /// The file carried valid GPS coordinates and was written to the index.
    Indexed(PhotoRecord),
    /// The file was examined but not indexed.
    Skipped { path: PathBuf, reason: SkipReason },
    /// Extraction or storage failed for this file.
    Failed { path: PathBuf, error: Error },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// No GPS tags present in the metadata.
    NoGps,
    /// The file extension is not a supported image type.
    UnsupportedType,
    /// GPS tags were present but malformed or out of range.
    InvalidCoordinate(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoGps => write!(f, "no GPS data"),
            SkipReason::UnsupportedType => write!(f, "unsupported file type"),
            SkipReason::InvalidCoordinate(message) => {
                write!(f, "invalid GPS data: {message}")
            }
        }
    }
}

/// Summary of the indexed corpus.
#[derive(Debug, Clone, PartialEq)]
pub struct AtlasStats {
    pub total_photos: u64,
    pub total_albums: u64,
    /// Smallest box containing every indexed coordinate.
    pub extent: Option<BoundingBox>,
    /// Arithmetic mean of all indexed coordinates, for map centering.
    pub centroid: Option<(f64, f64)>,
}
