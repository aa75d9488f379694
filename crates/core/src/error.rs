use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("EXIF parsing error: {0}")]
    Exif(#[from] exif::Error),

    #[error("walkdir error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("root path does not exist: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("root path is not a directory: {}", .0.display())]
    RootNotDirectory(PathBuf),

    #[error("photo not found: {0}")]
    PhotoNotFound(String),

    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("metadata extraction failed for {}: {message}", .path.display())]
    Extraction { path: PathBuf, message: String },

    #[error("metadata tool timed out after {seconds}s on {}", .path.display())]
    ExtractionTimeout { path: PathBuf, seconds: u64 },

    #[error("index schema version {db} is newer than this build supports ({code})")]
    SchemaTooNew { db: i64, code: i64 },
}

pub type Result<T> = std::result::Result<T, Error>;
