pub mod domain;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod normalize;
pub mod query;
pub mod repo;
pub mod scanner;

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

use domain::{AtlasStats, BoundingBox, IngestOutcome, PhotoRecord};
use error::Result;
use extract::MetadataSource;
use query::{Marker, QueryError};
use repo::Repository;

/// Callback payload for reporting ingest progress.
#[derive(Debug)]
pub enum IngestProgress {
    /// Discovery finished; extraction over `file_count` files begins.
    ScanStart { root: PathBuf, file_count: usize },
    /// A file has been processed.
    FileDone { path: PathBuf },
    /// Ingest phase completed.
    PhaseComplete { phase: String },
}

/// The main entry point for the PhotoAtlas library.
pub struct Atlas {
    repo: Repository,
    source: Box<dyn MetadataSource>,
}

impl Atlas {
    /// Open or create an atlas at the given index path, picking the best
    /// metadata source available on this machine.
    pub fn open(index_path: &Path) -> Result<Self> {
        Self::open_with_source(index_path, extract::detect_source())
    }

    /// Open or create an atlas with a caller-chosen metadata source.
    pub fn open_with_source(index_path: &Path, source: Box<dyn MetadataSource>) -> Result<Self> {
        let repo = Repository::open(index_path)?;
        Ok(Self { repo, source })
    }

    /// Walk a directory tree and index every geotagged photo in it.
    /// Returns one outcome per discovered file. Calls `progress_cb` with
    /// progress updates if provided; checks `cancel` between batches.
    pub fn ingest(
        &mut self,
        root: &Path,
        cancel: Option<&AtomicBool>,
        progress_cb: Option<&mut dyn FnMut(IngestProgress)>,
    ) -> Result<Vec<IngestOutcome>> {
        ingest::run(
            &mut self.repo,
            self.source.as_ref(),
            root,
            cancel,
            progress_cb,
        )
    }

    /// Remove every indexed photo under the given directory. Returns the
    /// number removed.
    pub fn remove_root(&mut self, root: &Path) -> Result<usize> {
        // The directory may already be gone from disk; fall back to lexical
        // normalization so its records can still be addressed.
        let root = root.canonicalize().or_else(|_| std::path::absolute(root))?;
        self.repo.remove_under(&root)
    }

    /// Fetch one record by its identity.
    pub fn get(&self, id: &str) -> Result<PhotoRecord> {
        self.repo.get(id)
    }

    /// Number of indexed photos.
    pub fn count(&self) -> Result<u64> {
        self.repo.count()
    }

    /// List every indexed photo, path-ordered.
    pub fn photos(&self) -> Result<Vec<PhotoRecord>> {
        self.repo.list_all()
    }

    /// Markers for every photo inside the box.
    pub fn markers(&self, bbox: &BoundingBox) -> std::result::Result<Vec<Marker>, QueryError> {
        query::markers(&self.repo, bbox)
    }

    /// Original image bytes plus MIME type for one photo.
    pub fn photo_bytes(
        &self,
        id: &str,
    ) -> std::result::Result<(Vec<u8>, &'static str), QueryError> {
        query::photo_bytes(&self.repo, id)
    }

    /// Index summary statistics (single query for the dashboard).
    pub fn status(&self) -> Result<AtlasStats> {
        self.repo.stats()
    }

    /// Rebuild the spatial index from the stored records. Returns the
    /// number of entries written.
    pub fn rebuild_index(&mut self) -> Result<usize> {
        self.repo.rebuild_index()
    }

    /// Name of the metadata source in use.
    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }
}
