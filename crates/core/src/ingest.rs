use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::domain::{IngestOutcome, PhotoRecord, SkipReason};
use crate::error::{Error, Result};
use crate::extract::{MetadataSource, BATCH_LIMIT};
use crate::normalize;
use crate::repo::Repository;
use crate::scanner;
use crate::IngestProgress;

const PUT_RETRIES: usize = 3;

/// Walks the root, extracts metadata batch by batch and writes geotagged
/// records to the repository. Produces one outcome per distinct identity
/// (when two directory entries resolve to the same identity the first
/// wins); a failure on one file never stops the rest.
pub(crate) fn run(
    repo: &mut Repository,
    source: &dyn MetadataSource,
    root: &Path,
    cancel: Option<&AtomicBool>,
    mut progress: Option<&mut dyn FnMut(IngestProgress)>,
) -> Result<Vec<IngestOutcome>> {
    if !root.exists() {
        return Err(Error::RootNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(Error::RootNotDirectory(root.to_path_buf()));
    }
    let root = root.canonicalize()?;

    let files = scanner::scan_directory(&root)?;
    emit(
        &mut progress,
        IngestProgress::ScanStart {
            root: root.clone(),
            file_count: files.len(),
        },
    );

    let mut outcomes = Vec::with_capacity(files.len());
    let mut seen = HashSet::new();
    let mut pending: Vec<(PathBuf, String)> = Vec::new();

    for path in files {
        if !scanner::is_supported_image(&path) {
            outcomes.push(IngestOutcome::Skipped {
                path: path.clone(),
                reason: SkipReason::UnsupportedType,
            });
            emit(&mut progress, IngestProgress::FileDone { path });
            continue;
        }
        let id = PhotoRecord::identity(&path);
        // Two directory entries resolving to the same identity; the first
        // wins and the rest are ignored.
        if !seen.insert(id.clone()) {
            emit(&mut progress, IngestProgress::FileDone { path });
            continue;
        }
        pending.push((path, id));
    }

    for chunk in pending.chunks(BATCH_LIMIT) {
        if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            break;
        }

        let paths: Vec<PathBuf> = chunk.iter().map(|(path, _)| path.clone()).collect();
        let results = source.extract(&paths);

        let mut records = Vec::new();
        let mut chunk_outcomes = Vec::with_capacity(chunk.len());
        for ((path, id), result) in chunk.iter().zip(results) {
            let outcome = match result {
                Err(error) => IngestOutcome::Failed {
                    path: path.clone(),
                    error,
                },
                Ok(tags) => match normalize::coordinates(&tags) {
                    Err(Error::InvalidCoordinate(message)) => IngestOutcome::Skipped {
                        path: path.clone(),
                        reason: SkipReason::InvalidCoordinate(message),
                    },
                    Err(error) => IngestOutcome::Failed {
                        path: path.clone(),
                        error,
                    },
                    Ok(None) => IngestOutcome::Skipped {
                        path: path.clone(),
                        reason: SkipReason::NoGps,
                    },
                    Ok(Some((lat, lon))) => {
                        let record = PhotoRecord {
                            id: id.clone(),
                            path: path.clone(),
                            lat,
                            lon,
                            altitude: normalize::altitude(&tags),
                            taken_at: normalize::timestamp(&tags),
                            album: album_label(path),
                        };
                        records.push(record.clone());
                        IngestOutcome::Indexed(record)
                    }
                },
            };
            emit(&mut progress, IngestProgress::FileDone { path: path.clone() });
            chunk_outcomes.push(outcome);
        }

        if put_batch_with_retry(repo, &records).is_err() {
            // One refused write should not take the whole batch down; land
            // records one at a time and fail only the ones that still refuse.
            for record in &records {
                if let Err(error) = repo.put(record) {
                    let failed = chunk_outcomes.iter_mut().find(|outcome| {
                        matches!(outcome, IngestOutcome::Indexed(existing) if existing.id == record.id)
                    });
                    if let Some(outcome) = failed {
                        *outcome = IngestOutcome::Failed {
                            path: record.path.clone(),
                            error,
                        };
                    }
                }
            }
        }
        outcomes.extend(chunk_outcomes);
    }

    emit(
        &mut progress,
        IngestProgress::PhaseComplete {
            phase: "indexing".to_string(),
        },
    );
    Ok(outcomes)
}

/// Outcome tallies for one ingest run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub indexed: usize,
    pub no_gps: usize,
    pub unsupported: usize,
    pub invalid: usize,
    pub failed: usize,
}

pub fn summarize(outcomes: &[IngestOutcome]) -> IngestSummary {
    let mut summary = IngestSummary::default();
    for outcome in outcomes {
        match outcome {
            IngestOutcome::Indexed(_) => summary.indexed += 1,
            IngestOutcome::Skipped {
                reason: SkipReason::NoGps,
                ..
            } => summary.no_gps += 1,
            IngestOutcome::Skipped {
                reason: SkipReason::UnsupportedType,
                ..
            } => summary.unsupported += 1,
            IngestOutcome::Skipped {
                reason: SkipReason::InvalidCoordinate(_),
                ..
            } => summary.invalid += 1,
            IngestOutcome::Failed { .. } => summary.failed += 1,
        }
    }
    summary
}

fn put_batch_with_retry(repo: &mut Repository, records: &[PhotoRecord]) -> Result<()> {
    let mut attempt = 0;
    loop {
        match repo.put_batch(records) {
            Ok(()) => return Ok(()),
            Err(error) if is_transient(&error) && attempt + 1 < PUT_RETRIES => {
                attempt += 1;
                std::thread::sleep(Duration::from_millis(50 * attempt as u64));
            }
            Err(error) => return Err(error),
        }
    }
}

fn is_transient(error: &Error) -> bool {
    match error {
        Error::Database(rusqlite::Error::SqliteFailure(failure, _)) => matches!(
            failure.code,
            rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
        ),
        _ => false,
    }
}

/// Album label from the parent directory name, when there is one.
fn album_label(path: &Path) -> Option<String> {
    path.parent()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().to_string())
}

fn emit(progress: &mut Option<&mut dyn FnMut(IngestProgress)>, event: IngestProgress) {
    if let Some(callback) = progress {
        callback(event);
    }
}
