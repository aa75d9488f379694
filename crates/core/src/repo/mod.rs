pub mod schema;

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use crate::domain::{AtlasStats, BoundingBox, PhotoRecord};
use crate::error::{Error, Result};

/// Grid cell edge in degrees. Every record lands in exactly one cell, so a
/// bounding-box query only has to scan the covered cell range and re-check
/// each candidate against the exact box.
const CELL_SIZE_DEG: f64 = 0.25;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// SQLite caps bound variables per statement, so bulk deletes go in chunks.
const DELETE_CHUNK: usize = 500;

/// SQLite-backed photo store plus the grid index over coordinates.
pub struct Repository {
    conn: Connection,
}

impl Repository {
    /// Open or create an atlas index at the given path with WAL mode.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        schema::initialize(&conn)?;
        schema::migrate(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory index (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        schema::initialize(&conn)?;
        schema::migrate(&conn)?;
        Ok(Self { conn })
    }

    // ── Records ──────────────────────────────────────────────────────

    /// Insert or replace one record together with its index entry.
    pub fn put(&mut self, record: &PhotoRecord) -> Result<()> {
        let tx = self.conn.transaction()?;
        upsert_in_tx(&tx, record)?;
        tx.commit()?;
        Ok(())
    }

    /// Insert or replace many records in a single transaction. Either all
    /// of them land or none do.
    pub fn put_batch(&mut self, records: &[PhotoRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let tx = self.conn.transaction()?;
        for record in records {
            upsert_in_tx(&tx, record)?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<PhotoRecord> {
        self.conn
            .query_row(
                "SELECT id, path, lat, lon, altitude, taken_at, album FROM photos WHERE id = ?1",
                params![id],
                row_to_record,
            )
            .optional()?
            .ok_or_else(|| Error::PhotoNotFound(id.to_string()))
    }

    pub fn count(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM photos", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    pub fn list_all(&self) -> Result<Vec<PhotoRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, path, lat, lon, altitude, taken_at, album FROM photos ORDER BY path",
        )?;
        let records = stmt
            .query_map([], row_to_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Delete every record whose path sits under the given root. Returns
    /// the number removed.
    pub fn remove_under(&mut self, root: &Path) -> Result<usize> {
        let ids: Vec<String> = self
            .list_all()?
            .into_iter()
            .filter(|record| record.path.starts_with(root))
            .map(|record| record.id)
            .collect();
        let tx = self.conn.transaction()?;
        for chunk in ids.chunks(DELETE_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            tx.execute(
                &format!("DELETE FROM geo_index WHERE photo_id IN ({placeholders})"),
                params_from_iter(chunk.iter()),
            )?;
            tx.execute(
                &format!("DELETE FROM photos WHERE id IN ({placeholders})"),
                params_from_iter(chunk.iter()),
            )?;
        }
        tx.commit()?;
        Ok(ids.len())
    }

    // ── Bounding-box queries ─────────────────────────────────────────

    /// All records inside the box, path-ordered. An east edge smaller than
    /// the west edge means the box crosses the antimeridian and is scanned
    /// as two longitude ranges.
    pub fn query_bounding_box(&self, bbox: &BoundingBox) -> Result<Vec<PhotoRecord>> {
        let mut records = if bbox.crosses_antimeridian() {
            let mut all = self.collect_candidates(bbox, bbox.west, 180.0)?;
            all.extend(self.collect_candidates(bbox, -180.0, bbox.east)?);
            all
        } else {
            self.collect_candidates(bbox, bbox.west, bbox.east)?
        };
        records.sort_by(|a, b| a.path.cmp(&b.path));
        // The two antimeridian sub-ranges can share a boundary cell.
        records.dedup_by(|a, b| a.id == b.id);
        Ok(records)
    }

    fn collect_candidates(
        &self,
        bbox: &BoundingBox,
        west: f64,
        east: f64,
    ) -> Result<Vec<PhotoRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT p.id, p.path, p.lat, p.lon, p.altitude, p.taken_at, p.album
             FROM geo_index g
             JOIN photos p ON p.id = g.photo_id
             WHERE g.cell_lat BETWEEN ?1 AND ?2
               AND g.cell_lon BETWEEN ?3 AND ?4",
        )?;
        let candidates = stmt
            .query_map(
                params![cell(bbox.south), cell(bbox.north), cell(west), cell(east)],
                row_to_record,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(candidates
            .into_iter()
            .filter(|record| bbox.contains(record.lat, record.lon))
            .collect())
    }

    /// Drop and rebuild every index entry from the stored records. Returns
    /// the number of entries written.
    pub fn rebuild_index(&mut self) -> Result<usize> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM geo_index", [])?;
        let mut rebuilt = 0;
        {
            let mut select = tx.prepare("SELECT id, lat, lon FROM photos")?;
            let mut insert = tx.prepare(
                "INSERT INTO geo_index (cell_lat, cell_lon, photo_id) VALUES (?1, ?2, ?3)",
            )?;
            let rows = select
                .query_map([], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, f64>(1)?,
                        row.get::<_, f64>(2)?,
                    ))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            for (id, lat, lon) in rows {
                insert.execute(params![cell(lat), cell(lon), id])?;
                rebuilt += 1;
            }
        }
        tx.commit()?;
        Ok(rebuilt)
    }

    /// Aggregates for the status dashboard in a single query.
    pub fn stats(&self) -> Result<AtlasStats> {
        let (total, albums, min_lat, max_lat, min_lon, max_lon, avg_lat, avg_lon) =
            self.conn.query_row(
                "SELECT COUNT(*), COUNT(DISTINCT album),
                        MIN(lat), MAX(lat), MIN(lon), MAX(lon),
                        AVG(lat), AVG(lon)
                 FROM photos",
                [],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, Option<f64>>(2)?,
                        row.get::<_, Option<f64>>(3)?,
                        row.get::<_, Option<f64>>(4)?,
                        row.get::<_, Option<f64>>(5)?,
                        row.get::<_, Option<f64>>(6)?,
                        row.get::<_, Option<f64>>(7)?,
                    ))
                },
            )?;
        let extent = match (min_lat, max_lat, min_lon, max_lon) {
            (Some(south), Some(north), Some(west), Some(east)) => Some(BoundingBox {
                south,
                west,
                north,
                east,
            }),
            _ => None,
        };
        Ok(AtlasStats {
            total_photos: total as u64,
            total_albums: albums as u64,
            extent,
            centroid: avg_lat.zip(avg_lon),
        })
    }

    // ── Config ───────────────────────────────────────────────────────

    pub fn set_config(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO config (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn get_config(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM config WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }
}

/// Writes the record and its index entry inside the caller's transaction.
/// A re-ingested record replaces both atomically, so a moved coordinate
/// never leaves a stale cell entry behind.
fn upsert_in_tx(tx: &rusqlite::Transaction<'_>, record: &PhotoRecord) -> Result<()> {
    tx.execute(
        "INSERT INTO photos (id, path, lat, lon, altitude, taken_at, album)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(id) DO UPDATE SET
            path = excluded.path, lat = excluded.lat, lon = excluded.lon,
            altitude = excluded.altitude, taken_at = excluded.taken_at,
            album = excluded.album",
        params![
            record.id,
            record.path.to_string_lossy().as_ref(),
            record.lat,
            record.lon,
            record.altitude,
            record.taken_at.map(|taken| taken.to_rfc3339()),
            record.album,
        ],
    )?;
    tx.execute(
        "DELETE FROM geo_index WHERE photo_id = ?1",
        params![record.id],
    )?;
    tx.execute(
        "INSERT INTO geo_index (cell_lat, cell_lon, photo_id) VALUES (?1, ?2, ?3)",
        params![cell(record.lat), cell(record.lon), record.id],
    )?;
    Ok(())
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<PhotoRecord> {
    let taken_at: Option<String> = row.get(5)?;
    Ok(PhotoRecord {
        id: row.get(0)?,
        path: PathBuf::from(row.get::<_, String>(1)?),
        lat: row.get(2)?,
        lon: row.get(3)?,
        altitude: row.get(4)?,
        taken_at: taken_at
            .and_then(|text| DateTime::parse_from_rfc3339(&text).ok())
            .map(|taken| taken.with_timezone(&Utc)),
        album: row.get(6)?,
    })
}

/// Cell coordinate for one axis. Floor keeps negative values on the
/// correct side of zero.
fn cell(value: f64) -> i64 {
    (value / CELL_SIZE_DEG).floor() as i64
}
