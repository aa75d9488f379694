use rusqlite::{Connection, OptionalExtension};

use crate::error::{Error, Result};

/// Schema generation this build reads and writes.
pub const SCHEMA_VERSION: i64 = 1;

pub fn initialize(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS photos (
            id          TEXT PRIMARY KEY,
            path        TEXT NOT NULL UNIQUE,
            lat         REAL NOT NULL,
            lon         REAL NOT NULL,
            altitude    REAL,
            taken_at    TEXT,
            album       TEXT
        );

        CREATE TABLE IF NOT EXISTS geo_index (
            cell_lat    INTEGER NOT NULL,
            cell_lon    INTEGER NOT NULL,
            photo_id    TEXT NOT NULL REFERENCES photos(id),
            PRIMARY KEY (cell_lat, cell_lon, photo_id)
        );

        CREATE INDEX IF NOT EXISTS idx_geo_index_photo ON geo_index(photo_id);

        CREATE TABLE IF NOT EXISTS config (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        ",
    )?;
    Ok(())
}

/// Records the schema version on fresh and legacy databases, and refuses
/// to open one written by a newer build.
pub fn migrate(conn: &Connection) -> Result<()> {
    let recorded: Option<String> = conn
        .query_row(
            "SELECT value FROM config WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()?;
    let db = recorded.and_then(|value| value.parse().ok()).unwrap_or(0);
    if db > SCHEMA_VERSION {
        return Err(Error::SchemaTooNew {
            db,
            code: SCHEMA_VERSION,
        });
    }
    conn.execute(
        "INSERT INTO config (key, value) VALUES ('schema_version', ?1)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        [SCHEMA_VERSION.to_string()],
    )?;
    Ok(())
}
