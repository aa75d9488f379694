use std::fs;
use std::path::Path;
use std::sync::atomic::AtomicBool;

use photoatlas_core::domain::{BoundingBox, IngestOutcome, SkipReason};
use photoatlas_core::extract::FileExifSource;
use photoatlas_core::query::QueryError;
use photoatlas_core::{Atlas, IngestProgress};

// ── EXIF fixture builder ─────────────────────────────────────────

fn push_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn push_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn push_entry(buf: &mut Vec<u8>, tag: u16, kind: u16, count: u32, value: u32) {
    push_u16(buf, tag);
    push_u16(buf, kind);
    push_u32(buf, count);
    push_u32(buf, value);
}

fn push_rational(buf: &mut Vec<u8>, num: u32, den: u32) {
    push_u32(buf, num);
    push_u32(buf, den);
}

/// Build a minimal JPEG whose APP1 segment carries GPS EXIF metadata.
///
/// The TIFF block is little-endian with a fixed layout: IFD0 points at the
/// Exif and GPS sub-IFDs, the Exif IFD holds the capture timestamp, and the
/// GPS IFD holds degree/minute/second rationals plus the altitude. A
/// negative `altitude` sets the below-sea-level reference byte.
fn geotagged_jpeg(
    lat: (u32, u32, f64),
    lat_ref: char,
    lon: (u32, u32, f64),
    lon_ref: char,
    altitude: f64,
    taken: &str,
) -> Vec<u8> {
    const EXIF_IFD: u32 = 38;
    const GPS_IFD: u32 = 56;
    const DATETIME_AT: u32 = 134;
    const LAT_AT: u32 = 154;
    const LON_AT: u32 = 178;
    const ALT_AT: u32 = 202;

    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"II");
    push_u16(&mut tiff, 42);
    push_u32(&mut tiff, 8);

    // IFD0: pointers to the Exif and GPS sub-IFDs
    push_u16(&mut tiff, 2);
    push_entry(&mut tiff, 0x8769, 4, 1, EXIF_IFD);
    push_entry(&mut tiff, 0x8825, 4, 1, GPS_IFD);
    push_u32(&mut tiff, 0);

    // Exif IFD: DateTimeOriginal
    push_u16(&mut tiff, 1);
    push_entry(&mut tiff, 0x9003, 2, 20, DATETIME_AT);
    push_u32(&mut tiff, 0);

    // GPS IFD: refs inline, rationals out of line
    push_u16(&mut tiff, 6);
    push_entry(&mut tiff, 0x0001, 2, 2, lat_ref as u32);
    push_entry(&mut tiff, 0x0002, 5, 3, LAT_AT);
    push_entry(&mut tiff, 0x0003, 2, 2, lon_ref as u32);
    push_entry(&mut tiff, 0x0004, 5, 3, LON_AT);
    push_entry(&mut tiff, 0x0005, 1, 1, u32::from(altitude < 0.0));
    push_entry(&mut tiff, 0x0006, 5, 1, ALT_AT);
    push_u32(&mut tiff, 0);

    assert_eq!(tiff.len() as u32, DATETIME_AT);
    assert_eq!(taken.len(), 19, "timestamp must be YYYY:MM:DD HH:MM:SS");
    tiff.extend_from_slice(taken.as_bytes());
    tiff.push(0);

    for (dms, at) in [(lat, LAT_AT), (lon, LON_AT)] {
        assert_eq!(tiff.len() as u32, at);
        push_rational(&mut tiff, dms.0, 1);
        push_rational(&mut tiff, dms.1, 1);
        push_rational(&mut tiff, (dms.2 * 10_000.0).round() as u32, 10_000);
    }

    assert_eq!(tiff.len() as u32, ALT_AT);
    push_rational(&mut tiff, (altitude.abs() * 100.0).round() as u32, 100);

    let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE1];
    let payload_len = (tiff.len() + 8) as u16;
    jpeg.extend_from_slice(&payload_len.to_be_bytes());
    jpeg.extend_from_slice(b"Exif\0\0");
    jpeg.extend_from_slice(&tiff);
    jpeg.extend_from_slice(&[0xFF, 0xD9]);
    jpeg
}

/// A valid JPEG container with no EXIF segment at all.
fn plain_jpeg() -> Vec<u8> {
    vec![0xFF, 0xD8, 0xFF, 0xD9]
}

fn paris_jpeg() -> Vec<u8> {
    // 48°51'29.6"N 2°17'40.2"E, the Eiffel Tower
    geotagged_jpeg(
        (48, 51, 29.6),
        'N',
        (2, 17, 40.2),
        'E',
        35.0,
        "2023:06:10 14:30:52",
    )
}

fn tokyo_jpeg() -> Vec<u8> {
    geotagged_jpeg(
        (35, 40, 53.1),
        'N',
        (139, 45, 31.4),
        'E',
        40.0,
        "2023:11:02 09:15:00",
    )
}

fn write_photo(path: &Path, bytes: Vec<u8>) {
    fs::write(path, bytes).unwrap();
}

fn open_atlas(db: &Path) -> Atlas {
    Atlas::open_with_source(db, Box::new(FileExifSource::new())).unwrap()
}

fn world() -> BoundingBox {
    BoundingBox::new(-90.0, -180.0, 90.0, 180.0).unwrap()
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-4
}

// ── Atlas::open ──────────────────────────────────────────────────

#[test]
fn test_open_creates_index_file() {
    let tmp = tempfile::tempdir().unwrap();
    let db_path = tmp.path().join("sub/dir/atlas.db");

    let _atlas = open_atlas(&db_path);
    assert!(db_path.exists());
}

#[test]
fn test_open_reopen_persists() {
    let tmp = tempfile::tempdir().unwrap();
    let db_path = tmp.path().join("atlas.db");
    let photos = tmp.path().join("photos");
    fs::create_dir_all(&photos).unwrap();
    write_photo(&photos.join("paris.jpg"), paris_jpeg());

    {
        let mut atlas = open_atlas(&db_path);
        atlas.ingest(&photos, None, None).unwrap();
    }

    let atlas = open_atlas(&db_path);
    assert_eq!(atlas.count().unwrap(), 1);
}

// ── Ingest: happy path ───────────────────────────────────────────

#[test]
fn test_ingest_indexes_geotagged_photos() {
    let tmp = tempfile::tempdir().unwrap();
    let photos = tmp.path().join("photos");
    fs::create_dir_all(&photos).unwrap();

    write_photo(&photos.join("paris.jpg"), paris_jpeg());
    write_photo(&photos.join("tokyo.jpg"), tokyo_jpeg());

    let mut atlas = open_atlas(&tmp.path().join("atlas.db"));
    let outcomes = atlas.ingest(&photos, None, None).unwrap();

    assert_eq!(outcomes.len(), 2);
    assert!(outcomes
        .iter()
        .all(|o| matches!(o, IngestOutcome::Indexed(_))));
    assert_eq!(atlas.count().unwrap(), 2);
}

#[test]
fn test_paris_photo_found_in_paris_box() {
    let tmp = tempfile::tempdir().unwrap();
    let photos = tmp.path().join("photos");
    fs::create_dir_all(&photos).unwrap();
    write_photo(&photos.join("eiffel.jpg"), paris_jpeg());

    let mut atlas = open_atlas(&tmp.path().join("atlas.db"));
    atlas.ingest(&photos, None, None).unwrap();

    let paris_box = BoundingBox::new(48.0, 2.0, 49.0, 3.0).unwrap();
    let markers = atlas.markers(&paris_box).unwrap();
    assert_eq!(markers.len(), 1);
    assert!(
        approx(markers[0].lat, 48.8582),
        "latitude was {}",
        markers[0].lat
    );
    assert!(
        approx(markers[0].lon, 2.2945),
        "longitude was {}",
        markers[0].lon
    );

    let atlantic_box = BoundingBox::new(0.0, 0.0, 1.0, 1.0).unwrap();
    assert!(atlas.markers(&atlantic_box).unwrap().is_empty());
}

#[test]
fn test_southern_western_hemispheres_signed_negative() {
    let tmp = tempfile::tempdir().unwrap();
    let photos = tmp.path().join("photos");
    fs::create_dir_all(&photos).unwrap();

    // 33°27'0"S 70°40'0"W, Santiago
    write_photo(
        &photos.join("santiago.jpg"),
        geotagged_jpeg(
            (33, 27, 0.0),
            'S',
            (70, 40, 0.0),
            'W',
            520.0,
            "2024:01:15 18:00:00",
        ),
    );

    let mut atlas = open_atlas(&tmp.path().join("atlas.db"));
    atlas.ingest(&photos, None, None).unwrap();

    let markers = atlas.markers(&world()).unwrap();
    assert_eq!(markers.len(), 1);
    assert!(approx(markers[0].lat, -33.45));
    assert!(approx(markers[0].lon, -(70.0 + 40.0 / 60.0)));
}

#[test]
fn test_altitude_and_timestamp_stored() {
    let tmp = tempfile::tempdir().unwrap();
    let photos = tmp.path().join("photos");
    fs::create_dir_all(&photos).unwrap();

    // Negative altitude sets the below-sea-level reference byte
    write_photo(
        &photos.join("deadsea.jpg"),
        geotagged_jpeg(
            (31, 30, 0.0),
            'N',
            (35, 28, 0.0),
            'E',
            -430.5,
            "2022:08:01 11:22:33",
        ),
    );

    let mut atlas = open_atlas(&tmp.path().join("atlas.db"));
    let outcomes = atlas.ingest(&photos, None, None).unwrap();

    let IngestOutcome::Indexed(record) = &outcomes[0] else {
        panic!("expected an indexed outcome, got {:?}", outcomes[0]);
    };
    let stored = atlas.get(&record.id).unwrap();
    assert!(approx(stored.altitude.unwrap(), -430.5));
    let taken = stored.taken_at.unwrap();
    assert_eq!(taken.to_rfc3339(), "2022-08-01T11:22:33+00:00");
}

#[test]
fn test_album_comes_from_parent_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let album_dir = tmp.path().join("photos/summer-2023");
    fs::create_dir_all(&album_dir).unwrap();
    write_photo(&album_dir.join("eiffel.jpg"), paris_jpeg());

    let mut atlas = open_atlas(&tmp.path().join("atlas.db"));
    atlas.ingest(&tmp.path().join("photos"), None, None).unwrap();

    let records = atlas.photos().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].album.as_deref(), Some("summer-2023"));
}

#[test]
fn test_nested_directories_discovered() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("photos");
    let deep = root.join("2023/june/paris");
    fs::create_dir_all(&deep).unwrap();

    write_photo(&root.join("top.jpg"), tokyo_jpeg());
    write_photo(&deep.join("nested.jpg"), paris_jpeg());

    let mut atlas = open_atlas(&tmp.path().join("atlas.db"));
    atlas.ingest(&root, None, None).unwrap();

    assert_eq!(atlas.count().unwrap(), 2);
}

// ── Ingest: skips and failures ───────────────────────────────────

#[test]
fn test_corrupt_file_fails_without_stopping_ingest() {
    let tmp = tempfile::tempdir().unwrap();
    let photos = tmp.path().join("photos");
    fs::create_dir_all(&photos).unwrap();

    write_photo(&photos.join("a.jpg"), paris_jpeg());
    write_photo(&photos.join("b.jpg"), tokyo_jpeg());
    write_photo(
        &photos.join("c.jpg"),
        geotagged_jpeg(
            (51, 30, 26.0),
            'N',
            (0, 7, 39.0),
            'W',
            11.0,
            "2023:03:03 08:00:00",
        ),
    );
    // Zero-byte file cannot be parsed at all
    fs::write(photos.join("broken.jpg"), b"").unwrap();

    let mut atlas = open_atlas(&tmp.path().join("atlas.db"));
    let outcomes = atlas.ingest(&photos, None, None).unwrap();

    let indexed = outcomes
        .iter()
        .filter(|o| matches!(o, IngestOutcome::Indexed(_)))
        .count();
    let failed: Vec<_> = outcomes
        .iter()
        .filter_map(|o| match o {
            IngestOutcome::Failed { path, .. } => Some(path.clone()),
            _ => None,
        })
        .collect();

    assert_eq!(indexed, 3);
    assert_eq!(failed.len(), 1);
    assert!(failed[0].ends_with("broken.jpg"));
    assert_eq!(atlas.count().unwrap(), 3);
}

#[test]
fn test_photo_without_gps_is_skipped_and_never_queryable() {
    let tmp = tempfile::tempdir().unwrap();
    let photos = tmp.path().join("photos");
    fs::create_dir_all(&photos).unwrap();
    write_photo(&photos.join("indoor.jpg"), plain_jpeg());

    let mut atlas = open_atlas(&tmp.path().join("atlas.db"));
    let outcomes = atlas.ingest(&photos, None, None).unwrap();

    assert!(matches!(
        &outcomes[0],
        IngestOutcome::Skipped {
            reason: SkipReason::NoGps,
            ..
        }
    ));
    assert_eq!(atlas.count().unwrap(), 0);
    assert!(atlas.markers(&world()).unwrap().is_empty());
}

#[test]
fn test_non_image_files_are_skipped_as_unsupported() {
    let tmp = tempfile::tempdir().unwrap();
    let photos = tmp.path().join("photos");
    fs::create_dir_all(&photos).unwrap();

    fs::write(photos.join("notes.txt"), b"not a photo").unwrap();
    fs::write(photos.join("clip.mp4"), b"not a photo either").unwrap();
    write_photo(&photos.join("real.jpg"), paris_jpeg());

    let mut atlas = open_atlas(&tmp.path().join("atlas.db"));
    let outcomes = atlas.ingest(&photos, None, None).unwrap();

    let unsupported = outcomes
        .iter()
        .filter(|o| {
            matches!(
                o,
                IngestOutcome::Skipped {
                    reason: SkipReason::UnsupportedType,
                    ..
                }
            )
        })
        .count();
    assert_eq!(unsupported, 2);
    assert_eq!(atlas.count().unwrap(), 1);
}

#[test]
fn test_ingest_missing_root_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    let mut atlas = open_atlas(&tmp.path().join("atlas.db"));

    let err = atlas
        .ingest(Path::new("/nonexistent/photos"), None, None)
        .unwrap_err();
    assert!(err.to_string().contains("does not exist"));
}

#[test]
fn test_ingest_file_root_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    let file_path = tmp.path().join("photo.jpg");
    write_photo(&file_path, paris_jpeg());

    let mut atlas = open_atlas(&tmp.path().join("atlas.db"));
    let err = atlas.ingest(&file_path, None, None).unwrap_err();
    assert!(err.to_string().contains("not a directory"));
}

// ── Ingest: idempotence and overwrite ────────────────────────────

#[test]
fn test_reingest_is_idempotent() {
    let tmp = tempfile::tempdir().unwrap();
    let photos = tmp.path().join("photos");
    fs::create_dir_all(&photos).unwrap();
    write_photo(&photos.join("paris.jpg"), paris_jpeg());
    write_photo(&photos.join("tokyo.jpg"), tokyo_jpeg());

    let mut atlas = open_atlas(&tmp.path().join("atlas.db"));
    atlas.ingest(&photos, None, None).unwrap();
    let first = atlas.markers(&world()).unwrap();

    atlas.ingest(&photos, None, None).unwrap();
    let second = atlas.markers(&world()).unwrap();

    assert_eq!(atlas.count().unwrap(), 2);
    assert_eq!(first, second);
}

#[test]
fn test_reingest_moves_photo_to_new_location() {
    let tmp = tempfile::tempdir().unwrap();
    let photos = tmp.path().join("photos");
    fs::create_dir_all(&photos).unwrap();
    let path = photos.join("shot.jpg");

    write_photo(&path, paris_jpeg());
    let mut atlas = open_atlas(&tmp.path().join("atlas.db"));
    atlas.ingest(&photos, None, None).unwrap();

    // Same file, new coordinates: the marker must move, not duplicate
    write_photo(&path, tokyo_jpeg());
    atlas.ingest(&photos, None, None).unwrap();

    assert_eq!(atlas.count().unwrap(), 1);
    let paris_box = BoundingBox::new(48.0, 2.0, 49.0, 3.0).unwrap();
    let tokyo_box = BoundingBox::new(35.0, 139.0, 36.0, 140.0).unwrap();
    assert!(atlas.markers(&paris_box).unwrap().is_empty());
    assert_eq!(atlas.markers(&tokyo_box).unwrap().len(), 1);
}

// ── Query: bounding boxes ────────────────────────────────────────

#[test]
fn test_box_edges_are_inclusive() {
    let tmp = tempfile::tempdir().unwrap();
    let photos = tmp.path().join("photos");
    fs::create_dir_all(&photos).unwrap();

    // Exactly 48°N 2°E
    write_photo(
        &photos.join("corner.jpg"),
        geotagged_jpeg(
            (48, 0, 0.0),
            'N',
            (2, 0, 0.0),
            'E',
            0.0,
            "2023:05:05 05:05:05",
        ),
    );

    let mut atlas = open_atlas(&tmp.path().join("atlas.db"));
    atlas.ingest(&photos, None, None).unwrap();

    // The photo sits on the south-west corner of one box and the
    // north-east corner of the other; both must include it.
    let sw_corner = BoundingBox::new(48.0, 2.0, 49.0, 3.0).unwrap();
    let ne_corner = BoundingBox::new(47.0, 1.0, 48.0, 2.0).unwrap();
    assert_eq!(atlas.markers(&sw_corner).unwrap().len(), 1);
    assert_eq!(atlas.markers(&ne_corner).unwrap().len(), 1);
}

#[test]
fn test_antimeridian_box_finds_both_sides() {
    let tmp = tempfile::tempdir().unwrap();
    let photos = tmp.path().join("photos");
    fs::create_dir_all(&photos).unwrap();

    // 16°48'S 179°54'E and 16°48'S 179°54'W, either side of the line near Fiji
    write_photo(
        &photos.join("east.jpg"),
        geotagged_jpeg(
            (16, 48, 0.0),
            'S',
            (179, 54, 0.0),
            'E',
            5.0,
            "2023:07:07 07:07:07",
        ),
    );
    write_photo(
        &photos.join("west.jpg"),
        geotagged_jpeg(
            (16, 48, 0.0),
            'S',
            (179, 54, 0.0),
            'W',
            5.0,
            "2023:07:07 07:08:08",
        ),
    );
    // Control photo far away
    write_photo(&photos.join("paris.jpg"), paris_jpeg());

    let mut atlas = open_atlas(&tmp.path().join("atlas.db"));
    atlas.ingest(&photos, None, None).unwrap();

    // east < west wraps across the antimeridian
    let fiji_box = BoundingBox::new(-18.0, 179.0, -15.0, -179.0).unwrap();
    let markers = atlas.markers(&fiji_box).unwrap();
    assert_eq!(markers.len(), 2);
    assert!(markers.iter().any(|m| m.lon > 179.0));
    assert!(markers.iter().any(|m| m.lon < -179.0));
}

// ── Query: photo payloads ────────────────────────────────────────

#[test]
fn test_photo_bytes_roundtrip() {
    let tmp = tempfile::tempdir().unwrap();
    let photos = tmp.path().join("photos");
    fs::create_dir_all(&photos).unwrap();
    let path = photos.join("eiffel.jpg");
    write_photo(&path, paris_jpeg());

    let mut atlas = open_atlas(&tmp.path().join("atlas.db"));
    atlas.ingest(&photos, None, None).unwrap();

    let markers = atlas.markers(&world()).unwrap();
    let (bytes, mime) = atlas.photo_bytes(&markers[0].id).unwrap();
    assert_eq!(bytes, fs::read(&path).unwrap());
    assert_eq!(mime, "image/jpeg");
}

#[test]
fn test_photo_bytes_unknown_id_is_not_found() {
    let tmp = tempfile::tempdir().unwrap();
    let atlas = open_atlas(&tmp.path().join("atlas.db"));

    let err = atlas.photo_bytes("no-such-photo").unwrap_err();
    assert!(matches!(err, QueryError::NotFound(_)));
}

// ── Concurrency and cancellation ─────────────────────────────────

#[test]
fn test_concurrent_ingestion_both_photos_retrievable() {
    let tmp = tempfile::tempdir().unwrap();
    let db_path = tmp.path().join("atlas.db");
    let dir_a = tmp.path().join("a");
    let dir_b = tmp.path().join("b");
    fs::create_dir_all(&dir_a).unwrap();
    fs::create_dir_all(&dir_b).unwrap();
    write_photo(&dir_a.join("paris.jpg"), paris_jpeg());
    write_photo(&dir_b.join("tokyo.jpg"), tokyo_jpeg());

    let mut atlas_a = open_atlas(&db_path);
    let mut atlas_b = open_atlas(&db_path);

    let handle_a = std::thread::spawn(move || atlas_a.ingest(&dir_a, None, None).unwrap());
    let handle_b = std::thread::spawn(move || atlas_b.ingest(&dir_b, None, None).unwrap());
    let outcomes_a = handle_a.join().unwrap();
    let outcomes_b = handle_b.join().unwrap();

    assert!(matches!(&outcomes_a[0], IngestOutcome::Indexed(_)));
    assert!(matches!(&outcomes_b[0], IngestOutcome::Indexed(_)));

    let atlas = open_atlas(&db_path);
    assert_eq!(atlas.count().unwrap(), 2);
    assert_eq!(atlas.markers(&world()).unwrap().len(), 2);
}

#[test]
fn test_cancelled_ingest_leaves_consistent_state() {
    let tmp = tempfile::tempdir().unwrap();
    let photos = tmp.path().join("photos");
    fs::create_dir_all(&photos).unwrap();
    write_photo(&photos.join("paris.jpg"), paris_jpeg());

    let mut atlas = open_atlas(&tmp.path().join("atlas.db"));
    let cancel = AtomicBool::new(true);
    let outcomes = atlas.ingest(&photos, Some(&cancel), None).unwrap();

    assert!(outcomes.is_empty());
    assert_eq!(atlas.count().unwrap(), 0);
    assert!(atlas.markers(&world()).unwrap().is_empty());
}

// ── Ingest progress callback ─────────────────────────────────────

#[test]
fn test_ingest_progress_callback() {
    let tmp = tempfile::tempdir().unwrap();
    let photos = tmp.path().join("photos");
    fs::create_dir_all(&photos).unwrap();
    write_photo(&photos.join("a.jpg"), paris_jpeg());
    write_photo(&photos.join("b.jpg"), tokyo_jpeg());

    let mut atlas = open_atlas(&tmp.path().join("atlas.db"));
    let mut events = Vec::new();
    atlas
        .ingest(
            &photos,
            None,
            Some(&mut |progress| match progress {
                IngestProgress::ScanStart { file_count, .. } => {
                    events.push(format!("start:{file_count}"));
                }
                IngestProgress::FileDone { .. } => events.push("file".to_string()),
                IngestProgress::PhaseComplete { phase } => events.push(format!("phase:{phase}")),
            }),
        )
        .unwrap();

    assert_eq!(events.first(), Some(&"start:2".to_string()));
    assert_eq!(events.iter().filter(|e| *e == "file").count(), 2);
    assert_eq!(events.last(), Some(&"phase:indexing".to_string()));
}

// ── Removal and reindex ──────────────────────────────────────────

#[test]
fn test_remove_root_clears_photos_and_markers() {
    let tmp = tempfile::tempdir().unwrap();
    let keep = tmp.path().join("keep");
    let drop_dir = tmp.path().join("drop");
    fs::create_dir_all(&keep).unwrap();
    fs::create_dir_all(&drop_dir).unwrap();
    write_photo(&keep.join("paris.jpg"), paris_jpeg());
    write_photo(&drop_dir.join("tokyo.jpg"), tokyo_jpeg());

    let mut atlas = open_atlas(&tmp.path().join("atlas.db"));
    atlas.ingest(&keep, None, None).unwrap();
    atlas.ingest(&drop_dir, None, None).unwrap();
    assert_eq!(atlas.count().unwrap(), 2);

    let removed = atlas.remove_root(&drop_dir).unwrap();
    assert_eq!(removed, 1);
    assert_eq!(atlas.count().unwrap(), 1);

    let markers = atlas.markers(&world()).unwrap();
    assert_eq!(markers.len(), 1);
    assert!(markers[0].path.starts_with(keep.canonicalize().unwrap()));
}

#[test]
fn test_rebuild_index_restores_queryability() {
    let tmp = tempfile::tempdir().unwrap();
    let photos = tmp.path().join("photos");
    fs::create_dir_all(&photos).unwrap();
    write_photo(&photos.join("paris.jpg"), paris_jpeg());
    write_photo(&photos.join("tokyo.jpg"), tokyo_jpeg());

    let mut atlas = open_atlas(&tmp.path().join("atlas.db"));
    atlas.ingest(&photos, None, None).unwrap();

    let rebuilt = atlas.rebuild_index().unwrap();
    assert_eq!(rebuilt, 2);
    assert_eq!(atlas.markers(&world()).unwrap().len(), 2);
}

// ── Status ───────────────────────────────────────────────────────

#[test]
fn test_status_empty_index() {
    let tmp = tempfile::tempdir().unwrap();
    let atlas = open_atlas(&tmp.path().join("atlas.db"));

    let stats = atlas.status().unwrap();
    assert_eq!(stats.total_photos, 0);
    assert_eq!(stats.total_albums, 0);
    assert!(stats.extent.is_none());
    assert!(stats.centroid.is_none());
}

#[test]
fn test_status_reports_extent_and_centroid() {
    let tmp = tempfile::tempdir().unwrap();
    let photos = tmp.path().join("photos");
    fs::create_dir_all(&photos).unwrap();
    write_photo(&photos.join("paris.jpg"), paris_jpeg());
    write_photo(&photos.join("tokyo.jpg"), tokyo_jpeg());

    let mut atlas = open_atlas(&tmp.path().join("atlas.db"));
    atlas.ingest(&photos, None, None).unwrap();

    let stats = atlas.status().unwrap();
    assert_eq!(stats.total_photos, 2);
    assert_eq!(stats.total_albums, 1);

    let extent = stats.extent.unwrap();
    assert!(approx(extent.south, 35.6814), "south was {}", extent.south);
    assert!(approx(extent.north, 48.8582), "north was {}", extent.north);
    assert!(approx(extent.west, 2.2945), "west was {}", extent.west);
    assert!(approx(extent.east, 139.7587), "east was {}", extent.east);

    let (lat, lon) = stats.centroid.unwrap();
    assert!(approx(lat, (35.6814 + 48.8582) / 2.0), "lat was {lat}");
    assert!(approx(lon, (2.2945 + 139.7587) / 2.0), "lon was {lon}");
}

// ── Paths with odd names ─────────────────────────────────────────

#[test]
fn test_paths_with_spaces_and_unicode() {
    let tmp = tempfile::tempdir().unwrap();
    let photos = tmp.path().join("photos/été 2023");
    fs::create_dir_all(&photos).unwrap();
    let path = photos.join("tour eiffel (1).jpg");
    write_photo(&path, paris_jpeg());

    let mut atlas = open_atlas(&tmp.path().join("atlas.db"));
    atlas.ingest(&tmp.path().join("photos"), None, None).unwrap();

    let markers = atlas.markers(&world()).unwrap();
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].album.as_deref(), Some("été 2023"));

    let (bytes, _) = atlas.photo_bytes(&markers[0].id).unwrap();
    assert_eq!(bytes, fs::read(&path).unwrap());
}
