pub mod ingest;
pub mod inspect;
pub mod ls;
pub mod markers;
pub mod reindex;
pub mod rm;
pub mod status;
