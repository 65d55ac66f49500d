//! Match Cache and Ingestion
//!
//! Provider JSONL/JSON → MatchData → MessagePack → LZ4 → SHA256 checksum.
//! CSV export of trajectories, run frames and player statistics.

pub mod error;
pub mod export;
pub mod ingest;
pub mod store;

pub use error::StoreError;
pub use export::{
    write_batch_run_frames, write_player_stats, write_run_frames, write_trajectories, write_trajectories_file,
};
pub use ingest::{load_match_files, parse_metadata_json, parse_tracking_jsonl, IngestStats, TrackingTables};
pub use store::{
    checksum, DiskBackend, EntryMetadata, MatchStore, MemoryBackend, StoreBackend, SCHEMA_VERSION,
};
