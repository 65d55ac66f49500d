use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Match not found in store: {match_id}")]
    NotFound { match_id: String },

    #[error("Invalid match id: {match_id:?}")]
    InvalidMatchId { match_id: String },

    #[error("Checksum mismatch for match {match_id}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        match_id: String,
        expected: String,
        actual: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("MessagePack encode error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("MessagePack decode error: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    #[error("LZ4 decompression error: {0}")]
    Decompress(#[from] lz4_flex::block::DecompressError),

    #[error("Entry metadata error: {0}")]
    Metadata(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
