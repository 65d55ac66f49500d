//! Match Store
//!
//! MatchData → MessagePack → LZ4 → SHA256 checksum, keyed by match id.
//!
//! The byte storage is injectable: [`MemoryBackend`] for tests and
//! [`DiskBackend`] for a cache directory with one
//! `{match_id}.msgpack.lz4` payload and one `{match_id}.meta.json`
//! metadata file per match.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use rustc_hash::FxHashMap;
use sc_core::{MatchData, MatchSource};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Result, StoreError};

/// Layout version of stored payloads
pub const SCHEMA_VERSION: &str = "v1";

const PAYLOAD_EXT: &str = "msgpack.lz4";
const META_EXT: &str = "meta.json";

/// Stored entry metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryMetadata {
    pub match_id: String,
    /// Schema version (e.g. "v1")
    pub schema_version: String,
    /// SHA256 of the compressed payload (hex)
    pub checksum: String,
    /// Creation time (RFC3339)
    pub created_at: String,
    /// MessagePack size (bytes)
    pub original_size: u64,
    /// Size after LZ4 (bytes)
    pub compressed_size: u64,
    /// compressed / original
    pub compression_ratio: f64,
}

/// Byte storage behind a [`MatchStore`].
pub trait StoreBackend: Send + Sync {
    fn write(&self, match_id: &str, payload: &[u8], metadata: &EntryMetadata) -> Result<()>;
    fn read_payload(&self, match_id: &str) -> Result<Option<Vec<u8>>>;
    fn read_metadata(&self, match_id: &str) -> Result<Option<EntryMetadata>>;
    /// Stored match ids, sorted
    fn list(&self) -> Result<Vec<String>>;
    /// Returns whether an entry existed.
    fn remove(&self, match_id: &str) -> Result<bool>;
}

/// In-process storage.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RwLock<FxHashMap<String, (Vec<u8>, EntryMetadata)>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StoreBackend for MemoryBackend {
    fn write(&self, match_id: &str, payload: &[u8], metadata: &EntryMetadata) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(match_id.to_string(), (payload.to_vec(), metadata.clone()));
        Ok(())
    }

    fn read_payload(&self, match_id: &str) -> Result<Option<Vec<u8>>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(match_id).map(|(payload, _)| payload.clone()))
    }

    fn read_metadata(&self, match_id: &str) -> Result<Option<EntryMetadata>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(match_id).map(|(_, meta)| meta.clone()))
    }

    fn list(&self) -> Result<Vec<String>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        let mut ids: Vec<String> = entries.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    fn remove(&self, match_id: &str) -> Result<bool> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        Ok(entries.remove(match_id).is_some())
    }
}

/// Cache directory storage.
#[derive(Debug, Clone)]
pub struct DiskBackend {
    root: PathBuf,
}

impl DiskBackend {
    /// Open `root`, creating it when missing.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn payload_path(&self, match_id: &str) -> PathBuf {
        self.root.join(format!("{match_id}.{PAYLOAD_EXT}"))
    }

    pub fn metadata_path(&self, match_id: &str) -> PathBuf {
        self.root.join(format!("{match_id}.{META_EXT}"))
    }
}

fn read_optional(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

impl StoreBackend for DiskBackend {
    fn write(&self, match_id: &str, payload: &[u8], metadata: &EntryMetadata) -> Result<()> {
        fs::write(self.payload_path(match_id), payload)?;
        fs::write(self.metadata_path(match_id), serde_json::to_string_pretty(metadata)?)?;
        Ok(())
    }

    fn read_payload(&self, match_id: &str) -> Result<Option<Vec<u8>>> {
        read_optional(&self.payload_path(match_id))
    }

    fn read_metadata(&self, match_id: &str) -> Result<Option<EntryMetadata>> {
        match read_optional(&self.metadata_path(match_id))? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn list(&self) -> Result<Vec<String>> {
        let suffix = format!(".{META_EXT}");
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let name = entry?.file_name();
            if let Some(id) = name.to_str().and_then(|n| n.strip_suffix(&suffix)) {
                ids.push(id.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn remove(&self, match_id: &str) -> Result<bool> {
        let mut existed = false;
        for path in [self.payload_path(match_id), self.metadata_path(match_id)] {
            match fs::remove_file(&path) {
                Ok(()) => existed = true,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(existed)
    }
}

/// SHA256 hex digest.
pub fn checksum(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Match ids become file names, so path syntax is rejected.
fn validate_match_id(match_id: &str) -> Result<()> {
    let valid = !match_id.is_empty()
        && match_id != "."
        && match_id != ".."
        && !match_id.contains(['/', '\\', '\0']);
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidMatchId {
            match_id: match_id.to_string(),
        })
    }
}

/// Content-addressed match cache.
#[derive(Debug)]
pub struct MatchStore<B: StoreBackend> {
    backend: B,
}

impl MatchStore<MemoryBackend> {
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }
}

impl MatchStore<DiskBackend> {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self::new(DiskBackend::open(root)?))
    }
}

impl<B: StoreBackend> MatchStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Encode and store `data` under its match id, replacing any previous entry.
    pub fn put(&self, data: &MatchData) -> Result<EntryMetadata> {
        let match_id = data.match_id();
        validate_match_id(match_id)?;

        let msgpack_bytes = rmp_serde::to_vec_named(data)?;
        let original_size = msgpack_bytes.len() as u64;
        let compressed = lz4_flex::compress_prepend_size(&msgpack_bytes);
        let compressed_size = compressed.len() as u64;

        let metadata = EntryMetadata {
            match_id: match_id.to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            checksum: checksum(&compressed),
            created_at: chrono::Utc::now().to_rfc3339(),
            original_size,
            compressed_size,
            compression_ratio: if original_size > 0 {
                compressed_size as f64 / original_size as f64
            } else {
                0.0
            },
        };
        self.backend.write(match_id, &compressed, &metadata)?;

        log::info!(
            "stored match {}: {} samples, {} → {} bytes",
            match_id,
            data.tracking.len(),
            original_size,
            compressed_size
        );
        Ok(metadata)
    }

    pub fn metadata(&self, match_id: &str) -> Result<EntryMetadata> {
        validate_match_id(match_id)?;
        self.backend
            .read_metadata(match_id)?
            .ok_or_else(|| StoreError::NotFound {
                match_id: match_id.to_string(),
            })
    }

    pub fn contains(&self, match_id: &str) -> Result<bool> {
        validate_match_id(match_id)?;
        Ok(self.backend.read_metadata(match_id)?.is_some())
    }

    pub fn list(&self) -> Result<Vec<String>> {
        self.backend.list()
    }

    pub fn remove(&self, match_id: &str) -> Result<bool> {
        validate_match_id(match_id)?;
        self.backend.remove(match_id)
    }

    /// Payload of `match_id` after checksum verification.
    fn verified_payload(&self, match_id: &str) -> Result<(Vec<u8>, EntryMetadata)> {
        let metadata = self.metadata(match_id)?;
        let payload = self
            .backend
            .read_payload(match_id)?
            .ok_or_else(|| StoreError::NotFound {
                match_id: match_id.to_string(),
            })?;

        let actual = checksum(&payload);
        if actual != metadata.checksum {
            return Err(StoreError::ChecksumMismatch {
                match_id: match_id.to_string(),
                expected: metadata.checksum,
                actual,
            });
        }
        Ok((payload, metadata))
    }

    /// Check the integrity of a stored entry.
    pub fn verify(&self, match_id: &str) -> Result<EntryMetadata> {
        self.verified_payload(match_id).map(|(_, metadata)| metadata)
    }

    /// Load and decode a stored match.
    ///
    /// # Errors
    /// `StoreError::NotFound` for unknown ids, `StoreError::ChecksumMismatch`
    /// when the payload no longer matches its recorded checksum.
    pub fn get(&self, match_id: &str) -> Result<MatchData> {
        let (compressed, _) = self.verified_payload(match_id)?;
        let msgpack_bytes = lz4_flex::decompress_size_prepended(&compressed)?;
        let data: MatchData = rmp_serde::from_slice(&msgpack_bytes)?;
        log::debug!("loaded match {} ({} samples)", match_id, data.tracking.len());
        Ok(data)
    }
}

impl<B: StoreBackend> MatchSource for MatchStore<B> {
    fn load_match(&self, match_id: &str) -> anyhow::Result<MatchData> {
        Ok(self.get(match_id)?)
    }
}
