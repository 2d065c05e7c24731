use anyhow::Result;
use bincode::{deserialize, serialize};
use chrono::{DateTime, Utc};
use cinestack_models::MovieRecord;
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct RecordSnapshot {
    version: u32,
    saved_at: DateTime<Utc>,
    records: Vec<MovieRecord>,
}

/// On-disk snapshot of resolved movie records.
///
/// bincode wrapped in gzip. Lets the resolver answer repeat lookups across restarts
/// without a round trip to the backend.
pub struct RecordCacheStorage {
    cache_path: PathBuf,
}

impl RecordCacheStorage {
    pub fn new(cache_path: impl Into<PathBuf>) -> Self {
        Self { cache_path: cache_path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.cache_path
    }

    pub fn exists(&self) -> bool {
        self.cache_path.exists()
    }

    /// Load the snapshot. A missing file yields no records; an unreadable one is
    /// backed up next to the original and ignored.
    pub fn load(&self) -> Result<Vec<MovieRecord>> {
        if !self.cache_path.exists() {
            debug!("Record cache {:?} does not exist, starting empty", self.cache_path);
            return Ok(Vec::new());
        }

        let start = std::time::Instant::now();
        let data = std::fs::read(&self.cache_path)?;

        let snapshot = match decode(&data) {
            Ok(snapshot) if snapshot.version == SNAPSHOT_VERSION => snapshot,
            Ok(snapshot) => {
                self.back_up(&format!("version {} is not {}", snapshot.version, SNAPSHOT_VERSION));
                return Ok(Vec::new());
            }
            Err(e) => {
                self.back_up(&e.to_string());
                return Ok(Vec::new());
            }
        };

        info!(
            "Loaded {} cached movie records (saved {}) in {:?}",
            snapshot.records.len(),
            snapshot.saved_at.format("%Y-%m-%d %H:%M"),
            start.elapsed()
        );
        Ok(snapshot.records)
    }

    /// Write the snapshot atomically (temp file, then rename)
    pub fn save(&self, records: &[MovieRecord]) -> Result<()> {
        let start = std::time::Instant::now();
        let snapshot = RecordSnapshot {
            version: SNAPSHOT_VERSION,
            saved_at: Utc::now(),
            records: records.to_vec(),
        };
        let serialized = serialize(&snapshot)?;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&serialized)?;
        let encoded = encoder.finish()?;

        if let Some(parent) = self.cache_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let temp_path = self.cache_path.with_extension("tmp");
        std::fs::write(&temp_path, encoded)?;
        std::fs::rename(&temp_path, &self.cache_path)?;

        info!("Saved {} movie records in {:?}", records.len(), start.elapsed());
        Ok(())
    }

    pub fn clear(&self) -> Result<bool> {
        if self.cache_path.exists() {
            std::fs::remove_file(&self.cache_path)?;
            info!("Removed record cache {:?}", self.cache_path);
            return Ok(true);
        }
        Ok(false)
    }

    pub fn size(&self) -> Result<u64> {
        if self.cache_path.exists() {
            Ok(std::fs::metadata(&self.cache_path)?.len())
        } else {
            Ok(0)
        }
    }

    fn back_up(&self, reason: &str) {
        let backup_path = self.cache_path.with_extension("bin.bak");
        match std::fs::rename(&self.cache_path, &backup_path) {
            Ok(()) => info!(
                "Record cache unreadable ({}). Moved it to {:?} and starting empty.",
                reason, backup_path
            ),
            Err(e) => warn!("Record cache unreadable ({}) and backup failed: {}", reason, e),
        }
    }
}

fn decode(data: &[u8]) -> Result<RecordSnapshot> {
    let mut decoder = GzDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder.read_to_end(&mut decompressed)?;
    Ok(deserialize(&decompressed)?)
}
