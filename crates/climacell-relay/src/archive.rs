//! Snapshot archive: immutable named blobs plus range read-back.
//!
//! Every archived snapshot is one blob named
//! `<category>-<YYYYMMDD>-<HHMMSS>` holding the UTF-8 JSON text of one
//! fetch response. The zero-padded encoding makes ascending name order
//! chronological, which is what the range selector assumes.
//!
//! ```text
//! POST /store/{kind}/ ──► Archiver::store_snapshot ──► BlobStore::put
//! GET  /store/{kind}/ ──► Archiver::materialize ──► list ─► offsets ─► get
//!                                                     │
//!                                                     └─► normalize ─► tag
//! ```

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{RelayError, Result};
use crate::fetch::ForecastKind;
use crate::range;
use crate::tz;

/// Timestamp layout embedded in blob names.
const NAME_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// One stored blob: its name and the creation time decoded from it.
#[derive(Debug, Clone, Serialize)]
pub struct BlobRecord {
    pub name: String,
    pub dateobj: DateTime<Utc>,
}

/// One normalized payload (or one element of an hourly payload sequence)
/// tagged with its source blob.
#[derive(Debug, Clone, Serialize)]
pub struct StoredRecord {
    pub name: String,
    pub data: Value,
}

/// A requested read-back window.
#[derive(Debug, Clone)]
pub enum RangeQuery {
    /// The N most recent snapshots.
    LastN(usize),
    /// Snapshots between two named blobs, newest-first.
    Between { start: String, end: String },
}

/// Blob storage seam: immutable named payload snapshots.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, name: &str, bytes: &[u8]) -> Result<()>;

    /// Fetch a blob's content; a missing name is [`RelayError::NameNotFound`].
    async fn get(&self, name: &str) -> Result<Vec<u8>>;

    /// Names starting with `<prefix>-`, in ascending order.
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;
}

/// Filesystem-backed blob store, one file per snapshot under a root
/// directory.
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, name: &str, bytes: &[u8]) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.root.join(name), bytes).await?;
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Vec<u8>> {
        match tokio::fs::read(self.root.join(name)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(RelayError::NameNotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let mut dir = match tokio::fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            // Nothing archived yet.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let wanted = format!("{prefix}-");
        let mut names = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with(&wanted) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }
}

/// Persists raw snapshots and materializes normalized range queries.
pub struct Archiver {
    store: Arc<dyn BlobStore>,
    source: Tz,
    target: Tz,
}

impl Archiver {
    pub fn new(store: Arc<dyn BlobStore>, source: Tz, target: Tz) -> Self {
        Self {
            store,
            source,
            target,
        }
    }

    /// Persist one raw payload under a timestamp-derived name.
    pub async fn store_snapshot(&self, kind: ForecastKind, payload: &str) -> Result<BlobRecord> {
        let now = Utc::now();
        let name = blob_name(kind, now);
        self.store.put(&name, payload.as_bytes()).await?;
        log::info!("Archived {name} ({} bytes)", payload.len());

        // dateobj is second-resolution, matching what a later listing decodes.
        let dateobj = parse_blob_date(kind, &name)
            .ok_or_else(|| RelayError::Config(format!("unparseable blob name '{name}'")))?;
        Ok(BlobRecord { name, dateobj })
    }

    /// All stored blobs of a category, ascending, with decoded creation
    /// times. Blobs whose names do not decode are skipped.
    pub async fn list(&self, kind: ForecastKind) -> Result<Vec<BlobRecord>> {
        let names = self.store.list(kind.as_str()).await?;
        let mut records = Vec::with_capacity(names.len());
        for name in names {
            match parse_blob_date(kind, &name) {
                Some(dateobj) => records.push(BlobRecord { name, dateobj }),
                None => log::warn!("Skipping blob with unparseable name '{name}'"),
            }
        }
        Ok(records)
    }

    /// Resolve a range query against the stored blobs and return the
    /// normalized, name-tagged records, in offset (newest-first) order.
    ///
    /// A sequence payload (the hourly case bundles many time slices per
    /// blob) is flattened into one record per element; an object payload
    /// (the realtime case) yields exactly one record.
    pub async fn materialize(
        &self,
        kind: ForecastKind,
        query: RangeQuery,
    ) -> Result<Vec<StoredRecord>> {
        let names = self.store.list(kind.as_str()).await?;
        let offsets = match &query {
            RangeQuery::LastN(n) => range::last_n(*n),
            RangeQuery::Between { start, end } => range::between(&names, start, end)?,
        };

        let mut records = Vec::new();
        for index in range::resolve(&offsets, names.len()) {
            let name = &names[index];
            let bytes = self.store.get(name).await?;
            let payload: Value = serde_json::from_slice(&bytes)?;
            match tz::normalize(payload, self.source, self.target) {
                Value::Array(items) => {
                    records.extend(items.into_iter().map(|data| StoredRecord {
                        name: name.clone(),
                        data,
                    }));
                }
                data => records.push(StoredRecord {
                    name: name.clone(),
                    data,
                }),
            }
        }
        Ok(records)
    }
}

/// `<category>-<YYYYMMDD>-<HHMMSS>` for the given instant.
pub fn blob_name(kind: ForecastKind, at: DateTime<Utc>) -> String {
    format!("{}-{}", kind.as_str(), at.format(NAME_TIMESTAMP_FORMAT))
}

fn parse_blob_date(kind: ForecastKind, name: &str) -> Option<DateTime<Utc>> {
    let rest = name.strip_prefix(kind.as_str())?.strip_prefix('-')?;
    NaiveDateTime::parse_from_str(rest, NAME_TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}
