//! Timestamped snapshot stores.
//!
//! A snapshot is the body of a successful response, stored under the URL's
//! [`snapshot_path`] and the unix timestamp at which it was observed. Writing
//! the same URL and timestamp twice stores the same content, so concurrent
//! writers need no locking beyond an atomic rename.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use url::Url;

use super::path::{PathOptions, snapshot_path};
use crate::error::{Result, ResultExt};

const SNAPSHOT_EXTENSION: &str = "snapshot";

/// Unique suffix for temporary files of concurrent writers.
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A cached provider response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub url: String,
    /// Unix timestamp (seconds) at which the response was observed
    pub timestamp: i64,
    pub content: Vec<u8>,
    /// Whether the response was fetched live for this request
    pub is_fresh: bool,
}

/// Storage for snapshots.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// The freshest snapshot of `url`, at or before `max_timestamp` if given.
    async fn latest(&self, url: &Url, max_timestamp: Option<i64>) -> Result<Option<Snapshot>>;

    /// Store a snapshot. Idempotent for the same URL and timestamp.
    async fn store(&self, url: &Url, timestamp: i64, content: &[u8]) -> Result<()>;
}

/// Snapshot store on the local file system.
pub struct DiskSnapshotStore {
    root: PathBuf,
    options: PathOptions,
}

impl DiskSnapshotStore {
    /// Create a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>, options: PathOptions) -> Self {
        Self {
            root: root.into(),
            options,
        }
    }

    /// Create a store in the default location (user cache directory).
    pub fn default_location(options: PathOptions) -> Self {
        let root = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from(".cache"))
            .join("release-harmonizer")
            .join("snapshots");
        Self::new(root, options)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding all snapshots of `url`.
    pub fn snapshot_dir(&self, url: &Url) -> PathBuf {
        self.root.join(snapshot_path(url, &self.options))
    }

    /// Timestamps of all stored snapshots of `url`, ascending.
    async fn timestamps(&self, dir: &Path) -> Result<Vec<i64>> {
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e).with_context(format!("reading {}", dir.display())),
        };

        let mut timestamps = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(SNAPSHOT_EXTENSION) {
                continue;
            }
            if let Some(timestamp) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<i64>().ok())
            {
                timestamps.push(timestamp);
            }
        }
        timestamps.sort_unstable();
        Ok(timestamps)
    }
}

#[async_trait]
impl SnapshotStore for DiskSnapshotStore {
    async fn latest(&self, url: &Url, max_timestamp: Option<i64>) -> Result<Option<Snapshot>> {
        let dir = self.snapshot_dir(url);
        let timestamps = self.timestamps(&dir).await?;

        let Some(timestamp) = timestamps
            .into_iter()
            .rev()
            .find(|ts| max_timestamp.is_none_or(|max| *ts <= max))
        else {
            return Ok(None);
        };

        let path = dir.join(format!("{}.{}", timestamp, SNAPSHOT_EXTENSION));
        let content = tokio::fs::read(&path)
            .await
            .with_context(format!("reading snapshot {}", path.display()))?;

        tracing::debug!(url = %url, timestamp, "Snapshot cache hit");
        Ok(Some(Snapshot {
            url: url.to_string(),
            timestamp,
            content,
            is_fresh: false,
        }))
    }

    async fn store(&self, url: &Url, timestamp: i64, content: &[u8]) -> Result<()> {
        let dir = self.snapshot_dir(url);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(format!("creating {}", dir.display()))?;

        let path = dir.join(format!("{}.{}", timestamp, SNAPSHOT_EXTENSION));
        let temp_path = dir.join(format!(
            "{}.tmp-{}-{}",
            timestamp,
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        // Write atomically (write to temp, then rename)
        tokio::fs::write(&temp_path, content)
            .await
            .with_context(format!("writing {}", temp_path.display()))?;
        tokio::fs::rename(&temp_path, &path)
            .await
            .with_context(format!("renaming {}", temp_path.display()))?;

        tracing::debug!(url = %url, timestamp, "Stored snapshot");
        Ok(())
    }
}

/// Snapshot store kept in memory, keyed like the disk store.
#[derive(Default)]
pub struct MemorySnapshotStore {
    options: PathOptions,
    snapshots: Mutex<HashMap<PathBuf, BTreeMap<i64, Vec<u8>>>>,
}

impl MemorySnapshotStore {
    pub fn new(options: PathOptions) -> Self {
        Self {
            options,
            snapshots: Mutex::new(HashMap::new()),
        }
    }

    /// Number of stored snapshots across all URLs.
    pub fn len(&self) -> usize {
        self.snapshots.lock().values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn latest(&self, url: &Url, max_timestamp: Option<i64>) -> Result<Option<Snapshot>> {
        let key = snapshot_path(url, &self.options);
        let snapshots = self.snapshots.lock();
        let found = snapshots.get(&key).and_then(|versions| match max_timestamp {
            Some(max) => versions.range(..=max).next_back(),
            None => versions.iter().next_back(),
        });
        Ok(found.map(|(timestamp, content)| Snapshot {
            url: url.to_string(),
            timestamp: *timestamp,
            content: content.clone(),
            is_fresh: false,
        }))
    }

    async fn store(&self, url: &Url, timestamp: i64, content: &[u8]) -> Result<()> {
        let key = snapshot_path(url, &self.options);
        self.snapshots
            .lock()
            .entry(key)
            .or_default()
            .insert(timestamp, content.to_vec());
        Ok(())
    }
}
