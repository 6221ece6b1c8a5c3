//! Cache pool over a pluggable filesystem
//!
//! Every item lives in its own file `<folder>/<key>` as a JSON record holding
//! the value, the expiry timestamp and the item's tags. Tag membership is kept
//! in separate list files managed by [`TagIndex`]. None of the multi-file
//! operations are atomic; a crash or a concurrent writer can leave a tag list
//! pointing at a key that no longer exists, which every reader tolerates.

use crate::error::Result;
use crate::filesystem::{join, Filesystem};
use crate::item::{expiry_after, CacheItem};
use crate::key::{validate_folder, validate_key, validate_tag, TAG_PREFIX};
use crate::record::StoredRecord;
use crate::tag_index::TagIndex;
use crate::types::CacheStats;
use chrono::{Duration, Utc};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Folder used when none is configured
pub const DEFAULT_FOLDER: &str = "cache";

/// A cache pool storing items as files
#[derive(Debug)]
pub struct FilesystemCachePool<F> {
    fs: Arc<F>,
    folder: String,
    tags: TagIndex<F>,
    /// Applied on save to items without an explicit expiration
    default_ttl: Option<Duration>,
    /// Items queued by `save_deferred`, keyed by cache key
    deferred: Mutex<HashMap<String, CacheItem>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<F: Filesystem> FilesystemCachePool<F> {
    /// Create a pool storing its files under [`DEFAULT_FOLDER`]
    pub fn new(fs: F) -> Self {
        Self::from_arc(Arc::new(fs))
    }

    /// Create a pool over a filesystem shared with other users
    pub fn from_arc(fs: Arc<F>) -> Self {
        Self {
            tags: TagIndex::new(fs.clone(), DEFAULT_FOLDER),
            fs,
            folder: DEFAULT_FOLDER.to_string(),
            default_ttl: None,
            deferred: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Store files under `folder` instead of the default
    pub fn with_folder(mut self, folder: &str) -> Result<Self> {
        validate_folder(folder)?;
        self.folder = folder.to_string();
        self.tags = TagIndex::new(self.fs.clone(), folder);
        Ok(self)
    }

    /// Expire items saved without an expiration after `ttl`
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    pub fn folder(&self) -> &str {
        &self.folder
    }

    pub fn filesystem(&self) -> &Arc<F> {
        &self.fs
    }

    pub fn tag_index(&self) -> &TagIndex<F> {
        &self.tags
    }

    /// Initialize the pool by ensuring its folder exists
    pub async fn init(&self) -> Result<()> {
        self.fs.create_dir(&self.folder).await?;
        info!(folder = %self.folder, "Cache pool initialized");
        Ok(())
    }

    fn item_path(&self, key: &str) -> String {
        join(&self.folder, key)
    }

    /// Read and decode the record for `key`. Corrupt records are removed and
    /// reported as absent.
    async fn read_record(&self, key: &str) -> Result<Option<StoredRecord>> {
        let path = self.item_path(key);
        let Some(data) = self.fs.read(&path).await? else {
            return Ok(None);
        };

        match serde_json::from_slice::<StoredRecord>(&data) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                warn!(key = %key, error = %e, "Corrupt cache record, removing");
                self.fs.delete(&path).await?;
                Ok(None)
            }
        }
    }

    /// Load an item from storage, dropping it if it has expired
    async fn fetch(&self, key: &str) -> Result<CacheItem> {
        let Some(record) = self.read_record(key).await? else {
            return Ok(CacheItem::miss(key));
        };

        if record.is_expired_at(Utc::now()) {
            debug!(key = %key, expires_at = ?record.expires_at, "Cache entry expired");
            self.remove_stored(key, &record.tags).await?;
            return Ok(CacheItem::miss(key));
        }

        let expiration = record.expiration();
        Ok(CacheItem::loaded(key, record.value, expiration, record.tags))
    }

    /// Detach `key` from `tags` and delete its record. Returns whether a
    /// record was present.
    async fn remove_stored(&self, key: &str, tags: &[String]) -> Result<bool> {
        for tag in tags {
            self.tags.remove_item(tag, key).await?;
        }
        self.fs.delete(&self.item_path(key)).await
    }

    /// Remove one key from the queue and from storage
    async fn delete_entry(&self, key: &str) -> Result<bool> {
        self.deferred.lock().await.remove(key);
        let stored_tags = self
            .read_record(key)
            .await?
            .map(|record| record.tags)
            .unwrap_or_default();
        let existed = self.remove_stored(key, &stored_tags).await?;
        debug!(key = %key, existed, "Deleted cache entry");
        Ok(existed)
    }

    fn record_lookup(&self, item: &CacheItem) {
        if item.is_hit() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(key = %item.key(), "Cache hit");
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            debug!(key = %item.key(), "Cache miss");
        }
    }

    /// Get the item for `key`. A miss is returned as an item that is not a hit.
    pub async fn get_item(&self, key: &str) -> Result<CacheItem> {
        validate_key(key)?;

        let queued = {
            let deferred = self.deferred.lock().await;
            deferred.get(key).map(CacheItem::from_deferred)
        };

        let item = match queued {
            Some(item) => item,
            None => self.fetch(key).await?,
        };
        self.record_lookup(&item);
        Ok(item)
    }

    /// Get the items for `keys`, in the same order. All keys are validated
    /// before anything is read.
    pub async fn get_items<S: AsRef<str>>(&self, keys: &[S]) -> Result<Vec<CacheItem>> {
        for key in keys {
            validate_key(key.as_ref())?;
        }

        let mut items = Vec::with_capacity(keys.len());
        for key in keys {
            items.push(self.get_item(key.as_ref()).await?);
        }
        Ok(items)
    }

    pub async fn has_item(&self, key: &str) -> Result<bool> {
        Ok(self.get_item(key).await?.is_hit())
    }

    /// Persist an item right away.
    ///
    /// An item whose expiration has already passed is deleted instead.
    pub async fn save(&self, item: &CacheItem) -> Result<()> {
        let key = item.key();
        validate_key(key)?;

        let now = Utc::now();
        let expiration = item
            .expiration()
            .map(Ok)
            .or_else(|| self.default_ttl.map(|ttl| expiry_after(now, ttl)))
            .transpose()?;

        if matches!(expiration, Some(at) if at < now) {
            debug!(key = %key, "Saving already expired item, deleting instead");
            self.delete_entry(key).await?;
            return Ok(());
        }

        self.deferred.lock().await.remove(key);

        let stored_tags = self
            .read_record(key)
            .await?
            .map(|record| record.tags)
            .unwrap_or_default();

        let record = StoredRecord {
            expires_at: expiration.map(|at| at.timestamp()),
            value: item.value().cloned().unwrap_or(Value::Null),
            tags: item.tags().iter().cloned().collect(),
        };
        let data = serde_json::to_vec(&record)?;
        self.fs.write(&self.item_path(key), &data).await?;

        for tag in stored_tags.iter().filter(|t| !item.tags().contains(*t)) {
            self.tags.remove_item(tag, key).await?;
        }
        for tag in item.tags() {
            self.tags.append(tag, key).await?;
        }

        debug!(key = %key, size = data.len(), tags = item.tags().len(), "Saved cache entry");
        Ok(())
    }

    /// Queue an item to be persisted by [`commit`](Self::commit)
    pub async fn save_deferred(&self, item: CacheItem) -> Result<()> {
        validate_key(item.key())?;
        self.deferred
            .lock()
            .await
            .insert(item.key().to_string(), item);
        Ok(())
    }

    /// Number of items waiting for [`commit`](Self::commit)
    pub async fn deferred_len(&self) -> usize {
        self.deferred.lock().await.len()
    }

    /// Persist every queued item.
    ///
    /// All items are attempted even if some fail; the first error is returned.
    pub async fn commit(&self) -> Result<()> {
        let items: Vec<CacheItem> = {
            let mut deferred = self.deferred.lock().await;
            deferred.drain().map(|(_, item)| item).collect()
        };

        let total = items.len();
        let mut failed = 0usize;
        let mut first_error = None;

        for item in &items {
            if let Err(e) = self.save(item).await {
                warn!(key = %item.key(), error = %e, "Failed to save deferred item");
                failed += 1;
                first_error.get_or_insert(e);
            }
        }

        debug!(total, failed, "Committed deferred items");
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Delete one item. Returns whether a stored record was removed.
    pub async fn delete_item(&self, key: &str) -> Result<bool> {
        validate_key(key)?;
        self.delete_entry(key).await
    }

    /// Delete several items. All keys are validated before anything is deleted;
    /// keys that are not cached are skipped silently. Returns how many stored
    /// records were removed.
    pub async fn delete_items<S: AsRef<str>>(&self, keys: &[S]) -> Result<usize> {
        for key in keys {
            validate_key(key.as_ref())?;
        }
        let mut deleted = 0usize;
        for key in keys {
            if self.delete_entry(key.as_ref()).await? {
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    /// Drop every item and tag list, including queued items
    pub async fn clear(&self) -> Result<()> {
        let dropped = {
            let mut deferred = self.deferred.lock().await;
            let count = deferred.len();
            deferred.clear();
            count
        };

        self.fs.delete_dir(&self.folder).await?;
        self.fs.create_dir(&self.folder).await?;

        info!(folder = %self.folder, deferred_dropped = dropped, "Cache pool cleared");
        Ok(())
    }

    pub async fn invalidate_tag(&self, tag: &str) -> Result<usize> {
        self.invalidate_tags(&[tag]).await
    }

    /// Delete every item carrying any of `tags`, then the tag lists themselves.
    ///
    /// Queued items carrying one of the tags are dropped as well. Returns the
    /// number of distinct keys that were listed under the tags.
    pub async fn invalidate_tags<S: AsRef<str>>(&self, tags: &[S]) -> Result<usize> {
        for tag in tags {
            validate_tag(tag.as_ref())?;
        }
        let tags: BTreeSet<&str> = tags.iter().map(|t| t.as_ref()).collect();

        let mut keys = BTreeSet::new();
        for tag in &tags {
            keys.extend(self.tags.get_list(tag).await?);
        }

        self.deferred
            .lock()
            .await
            .retain(|_, item| !item.tags().iter().any(|t| tags.contains(t.as_str())));

        for key in &keys {
            if let Err(e) = validate_key(key) {
                warn!(key = %key, error = %e, "Skipping invalid key found in tag list");
                continue;
            }
            self.delete_entry(key).await?;
        }

        for tag in &tags {
            self.tags.remove_list(tag).await?;
        }

        info!(tags = ?tags, keys = keys.len(), "Invalidated tags");
        Ok(keys.len())
    }

    /// Delete every expired or unreadable record. Returns how many were removed.
    pub async fn prune(&self) -> Result<usize> {
        let now = Utc::now();
        let mut removed = 0usize;

        for name in self.fs.list(&self.folder).await? {
            if name.starts_with(TAG_PREFIX) || validate_key(&name).is_err() {
                continue;
            }

            let path = self.item_path(&name);
            let Some(data) = self.fs.read(&path).await? else {
                continue;
            };

            match serde_json::from_slice::<StoredRecord>(&data) {
                Ok(record) if record.is_expired_at(now) => {
                    self.remove_stored(&name, &record.tags).await?;
                    removed += 1;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(key = %name, error = %e, "Corrupt cache record, removing");
                    self.fs.delete(&path).await?;
                    removed += 1;
                }
            }
        }

        info!(folder = %self.folder, removed, "Pruned cache pool");
        Ok(removed)
    }

    /// Get current cache statistics
    pub async fn stats(&self) -> Result<CacheStats> {
        let mut stats = CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            ..CacheStats::default()
        };

        for name in self.fs.list(&self.folder).await? {
            if name.starts_with(TAG_PREFIX) {
                stats.tags += 1;
            } else if validate_key(&name).is_ok() {
                stats.entries += 1;
                stats.total_size += self
                    .fs
                    .size(&self.item_path(&name))
                    .await?
                    .unwrap_or(0);
            }
        }

        Ok(stats)
    }
}

impl<F> Drop for FilesystemCachePool<F> {
    fn drop(&mut self) {
        let pending = self.deferred.get_mut().len();
        if pending > 0 {
            warn!(
                folder = %self.folder,
                pending,
                "Cache pool dropped with uncommitted deferred items"
            );
        }
    }
}
