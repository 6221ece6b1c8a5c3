//! Plain key/value access on top of the item API

use crate::error::Result;
use crate::filesystem::Filesystem;
use crate::item::CacheItem;
use crate::key::validate_key;
use crate::pool::FilesystemCachePool;
use chrono::Duration;
use serde::de::DeserializeOwned;
use serde::Serialize;

impl<F: Filesystem> FilesystemCachePool<F> {
    /// Value stored under `key`, `None` on a miss
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.get_item(key).await?.get()
    }

    /// Value stored under `key`, or `default` on a miss
    pub async fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T> {
        Ok(self.get(key).await?.unwrap_or(default))
    }

    /// Store `value` under `key`. A ttl of zero or less deletes the key.
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<()> {
        self.set_with_tags(key, value, ttl, std::iter::empty::<String>())
            .await
    }

    pub async fn set_with_tags<T, I, S>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
        tags: I,
    ) -> Result<()>
    where
        T: Serialize + ?Sized,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        validate_key(key)?;
        if matches!(ttl, Some(ttl) if ttl <= Duration::zero()) {
            self.delete_item(key).await?;
            return Ok(());
        }

        let mut item = CacheItem::miss(key);
        item.set(value)?;
        item.set_tags(tags)?;
        item.expires_after(ttl)?;
        self.save(&item).await
    }

    /// Returns whether a stored value was removed
    pub async fn delete(&self, key: &str) -> Result<bool> {
        self.delete_item(key).await
    }

    pub async fn has(&self, key: &str) -> Result<bool> {
        self.has_item(key).await
    }

    /// Values for `keys` in order, paired with their key
    pub async fn get_multiple<T, S>(&self, keys: &[S]) -> Result<Vec<(String, Option<T>)>>
    where
        T: DeserializeOwned,
        S: AsRef<str>,
    {
        let items = self.get_items(keys).await?;
        let mut values = Vec::with_capacity(items.len());
        for item in items {
            let value = item.get()?;
            values.push((item.key().to_string(), value));
        }
        Ok(values)
    }

    /// Store every pair with the same ttl. All keys are validated first.
    pub async fn set_multiple<K, T>(&self, pairs: &[(K, T)], ttl: Option<Duration>) -> Result<()>
    where
        K: AsRef<str>,
        T: Serialize,
    {
        for (key, _) in pairs {
            validate_key(key.as_ref())?;
        }
        for (key, value) in pairs {
            self.set(key.as_ref(), value, ttl).await?;
        }
        Ok(())
    }

    /// Returns how many stored values were removed
    pub async fn delete_multiple<S: AsRef<str>>(&self, keys: &[S]) -> Result<usize> {
        self.delete_items(keys).await
    }
}
