//! Tag lists: one file per tag holding the keys that carry it
//!
//! Lists are plain JSON arrays and are updated with read-modify-write, so two
//! concurrent writers can lose an update. Readers treat a list as a hint: a
//! listed key may already be gone, and deleting it again is harmless.

use crate::error::Result;
use crate::filesystem::{join, Filesystem};
use crate::key::TAG_PREFIX;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug)]
pub struct TagIndex<F> {
    fs: Arc<F>,
    folder: String,
}

impl<F: Filesystem> TagIndex<F> {
    pub fn new(fs: Arc<F>, folder: impl Into<String>) -> Self {
        Self {
            fs,
            folder: folder.into(),
        }
    }

    /// Path of the list file for `tag`
    pub fn tag_path(&self, tag: &str) -> String {
        join(&self.folder, &format!("{}{}", TAG_PREFIX, tag))
    }

    /// Keys listed under `tag`; empty when the list is missing or unreadable
    pub async fn get_list(&self, tag: &str) -> Result<Vec<String>> {
        let path = self.tag_path(tag);
        let Some(data) = self.fs.read(&path).await? else {
            return Ok(Vec::new());
        };

        match serde_json::from_slice::<Vec<String>>(&data) {
            Ok(keys) => Ok(keys),
            Err(e) => {
                warn!(tag = %tag, error = %e, "Corrupt tag list, ignoring");
                Ok(Vec::new())
            }
        }
    }

    /// Add `key` to the list of `tag` unless it is already there
    pub async fn append(&self, tag: &str, key: &str) -> Result<()> {
        let mut keys = self.get_list(tag).await?;
        if keys.iter().any(|k| k == key) {
            return Ok(());
        }
        keys.push(key.to_string());
        self.write_list(tag, &keys).await?;
        debug!(tag = %tag, key = %key, "Tagged key");
        Ok(())
    }

    /// Remove `key` from the list of `tag`, dropping the list once empty
    pub async fn remove_item(&self, tag: &str, key: &str) -> Result<()> {
        let mut keys = self.get_list(tag).await?;
        let before = keys.len();
        keys.retain(|k| k != key);
        if keys.len() == before {
            return Ok(());
        }

        if keys.is_empty() {
            self.remove_list(tag).await?;
        } else {
            self.write_list(tag, &keys).await?;
        }
        debug!(tag = %tag, key = %key, "Untagged key");
        Ok(())
    }

    /// Delete the whole list of `tag`
    pub async fn remove_list(&self, tag: &str) -> Result<bool> {
        self.fs.delete(&self.tag_path(tag)).await
    }

    async fn write_list(&self, tag: &str, keys: &[String]) -> Result<()> {
        let data = serde_json::to_vec(keys)?;
        self.fs.write(&self.tag_path(tag), &data).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::MemoryFilesystem;

    fn index() -> (Arc<MemoryFilesystem>, TagIndex<MemoryFilesystem>) {
        let fs = Arc::new(MemoryFilesystem::new());
        let index = TagIndex::new(fs.clone(), "cache");
        (fs, index)
    }

    #[test]
    fn test_tag_path() {
        let (_, index) = index();
        assert_eq!(index.tag_path("colors"), "cache/tag!colors");
    }

    #[tokio::test]
    async fn test_missing_list_is_empty() {
        let (_, index) = index();
        assert!(index.get_list("nothing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_dedups() {
        let (_, index) = index();
        index.append("colors", "red").await.unwrap();
        index.append("colors", "blue").await.unwrap();
        index.append("colors", "red").await.unwrap();

        assert_eq!(
            index.get_list("colors").await.unwrap(),
            vec!["red".to_string(), "blue".to_string()]
        );
    }

    #[tokio::test]
    async fn test_remove_item_drops_empty_list() {
        let (fs, index) = index();
        index.append("colors", "red").await.unwrap();
        index.append("colors", "blue").await.unwrap();

        index.remove_item("colors", "red").await.unwrap();
        assert_eq!(
            index.get_list("colors").await.unwrap(),
            vec!["blue".to_string()]
        );

        index.remove_item("colors", "blue").await.unwrap();
        assert!(!fs.has("cache/tag!colors").await.unwrap());

        // Removing from a missing list is a no-op
        index.remove_item("colors", "green").await.unwrap();
    }

    #[tokio::test]
    async fn test_remove_list() {
        let (_, index) = index();
        index.append("colors", "red").await.unwrap();

        assert!(index.remove_list("colors").await.unwrap());
        assert!(!index.remove_list("colors").await.unwrap());
        assert!(index.get_list("colors").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_list_reads_as_empty() {
        let (fs, index) = index();
        fs.write("cache/tag!colors", b"{oops").await.unwrap();

        assert!(index.get_list("colors").await.unwrap().is_empty());

        // Appending rewrites the list from scratch
        index.append("colors", "red").await.unwrap();
        assert_eq!(
            index.get_list("colors").await.unwrap(),
            vec!["red".to_string()]
        );
    }
}
