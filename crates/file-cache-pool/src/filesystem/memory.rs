//! In-process backend, useful for tests and throwaway pools

use super::Filesystem;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Tree {
    files: BTreeMap<String, Vec<u8>>,
    dirs: BTreeSet<String>,
}

impl Tree {
    fn add_parents(&mut self, path: &str) {
        let mut current = path;
        while let Some((parent, _)) = current.rsplit_once('/') {
            self.dirs.insert(parent.to_string());
            current = parent;
        }
    }
}

/// Filesystem kept entirely in memory
#[derive(Debug, Default)]
pub struct MemoryFilesystem {
    tree: RwLock<Tree>,
}

impl MemoryFilesystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of files currently stored
    pub async fn file_count(&self) -> usize {
        self.tree.read().await.files.len()
    }
}

fn normalize(path: &str) -> String {
    path.trim_matches('/').to_string()
}

fn dir_prefix(dir: &str) -> String {
    let dir = normalize(dir);
    if dir.is_empty() {
        dir
    } else {
        format!("{}/", dir)
    }
}

#[async_trait]
impl Filesystem for MemoryFilesystem {
    async fn has(&self, path: &str) -> Result<bool> {
        let path = normalize(path);
        let tree = self.tree.read().await;
        Ok(tree.files.contains_key(&path) || tree.dirs.contains(&path))
    }

    async fn read(&self, path: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.tree.read().await.files.get(&normalize(path)).cloned())
    }

    async fn size(&self, path: &str) -> Result<Option<u64>> {
        Ok(self
            .tree
            .read()
            .await
            .files
            .get(&normalize(path))
            .map(|data| data.len() as u64))
    }

    async fn write(&self, path: &str, contents: &[u8]) -> Result<()> {
        let path = normalize(path);
        let mut tree = self.tree.write().await;
        tree.add_parents(&path);
        tree.files.insert(path, contents.to_vec());
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<bool> {
        Ok(self
            .tree
            .write()
            .await
            .files
            .remove(&normalize(path))
            .is_some())
    }

    async fn delete_dir(&self, path: &str) -> Result<bool> {
        let dir = normalize(path);
        let prefix = dir_prefix(&dir);
        let mut tree = self.tree.write().await;

        let existed = tree.dirs.remove(&dir);
        let files_before = tree.files.len();
        let dirs_before = tree.dirs.len();
        tree.files.retain(|p, _| !p.starts_with(&prefix));
        tree.dirs.retain(|p| !p.starts_with(&prefix));

        Ok(existed || tree.files.len() != files_before || tree.dirs.len() != dirs_before)
    }

    async fn create_dir(&self, path: &str) -> Result<()> {
        let dir = normalize(path);
        let mut tree = self.tree.write().await;
        tree.add_parents(&dir);
        tree.dirs.insert(dir);
        Ok(())
    }

    async fn list(&self, dir: &str) -> Result<Vec<String>> {
        let prefix = dir_prefix(dir);
        let tree = self.tree.read().await;
        Ok(tree
            .files
            .keys()
            .filter_map(|p| p.strip_prefix(&prefix))
            .filter(|rest| !rest.contains('/'))
            .map(str::to_string)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_creates_parent_dirs() {
        let fs = MemoryFilesystem::new();
        fs.write("cache/sub/file", b"data").await.unwrap();

        assert!(fs.has("cache").await.unwrap());
        assert!(fs.has("cache/sub").await.unwrap());
        assert!(fs.has("cache/sub/file").await.unwrap());
        assert_eq!(fs.read("cache/sub/file").await.unwrap().unwrap(), b"data");
        assert_eq!(fs.size("cache/sub/file").await.unwrap(), Some(4));
        assert!(fs.size("cache/sub").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_reports_presence() {
        let fs = MemoryFilesystem::new();
        fs.write("cache/k", b"v").await.unwrap();

        assert!(fs.delete("cache/k").await.unwrap());
        assert!(!fs.delete("cache/k").await.unwrap());
        assert_eq!(fs.file_count().await, 0);
    }

    #[tokio::test]
    async fn test_delete_dir_is_recursive_and_scoped() {
        let fs = MemoryFilesystem::new();
        fs.write("cache/a", b"1").await.unwrap();
        fs.write("cache/sub/b", b"2").await.unwrap();
        fs.write("cache2/c", b"3").await.unwrap();

        assert!(fs.delete_dir("cache").await.unwrap());
        assert!(!fs.has("cache").await.unwrap());
        assert!(!fs.has("cache/sub").await.unwrap());
        assert!(fs.has("cache2/c").await.unwrap());
        assert!(!fs.delete_dir("cache").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_direct_children_only() {
        let fs = MemoryFilesystem::new();
        fs.write("cache/b", b"2").await.unwrap();
        fs.write("cache/a", b"1").await.unwrap();
        fs.write("cache/sub/c", b"3").await.unwrap();

        assert_eq!(
            fs.list("cache").await.unwrap(),
            vec!["a".to_string(), "b".to_string()]
        );
        assert!(fs.list("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_dir_is_idempotent() {
        let fs = MemoryFilesystem::new();
        fs.create_dir("cache").await.unwrap();
        fs.create_dir("cache").await.unwrap();

        assert!(fs.has("cache").await.unwrap());
        assert!(fs.list("cache").await.unwrap().is_empty());
    }
}
