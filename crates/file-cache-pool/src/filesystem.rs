//! Pluggable storage backend for the cache pool
//!
//! Paths are relative and `/`-separated. Implementations decide what they are
//! relative to (a root directory, an in-memory map, a remote bucket).

mod local;
mod memory;

pub use local::LocalFilesystem;
pub use memory::MemoryFilesystem;

use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait Filesystem: Send + Sync {
    /// Whether a file or directory exists at `path`
    async fn has(&self, path: &str) -> Result<bool>;

    /// Read a whole file, `None` if it does not exist.
    ///
    /// A file may disappear between a [`has`](Filesystem::has) check and the
    /// read; that case is reported as `None` as well.
    async fn read(&self, path: &str) -> Result<Option<Vec<u8>>>;

    /// Size of a file in bytes, `None` if it does not exist
    async fn size(&self, path: &str) -> Result<Option<u64>>;

    /// Create or overwrite a file, creating parent directories as needed
    async fn write(&self, path: &str, contents: &[u8]) -> Result<()>;

    /// Delete a file, returns `false` if it was absent
    async fn delete(&self, path: &str) -> Result<bool>;

    /// Recursively delete a directory, returns `false` if it was absent
    async fn delete_dir(&self, path: &str) -> Result<bool>;

    /// Recursively create a directory; succeeds if it already exists
    async fn create_dir(&self, path: &str) -> Result<()>;

    /// Names of the files directly inside `dir`, empty if `dir` does not exist
    async fn list(&self, dir: &str) -> Result<Vec<String>>;
}

/// Join a directory and a file name into a backend path
pub(crate) fn join(dir: &str, name: &str) -> String {
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}
