use crate::error::{CachePoolError, Result};
use crate::filesystem::LocalFilesystem;
use crate::pool::{FilesystemCachePool, DEFAULT_FOLDER};
use chrono::Duration;
use std::env;
use std::path::PathBuf;

/// Pool configuration parsed from environment variables
#[derive(Debug, Clone, PartialEq)]
pub struct PoolConfig {
    /// Directory the local filesystem is rooted at
    pub root_dir: PathBuf,
    /// Folder inside the root holding items and tag lists
    pub folder: String,
    pub default_ttl_secs: Option<u64>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("./var/cache-pool"),
            folder: DEFAULT_FOLDER.to_string(),
            default_ttl_secs: None,
        }
    }
}

impl PoolConfig {
    /// Parse configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let root_dir = env::var("CACHE_ROOT")
            .map(PathBuf::from)
            .unwrap_or(defaults.root_dir);

        let folder = env::var("CACHE_FOLDER").unwrap_or(defaults.folder);

        let default_ttl_secs = env::var("CACHE_DEFAULT_TTL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok());

        Self {
            root_dir,
            folder,
            default_ttl_secs,
        }
    }

    /// Build a pool on the local disk from this configuration
    pub fn build(&self) -> Result<FilesystemCachePool<LocalFilesystem>> {
        let mut pool = FilesystemCachePool::new(LocalFilesystem::new(&self.root_dir))
            .with_folder(&self.folder)?;
        if let Some(secs) = self.default_ttl_secs {
            let ttl = i64::try_from(secs)
                .ok()
                .and_then(Duration::try_seconds)
                .ok_or_else(|| {
                    CachePoolError::InvalidTtl(format!("{} seconds is out of range", secs))
                })?;
            pool = pool.with_default_ttl(ttl);
        }
        Ok(pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = PoolConfig::default();
        assert_eq!(config.root_dir, PathBuf::from("./var/cache-pool"));
        assert_eq!(config.folder, "cache");
        assert_eq!(config.default_ttl_secs, None);
    }

    #[test]
    fn test_build_rejects_bad_folder() {
        let config = PoolConfig {
            folder: "a/b".to_string(),
            ..PoolConfig::default()
        };
        assert!(config.build().is_err());
    }

    #[test]
    fn test_build_rejects_out_of_range_ttl() {
        for secs in [u64::MAX, i64::MAX as u64] {
            let config = PoolConfig {
                default_ttl_secs: Some(secs),
                ..PoolConfig::default()
            };
            let err = config.build().unwrap_err();
            assert!(matches!(err, CachePoolError::InvalidTtl(_)));
        }
    }

    #[tokio::test]
    async fn test_build_huge_default_ttl_fails_on_save() {
        let dir = tempdir().unwrap();
        let config = PoolConfig {
            root_dir: dir.path().to_path_buf(),
            folder: "items".to_string(),
            default_ttl_secs: Some(10_000_000_000_000),
        };

        // Representable as a duration, but not as a date once added to now
        let pool = config.build().unwrap();
        pool.init().await.unwrap();
        let err = pool.set("k", "v", None).await.unwrap_err();
        assert!(matches!(err, CachePoolError::InvalidTtl(_)));
        assert!(!dir.path().join("items").join("k").exists());
    }

    #[tokio::test]
    async fn test_build_local_pool() {
        let dir = tempdir().unwrap();
        let config = PoolConfig {
            root_dir: dir.path().to_path_buf(),
            folder: "items".to_string(),
            default_ttl_secs: Some(60),
        };

        let pool = config.build().unwrap();
        pool.init().await.unwrap();
        pool.set("k", "v", None).await.unwrap();

        assert!(dir.path().join("items").join("k").is_file());
        let item = pool.get_item("k").await.unwrap();
        assert!(item.expiration().is_some());
    }
}
