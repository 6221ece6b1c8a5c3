//! Filesystem-backed cache pool with expiration and tag-based invalidation
//!
//! Items are stored as JSON records under a single folder of a pluggable
//! [`Filesystem`]. Each tag keeps a flat list of the keys carrying it, so a
//! whole group of items can be invalidated at once. Saves may be deferred and
//! flushed later with [`FilesystemCachePool::commit`].

pub mod config;
pub mod error;
pub mod filesystem;
pub mod item;
pub mod key;
pub mod pool;
mod record;
pub mod simple;
pub mod tag_index;
pub mod types;

pub use config::PoolConfig;
pub use error::{CachePoolError, Result};
pub use filesystem::{Filesystem, LocalFilesystem, MemoryFilesystem};
pub use item::CacheItem;
pub use pool::FilesystemCachePool;
pub use tag_index::TagIndex;
pub use types::CacheStats;
