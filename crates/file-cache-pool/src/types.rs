//! Cache types

use serde::{Deserialize, Serialize};

/// Statistics about the cache pool
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of item records in the folder
    pub entries: usize,
    /// Number of tag lists in the folder
    pub tags: usize,
    /// Total size of the item records in bytes
    pub total_size: u64,
    pub hits: u64,
    pub misses: u64,
}
