//! Subcommands and their JSON output

use crate::error::Result;
use chrono::{DateTime, Duration, Utc};
use clap::Subcommand;
use file_cache_pool::{CachePoolError, Filesystem, FilesystemCachePool};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the item stored under a key
    Get { key: String },
    /// Store a value (JSON, or a plain string if it does not parse)
    Set {
        key: String,
        value: String,
        /// Expire after this many seconds
        #[arg(long)]
        ttl: Option<i64>,
        /// Tag to attach; may be repeated
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Delete one or more keys
    Delete {
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Delete every item carrying any of the given tags
    Invalidate {
        #[arg(required = true)]
        tags: Vec<String>,
    },
    /// Remove every item and tag list
    Clear,
    /// Remove expired and unreadable records
    Prune,
    /// Print pool statistics
    Stats,
}

#[derive(Debug, Serialize)]
pub struct ItemView {
    pub key: String,
    pub hit: bool,
    pub value: Option<Value>,
    pub expires_at: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
}

/// Run one command against the pool and return what should be printed
pub async fn run<F: Filesystem>(pool: &FilesystemCachePool<F>, command: Command) -> Result<Value> {
    let output = match command {
        Command::Get { key } => {
            let item = pool.get_item(&key).await?;
            let hit = item.is_hit();
            serde_json::to_value(ItemView {
                key,
                hit,
                value: if hit { item.value().cloned() } else { None },
                expires_at: item.expiration(),
                tags: item.previous_tags().iter().cloned().collect(),
            })?
        }
        Command::Set {
            key,
            value,
            ttl,
            tags,
        } => {
            let ttl = ttl
                .map(|secs| {
                    Duration::try_seconds(secs).ok_or_else(|| {
                        CachePoolError::InvalidTtl(format!("{} seconds is out of range", secs))
                    })
                })
                .transpose()?;
            let value = serde_json::from_str::<Value>(&value).unwrap_or(Value::String(value));
            pool.set_with_tags(&key, &value, ttl, tags).await?;
            info!(key = %key, "Stored item");
            serde_json::json!({ "stored": key })
        }
        Command::Delete { keys } => {
            let deleted = pool.delete_items(&keys).await?;
            serde_json::json!({ "deleted": deleted })
        }
        Command::Invalidate { tags } => {
            let invalidated = pool.invalidate_tags(&tags).await?;
            serde_json::json!({ "invalidated": invalidated })
        }
        Command::Clear => {
            pool.clear().await?;
            serde_json::json!({ "cleared": true })
        }
        Command::Prune => {
            let removed = pool.prune().await?;
            serde_json::json!({ "removed": removed })
        }
        Command::Stats => serde_json::to_value(pool.stats().await?)?,
    };
    Ok(output)
}
