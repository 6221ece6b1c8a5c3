//! Cache items handed out and accepted by the pool

use crate::error::{CachePoolError, Result};
use crate::key::validate_tag;
use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;

/// A single cache entry: key, serialized value, expiration and tags
#[derive(Debug, Clone, PartialEq)]
pub struct CacheItem {
    key: String,
    value: Option<Value>,
    has_value: bool,
    expiration: Option<DateTime<Utc>>,
    tags: BTreeSet<String>,
    previous_tags: BTreeSet<String>,
}

impl CacheItem {
    /// An empty item for `key`. The key is validated by the pool, not here.
    pub(crate) fn miss(key: &str) -> Self {
        Self {
            key: key.to_string(),
            value: None,
            has_value: false,
            expiration: None,
            tags: BTreeSet::new(),
            previous_tags: BTreeSet::new(),
        }
    }

    /// An item loaded from storage; stored tags become the previous tags
    pub(crate) fn loaded(
        key: &str,
        value: Value,
        expiration: Option<DateTime<Utc>>,
        stored_tags: Vec<String>,
    ) -> Self {
        Self {
            key: key.to_string(),
            value: Some(value),
            has_value: true,
            expiration,
            tags: BTreeSet::new(),
            previous_tags: stored_tags.into_iter().collect(),
        }
    }

    /// Copy of a queued item as seen by a reader before commit
    pub(crate) fn from_deferred(item: &CacheItem) -> Self {
        let mut copy = item.clone();
        copy.previous_tags = item.tags.clone();
        copy
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether the item holds a value that has not expired yet
    pub fn is_hit(&self) -> bool {
        self.has_value && !self.is_expired_at(Utc::now())
    }

    pub(crate) fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expiration, Some(at) if at < now)
    }

    /// Deserialize the value, `None` on a miss
    pub fn get<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        if !self.is_hit() {
            return Ok(None);
        }
        match &self.value {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    /// Raw serialized value, regardless of expiration
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn set<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<&mut Self> {
        self.value = Some(serde_json::to_value(value)?);
        self.has_value = true;
        Ok(self)
    }

    pub fn expires_at(&mut self, at: Option<DateTime<Utc>>) -> &mut Self {
        self.expiration = at;
        self
    }

    /// Expire `ttl` from now; `None` removes the expiration
    pub fn expires_after(&mut self, ttl: Option<Duration>) -> Result<&mut Self> {
        self.expiration = match ttl {
            Some(ttl) => Some(expiry_after(Utc::now(), ttl)?),
            None => None,
        };
        Ok(self)
    }

    pub fn expiration(&self) -> Option<DateTime<Utc>> {
        self.expiration
    }

    /// Replace the tags persisted on the next save
    pub fn set_tags<I, S>(&mut self, tags: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut validated = BTreeSet::new();
        for tag in tags {
            let tag = tag.into();
            validate_tag(&tag)?;
            validated.insert(tag);
        }
        self.tags = validated;
        Ok(self)
    }

    pub fn add_tag(&mut self, tag: impl Into<String>) -> Result<&mut Self> {
        let tag = tag.into();
        validate_tag(&tag)?;
        self.tags.insert(tag);
        Ok(self)
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Tags the item carried in storage when it was fetched
    pub fn previous_tags(&self) -> &BTreeSet<String> {
        &self.previous_tags
    }
}

/// `now + ttl`, or an error when the result is out of range
pub(crate) fn expiry_after(now: DateTime<Utc>, ttl: Duration) -> Result<DateTime<Utc>> {
    now.checked_add_signed(ttl).ok_or_else(|| {
        CachePoolError::InvalidTtl(format!("{} seconds is out of range", ttl.num_seconds()))
    })
}
