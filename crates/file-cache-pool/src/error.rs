//! Error types for the cache pool

use std::fmt;

#[derive(Debug)]
pub enum CachePoolError {
    InvalidKey(String),
    InvalidTag(String),
    InvalidFolder(String),
    InvalidTtl(String),
    Io(Box<std::io::Error>),
    Serialization(String),
}

impl fmt::Display for CachePoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CachePoolError::InvalidKey(msg) => write!(f, "Invalid cache key: {}", msg),
            CachePoolError::InvalidTag(msg) => write!(f, "Invalid tag: {}", msg),
            CachePoolError::InvalidFolder(msg) => write!(f, "Invalid cache folder: {}", msg),
            CachePoolError::InvalidTtl(msg) => write!(f, "Invalid TTL: {}", msg),
            CachePoolError::Io(err) => write!(f, "IO error: {}", err),
            CachePoolError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for CachePoolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CachePoolError::Io(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CachePoolError {
    fn from(err: std::io::Error) -> Self {
        CachePoolError::Io(Box::new(err))
    }
}

impl From<serde_json::Error> for CachePoolError {
    fn from(err: serde_json::Error) -> Self {
        CachePoolError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CachePoolError>;
