//! Error types for the cache pool admin CLI

use std::fmt;

#[derive(Debug)]
pub enum AdminError {
    Cache(file_cache_pool::CachePoolError),
    Json(serde_json::Error),
    Config(String),
}

impl fmt::Display for AdminError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdminError::Cache(err) => write!(f, "Cache error: {}", err),
            AdminError::Json(err) => write!(f, "JSON error: {}", err),
            AdminError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for AdminError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AdminError::Cache(err) => Some(err),
            AdminError::Json(err) => Some(err),
            AdminError::Config(_) => None,
        }
    }
}

impl From<file_cache_pool::CachePoolError> for AdminError {
    fn from(err: file_cache_pool::CachePoolError) -> Self {
        AdminError::Cache(err)
    }
}

impl From<serde_json::Error> for AdminError {
    fn from(err: serde_json::Error) -> Self {
        AdminError::Json(err)
    }
}

impl From<tracing_subscriber::filter::ParseError> for AdminError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        AdminError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AdminError>;

#[cfg(test)]
mod tests {
    use super::*;
    use file_cache_pool::CachePoolError;

    #[test]
    fn test_cache_error_display() {
        let err = AdminError::Cache(CachePoolError::InvalidKey("a/b".to_string()));
        assert_eq!(format!("{}", err), "Cache error: Invalid cache key: a/b");
    }

    #[test]
    fn test_config_error_display() {
        let err = AdminError::Config("bad CACHE_FOLDER".to_string());
        assert_eq!(format!("{}", err), "Configuration error: bad CACHE_FOLDER");
    }

    #[test]
    fn test_error_is_debug() {
        let err = AdminError::Config("test".to_string());
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("Config"));
    }
}
