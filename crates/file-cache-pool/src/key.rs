//! Key and tag validation
//!
//! Keys double as file names inside the pool folder, so they are restricted to
//! a small filesystem-safe alphabet on top of the reserved characters every
//! cache pool rejects.

use crate::error::{CachePoolError, Result};

/// Characters no key or tag may contain
pub const RESERVED_CHARACTERS: &str = "{}()/\\@:";

/// Prefix of the files holding tag lists; user keys may not start with it
pub const TAG_PREFIX: &str = "tag!";

fn is_path_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '!' | ' ')
}

/// Shared checks for anything that ends up as a single path segment
fn check_segment(value: &str) -> std::result::Result<(), String> {
    if value.is_empty() {
        return Err("must not be empty".to_string());
    }

    if let Some(c) = value.chars().find(|c| RESERVED_CHARACTERS.contains(*c)) {
        return Err(format!("{:?} contains reserved character '{}'", value, c));
    }

    if let Some(c) = value.chars().find(|c| !is_path_safe(*c)) {
        return Err(format!(
            "{:?} contains '{}'; valid names match [a-zA-Z0-9_.! ]",
            value, c
        ));
    }

    if value == "." || value == ".." {
        return Err(format!("{:?} is not a valid file name", value));
    }

    Ok(())
}

/// Validate a cache key
pub fn validate_key(key: &str) -> Result<()> {
    check_segment(key).map_err(CachePoolError::InvalidKey)?;

    if key.starts_with(TAG_PREFIX) {
        return Err(CachePoolError::InvalidKey(format!(
            "{:?} uses the reserved prefix {:?}",
            key, TAG_PREFIX
        )));
    }

    Ok(())
}

/// Validate a tag name
pub fn validate_tag(tag: &str) -> Result<()> {
    check_segment(tag).map_err(CachePoolError::InvalidTag)
}

/// Validate the folder a pool stores its files in
pub fn validate_folder(folder: &str) -> Result<()> {
    check_segment(folder).map_err(CachePoolError::InvalidFolder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_keys() {
        for key in ["user_42", "profile.v2", "a b", "Hello!", "x"] {
            assert!(validate_key(key).is_ok(), "{} should be valid", key);
        }
    }

    #[test]
    fn test_empty_key_rejected() {
        let err = validate_key("").unwrap_err();
        assert!(matches!(err, CachePoolError::InvalidKey(_)));
    }

    #[test]
    fn test_reserved_characters_rejected() {
        for c in RESERVED_CHARACTERS.chars() {
            let key = format!("foo{}bar", c);
            let err = validate_key(&key).unwrap_err();
            assert!(
                format!("{}", err).contains("reserved character"),
                "{} should be rejected as reserved",
                key
            );
        }
    }

    #[test]
    fn test_unsafe_characters_rejected() {
        for key in ["semi;colon", "dash-key", "tab\tkey", "ünïcode", "star*"] {
            assert!(validate_key(key).is_err(), "{} should be rejected", key);
        }
    }

    #[test]
    fn test_dot_names_rejected() {
        assert!(validate_key(".").is_err());
        assert!(validate_key("..").is_err());
        assert!(validate_key("...").is_ok());
    }

    #[test]
    fn test_tag_prefix_reserved_for_keys_only() {
        assert!(validate_key("tag!colors").is_err());
        assert!(validate_key("tags").is_ok());
        assert!(validate_tag("tag!colors").is_ok());
    }

    #[test]
    fn test_tag_errors_use_tag_variant() {
        assert!(matches!(
            validate_tag("a/b").unwrap_err(),
            CachePoolError::InvalidTag(_)
        ));
        assert!(validate_tag("colors").is_ok());
    }

    #[test]
    fn test_folder_validation() {
        assert!(validate_folder("cache").is_ok());
        assert!(matches!(
            validate_folder("..").unwrap_err(),
            CachePoolError::InvalidFolder(_)
        ));
        assert!(validate_folder("nested/cache").is_err());
    }
}
