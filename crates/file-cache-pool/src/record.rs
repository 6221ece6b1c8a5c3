//! On-disk layout of cached items

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What gets written to `<folder>/<key>`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StoredRecord {
    /// Unix timestamp in seconds, `None` for items that never expire
    pub expires_at: Option<i64>,
    pub value: Value,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl StoredRecord {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(ts) if now.timestamp() > ts)
    }

    pub fn expiration(&self) -> Option<DateTime<Utc>> {
        self.expires_at.and_then(|ts| DateTime::from_timestamp(ts, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_record_serialization() {
        let record = StoredRecord {
            expires_at: Some(1_700_000_000),
            value: serde_json::json!({"name": "Ada"}),
            tags: vec!["users".to_string()],
        };

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"expires_at\":1700000000"));
        assert!(json.contains("users"));

        let parsed: StoredRecord = serde_json::from_slice(json.as_bytes()).unwrap();
        assert_eq!(parsed.value["name"], "Ada");
        assert_eq!(parsed.tags, vec!["users".to_string()]);
    }

    #[test]
    fn test_missing_tags_default_to_empty() {
        let parsed: StoredRecord =
            serde_json::from_str(r#"{"expires_at": null, "value": 3}"#).unwrap();
        assert!(parsed.tags.is_empty());
        assert!(parsed.expiration().is_none());
    }

    #[test]
    fn test_expiry_is_strictly_after() {
        let now = Utc::now();
        let record = StoredRecord {
            expires_at: Some(now.timestamp()),
            value: Value::Null,
            tags: Vec::new(),
        };

        assert!(!record.is_expired_at(now));
        assert!(record.is_expired_at(now + Duration::seconds(1)));
    }

    #[test]
    fn test_no_expiry_never_expires() {
        let record = StoredRecord {
            expires_at: None,
            value: Value::Bool(true),
            tags: Vec::new(),
        };
        assert!(!record.is_expired_at(Utc::now() + Duration::days(3650)));
    }
}
