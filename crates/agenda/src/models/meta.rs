//! Schedule metadata persisted between update cycles

use serde::{Deserialize, Serialize};

/// Metadata of the most recently applied schedule
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    /// Version label published by the conference (may be empty)
    pub version: String,
    /// Conference title
    pub title: String,
    /// Number of conference days
    pub num_days: u32,
    /// ETag of the applied document, sent back as `If-None-Match`
    #[serde(default)]
    pub etag: String,
}

impl Meta {
    /// Whether a schedule has ever been applied
    pub fn has_schedule(&self) -> bool {
        self.num_days > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_meta_has_no_schedule() {
        let meta = Meta::default();
        assert!(!meta.has_schedule());
        assert!(meta.etag.is_empty());
    }

    #[test]
    fn test_deserialize_without_etag() {
        let json = r#"{"version":"1.0","title":"Conf","num_days":4}"#;
        let meta: Meta = serde_json::from_str(json).unwrap();
        assert!(meta.has_schedule());
        assert_eq!(meta.etag, "");
    }
}
