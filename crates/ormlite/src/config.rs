use crate::error::{OrmError, OrmResult};
use serde::Deserialize;

/// Default number of records per multi-row INSERT.
pub const DEFAULT_MAX_INSERT_SIZE: usize = 100;

/// Default tag attached to bulk insert/update statements.
pub const DEFAULT_BULK_TAG: &str = "bulk";

/// Configuration for [`OrmLite`](crate::OrmLite).
///
/// Deserializable so it can live inside an application's own config file;
/// missing keys fall back to the defaults:
///
/// ```ignore
/// #[derive(serde::Deserialize)]
/// struct AppConfig {
///     #[serde(default)]
///     orm: ormlite::OrmLiteConfig,
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OrmLiteConfig {
    /// Maximum records per INSERT statement. Must be at least 1.
    pub max_insert_size: usize,
    /// Tag passed to the query logger for bulk insert/update statements.
    pub bulk_tag: String,
    /// Whether UPDATE writes the primary-key column back in its SET clause
    /// when the key is one of the mapped columns.
    pub include_primary_key_in_set: bool,
}

impl Default for OrmLiteConfig {
    fn default() -> Self {
        Self {
            max_insert_size: DEFAULT_MAX_INSERT_SIZE,
            bulk_tag: DEFAULT_BULK_TAG.to_string(),
            include_primary_key_in_set: true,
        }
    }
}

impl OrmLiteConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the INSERT chunk size.
    pub fn max_insert_size(mut self, size: usize) -> Self {
        self.max_insert_size = size;
        self
    }

    /// Set the bulk tag.
    pub fn bulk_tag(mut self, tag: impl Into<String>) -> Self {
        self.bulk_tag = tag.into();
        self
    }

    /// Leave the primary-key column out of UPDATE's SET clause.
    pub fn exclude_primary_key_from_set(mut self) -> Self {
        self.include_primary_key_in_set = false;
        self
    }

    /// Check the configuration.
    pub fn validate(&self) -> OrmResult<()> {
        validate_max_insert_size(self.max_insert_size)?;
        if self.bulk_tag.is_empty() {
            return Err(OrmError::validation("bulk_tag must not be empty"));
        }
        Ok(())
    }
}

pub(crate) fn validate_max_insert_size(size: usize) -> OrmResult<()> {
    if size == 0 {
        return Err(OrmError::validation("max_insert_size must be at least 1"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = OrmLiteConfig::default();
        assert_eq!(config.max_insert_size, 100);
        assert_eq!(config.bulk_tag, "bulk");
        assert!(config.include_primary_key_in_set);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_methods() {
        let config = OrmLiteConfig::new()
            .max_insert_size(25)
            .bulk_tag("import")
            .exclude_primary_key_from_set();
        assert_eq!(config.max_insert_size, 25);
        assert_eq!(config.bulk_tag, "import");
        assert!(!config.include_primary_key_in_set);
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        let err = OrmLiteConfig::new().max_insert_size(0).validate().unwrap_err();
        assert!(matches!(err, OrmError::Validation(_)));
        assert!(OrmLiteConfig::new().bulk_tag("").validate().is_err());
    }

    #[test]
    fn deserializes_with_missing_keys() {
        let config: OrmLiteConfig =
            serde_json::from_str(r#"{ "max_insert_size": 500 }"#).unwrap();
        assert_eq!(config.max_insert_size, 500);
        assert_eq!(config.bulk_tag, "bulk");
        assert!(config.include_primary_key_in_set);

        let empty: OrmLiteConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, OrmLiteConfig::default());
    }
}
