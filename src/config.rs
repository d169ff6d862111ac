//! Demo configuration, read from TOML. Every field has a default.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioConfig {
    pub capacity: usize,
    pub records: usize,
    pub pairs: usize,
    pub orders: usize,
    pub nested: usize,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            capacity: 10,
            records: 20,
            pairs: 20,
            orders: 10,
            nested: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MultiProducerConfig {
    pub capacity: usize,
    pub producers: usize,
    pub items_per_producer: usize,
    pub consumers: usize,
    /// Milliseconds each producer sleeps between puts.
    pub pace_ms: u64,
}

impl Default for MultiProducerConfig {
    fn default() -> Self {
        Self {
            capacity: 5,
            producers: 3,
            items_per_producer: 10,
            consumers: 1,
            pace_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemoConfig {
    pub scenarios: ScenarioConfig,
    pub multi_producer: MultiProducerConfig,
}

impl DemoConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: DemoConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| Error::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("scenarios.capacity", self.scenarios.capacity),
            ("multi_producer.capacity", self.multi_producer.capacity),
            ("multi_producer.producers", self.multi_producer.producers),
            ("multi_producer.consumers", self.multi_producer.consumers),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(Error::invalid_config(field, "must be at least 1"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = DemoConfig::from_toml_str("").unwrap();
        assert_eq!(config, DemoConfig::default());
        assert_eq!(config.scenarios.records, 20);
        assert_eq!(config.multi_producer.capacity, 5);
    }

    #[test]
    fn test_partial_override() {
        let config = DemoConfig::from_toml_str(
            r#"
            [multi_producer]
            producers = 4
            pace_ms = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.multi_producer.producers, 4);
        assert_eq!(config.multi_producer.pace_ms, 2);
        assert_eq!(config.multi_producer.items_per_producer, 10);
        assert_eq!(config.scenarios, ScenarioConfig::default());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = DemoConfig::from_toml_str("[scenarios]\ncapacity = 0\n").unwrap_err();
        match err {
            Error::InvalidConfig { field, .. } => assert_eq!(field, "scenarios.capacity"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_unknown_field_is_parse_error() {
        let err = DemoConfig::from_toml_str("[scenarios]\nbogus = 1\n").unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[scenarios]\norders = 3").unwrap();
        let config = DemoConfig::load(file.path()).unwrap();
        assert_eq!(config.scenarios.orders, 3);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = DemoConfig::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, Error::ConfigIo { .. }));
    }
}
