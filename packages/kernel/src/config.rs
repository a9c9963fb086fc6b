//! Configuration handed to composers, and kernel settings.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Per-instance configuration.
///
/// Opaque to the kernel: it is passed through to the block's composer and
/// from there to the components it builds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Configuration(Value);

impl Configuration {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// An empty configuration.
    pub fn empty() -> Self {
        Self(Value::Null)
    }

    /// True for `null` and for empty objects.
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            _ => false,
        }
    }

    /// Look up a top-level key when the configuration is an object.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.as_object()?.get(key)
    }

    /// Look up a top-level string value.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key)?.as_str()
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    /// Deserialize the whole configuration into a typed structure.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.0)
    }
}

impl From<Value> for Configuration {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Settings of the kernel itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Longest extension chain accepted when deploying a block.
    pub max_extension_depth: usize,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            max_extension_depth: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kernel_config_default() {
        let config = KernelConfig::default();
        assert_eq!(config.max_extension_depth, 64);
    }

    #[test]
    fn kernel_config_partial_json() {
        let config: KernelConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, KernelConfig::default());

        let config: KernelConfig =
            serde_json::from_value(json!({"max_extension_depth": 3})).unwrap();
        assert_eq!(config.max_extension_depth, 3);
    }

    #[test]
    fn configuration_lookup() {
        let config = Configuration::from(json!({"pool": {"size": 4}, "name": "users"}));
        assert!(!config.is_empty());
        assert_eq!(config.get_str("name"), Some("users"));
        assert_eq!(config.get("pool").unwrap()["size"], 4);
        assert!(config.get("missing").is_none());
    }

    #[test]
    fn configuration_typed() {
        #[derive(Deserialize)]
        struct Pool {
            size: u32,
        }

        let config = Configuration::from(json!({"size": 8}));
        let pool: Pool = config.deserialize().unwrap();
        assert_eq!(pool.size, 8);
    }

    #[test]
    fn empty_configurations() {
        assert!(Configuration::empty().is_empty());
        assert!(Configuration::from(json!({})).is_empty());
        assert!(!Configuration::from(json!([1])).is_empty());
        assert!(Configuration::empty().get("x").is_none());
    }
}
