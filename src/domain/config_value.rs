// SPDX-License-Identifier: MIT OR Apache-2.0

//! Raw configuration values.
//!
//! Sources hand out `ConfigValue`s: either a scalar rendered as text, or a
//! table of nested values (a parsed document exposed under one key). Typed
//! access happens through the conversion helpers below or through an
//! interpreter layered over the source.

use crate::domain::errors::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A raw configuration value.
///
/// # Examples
///
/// ```
/// use layercfg::domain::ConfigValue;
///
/// let value = ConfigValue::from("42");
/// assert_eq!(value.as_str(), Some("42"));
/// assert_eq!(value.as_i32("test.key").unwrap(), 42);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    /// A scalar value.
    Text(String),
    /// A nested map of values.
    Table(BTreeMap<String, ConfigValue>),
}

impl ConfigValue {
    /// Creates a text value.
    pub fn new(value: String) -> Self {
        ConfigValue::Text(value)
    }

    /// Creates a table value from key/value pairs.
    ///
    /// # Examples
    ///
    /// ```
    /// use layercfg::domain::ConfigValue;
    ///
    /// let table = ConfigValue::table([("a", "1"), ("b", "2")]);
    /// assert_eq!(table.get_path("a"), Some(&ConfigValue::from("1")));
    /// ```
    pub fn table<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ConfigValue>,
    {
        ConfigValue::Table(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Returns the text of a scalar value, or `None` for a table.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::Text(s) => Some(s),
            ConfigValue::Table(_) => None,
        }
    }

    /// Returns the nested map of a table value, or `None` for a scalar.
    pub fn as_table(&self) -> Option<&BTreeMap<String, ConfigValue>> {
        match self {
            ConfigValue::Table(map) => Some(map),
            ConfigValue::Text(_) => None,
        }
    }

    /// Returns `true` when the value is a table.
    pub fn is_table(&self) -> bool {
        matches!(self, ConfigValue::Table(_))
    }

    /// Walks dot-separated segments through nested tables.
    ///
    /// # Examples
    ///
    /// ```
    /// use layercfg::domain::ConfigValue;
    ///
    /// let db = ConfigValue::table([("host", "localhost")]);
    /// let root = ConfigValue::table([("database", db)]);
    /// assert_eq!(
    ///     root.get_path("database.host").and_then(|v| v.as_str()),
    ///     Some("localhost")
    /// );
    /// ```
    pub fn get_path(&self, path: &str) -> Option<&ConfigValue> {
        path.split('.').try_fold(self, |current, segment| {
            current.as_table().and_then(|map| map.get(segment))
        })
    }

    fn text(&self, key: &str, target_type: &str) -> Result<&str> {
        self.as_str().ok_or_else(|| ConfigError::TypeConversionError {
            key: key.to_string(),
            target_type: target_type.to_string(),
            source: "value is a table, not a scalar".into(),
        })
    }

    /// Converts the value to a boolean.
    ///
    /// Recognizes the following values (case-insensitive):
    /// - `true`: "true", "yes", "1", "on"
    /// - `false`: "false", "no", "0", "off"
    pub fn as_bool(&self, key: &str) -> Result<bool> {
        let text = self.text(key, "boolean")?;
        match text.to_lowercase().as_str() {
            "true" | "yes" | "1" | "on" => Ok(true),
            "false" | "no" | "0" | "off" => Ok(false),
            _ => text
                .parse::<bool>()
                .map_err(|e| ConfigError::from_parse_bool_error(key.to_string(), e)),
        }
    }

    /// Converts the value to an `i32`.
    pub fn as_i32(&self, key: &str) -> Result<i32> {
        self.text(key, "integer")?
            .parse::<i32>()
            .map_err(|e| ConfigError::from_parse_int_error(key.to_string(), e))
    }

    /// Converts the value to an `i64`.
    pub fn as_i64(&self, key: &str) -> Result<i64> {
        self.text(key, "integer")?
            .parse::<i64>()
            .map_err(|e| ConfigError::from_parse_int_error(key.to_string(), e))
    }

    /// Converts the value to a `u32`.
    pub fn as_u32(&self, key: &str) -> Result<u32> {
        self.text(key, "integer")?
            .parse::<u32>()
            .map_err(|e| ConfigError::from_parse_int_error(key.to_string(), e))
    }

    /// Converts the value to a `u64`.
    pub fn as_u64(&self, key: &str) -> Result<u64> {
        self.text(key, "integer")?
            .parse::<u64>()
            .map_err(|e| ConfigError::from_parse_int_error(key.to_string(), e))
    }

    /// Converts the value to an `f64`.
    pub fn as_f64(&self, key: &str) -> Result<f64> {
        self.text(key, "float")?
            .parse::<f64>()
            .map_err(|e| ConfigError::from_parse_float_error(key.to_string(), e))
    }

    /// Parses the value into any type that implements `FromStr`.
    ///
    /// # Examples
    ///
    /// ```
    /// use layercfg::domain::ConfigValue;
    /// use std::net::IpAddr;
    ///
    /// let value = ConfigValue::from("127.0.0.1");
    /// let ip: IpAddr = value.parse("test.key").unwrap();
    /// assert_eq!(ip.to_string(), "127.0.0.1");
    /// ```
    pub fn parse<T>(&self, key: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        let target_type = std::any::type_name::<T>();
        self.text(key, target_type)?
            .parse::<T>()
            .map_err(|e| ConfigError::TypeConversionError {
                key: key.to_string(),
                target_type: target_type.to_string(),
                source: Box::new(e),
            })
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        ConfigValue::Text(s)
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::Text(s.to_string())
    }
}

impl From<BTreeMap<String, ConfigValue>> for ConfigValue {
    fn from(map: BTreeMap<String, ConfigValue>) -> Self {
        ConfigValue::Table(map)
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Text(s) => write!(f, "{}", s),
            ConfigValue::Table(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}={}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::IpAddr;

    #[test]
    fn test_config_value_text() {
        let value = ConfigValue::new("test".to_string());
        assert_eq!(value.as_str(), Some("test"));
        assert!(!value.is_table());
        assert!(value.as_table().is_none());
    }

    #[test]
    fn test_config_value_table() {
        let value = ConfigValue::table([("a", "1"), ("b", "2")]);
        assert!(value.is_table());
        assert_eq!(value.as_str(), None);
        assert_eq!(value.as_table().map(|m| m.len()), Some(2));
    }

    #[test]
    fn test_get_path_nested() {
        let inner = ConfigValue::table([("port", "5432")]);
        let root = ConfigValue::table([("database", inner)]);

        assert_eq!(
            root.get_path("database.port"),
            Some(&ConfigValue::from("5432"))
        );
        assert_eq!(root.get_path("database.missing"), None);
        assert_eq!(root.get_path("database.port.deeper"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(ConfigValue::from("x").to_string(), "x");
        let table = ConfigValue::table([("a", "1"), ("b", "2")]);
        assert_eq!(table.to_string(), "{a=1, b=2}");
    }

    #[test]
    fn test_as_bool_variants() {
        for val in ["true", "True", "YES", "1", "on"] {
            assert!(ConfigValue::from(val).as_bool("k").unwrap(), "{}", val);
        }
        for val in ["false", "No", "0", "OFF"] {
            assert!(!ConfigValue::from(val).as_bool("k").unwrap(), "{}", val);
        }
        assert!(ConfigValue::from("maybe").as_bool("k").is_err());
    }

    #[test]
    fn test_numeric_conversions() {
        assert_eq!(ConfigValue::from("-42").as_i32("k").unwrap(), -42);
        assert_eq!(
            ConfigValue::from("9223372036854775807").as_i64("k").unwrap(),
            i64::MAX
        );
        assert_eq!(ConfigValue::from("42").as_u32("k").unwrap(), 42);
        assert!(ConfigValue::from("-1").as_u64("k").is_err());
        assert_eq!(ConfigValue::from("2.5").as_f64("k").unwrap(), 2.5);
        assert!(ConfigValue::from("3.14").as_i32("k").is_err());
    }

    #[test]
    fn test_table_conversion_fails() {
        let value = ConfigValue::table([("a", "1")]);
        let err = value.as_i32("nested").unwrap_err();
        assert!(matches!(err, ConfigError::TypeConversionError { .. }));
        assert!(err.to_string().contains("nested"));
    }

    #[test]
    fn test_parse_custom_type() {
        let ip: IpAddr = ConfigValue::from("127.0.0.1").parse("k").unwrap();
        assert_eq!(ip.to_string(), "127.0.0.1");

        let result: Result<IpAddr> = ConfigValue::from("not_an_ip").parse("k");
        assert!(result.is_err());
    }

    #[test]
    #[cfg(feature = "yaml")]
    fn test_serde_untagged() {
        let value: ConfigValue = serde_yaml::from_str("a: '1'\nb:\n  c: '2'\n").unwrap();
        assert_eq!(value.get_path("b.c"), Some(&ConfigValue::from("2")));
    }
}
