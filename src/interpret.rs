// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stock interpretation functions for [`Interpreter`](crate::middleware::Interpreter).
//!
//! Every helper here treats an absent raw value as "nothing usable" and
//! answers `Ok(None)`. The lenient helpers do the same for values they cannot
//! use, so an aggregator falls through to lower priority sources; the strict
//! ones report a hard error instead.
//!
//! # Examples
//!
//! ```rust
//! use layercfg::adapters::ManualSource;
//! use layercfg::interpret;
//! use layercfg::middleware::Interpreter;
//! use layercfg::ports::{ConfigSource, SourceRef};
//! use std::sync::Arc;
//!
//! let raw = Arc::new(ManualSource::new("raw").with_value("workers", "8"));
//! let workers = Interpreter::new(SourceRef::blocking(raw), interpret::parsed::<usize>());
//! assert_eq!(workers.get_str("workers").unwrap(), Some(8));
//! ```

use crate::domain::{ConfigError, ConfigValue, Result};
use crate::middleware::RawEntry;
use std::fmt::Display;
use std::str::FromStr;

/// Parses text with `FromStr`. Unparseable values and tables yield `None`.
pub fn parsed<T>() -> impl Fn(RawEntry<ConfigValue>) -> Result<Option<T>> + Send + Sync + 'static
where
    T: FromStr + 'static,
    T::Err: Display,
{
    |entry| {
        let Some(text) = entry.value.as_ref().and_then(ConfigValue::as_str) else {
            return Ok(None);
        };
        match text.parse::<T>() {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::debug!(
                    "Ignoring value of '{}' from '{}': {}",
                    entry.key,
                    entry.source.name(),
                    e
                );
                Ok(None)
            }
        }
    }
}

/// Parses text with `FromStr`, failing the resolution on bad input.
pub fn strict<T>() -> impl Fn(RawEntry<ConfigValue>) -> Result<Option<T>> + Send + Sync + 'static
where
    T: FromStr + 'static,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    |entry| match &entry.value {
        Some(value) => value.parse::<T>(entry.key.as_str()).map(Some),
        None => Ok(None),
    }
}

/// Accepts the boolean words understood by [`ConfigValue::as_bool`].
pub fn boolean() -> impl Fn(RawEntry<ConfigValue>) -> Result<Option<bool>> + Send + Sync + 'static
{
    |entry| Ok(entry.value.and_then(|v| v.as_bool(entry.key.as_str()).ok()))
}

/// Splits text on `separator`, trimming items and dropping empty ones.
pub fn list(
    separator: char,
) -> impl Fn(RawEntry<ConfigValue>) -> Result<Option<Vec<String>>> + Send + Sync + 'static {
    move |entry| {
        Ok(entry
            .value
            .as_ref()
            .and_then(ConfigValue::as_str)
            .map(|text| {
                text.split(separator)
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(String::from)
                    .collect()
            }))
    }
}

/// Keeps text that is not blank. Blank strings count as unset.
pub fn non_empty() -> impl Fn(RawEntry<ConfigValue>) -> Result<Option<String>> + Send + Sync + 'static
{
    |entry| {
        Ok(entry
            .value
            .as_ref()
            .and_then(ConfigValue::as_str)
            .filter(|text| !text.trim().is_empty())
            .map(String::from))
    }
}

/// Byte order used to read a hex-encoded integer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ByteOrder {
    /// Most significant byte first.
    BigEndian,
    /// Least significant byte first.
    LittleEndian,
}

/// Reads hex-encoded bytes (optionally `0x`-prefixed, at most eight bytes) as
/// an unsigned integer in the given byte order.
///
/// Malformed hex is a hard error.
///
/// # Examples
///
/// ```rust
/// use layercfg::adapters::ManualSource;
/// use layercfg::interpret::{hex_integer, ByteOrder};
/// use layercfg::middleware::Interpreter;
/// use layercfg::ports::{ConfigSource, SourceRef};
/// use std::sync::Arc;
///
/// let raw = SourceRef::blocking(Arc::new(ManualSource::new("raw").with_value("id", "0x0102")));
/// let big = Interpreter::new(raw.clone(), hex_integer(ByteOrder::BigEndian));
/// let little = Interpreter::new(raw, hex_integer(ByteOrder::LittleEndian));
///
/// assert_eq!(big.get_str("id").unwrap(), Some(0x0102));
/// assert_eq!(little.get_str("id").unwrap(), Some(0x0201));
/// ```
pub fn hex_integer(
    order: ByteOrder,
) -> impl Fn(RawEntry<ConfigValue>) -> Result<Option<u64>> + Send + Sync + 'static {
    move |entry| {
        let Some(text) = entry.value.as_ref().and_then(ConfigValue::as_str) else {
            return Ok(None);
        };
        decode_hex(text, order)
            .map(Some)
            .map_err(|message| ConfigError::interpretation(entry.key.as_str(), message))
    }
}

fn decode_hex(text: &str, order: ByteOrder) -> std::result::Result<u64, String> {
    let digits = text.trim();
    let digits = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
        .unwrap_or(digits);

    if digits.is_empty() {
        return Err(format!("no hex digits in {:?}", text));
    }
    let mut bytes = hex::decode(digits).map_err(|e| format!("{:?}: {}", text, e))?;
    if bytes.len() > 8 {
        return Err(format!("{} bytes do not fit in 64 bits", bytes.len()));
    }
    if order == ByteOrder::LittleEndian {
        bytes.reverse();
    }
    Ok(bytes
        .into_iter()
        .fold(0u64, |acc, byte| (acc << 8) | u64::from(byte)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ManualSource;
    use crate::domain::ConfigKey;
    use crate::ports::SourceRef;
    use std::sync::Arc;

    fn entry(value: Option<ConfigValue>) -> RawEntry<ConfigValue> {
        RawEntry {
            key: ConfigKey::from("k"),
            source: SourceRef::blocking(Arc::new(ManualSource::new("raw"))),
            value,
        }
    }

    fn text(s: &str) -> RawEntry<ConfigValue> {
        entry(Some(ConfigValue::from(s)))
    }

    #[test]
    fn test_parsed() {
        let f = parsed::<u16>();
        assert_eq!(f(text("8080")).unwrap(), Some(8080));
        assert_eq!(f(text("eighty")).unwrap(), None);
        assert_eq!(f(entry(None)).unwrap(), None);
        assert_eq!(f(entry(Some(ConfigValue::table([("a", "1")])))).unwrap(), None);
    }

    #[test]
    fn test_strict() {
        let f = strict::<u16>();
        assert_eq!(f(text("8080")).unwrap(), Some(8080));
        assert!(matches!(
            f(text("eighty")),
            Err(ConfigError::TypeConversionError { .. })
        ));
        assert_eq!(f(entry(None)).unwrap(), None);
    }

    #[test]
    fn test_boolean() {
        let f = boolean();
        assert_eq!(f(text("yes")).unwrap(), Some(true));
        assert_eq!(f(text("OFF")).unwrap(), Some(false));
        assert_eq!(f(text("maybe")).unwrap(), None);
    }

    #[test]
    fn test_list() {
        let f = list(',');
        assert_eq!(
            f(text(" a, b,,c ")).unwrap(),
            Some(vec!["a".to_string(), "b".to_string(), "c".to_string()])
        );
        assert_eq!(f(text("")).unwrap(), Some(Vec::new()));
        assert_eq!(f(entry(None)).unwrap(), None);
    }

    #[test]
    fn test_non_empty() {
        let f = non_empty();
        assert_eq!(f(text("x")).unwrap(), Some("x".to_string()));
        assert_eq!(f(text("   ")).unwrap(), None);
    }

    #[test]
    fn test_hex_integer_byte_order() {
        assert_eq!(hex_integer(ByteOrder::BigEndian)(text("0102")).unwrap(), Some(258));
        assert_eq!(hex_integer(ByteOrder::LittleEndian)(text("0102")).unwrap(), Some(513));
        assert_eq!(
            hex_integer(ByteOrder::BigEndian)(text("0xFFFFFFFFFFFFFFFF")).unwrap(),
            Some(u64::MAX)
        );
        assert_eq!(hex_integer(ByteOrder::BigEndian)(entry(None)).unwrap(), None);
    }

    #[test]
    fn test_hex_integer_rejects_malformed() {
        let f = hex_integer(ByteOrder::BigEndian);
        for bad in ["abc", "zz", "", "0x", "010203040506070809", "0x+1", "+1ab", "-1"] {
            assert!(
                matches!(f(text(bad)), Err(ConfigError::InterpretationError { .. })),
                "{:?} should be rejected",
                bad
            );
        }
    }
}
