// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration parser trait definition.
//!
//! A parser turns the raw text of a configuration document into a
//! [`ConfigValue`] tree. File adapters decide afterwards whether to expose the
//! tree as nested tables or as flattened dotted keys.

use crate::domain::{ConfigValue, Result};

/// A trait for parsing configuration documents.
///
/// # Key Format
///
/// Parsers keep the document's nesting. A YAML document like:
///
/// ```yaml
/// database:
///   host: localhost
///   port: 5432
/// ```
///
/// parses to a table with a single `database` entry, itself a table holding
/// `host` and `port`. Scalars become text; sequences become tables keyed by
/// index (`"0"`, `"1"`, ...).
///
/// # Examples
///
/// ```rust
/// use layercfg::domain::{ConfigValue, Result};
/// use layercfg::ports::ConfigParser;
///
/// struct KeyEqualsValue;
///
/// impl ConfigParser for KeyEqualsValue {
///     fn parse(&self, content: &str) -> Result<ConfigValue> {
///         Ok(ConfigValue::table(
///             content.lines().filter_map(|line| line.split_once('=')),
///         ))
///     }
///
///     fn supported_extensions(&self) -> &[&str] {
///         &["kv"]
///     }
/// }
///
/// let doc = KeyEqualsValue.parse("a=1\nb=2").unwrap();
/// assert_eq!(doc.get_path("b"), Some(&ConfigValue::from("2")));
/// ```
pub trait ConfigParser {
    /// Parses a document into a value tree.
    ///
    /// # Returns
    ///
    /// * `Ok(ConfigValue)` - The parsed document, normally a table
    /// * `Err(ConfigError)` - The content is not valid for this format
    fn parse(&self, content: &str) -> Result<ConfigValue>;

    /// Returns the file extensions (without the leading dot) this parser handles.
    fn supported_extensions(&self) -> &[&str];
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestParser;

    impl ConfigParser for TestParser {
        fn parse(&self, _content: &str) -> Result<ConfigValue> {
            let database = ConfigValue::table([("host", "localhost"), ("port", "5432")]);
            Ok(ConfigValue::table([
                ("database", database),
                ("app", ConfigValue::table([("name", "MyApp")])),
            ]))
        }

        fn supported_extensions(&self) -> &[&str] {
            &["test", "tst"]
        }
    }

    #[test]
    fn test_parser_parse_keeps_nesting() {
        let result = TestParser.parse("dummy content").unwrap();
        assert_eq!(result.as_table().map(|t| t.len()), Some(2));
        assert_eq!(
            result.get_path("database.port"),
            Some(&ConfigValue::from("5432"))
        );
        assert_eq!(result.get_path("app.name"), Some(&ConfigValue::from("MyApp")));
    }

    #[test]
    fn test_parser_supported_extensions() {
        let extensions = TestParser.supported_extensions();
        assert_eq!(extensions, &["test", "tst"]);
    }
}
