// SPDX-License-Identifier: MIT OR Apache-2.0

//! YAML file configuration source adapter.
//!
//! The file is parsed into a [`ConfigValue`] tree and exposed either as
//! flattened dotted keys (`database.host`) or as top-level keys whose values
//! are nested tables. The nested layout pairs with
//! [`Upleveler`](crate::middleware::Upleveler).

use crate::domain::{ConfigError, ConfigKey, ConfigValue, Result};
use crate::ports::{ConfigParser, ConfigSource, Named};
use directories::ProjectDirs;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

/// Maximum allowed file size for YAML configuration files (10MB)
const MAX_YAML_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// YAML parser implementation.
///
/// # Examples
///
/// ```rust
/// use layercfg::adapters::YamlParser;
/// use layercfg::domain::ConfigValue;
/// use layercfg::ports::ConfigParser;
///
/// let parser = YamlParser::new();
/// let doc = parser.parse("database:\n  host: localhost\n  port: 5432").unwrap();
/// assert_eq!(doc.get_path("database.port"), Some(&ConfigValue::from("5432")));
/// ```
#[derive(Debug, Clone, Default)]
pub struct YamlParser;

impl YamlParser {
    /// Creates a new YAML parser.
    pub fn new() -> Self {
        YamlParser
    }

    fn convert(value: serde_yaml::Value) -> Option<ConfigValue> {
        match value {
            serde_yaml::Value::Mapping(map) => {
                let table = map
                    .into_iter()
                    .filter_map(|(k, v)| {
                        let key = match k {
                            serde_yaml::Value::String(s) => s,
                            serde_yaml::Value::Number(n) => n.to_string(),
                            serde_yaml::Value::Bool(b) => b.to_string(),
                            _ => return None,
                        };
                        Self::convert(v).map(|v| (key, v))
                    })
                    .collect::<BTreeMap<_, _>>();
                Some(ConfigValue::Table(table))
            }
            serde_yaml::Value::Sequence(seq) => Some(ConfigValue::Table(
                seq.into_iter()
                    .enumerate()
                    .filter_map(|(i, v)| Self::convert(v).map(|v| (i.to_string(), v)))
                    .collect(),
            )),
            serde_yaml::Value::String(s) => Some(ConfigValue::Text(s)),
            serde_yaml::Value::Number(n) => Some(ConfigValue::Text(n.to_string())),
            serde_yaml::Value::Bool(b) => Some(ConfigValue::Text(b.to_string())),
            serde_yaml::Value::Null => Some(ConfigValue::Text(String::new())),
            serde_yaml::Value::Tagged(tagged) => Self::convert(tagged.value),
        }
    }
}

impl ConfigParser for YamlParser {
    fn parse(&self, content: &str) -> Result<ConfigValue> {
        let value: serde_yaml::Value =
            serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError {
                message: format!("Failed to parse YAML: {}", e),
                source: Some(Box::new(e)),
            })?;

        Ok(Self::convert(value).unwrap_or_else(|| ConfigValue::Table(BTreeMap::new())))
    }

    fn supported_extensions(&self) -> &[&str] {
        &["yaml", "yml"]
    }
}

/// How document keys are exposed by [`YamlFileAdapter`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyLayout {
    /// Every scalar under its dotted path, e.g. `database.host`.
    #[default]
    Flattened,
    /// Only top-level keys; nested maps are returned as table values.
    Nested,
}

/// Configuration source adapter for YAML files.
///
/// # Examples
///
/// ```rust,no_run
/// use layercfg::adapters::{KeyLayout, YamlFileAdapter};
///
/// // Load from a specific file
/// let adapter = YamlFileAdapter::from_file("/path/to/config.yaml").unwrap();
///
/// // Keep nested tables intact
/// let nested = YamlFileAdapter::from_file("/path/to/config.yaml")
///     .unwrap()
///     .layout(KeyLayout::Nested);
///
/// // Load from default OS location
/// let adapter = YamlFileAdapter::from_default_location("myapp", "com.example").unwrap();
/// ```
#[derive(Debug)]
pub struct YamlFileAdapter {
    /// Path to the YAML file
    file_path: PathBuf,
    /// Parsed document
    document: RwLock<ConfigValue>,
    /// Key exposure
    layout: KeyLayout,
    /// YAML parser
    parser: YamlParser,
}

impl YamlFileAdapter {
    /// Creates a new YAML file adapter from a specific file path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file_path = path.as_ref().to_path_buf();
        let parser = YamlParser::new();

        // Canonicalize path to prevent directory traversal attacks
        let canonical_path = file_path
            .canonicalize()
            .map_err(|e| {
                failure(format!("Invalid or inaccessible path: {}", display_name(&file_path)))
                    .caused_by(e)
            })?;

        let document = read_document(&canonical_path, &parser)?;

        Ok(Self {
            file_path: canonical_path,
            document: RwLock::new(document),
            layout: KeyLayout::default(),
            parser,
        })
    }

    /// Creates a new YAML file adapter from `config.yaml` in the OS-appropriate
    /// configuration directory.
    pub fn from_default_location(app_name: &str, qualifier: &str) -> Result<Self> {
        Self::with_filename(app_name, qualifier, "config.yaml")
    }

    /// Creates a new YAML file adapter with a custom file name in the default location.
    pub fn with_filename(app_name: &str, qualifier: &str, filename: &str) -> Result<Self> {
        let proj_dirs = ProjectDirs::from(qualifier, "", app_name)
            .ok_or_else(|| failure("Failed to determine project directories"))?;

        Self::from_file(proj_dirs.config_dir().join(filename))
    }

    /// Sets how document keys are exposed.
    pub fn layout(mut self, layout: KeyLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Returns the path to the configuration file.
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Re-reads the file. On failure the previously loaded document is kept.
    pub fn reload(&self) -> Result<()> {
        let document = read_document(&self.file_path, &self.parser)?;
        *self
            .document
            .write()
            .unwrap_or_else(PoisonError::into_inner) = document;
        Ok(())
    }

    // Sorted by key, so listings are stable across runs.
    fn entries(&self) -> BTreeMap<ConfigKey, ConfigValue> {
        let document = self
            .document
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let mut entries = BTreeMap::new();
        if let Some(table) = document.as_table() {
            match self.layout {
                KeyLayout::Nested => {
                    for (k, v) in table {
                        entries.insert(ConfigKey::from(k.as_str()), v.clone());
                    }
                }
                KeyLayout::Flattened => {
                    for (k, v) in table {
                        flatten(v, k, &mut entries);
                    }
                }
            }
        }
        entries
    }
}

fn flatten(value: &ConfigValue, prefix: &str, out: &mut BTreeMap<ConfigKey, ConfigValue>) {
    match value {
        ConfigValue::Table(map) => {
            for (k, v) in map {
                flatten(v, &format!("{}.{}", prefix, k), out);
            }
        }
        ConfigValue::Text(_) => {
            out.insert(ConfigKey::from(prefix), value.clone());
        }
    }
}

fn failure(message: impl Into<String>) -> ConfigError {
    ConfigError::source_failure("yaml-file", message)
}

fn display_name(path: &Path) -> &str {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
}

fn read_document(path: &Path, parser: &YamlParser) -> Result<ConfigValue> {
    // Check file size before reading to prevent DoS via large files
    let metadata = fs::metadata(path).map_err(|e| {
        failure(format!("Failed to read file metadata: {}", display_name(path))).caused_by(e)
    })?;

    if metadata.len() > MAX_YAML_FILE_SIZE {
        return Err(failure(format!(
            "Configuration file too large: {} bytes (max {} bytes)",
            metadata.len(),
            MAX_YAML_FILE_SIZE
        )));
    }

    let content = fs::read_to_string(path).map_err(|e| {
        failure(format!("Failed to read configuration file: {}", display_name(path))).caused_by(e)
    })?;

    parser.parse(&content)
}

impl Named for YamlFileAdapter {
    fn name(&self) -> &str {
        "yaml-file"
    }
}

impl ConfigSource for YamlFileAdapter {
    fn get(&self, key: &ConfigKey) -> Result<Option<ConfigValue>> {
        let document = self
            .document
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let found = match self.layout {
            KeyLayout::Nested => document.as_table().and_then(|t| t.get(key.as_str())),
            KeyLayout::Flattened => document
                .get_path(key.as_str())
                .filter(|v| !v.is_table()),
        };
        Ok(found.cloned())
    }

    fn all_keys(&self) -> Result<Vec<ConfigKey>> {
        Ok(self.entries().into_keys().collect())
    }

    fn get_all(&self) -> Result<HashMap<ConfigKey, ConfigValue>> {
        Ok(self.entries().into_iter().collect())
    }
}
