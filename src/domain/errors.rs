// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the configuration crate.
//!
//! Absence of a value is never an error: sources and middleware report it as
//! `Ok(None)`. The variants below cover genuine failures. The aggregator itself
//! only ever originates [`ConfigError::ConfigKeyNotFound`]; everything else is
//! raised by sources or user interpreters and passed through untouched.

use std::num::{ParseFloatError, ParseIntError};
use std::str::ParseBoolError;
use thiserror::Error;

/// The main error type for configuration operations.
///
/// # Examples
///
/// ```
/// use layercfg::domain::ConfigError;
///
/// fn get_config_value() -> Result<String, ConfigError> {
///     Err(ConfigError::ConfigKeyNotFound {
///         key: "database.host".to_string(),
///     })
/// }
/// ```
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The requested configuration key resolved to no value in any source.
    #[error("Configuration key not found: {key}")]
    ConfigKeyNotFound {
        /// The key that was not found
        key: String,
    },

    /// Failed to convert a configuration value to the requested type.
    #[error(
        "Failed to convert configuration value for key '{key}' to type {target_type}: {source}"
    )]
    TypeConversionError {
        /// The key being converted
        key: String,
        /// The target type name
        target_type: String,
        /// The underlying conversion error
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An interpreter rejected a value outright.
    ///
    /// Interpreters that merely cannot use a value should return `Ok(None)`
    /// so that lower priority sources get a chance; this variant aborts the
    /// whole resolution.
    #[error("Failed to interpret configuration value for key '{key}': {message}")]
    InterpretationError {
        /// The key being interpreted
        key: String,
        /// The error message
        message: String,
    },

    /// An error occurred in a configuration source.
    #[error("Configuration source '{source_name}' error: {message}")]
    SourceError {
        /// The name of the source that encountered the error
        source_name: String,
        /// The error message
        message: String,
        /// The underlying error, if any
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Failed to parse a configuration file or value.
    #[error("Failed to parse configuration: {message}")]
    ParseError {
        /// The error message
        message: String,
        /// The underlying parsing error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An I/O error occurred while reading configuration.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ConfigError {
    /// The failure raised when a required key resolves to nothing.
    pub fn not_found(key: impl Into<String>) -> Self {
        ConfigError::ConfigKeyNotFound { key: key.into() }
    }

    /// A failure reported by the named source, without an underlying cause.
    ///
    /// Attach one with [`ConfigError::caused_by`].
    pub fn source_failure(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::SourceError {
            source_name: source_name.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates an InterpretationError for the given key.
    pub fn interpretation(key: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::InterpretationError {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Records `cause` as the underlying error of a source or parse failure.
    ///
    /// Other variants are returned unchanged.
    pub fn caused_by<E>(mut self, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        if let ConfigError::SourceError { source, .. } | ConfigError::ParseError { source, .. } =
            &mut self
        {
            *source = Some(Box::new(cause));
        }
        self
    }

    /// Creates a TypeConversionError from a ParseIntError.
    pub fn from_parse_int_error(key: String, err: ParseIntError) -> Self {
        Self::conversion(key, "integer", err)
    }

    /// Creates a TypeConversionError from a ParseFloatError.
    pub fn from_parse_float_error(key: String, err: ParseFloatError) -> Self {
        Self::conversion(key, "float", err)
    }

    /// Creates a TypeConversionError from a ParseBoolError.
    pub fn from_parse_bool_error(key: String, err: ParseBoolError) -> Self {
        Self::conversion(key, "boolean", err)
    }

    fn conversion<E>(key: String, target_type: &str, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ConfigError::TypeConversionError {
            key,
            target_type: target_type.to_string(),
            source: Box::new(err),
        }
    }

    /// Returns `true` if this is the not-found failure raised by `require`.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ConfigError::ConfigKeyNotFound { .. })
    }
}

/// A specialized Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
