//! Errors.
//!
//! Most of the toolkit fails silently and keeps rendering. These errors are reserved for
//! programming mistakes: malformed style descriptors and bad configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that occur when converting a descriptor into a [`Style`](crate::Style).
#[derive(Debug, Error)]
pub enum StyleError {
    /// The descriptor is neither a class string nor a table of properties.
    #[error("unrecognized type for style descriptor: expected string or table, found {found}")]
    Unrecognized { found: &'static str },

    /// A property in a style table has a value that can't be applied.
    #[error("style property '{property}' has unsupported type {found}")]
    InvalidProperty {
        property: String,
        found: &'static str,
    },
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {source}")]
    Parse {
        #[source]
        source: toml::de::Error,
    },

    #[error("config validation failed: {message}")]
    Validation { message: String },
}
