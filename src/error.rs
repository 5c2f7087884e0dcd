//! Error types for configuration and terminal I/O

use thiserror::Error;

/// Result type alias for starfield operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur outside the (infallible) star generation core
#[derive(Error, Debug)]
pub enum Error {
    /// Terminal or file I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid TOML for [`crate::config::Config`]
    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The effective config could not be written back out as TOML
    #[error("Failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// The config parsed but holds values the generator cannot use
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A color was not in RRGGBB hex form
    #[error("Invalid hex color: {0} (expected RRGGBB, e.g. 1a1b26)")]
    InvalidColor(String),
}
