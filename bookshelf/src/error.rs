//! Error types

use miette::Diagnostic;
use thiserror::Error;

/// Application errors for configuration and startup.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// A configuration source could not be read or parsed.
    #[error("Could not load configuration from {path}")]
    #[diagnostic(help("check the file and any BOOKSHELF_* environment variables"))]
    LoadConfig {
        /// Path of the configuration file.
        path: String,
        /// The underlying error.
        #[source]
        source: Box<figment::Error>,
    },
    /// The configuration was parsed but holds an invalid value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
