//! Configuration, tracing and command handling for the `bookshelf` command-line tool.

pub mod cli;
pub mod config;
mod error;
pub mod shell;
pub mod tracing;

pub use config::Config;
pub use error::Error;
