//! Error results that can be returned from the engine

use crate::location::Location;
use thiserror::Error;

/// Parser error that defines an error (message) on the given position
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    /// Parse error message
    pub message: String,
    /// Location of the error
    pub location: Location,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}", self.message, self.location)
    }
}

/// Errors of the engine facade and its tools
#[derive(Debug, Error)]
pub enum Error {
    /// A command line or configuration value that cannot be used
    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    IO(#[from] std::io::Error),
}

/// Result that can be returned which holds either T or an Error
pub type Result<T> = std::result::Result<T, anyhow::Error>;
