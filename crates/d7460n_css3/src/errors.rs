//! Error results that can be returned from the selector parser
use d7460n_shared::location::Location;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("selector parse error: {0} at {1}")]
    Parse(String, Location),

    #[error("unsupported selector: {0}")]
    Unsupported(String),
}
