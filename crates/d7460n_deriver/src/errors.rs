//! Errors raised while loading a visibility rule set. Derivation itself cannot fail.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid selector '{selector}' in visibility rule: {source}")]
    Selector {
        selector: String,
        #[source]
        source: d7460n_css3::errors::Error,
    },

    #[error("authoring defect: {0}")]
    AuthoringDefect(String),
}
