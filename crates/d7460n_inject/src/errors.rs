//! Error results that can be returned from the injection step
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InjectError {
    /// The data could not be fetched or decoded. The snapshot was left untouched.
    #[error("data injection into slot '{slot}' failed: {reason}")]
    DataInjectionFailure { slot: String, reason: String },

    /// Static defect in the manifest or the page, e.g. a slot without a target element
    #[error("authoring defect: {0}")]
    AuthoringDefect(String),

    #[error("slot '{slot}' accepts at most {limit} items, got {count}")]
    TooManyItems { slot: String, count: usize, limit: usize },

    #[error("slot '{slot}' has an invalid selector: {source}")]
    Selector {
        slot: String,
        #[source]
        source: d7460n_css3::errors::Error,
    },

    #[error("document error: {0}")]
    Document(#[from] d7460n_html5::errors::Error),
}
