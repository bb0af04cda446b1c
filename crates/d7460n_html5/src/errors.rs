//! Error results that can be returned from the document layer
use d7460n_shared::node::NodeId;
use d7460n_shared::types::ParseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("parse error: {0}")]
    Parse(ParseError),

    /// Static defect in the authored structure, e.g. a class attribute
    #[error("authoring defect: {0}")]
    AuthoringDefect(String),

    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    #[error("node {0} is not an element")]
    NotAnElement(NodeId),

    #[error("element {0} is not a form control")]
    NotAFormControl(NodeId),
}
