//! Structural snapshot
//!
//! This crate holds the document the deriver reads: a tree of elements, text and comments with
//! native attributes and the live state of form controls. It also provides the markup reader and
//! writer, native constraint validation and the user interactions that mutate control state.
use crate::document::{Document, DocumentHandle};
use crate::errors::Error;
use crate::parser::Html5Parser;

pub mod document;
pub mod errors;
pub mod interaction;
pub mod node;
pub mod parser;
pub mod validity;
pub mod writer;

/// Parses the given HTML string and returns a handle to the resulting snapshot.
pub fn html_compile(html: &str) -> Result<DocumentHandle, Error> {
    let document: Document = Html5Parser::parse_document(html)?;
    Ok(DocumentHandle::create(document))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_shares_one_snapshot() {
        let handle = html_compile("<main><aside></aside></main>").unwrap();
        let other = handle.clone();

        let aside = handle.get().elements_named("aside")[0];
        other.get_mut().set_attribute(aside, "hidden", "").unwrap();
        assert!(handle.get().has_attribute(aside, "hidden"));
    }

    #[test]
    fn compile_reports_defects() {
        assert!(matches!(html_compile(r#"<p class="lead">x</p>"#), Err(Error::AuthoringDefect(_))));
    }
}
