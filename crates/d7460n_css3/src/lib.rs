//! Selector engine
//!
//! Parses selector lists (type, attribute and structural pseudo-class selectors joined by
//! combinators) and matches them against the structural snapshot. Class and id selectors are
//! understood by the parser so they can be reported, but never match.
use d7460n_html5::document::Document;
use d7460n_shared::node::NodeId;

use crate::errors::Error;
use crate::parser::SelectorParser;
use crate::selector::CssSelector;

pub mod errors;
pub mod matcher;
pub mod parser;
pub mod selector;

/// Parses a selector list
pub fn parse_selector(source: &str) -> Result<CssSelector, Error> {
    SelectorParser::new(source).parse()
}

/// Returns true when the node is an element that matches the selector
pub fn matches(doc: &Document, node_id: NodeId, selector: &CssSelector) -> bool {
    matcher::match_selector(doc, node_id, selector)
}

/// All matching elements in tree order
pub fn query_selector_all(doc: &Document, selector: &CssSelector) -> Vec<NodeId> {
    doc.tree_iterator()
        .filter(|node_id| matcher::match_selector(doc, *node_id, selector))
        .collect()
}

/// The first matching element in tree order
pub fn query_selector(doc: &Document, selector: &CssSelector) -> Option<NodeId> {
    doc.tree_iterator()
        .find(|node_id| matcher::match_selector(doc, *node_id, selector))
}

#[cfg(test)]
mod tests {
    use super::*;
    use d7460n_html5::parser::Html5Parser;

    #[test]
    fn query() {
        let doc = Html5Parser::parse_document("<main><aside></aside><aside>x</aside></main>").unwrap();
        let asides = doc.elements_named("aside");

        let all = parse_selector("main > aside").unwrap();
        assert_eq!(query_selector_all(&doc, &all), asides);

        let filled = parse_selector("aside:not(:empty)").unwrap();
        assert_eq!(query_selector(&doc, &filled), Some(asides[1]));
        assert!(!matches(&doc, asides[0], &filled));

        let missing = parse_selector("nav").unwrap();
        assert_eq!(query_selector(&doc, &missing), None);
    }
}
