use std::collections::BTreeMap;

use d7460n_html5::document::Document;
use d7460n_html5::node::NodeData;
use d7460n_shared::node::NodeId;

use crate::deriver::ValidationState;

/// Everything the deriver knows about one generation of the document. It is handed out and never
/// kept; the next mutation produces a new one from scratch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DerivedState {
    /// Generation of the document this state was derived from
    pub generation: u64,
    /// Visibility of every element
    pub visibility: BTreeMap<NodeId, bool>,
    /// Validation state of every form control
    pub validation: BTreeMap<NodeId, ValidationState>,
    /// Actionability of every button
    pub actionable: BTreeMap<NodeId, bool>,
    /// Inline message of every invalid control
    pub messages: BTreeMap<NodeId, String>,
}

impl DerivedState {
    pub fn is_visible(&self, node_id: NodeId) -> bool {
        self.visibility.get(&node_id).copied().unwrap_or(false)
    }

    pub fn validation_of(&self, node_id: NodeId) -> Option<ValidationState> {
        self.validation.get(&node_id).copied()
    }

    pub fn is_actionable(&self, node_id: NodeId) -> Option<bool> {
        self.actionable.get(&node_id).copied()
    }

    pub fn message(&self, node_id: NodeId) -> Option<&str> {
        self.messages.get(&node_id).map(String::as_str)
    }

    pub fn visible_elements(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.visibility
            .iter()
            .filter(|(_, visible)| **visible)
            .map(|(node_id, _)| *node_id)
    }

    /// Renders the element tree with the derived state of every element, one element per line
    pub fn describe(&self, doc: &Document) -> String {
        let mut out = String::new();
        for child in doc.children(doc.root()) {
            self.describe_node(doc, *child, 0, &mut out);
        }
        out
    }

    fn describe_node(&self, doc: &Document, node_id: NodeId, depth: usize, out: &mut String) {
        let Some(node) = doc.node_by_id(node_id) else {
            return;
        };
        let NodeData::Element(data) = &node.data else {
            return;
        };

        out.push_str(&"  ".repeat(depth));
        out.push_str(data.name());
        for (name, value) in data.attributes() {
            if value.is_empty() {
                out.push_str(&format!("[{name}]"));
            } else {
                out.push_str(&format!("[{name}={value:?}]"));
            }
        }

        out.push_str(if self.is_visible(node_id) { " visible" } else { " hidden" });
        if let Some(validation) = self.validation_of(node_id) {
            out.push_str(&format!(" {validation}"));
        }
        if let Some(actionable) = self.is_actionable(node_id) {
            out.push_str(if actionable { " actionable" } else { " inert" });
        }
        if let Some(message) = self.message(node_id) {
            out.push_str(&format!(" \"{message}\""));
        }

        let text = doc
            .children(node_id)
            .iter()
            .filter_map(|child| doc.node_by_id(*child).and_then(|node| node.get_text_data()))
            .map(|text| text.value().trim())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !text.is_empty() {
            out.push_str(&format!(" {text:?}"));
        }
        out.push('\n');

        for child in doc.children(node_id) {
            self.describe_node(doc, *child, depth + 1, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deriver::{DeriverSettings, StateDeriver};
    use crate::rules::RuleSet;
    use d7460n_html5::parser::Html5Parser;

    #[test]
    fn describe_tree() {
        let deriver = StateDeriver::with_settings(RuleSet::default(), DeriverSettings::default());
        let doc = Html5Parser::parse_document(
            r#"<form><input name="q" required><button>Send</button></form><p hidden>gone</p>"#,
        )
        .unwrap();

        let state = deriver.derive(&doc);
        assert_eq!(
            state.describe(&doc),
            concat!(
                "form visible\n",
                "  input[name=\"q\"][required] visible indeterminate\n",
                "  button visible inert \"Send\"\n",
                "p[hidden] hidden \"gone\"\n",
            )
        );
        assert_eq!(state.visible_elements().count(), 3);
    }
}
