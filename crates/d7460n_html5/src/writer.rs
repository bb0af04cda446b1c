use crate::document::Document;
use crate::node::visitor::Visitor;
use crate::node::{Node, NodeType};
use d7460n_shared::node::NodeId;

/// Elements whose text is written without escaping
const UNESCAPED_TEXT_ELEMENTS: [&str; 2] = ["script", "style"];

// Writer to convert a document (or a part of it) back to markup
pub struct DocumentWriter {
    /// The buffer to write to
    buffer: String,
    /// Whether to include comments in the output
    comments: bool,
    /// Set while inside script or style
    raw_text: bool,
}

impl DocumentWriter {
    pub fn write_from_node(node: NodeId, document: &Document) -> String {
        Self::write(node, document, false)
    }

    pub fn write_with_comments(node: NodeId, document: &Document) -> String {
        Self::write(node, document, true)
    }

    fn write(node: NodeId, document: &Document, comments: bool) -> String {
        let mut w = Self {
            buffer: String::new(),
            comments,
            raw_text: false,
        };

        w.visit_node(node, document);
        w.buffer
    }

    pub fn visit_node(&mut self, id: NodeId, document: &Document) {
        let Some(node) = document.node_by_id(id) else {
            return;
        };

        match node.type_of() {
            NodeType::DocumentNode => {
                self.document_enter(node);
                self.visit_children(node.children(), document);
                self.document_leave(node);
            }
            NodeType::TextNode => {
                self.text_enter(node);
                self.text_leave(node);
            }
            NodeType::CommentNode => {
                self.comment_enter(node);
                self.comment_leave(node);
            }
            NodeType::ElementNode => {
                self.element_enter(node);
                self.visit_children(node.children(), document);
                self.element_leave(node);
            }
        }
    }

    pub fn visit_children(&mut self, children: &[NodeId], document: &Document) {
        for child in children {
            self.visit_node(*child, document);
        }
    }
}

impl Visitor for DocumentWriter {
    fn document_enter(&mut self, _node: &Node) {
        self.buffer.push_str("<!DOCTYPE html>");
    }

    fn document_leave(&mut self, _node: &Node) {}

    fn text_enter(&mut self, node: &Node) {
        if let Some(data) = node.get_text_data() {
            if self.raw_text {
                self.buffer.push_str(data.value());
            } else {
                self.buffer.push_str(&escape_text(data.value()));
            }
        }
    }

    fn text_leave(&mut self, _node: &Node) {}

    fn comment_enter(&mut self, node: &Node) {
        if !self.comments {
            return;
        }
        if let Some(data) = node.get_comment_data() {
            self.buffer.push_str("<!--");
            self.buffer.push_str(data.value());
            self.buffer.push_str("-->");
        }
    }

    fn comment_leave(&mut self, _node: &Node) {}

    fn element_enter(&mut self, node: &Node) {
        if let Some(data) = node.get_element_data() {
            self.buffer.push('<');
            self.buffer.push_str(data.name());

            for (name, value) in data.attributes() {
                self.buffer.push(' ');
                self.buffer.push_str(name);
                if !value.is_empty() {
                    self.buffer.push_str("=\"");
                    self.buffer.push_str(&escape_attribute(value));
                    self.buffer.push('"');
                }
            }

            self.buffer.push('>');
            self.raw_text = UNESCAPED_TEXT_ELEMENTS.contains(&data.name());
        }
    }

    fn element_leave(&mut self, node: &Node) {
        if let Some(data) = node.get_element_data() {
            self.raw_text = false;
            if data.is_void() {
                return;
            }
            self.buffer.push_str("</");
            self.buffer.push_str(data.name());
            self.buffer.push('>');
        }
    }
}

fn escape_text(value: &str) -> String {
    value.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attribute(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}
