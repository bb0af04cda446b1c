use crate::node::data::comment::CommentData;
use crate::node::data::element::ElementData;
use crate::node::data::text::TextData;
use d7460n_shared::location::Location;
use d7460n_shared::node::NodeId;

pub mod arena;
pub mod data;
pub mod elements;
pub mod visitor;

/// Different types of nodes that all have their own data structures (NodeData)
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum NodeType {
    DocumentNode,
    TextNode,
    CommentNode,
    ElementNode,
}

/// Different types of nodes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Document,
    Text(TextData),
    Comment(CommentData),
    Element(Box<ElementData>),
}

/// Node that resides in the arena of a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// ID of the node, 0 is always the root / document node
    pub id: NodeId,
    /// parent of the node, if any
    pub parent: Option<NodeId>,
    /// children of the node, in document order
    pub children: Vec<NodeId>,
    /// actual data of the node
    pub data: NodeData,
    /// Where the node started in the source markup
    pub location: Location,
    /// true when the node is registered to an arena
    pub(crate) registered: bool,
}

impl Node {
    fn new(data: NodeData, location: Location) -> Self {
        Self {
            id: NodeId::default(),
            parent: None,
            children: Vec::new(),
            data,
            location,
            registered: false,
        }
    }

    #[must_use]
    pub fn new_document() -> Self {
        Self::new(NodeData::Document, Location::default())
    }

    #[must_use]
    pub fn new_element(data: ElementData, location: Location) -> Self {
        Self::new(NodeData::Element(Box::new(data)), location)
    }

    #[must_use]
    pub fn new_text(value: &str, location: Location) -> Self {
        Self::new(NodeData::Text(TextData::with_value(value)), location)
    }

    #[must_use]
    pub fn new_comment(value: &str, location: Location) -> Self {
        Self::new(NodeData::Comment(CommentData::with_value(value)), location)
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn is_root(&self) -> bool {
        self.id.is_root()
    }

    pub fn parent_id(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        self.children.as_slice()
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    pub fn type_of(&self) -> NodeType {
        match self.data {
            NodeData::Document => NodeType::DocumentNode,
            NodeData::Text(_) => NodeType::TextNode,
            NodeData::Comment(_) => NodeType::CommentNode,
            NodeData::Element(_) => NodeType::ElementNode,
        }
    }

    pub fn is_element_node(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    pub fn is_text_node(&self) -> bool {
        matches!(self.data, NodeData::Text(_))
    }

    pub fn get_element_data(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(data) => Some(&**data),
            _ => None,
        }
    }

    pub fn get_element_data_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(data) => Some(&mut **data),
            _ => None,
        }
    }

    pub fn get_text_data(&self) -> Option<&TextData> {
        match &self.data {
            NodeData::Text(data) => Some(data),
            _ => None,
        }
    }

    pub fn get_comment_data(&self) -> Option<&CommentData> {
        match &self.data {
            NodeData::Comment(data) => Some(data),
            _ => None,
        }
    }

    /// Returns true when this node is an element with the given (lowercase) tag name
    pub fn is_named(&self, name: &str) -> bool {
        self.get_element_data().is_some_and(|data| data.name == name)
    }
}
