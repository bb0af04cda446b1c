use crate::document::Fragment;
use crate::node::data::element::ControlState;
use d7460n_shared::node::NodeId;

/// A single structural change. A list of mutations is validated as a whole and committed as one
/// generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Replaces all children of `parent` with the given content
    ReplaceChildren { parent: NodeId, content: Vec<Fragment> },
    /// Appends content as the last child of `parent`
    AppendChild { parent: NodeId, content: Fragment },
    SetAttribute { node: NodeId, name: String, value: String },
    RemoveAttribute { node: NodeId, name: String },
    /// Drops the live value/checkedness of a control so it reflects its defaults again
    ResetControl { node: NodeId },
    /// Replaces the live state of a control (data injection, not user interaction)
    SetControl { node: NodeId, state: ControlState },
}

impl Mutation {
    pub fn target(&self) -> NodeId {
        match self {
            Mutation::ReplaceChildren { parent, .. } | Mutation::AppendChild { parent, .. } => *parent,
            Mutation::SetAttribute { node, .. }
            | Mutation::RemoveAttribute { node, .. }
            | Mutation::ResetControl { node }
            | Mutation::SetControl { node, .. } => *node,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeKind {
    ChildList,
    Attribute(String),
    ControlState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub target: NodeId,
    pub kind: ChangeKind,
}

/// Handed to observers once a mutation has been committed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    /// Generation of the document after the commit
    pub generation: u64,
    pub changes: Vec<Change>,
}
