use crate::node::Node;
use d7460n_shared::node::NodeId;
use std::collections::HashMap;

/// The node arena is the single source for nodes in a document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeArena {
    /// Current nodes stored as <id, node>
    nodes: HashMap<NodeId, Node>,
    /// Next node ID to use
    next_id: NodeId,
}

impl NodeArena {
    /// Creates a new NodeArena
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Gets the node with the given id
    pub fn node_ref(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Get the node with the given id as a mutable reference
    pub(crate) fn node_mut(&mut self, node_id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&node_id)
    }

    pub(crate) fn delete_node(&mut self, node_id: NodeId) -> Option<Node> {
        self.nodes.remove(&node_id)
    }

    /// Registers an unregistered node into the arena and returns its new id. A node that is
    /// already registered keeps its id.
    pub(crate) fn register_node(&mut self, mut node: Node) -> NodeId {
        if node.is_registered() {
            let id = node.id;
            self.nodes.insert(id, node);
            return id;
        }

        let id = self.next_id;
        self.next_id = id.next();

        node.id = id;
        node.registered = true;

        self.nodes.insert(id, node);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::data::element::ElementData;
    use d7460n_shared::location::Location;

    #[test]
    fn register_node() {
        let mut arena = NodeArena::new();
        let root = arena.register_node(Node::new_document());
        let id = arena.register_node(Node::new_element(ElementData::new("main"), Location::default()));

        assert_eq!(root, NodeId::root());
        assert_eq!(id, NodeId::from(1_usize));
        assert_eq!(arena.node_count(), 2);
        assert_eq!(arena.next_id, NodeId::from(2_usize));
    }

    #[test]
    fn register_registered_node_keeps_id() {
        let mut arena = NodeArena::new();
        arena.register_node(Node::new_document());
        let id = arena.register_node(Node::new_text("x", Location::default()));

        let node = arena.node_ref(id).cloned().unwrap();
        assert_eq!(arena.register_node(node), id);
        assert_eq!(arena.node_count(), 2);
    }

    #[test]
    fn delete_node() {
        let mut arena = NodeArena::new();
        let id = arena.register_node(Node::new_text("gone", Location::default()));
        assert!(arena.delete_node(id).is_some());
        assert!(arena.node_ref(id).is_none());
        assert!(arena.delete_node(id).is_none());
    }
}
