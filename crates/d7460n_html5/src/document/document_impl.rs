use core::fmt::Debug;
use std::collections::HashSet;
use std::fmt;

use log::trace;

use crate::document::mutation::{Change, ChangeKind, Mutation, MutationRecord};
use crate::document::observer::{MutationObserver, ObserverId};
use crate::document::Fragment;
use crate::errors::Error;
use crate::node::arena::NodeArena;
use crate::node::data::element::{ControlState, ElementData};
use crate::node::elements::forbidden_attribute;
use crate::node::{Node, NodeData};
use d7460n_shared::location::Location;
use d7460n_shared::node::NodeId;

/// The structural snapshot. It owns every node; all writes go through [`Document::apply`] (or the
/// interaction methods) so that each change is validated, committed as one generation and reported
/// to the observers.
pub struct Document {
    /// Holds and owns all nodes in the document
    pub(crate) arena: NodeArena,
    /// Bumped on every committed mutation
    generation: u64,
    observers: Vec<(ObserverId, Box<dyn MutationObserver>)>,
    next_observer: u64,
}

impl Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.arena.node_count())
            .field("generation", &self.generation)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates an empty document that only holds the document (root) node
    #[must_use]
    pub fn new() -> Self {
        let mut arena = NodeArena::new();
        arena.register_node(Node::new_document());

        Self {
            arena,
            generation: 0,
            observers: Vec::new(),
            next_observer: 0,
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId::root()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn node_count(&self) -> usize {
        self.arena.node_count()
    }

    /// Fetches a node by id or returns None when no node with this ID is found
    pub fn node_by_id(&self, node_id: NodeId) -> Option<&Node> {
        self.arena.node_ref(node_id)
    }

    pub fn element(&self, node_id: NodeId) -> Option<&ElementData> {
        self.node_by_id(node_id).and_then(Node::get_element_data)
    }

    pub fn is_element_named(&self, node_id: NodeId, name: &str) -> bool {
        self.element(node_id).is_some_and(|data| data.name == name)
    }

    pub fn has_attribute(&self, node_id: NodeId, name: &str) -> bool {
        self.element(node_id).is_some_and(|data| data.has_attribute(name))
    }

    pub fn attribute(&self, node_id: NodeId, name: &str) -> Option<&str> {
        self.element(node_id).and_then(|data| data.attribute(name))
    }

    pub fn parent(&self, node_id: NodeId) -> Option<NodeId> {
        self.node_by_id(node_id).and_then(Node::parent_id)
    }

    pub fn children(&self, node_id: NodeId) -> &[NodeId] {
        self.node_by_id(node_id).map(Node::children).unwrap_or_default()
    }

    pub fn element_children(&self, node_id: NodeId) -> Vec<NodeId> {
        self.children(node_id)
            .iter()
            .copied()
            .filter(|child| self.element(*child).is_some())
            .collect()
    }

    /// Returns the element siblings of the node (including the node itself) in document order
    fn element_siblings(&self, node_id: NodeId) -> Vec<NodeId> {
        match self.parent(node_id) {
            Some(parent) => self.element_children(parent),
            None => vec![node_id],
        }
    }

    pub fn previous_element_sibling(&self, node_id: NodeId) -> Option<NodeId> {
        let siblings = self.element_siblings(node_id);
        let pos = siblings.iter().position(|sibling| *sibling == node_id)?;
        pos.checked_sub(1).and_then(|prev| siblings.get(prev).copied())
    }

    pub fn next_element_sibling(&self, node_id: NodeId) -> Option<NodeId> {
        let siblings = self.element_siblings(node_id);
        let pos = siblings.iter().position(|sibling| *sibling == node_id)?;
        siblings.get(pos + 1).copied()
    }

    /// All element siblings that precede the node, nearest first
    pub fn preceding_element_siblings(&self, node_id: NodeId) -> Vec<NodeId> {
        let siblings = self.element_siblings(node_id);
        let Some(pos) = siblings.iter().position(|sibling| *sibling == node_id) else {
            return Vec::new();
        };
        siblings[..pos].iter().rev().copied().collect()
    }

    /// Ancestors of the node, nearest first, up to and including the document node
    pub fn ancestors(&self, node_id: NodeId) -> Vec<NodeId> {
        let mut ancestors = Vec::new();
        let mut cursor = self.parent(node_id);
        while let Some(parent) = cursor {
            ancestors.push(parent);
            cursor = self.parent(parent);
        }
        ancestors
    }

    /// Returns the node itself or the nearest ancestor that is an element with the given name
    pub fn closest(&self, node_id: NodeId, name: &str) -> Option<NodeId> {
        if self.is_element_named(node_id, name) {
            return Some(node_id);
        }
        self.ancestors(node_id)
            .into_iter()
            .find(|ancestor| self.is_element_named(*ancestor, name))
    }

    /// All descendants of the node in tree order, excluding the node itself
    pub fn descendants(&self, node_id: NodeId) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node_id).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            found.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        found
    }

    /// All elements with the given tag name in tree order
    pub fn elements_named(&self, name: &str) -> Vec<NodeId> {
        TreeIterator::new(self)
            .filter(|node_id| self.is_element_named(*node_id, name))
            .collect()
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, node_id: NodeId) -> String {
        let Some(node) = self.node_by_id(node_id) else {
            return String::new();
        };
        if let Some(text) = node.get_text_data() {
            return text.value.clone();
        }

        self.descendants(node_id)
            .into_iter()
            .filter_map(|id| self.node_by_id(id).and_then(Node::get_text_data))
            .map(|text| text.value())
            .collect()
    }

    /// A region is empty when it has no element children and its text is whitespace only.
    /// Comments do not count as content.
    pub fn is_empty_region(&self, node_id: NodeId) -> bool {
        self.children(node_id).iter().all(|child| match self.node_by_id(*child).map(|node| &node.data) {
            Some(NodeData::Element(_)) => false,
            Some(NodeData::Text(text)) => text.is_blank(),
            _ => true,
        })
    }

    pub fn tree_iterator(&self) -> TreeIterator<'_> {
        TreeIterator::new(self)
    }

    /// Subscribes an observer that is called after every committed mutation
    pub fn subscribe(&mut self, observer: Box<dyn MutationObserver>) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push((id, observer));
        id
    }

    /// Removes a subscription. Returns false when the observer was not subscribed.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(observer_id, _)| *observer_id != id);
        before != self.observers.len()
    }

    /// Validates every mutation first and only then applies all of them as one generation. On
    /// error the document is left untouched. Returns the ids of the inserted top-level nodes.
    ///
    /// A mutation that targets a node removed by an earlier `ReplaceChildren` of the same batch
    /// is refused with [`Error::NodeNotFound`].
    pub fn apply(&mut self, mutations: Vec<Mutation>) -> Result<Vec<NodeId>, Error> {
        let mut removed: HashSet<NodeId> = HashSet::new();
        for mutation in &mutations {
            let target = mutation.target();
            if removed.contains(&target) {
                return Err(Error::NodeNotFound(target));
            }
            self.check_mutation(mutation)?;
            if let Mutation::ReplaceChildren { parent, .. } = mutation {
                removed.extend(self.descendants(*parent));
            }
        }

        let mut inserted = Vec::new();
        let mut changes = Vec::with_capacity(mutations.len());

        for mutation in mutations {
            let target = mutation.target();
            match mutation {
                Mutation::ReplaceChildren { parent, content } => {
                    self.remove_children(parent);
                    for fragment in &content {
                        inserted.push(self.insert_fragment(parent, fragment));
                    }
                    changes.push(Change {
                        target,
                        kind: ChangeKind::ChildList,
                    });
                }
                Mutation::AppendChild { parent, content } => {
                    inserted.push(self.insert_fragment(parent, &content));
                    changes.push(Change {
                        target,
                        kind: ChangeKind::ChildList,
                    });
                }
                Mutation::SetAttribute { node, name, value } => {
                    if let Some(data) = self.element_mut(node) {
                        data.add_attribute(&name, &value);
                    }
                    changes.push(Change {
                        target,
                        kind: ChangeKind::Attribute(name.to_ascii_lowercase()),
                    });
                }
                Mutation::RemoveAttribute { node, name } => {
                    if let Some(data) = self.element_mut(node) {
                        data.remove_attribute(&name.to_ascii_lowercase());
                    }
                    changes.push(Change {
                        target,
                        kind: ChangeKind::Attribute(name.to_ascii_lowercase()),
                    });
                }
                Mutation::ResetControl { node } => {
                    if let Some(data) = self.element_mut(node) {
                        data.control = ControlState::default();
                    }
                    changes.push(Change {
                        target,
                        kind: ChangeKind::ControlState,
                    });
                }
                Mutation::SetControl { node, state } => {
                    if let Some(data) = self.element_mut(node) {
                        data.control = state;
                    }
                    changes.push(Change {
                        target,
                        kind: ChangeKind::ControlState,
                    });
                }
            }
        }

        self.commit(changes);
        Ok(inserted)
    }

    /// Replaces all children of `parent` with the given content in one generation
    pub fn replace_children(&mut self, parent: NodeId, content: Vec<Fragment>) -> Result<Vec<NodeId>, Error> {
        self.apply(vec![Mutation::ReplaceChildren { parent, content }])
    }

    pub fn append_child(&mut self, parent: NodeId, content: Fragment) -> Result<NodeId, Error> {
        let inserted = self.apply(vec![Mutation::AppendChild { parent, content }])?;
        inserted.first().copied().ok_or(Error::NodeNotFound(parent))
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), Error> {
        self.apply(vec![Mutation::SetAttribute {
            node,
            name: name.to_owned(),
            value: value.to_owned(),
        }])
        .map(|_| ())
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<(), Error> {
        self.apply(vec![Mutation::RemoveAttribute {
            node,
            name: name.to_owned(),
        }])
        .map(|_| ())
    }

    fn check_mutation(&self, mutation: &Mutation) -> Result<(), Error> {
        let target = mutation.target();
        let node = self.node_by_id(target).ok_or(Error::NodeNotFound(target))?;

        match mutation {
            Mutation::ReplaceChildren { content, .. } => {
                self.check_container(node)?;
                content.iter().try_for_each(Fragment::check)
            }
            Mutation::AppendChild { content, .. } => {
                self.check_container(node)?;
                content.check()
            }
            Mutation::SetAttribute { name, .. } => {
                node.get_element_data().ok_or(Error::NotAnElement(target))?;
                match forbidden_attribute(name) {
                    Some(reason) => Err(Error::AuthoringDefect(reason)),
                    None => Ok(()),
                }
            }
            Mutation::RemoveAttribute { .. } => {
                node.get_element_data().ok_or(Error::NotAnElement(target))?;
                Ok(())
            }
            Mutation::ResetControl { .. } | Mutation::SetControl { .. } => {
                let data = node.get_element_data().ok_or(Error::NotAnElement(target))?;
                if !data.is_form_control() {
                    return Err(Error::NotAFormControl(target));
                }
                Ok(())
            }
        }
    }

    fn check_container(&self, node: &Node) -> Result<(), Error> {
        match &node.data {
            NodeData::Document => Ok(()),
            NodeData::Element(data) if data.is_void() => Err(Error::AuthoringDefect(format!(
                "<{}> is a void element and cannot have children",
                data.name
            ))),
            NodeData::Element(_) => Ok(()),
            _ => Err(Error::NotAnElement(node.id)),
        }
    }

    pub(crate) fn element_mut(&mut self, node_id: NodeId) -> Option<&mut ElementData> {
        self.arena.node_mut(node_id).and_then(Node::get_element_data_mut)
    }

    /// Bumps the generation and notifies all observers with the settled document
    pub(crate) fn commit(&mut self, changes: Vec<Change>) {
        self.generation += 1;
        let record = MutationRecord {
            generation: self.generation,
            changes,
        };
        trace!("document: committed generation {} ({} changes)", record.generation, record.changes.len());

        let observers = std::mem::take(&mut self.observers);
        for (_, observer) in &observers {
            observer.on_mutation(self, &record);
        }
        self.observers = observers;
    }

    /// Registers the node and attaches it as the last child of parent (or at position). Does not
    /// notify observers; used while building a document and while applying mutations.
    pub(crate) fn register_node_at(&mut self, node: Node, parent_id: NodeId, position: Option<usize>) -> NodeId {
        let node_id = self.arena.register_node(node);

        if let Some(parent) = self.arena.node_mut(parent_id) {
            match position {
                Some(position) if position <= parent.children.len() => parent.children.insert(position, node_id),
                _ => parent.children.push(node_id),
            }
        }
        if let Some(node) = self.arena.node_mut(node_id) {
            node.parent = Some(parent_id);
        }

        node_id
    }

    fn insert_fragment(&mut self, parent_id: NodeId, fragment: &Fragment) -> NodeId {
        match fragment {
            Fragment::Text(value) => self.register_node_at(Node::new_text(value, Location::default()), parent_id, None),
            Fragment::Element {
                name,
                attributes,
                children,
            } => {
                let mut data = ElementData::new(name);
                for (attr_name, attr_value) in attributes {
                    data.add_attribute(attr_name, attr_value);
                }
                let node_id = self.register_node_at(Node::new_element(data, Location::default()), parent_id, None);
                for child in children {
                    self.insert_fragment(node_id, child);
                }
                node_id
            }
        }
    }

    /// Removes all children of the node, deleting their subtrees from the arena
    fn remove_children(&mut self, node_id: NodeId) {
        let removed = self.descendants(node_id);
        if let Some(node) = self.arena.node_mut(node_id) {
            node.children.clear();
        }
        for id in removed {
            self.arena.delete_node(id);
        }
    }
}

/// Walks the document in tree order (preorder, depth first), starting at the document node
pub struct TreeIterator<'a> {
    node_stack: Vec<NodeId>,
    document: &'a Document,
}

impl<'a> TreeIterator<'a> {
    #[must_use]
    pub fn new(doc: &'a Document) -> Self {
        Self {
            node_stack: vec![doc.root()],
            document: doc,
        }
    }
}

impl Iterator for TreeIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current_node_id = self.node_stack.pop()?;
        self.node_stack
            .extend(self.document.children(current_node_id).iter().rev().copied());

        Some(current_node_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn doc_with_list() -> (Document, NodeId) {
        let mut doc = Document::new();
        let list = doc
            .append_child(
                doc.root(),
                Fragment::element("ul")
                    .with_child(Fragment::element("li").with_text("one"))
                    .with_child(Fragment::text("  "))
                    .with_child(Fragment::element("li").with_text("two")),
            )
            .unwrap();
        (doc, list)
    }

    #[test]
    fn tree_iterator_is_preorder() {
        let (doc, list) = doc_with_list();
        let order: Vec<NodeId> = doc.tree_iterator().collect();

        assert_eq!(order[0], NodeId::root());
        assert_eq!(order[1], list);
        assert_eq!(order.len(), doc.node_count());
        assert_eq!(doc.text_content(list), "one  two");
    }

    #[test]
    fn element_siblings() {
        let (doc, list) = doc_with_list();
        let items = doc.element_children(list);
        assert_eq!(items.len(), 2);
        assert_eq!(doc.next_element_sibling(items[0]), Some(items[1]));
        assert_eq!(doc.previous_element_sibling(items[1]), Some(items[0]));
        assert_eq!(doc.previous_element_sibling(items[0]), None);
        assert_eq!(doc.preceding_element_siblings(items[1]), vec![items[0]]);
        assert_eq!(doc.closest(items[0], "ul"), Some(list));
    }

    #[test]
    fn empty_region_ignores_whitespace_and_comments() {
        let mut doc = Document::new();
        let aside = doc
            .append_child(doc.root(), Fragment::element("aside").with_text(" \n\t "))
            .unwrap();
        assert!(doc.is_empty_region(aside));

        doc.append_child(aside, Fragment::text("x")).unwrap();
        assert!(!doc.is_empty_region(aside));

        doc.replace_children(aside, vec![Fragment::element("dl")]).unwrap();
        assert!(!doc.is_empty_region(aside));

        doc.replace_children(aside, vec![]).unwrap();
        assert!(doc.is_empty_region(aside));
    }

    #[test]
    fn replace_children_deletes_old_subtree() {
        let (mut doc, list) = doc_with_list();
        let before = doc.node_count();
        let old_items = doc.element_children(list);

        let inserted = doc
            .replace_children(list, vec![Fragment::element("li").with_text("three")])
            .unwrap();

        assert_eq!(inserted.len(), 1);
        assert_eq!(doc.node_count(), before - 5 + 2);
        assert!(old_items.iter().all(|id| doc.node_by_id(*id).is_none()));
        assert_eq!(doc.text_content(list), "three");
    }

    #[test]
    fn forbidden_attribute_leaves_document_untouched() {
        let (mut doc, list) = doc_with_list();
        let generation = doc.generation();

        let result = doc.apply(vec![
            Mutation::SetAttribute {
                node: list,
                name: "hidden".into(),
                value: String::new(),
            },
            Mutation::SetAttribute {
                node: list,
                name: "class".into(),
                value: "menu".into(),
            },
        ]);

        assert!(matches!(result, Err(Error::AuthoringDefect(_))));
        assert!(!doc.has_attribute(list, "hidden"));
        assert_eq!(doc.generation(), generation);
    }

    #[test]
    fn void_elements_refuse_children() {
        let mut doc = Document::new();
        let input = doc.append_child(doc.root(), Fragment::element("input")).unwrap();
        assert!(matches!(
            doc.append_child(input, Fragment::text("x")),
            Err(Error::AuthoringDefect(_))
        ));
    }

    #[test]
    fn batch_refuses_nodes_removed_earlier_in_the_batch() {
        let (mut doc, list) = doc_with_list();
        let first_item = doc.element_children(list)[0];
        let generation = doc.generation();

        let result = doc.apply(vec![
            Mutation::ReplaceChildren {
                parent: list,
                content: vec![Fragment::element("li").with_text("three")],
            },
            Mutation::SetAttribute {
                node: first_item,
                name: "hidden".into(),
                value: String::new(),
            },
        ]);

        assert!(matches!(result, Err(Error::NodeNotFound(node)) if node == first_item));
        assert_eq!(doc.generation(), generation);
        assert_eq!(doc.element_children(list).len(), 2);
        assert_eq!(doc.text_content(list), "one  two");

        // the replaced parent itself stays a valid target
        doc.apply(vec![
            Mutation::ReplaceChildren {
                parent: list,
                content: vec![Fragment::element("li").with_text("three")],
            },
            Mutation::SetAttribute {
                node: list,
                name: "hidden".into(),
                value: String::new(),
            },
        ])
        .unwrap();
        assert!(doc.has_attribute(list, "hidden"));
        assert_eq!(doc.text_content(list), "three");
    }

    #[test]
    fn unknown_node_is_reported() {
        let mut doc = Document::new();
        let missing = NodeId::from(99_usize);
        assert!(matches!(doc.set_attribute(missing, "hidden", ""), Err(Error::NodeNotFound(_))));
    }

    #[test]
    fn observers_see_every_commit_once() {
        let (mut doc, list) = doc_with_list();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        let id = doc.subscribe(Box::new(move |doc: &Document, record: &MutationRecord| {
            assert_eq!(doc.generation(), record.generation);
            sink.lock().push(record.clone());
        }));

        doc.set_attribute(list, "hidden", "").unwrap();
        doc.remove_attribute(list, "hidden").unwrap();
        assert_eq!(seen.lock().len(), 2);
        assert_eq!(seen.lock()[0].changes[0].kind, ChangeKind::Attribute("hidden".into()));

        assert!(doc.unsubscribe(id));
        assert!(!doc.unsubscribe(id));
        doc.set_attribute(list, "hidden", "").unwrap();
        assert_eq!(seen.lock().len(), 2);
    }
}
