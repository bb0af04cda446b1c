use crate::errors::Error;
use crate::node::elements::{forbidden_attribute, is_void};

/// A detached piece of structure. Fragments are built completely before they are committed to a
/// document, so a reader never observes a half-built subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Element {
        name: String,
        attributes: Vec<(String, String)>,
        children: Vec<Fragment>,
    },
    Text(String),
}

impl Fragment {
    #[must_use]
    pub fn element(name: &str) -> Self {
        Fragment::Element {
            name: name.to_ascii_lowercase(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn text(value: &str) -> Self {
        Fragment::Text(value.to_owned())
    }

    /// Adds an attribute. Has no effect on text fragments.
    #[must_use]
    pub fn with_attribute(mut self, attr_name: &str, attr_value: &str) -> Self {
        if let Fragment::Element { attributes, .. } = &mut self {
            attributes.push((attr_name.to_ascii_lowercase(), attr_value.to_owned()));
        }
        self
    }

    /// Appends a child. Has no effect on text fragments.
    #[must_use]
    pub fn with_child(mut self, child: Fragment) -> Self {
        if let Fragment::Element { children, .. } = &mut self {
            children.push(child);
        }
        self
    }

    #[must_use]
    pub fn with_text(self, value: &str) -> Self {
        self.with_child(Fragment::text(value))
    }

    /// Verifies the fragment against the attribute policy and the void element rules
    pub fn check(&self) -> Result<(), Error> {
        let Fragment::Element {
            name,
            attributes,
            children,
        } = self
        else {
            return Ok(());
        };

        for (attr_name, _) in attributes {
            if let Some(reason) = forbidden_attribute(attr_name) {
                return Err(Error::AuthoringDefect(format!("<{name}>: {reason}")));
            }
        }

        if is_void(name) && !children.is_empty() {
            return Err(Error::AuthoringDefect(format!("<{name}> is a void element and cannot have children")));
        }

        children.iter().try_for_each(Fragment::check)
    }

    /// Number of nodes the fragment expands to
    pub fn node_count(&self) -> usize {
        match self {
            Fragment::Text(_) => 1,
            Fragment::Element { children, .. } => 1 + children.iter().map(Fragment::node_count).sum::<usize>(),
        }
    }
}
