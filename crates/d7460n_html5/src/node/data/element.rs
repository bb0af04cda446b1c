use crate::node::elements::{is_form_control, is_void};
use indexmap::IndexMap;

/// Live state of a form control. `None` means the control still reflects its default
/// (`value` / `checked` attribute, selected option, textarea text).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlState {
    pub value: Option<String>,
    pub checked: Option<bool>,
    /// Set once the user edited or toggled the control
    pub interacted: bool,
}

/// Data structure for element nodes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    /// Name of the element (e.g., div), always lowercase
    pub name: String,
    /// Element's attributes in source order. Names are lowercase.
    pub attributes: IndexMap<String, String>,
    /// Live state, only meaningful for form controls
    pub control: ControlState,
}

impl ElementData {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            attributes: IndexMap::new(),
            control: ControlState::default(),
        }
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn attributes(&self) -> &IndexMap<String, String> {
        &self.attributes
    }

    /// Adding attributes goes through the document so the attribute policy is enforced.
    pub(crate) fn add_attribute(&mut self, name: &str, value: &str) {
        self.attributes.insert(name.to_ascii_lowercase(), value.to_owned());
    }

    pub(crate) fn remove_attribute(&mut self, name: &str) {
        self.attributes.shift_remove(name);
    }

    pub fn is_void(&self) -> bool {
        is_void(&self.name)
    }

    pub fn is_form_control(&self) -> bool {
        is_form_control(&self.name)
    }

    /// Returns the lowercase `type` of an input (defaults to "text"), of a button (defaults to
    /// "submit") or an empty string for other elements.
    pub fn control_type(&self) -> String {
        let default = match self.name.as_str() {
            "input" => "text",
            "button" => "submit",
            _ => return String::new(),
        };

        match self.attribute("type") {
            Some(kind) if !kind.trim().is_empty() => kind.trim().to_ascii_lowercase(),
            _ => default.to_string(),
        }
    }

    pub fn is_checkable(&self) -> bool {
        self.name == "input" && matches!(self.control_type().as_str(), "checkbox" | "radio")
    }
}
