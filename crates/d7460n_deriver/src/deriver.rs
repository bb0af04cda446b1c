use std::collections::BTreeMap;
use std::fmt;

use d7460n_config::config;
use d7460n_html5::document::Document;
use d7460n_html5::node::NodeData;
use d7460n_html5::validity::ValidityState;
use d7460n_shared::node::NodeId;
use log::trace;

use crate::messages::constraint_message;
use crate::rules::RuleSet;
use crate::state::DerivedState;

/// Elements that never render, whatever the rules say
const NON_RENDERED_ELEMENTS: [&str; 9] = ["head", "title", "meta", "link", "base", "script", "style", "template", "noscript"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationState {
    Valid,
    Invalid,
    /// Constraints fail, but the user has not touched the control and it has no default value
    Indeterminate,
}

impl fmt::Display for ValidationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationState::Valid => write!(f, "valid"),
            ValidationState::Invalid => write!(f, "invalid"),
            ValidationState::Indeterminate => write!(f, "indeterminate"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeriverSettings {
    /// Submit buttons require a valid form
    pub gate_on_form_validity: bool,
    /// Descendants of a collapsed `<details>` (except its summary) are not visible
    pub details_exempt: bool,
}

impl Default for DeriverSettings {
    fn default() -> Self {
        Self {
            gate_on_form_validity: true,
            details_exempt: true,
        }
    }
}

impl DeriverSettings {
    pub fn from_config() -> Self {
        Self {
            gate_on_form_validity: config!(bool "deriver.gate_on_form_validity"),
            details_exempt: config!(bool "deriver.details_exempt"),
        }
    }
}

/// Computes visibility, validity and actionability from the current snapshot. Holds no state
/// besides the compiled rules; every answer is recomputed from the document it is given.
#[derive(Debug, Clone)]
pub struct StateDeriver {
    rules: RuleSet,
    settings: DeriverSettings,
}

impl StateDeriver {
    /// Creates a deriver with the settings of the process wide config store
    pub fn new(rules: RuleSet) -> Self {
        Self::with_settings(rules, DeriverSettings::from_config())
    }

    pub fn with_settings(rules: RuleSet, settings: DeriverSettings) -> Self {
        Self { rules, settings }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn settings(&self) -> DeriverSettings {
        self.settings
    }

    /// A node is visible when it and every ancestor render within their parent
    pub fn is_visible(&self, doc: &Document, node_id: NodeId) -> bool {
        if doc.node_by_id(node_id).is_none() {
            return false;
        }

        let mut path = doc.ancestors(node_id);
        path.reverse();
        path.push(node_id);

        path.into_iter().all(|id| self.renders_within_parent(doc, id))
    }

    /// Visibility of a single node assuming its parent is visible
    fn renders_within_parent(&self, doc: &Document, node_id: NodeId) -> bool {
        let Some(node) = doc.node_by_id(node_id) else {
            return false;
        };

        match &node.data {
            NodeData::Document => true,
            NodeData::Comment(_) => false,
            NodeData::Text(_) => !(self.settings.details_exempt && self.collapsed_by_details(doc, node_id)),
            NodeData::Element(data) => {
                // hidden always wins
                if data.has_attribute("hidden") {
                    return false;
                }
                if NON_RENDERED_ELEMENTS.contains(&data.name()) {
                    return false;
                }
                if data.name() == "input" && data.control_type() == "hidden" {
                    return false;
                }
                if self.settings.details_exempt && self.collapsed_by_details(doc, node_id) {
                    return false;
                }

                self.rules.gates_for(doc, node_id).all(|rule| rule.passes(doc, node_id))
            }
        }
    }

    /// True for child nodes of a closed `<details>` other than its first summary
    fn collapsed_by_details(&self, doc: &Document, node_id: NodeId) -> bool {
        let Some(parent) = doc.parent(node_id) else {
            return false;
        };
        if !doc.is_element_named(parent, "details") || doc.has_attribute(parent, "open") {
            return false;
        }

        let summary = doc
            .element_children(parent)
            .into_iter()
            .find(|child| doc.is_element_named(*child, "summary"));
        summary != Some(node_id)
    }

    pub fn validity(&self, doc: &Document, control: NodeId) -> ValidityState {
        doc.validity(control)
    }

    pub fn is_valid(&self, doc: &Document, control: NodeId) -> ValidationState {
        if doc.validity(control).valid() {
            return ValidationState::Valid;
        }
        if !doc.user_interacted(control) && !doc.has_default_value(control) {
            return ValidationState::Indeterminate;
        }
        ValidationState::Invalid
    }

    /// Raw constraint validity of every submittable control owned by the form
    pub fn form_validity(&self, doc: &Document, form: NodeId) -> bool {
        doc.descendants(form)
            .into_iter()
            .filter(|node| doc.is_form_control(*node) && doc.form_owner(*node) == Some(form))
            .all(|control| doc.validity(control).valid())
    }

    pub fn is_actionable(&self, doc: &Document, button: NodeId) -> bool {
        let Some(data) = doc.element(button) else {
            return false;
        };

        let kind = data.control_type();
        let is_button = match data.name() {
            "button" => true,
            "input" => matches!(kind.as_str(), "submit" | "button" | "reset" | "image"),
            _ => false,
        };
        if !is_button || doc.is_disabled(button) {
            return false;
        }

        let is_submit = matches!(kind.as_str(), "submit" | "image");
        if self.settings.gate_on_form_validity && is_submit && !data.has_attribute("formnovalidate") {
            if let Some(form) = doc.form_owner(button) {
                if !doc.has_attribute(form, "novalidate") && !self.form_validity(doc, form) {
                    return false;
                }
            }
        }

        has_label(doc, button)
    }

    /// The inline message of an invalid control. Indeterminate and valid controls have none.
    pub fn validation_message(&self, doc: &Document, control: NodeId) -> Option<String> {
        if self.is_valid(doc, control) != ValidationState::Invalid {
            return None;
        }

        let constraint = doc.validity(control).first_violation()?;
        Some(constraint_message(doc, control, constraint))
    }

    /// Messages of every invalid control in tree order
    pub fn messages(&self, doc: &Document) -> Vec<(NodeId, String)> {
        doc.tree_iterator()
            .filter(|node| doc.is_form_control(*node))
            .filter_map(|control| self.validation_message(doc, control).map(|message| (control, message)))
            .collect()
    }

    /// Derives the complete state of the document in one pass
    pub fn derive(&self, doc: &Document) -> DerivedState {
        let mut state = DerivedState {
            generation: doc.generation(),
            ..DerivedState::default()
        };
        let mut visible: BTreeMap<NodeId, bool> = BTreeMap::new();

        for node_id in doc.tree_iterator() {
            let parent_visible = doc
                .parent(node_id)
                .map_or(true, |parent| visible.get(&parent).copied().unwrap_or(false));
            let is_visible = parent_visible && self.renders_within_parent(doc, node_id);
            visible.insert(node_id, is_visible);

            if doc.element(node_id).is_none() {
                continue;
            }
            state.visibility.insert(node_id, is_visible);

            if doc.is_form_control(node_id) {
                state.validation.insert(node_id, self.is_valid(doc, node_id));
                if let Some(message) = self.validation_message(doc, node_id) {
                    state.messages.insert(node_id, message);
                }
            }
            if is_button_like(doc, node_id) {
                state.actionable.insert(node_id, self.is_actionable(doc, node_id));
            }
        }

        trace!(
            "deriver: generation {} derived ({} elements, {} controls)",
            state.generation,
            state.visibility.len(),
            state.validation.len()
        );
        state
    }
}

fn is_button_like(doc: &Document, node_id: NodeId) -> bool {
    doc.element(node_id).is_some_and(|data| {
        data.name() == "button"
            || (data.name() == "input" && matches!(data.control_type().as_str(), "submit" | "button" | "reset" | "image"))
    })
}

/// Non-whitespace text, an aria-label, or for input buttons their value (submit and reset have a
/// built-in label)
fn has_label(doc: &Document, button: NodeId) -> bool {
    let aria_label = doc.attribute(button, "aria-label").is_some_and(|label| !label.trim().is_empty());
    if aria_label {
        return true;
    }

    let Some(data) = doc.element(button) else {
        return false;
    };
    if data.name() == "input" {
        let value = data.attribute("value").is_some_and(|value| !value.trim().is_empty());
        return value || matches!(data.control_type().as_str(), "submit" | "reset");
    }

    !doc.text_content(button).trim().is_empty()
}
