//! User interaction with the snapshot. Every operation marks the control as interacted with and
//! commits exactly one generation, so observers recompute once per user action.
use crate::document::{Change, ChangeKind, Document};
use crate::errors::Error;
use d7460n_shared::node::NodeId;
use log::debug;

impl Document {
    /// Replaces the value of a text-like input, a textarea or a select (by option value).
    /// Interaction with a disabled control is ignored.
    pub fn set_value(&mut self, node_id: NodeId, value: &str) -> Result<(), Error> {
        let data = self.element(node_id).ok_or_else(|| self.missing_or_not_element(node_id))?;
        if !data.is_form_control() || data.is_checkable() {
            return Err(Error::NotAFormControl(node_id));
        }
        if self.is_disabled(node_id) {
            debug!("interaction: ignoring value change of disabled control {node_id}");
            return Ok(());
        }

        if let Some(data) = self.element_mut(node_id) {
            data.control.value = Some(value.to_owned());
            data.control.interacted = true;
        }
        self.commit(vec![Change {
            target: node_id,
            kind: ChangeKind::ControlState,
        }]);

        Ok(())
    }

    /// Sets the checkedness of a checkbox or radio. Checking a radio unchecks the rest of its group.
    pub fn set_checked(&mut self, node_id: NodeId, checked: bool) -> Result<(), Error> {
        let data = self.element(node_id).ok_or_else(|| self.missing_or_not_element(node_id))?;
        if !data.is_checkable() {
            return Err(Error::NotAFormControl(node_id));
        }
        if self.is_disabled(node_id) {
            debug!("interaction: ignoring toggle of disabled control {node_id}");
            return Ok(());
        }

        let is_radio = data.control_type() == "radio";
        let others: Vec<NodeId> = if is_radio && checked {
            self.radio_group(node_id)
                .into_iter()
                .filter(|radio| *radio != node_id)
                .collect()
        } else {
            Vec::new()
        };

        let mut changes = Vec::with_capacity(others.len() + 1);
        for radio in others {
            if let Some(data) = self.element_mut(radio) {
                data.control.checked = Some(false);
                changes.push(Change {
                    target: radio,
                    kind: ChangeKind::ControlState,
                });
            }
        }
        if let Some(data) = self.element_mut(node_id) {
            data.control.checked = Some(checked);
            data.control.interacted = true;
        }
        changes.push(Change {
            target: node_id,
            kind: ChangeKind::ControlState,
        });

        self.commit(changes);
        Ok(())
    }

    /// What a click does: flips a checkbox, checks a radio
    pub fn toggle_checked(&mut self, node_id: NodeId) -> Result<(), Error> {
        let data = self.element(node_id).ok_or_else(|| self.missing_or_not_element(node_id))?;
        if data.control_type() == "radio" {
            return self.set_checked(node_id, true);
        }

        let checked = self.is_checked(node_id);
        self.set_checked(node_id, !checked)
    }

    /// Opens a closed `<details>` and closes an open one
    pub fn toggle_details(&mut self, node_id: NodeId) -> Result<(), Error> {
        let data = self.element(node_id).ok_or_else(|| self.missing_or_not_element(node_id))?;
        if data.name() != "details" {
            return Err(Error::AuthoringDefect(format!("<{}> cannot be toggled open", data.name())));
        }

        if data.has_attribute("open") {
            self.remove_attribute(node_id, "open")
        } else {
            self.set_attribute(node_id, "open", "")
        }
    }

    fn missing_or_not_element(&self, node_id: NodeId) -> Error {
        match self.node_by_id(node_id) {
            Some(_) => Error::NotAnElement(node_id),
            None => Error::NodeNotFound(node_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MutationRecord;
    use crate::parser::Html5Parser;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn set_value_marks_interaction() {
        let mut doc = Html5Parser::parse_document(r#"<form><input name="q" required></form>"#).unwrap();
        let input = doc.elements_named("input")[0];
        assert!(!doc.user_interacted(input));
        assert!(!doc.validity(input).valid());

        doc.set_value(input, "hello").unwrap();
        assert!(doc.user_interacted(input));
        assert_eq!(doc.control_value(input), "hello");
        assert!(doc.validity(input).valid());
    }

    #[test]
    fn select_value_picks_option() {
        let mut doc = Html5Parser::parse_document(r#"<select><option value="a">A</option><option value="b">B</option></select>"#).unwrap();
        let select = doc.elements_named("select")[0];
        let options = doc.options(select);

        assert!(doc.is_checked(options[0]));
        doc.set_value(select, "b").unwrap();
        assert!(doc.is_checked(options[1]));
        assert_eq!(doc.control_value(select), "b");
    }

    #[test]
    fn radios_uncheck_their_group() {
        let mut doc = Html5Parser::parse_document(
            r#"<form><input type="radio" name="r" checked><input type="radio" name="r"></form>"#,
        )
        .unwrap();
        let radios = doc.elements_named("input");

        doc.toggle_checked(radios[1]).unwrap();
        assert!(!doc.is_checked(radios[0]));
        assert!(doc.is_checked(radios[1]));

        // clicking a checked radio keeps it checked
        doc.toggle_checked(radios[1]).unwrap();
        assert!(doc.is_checked(radios[1]));
    }

    #[test]
    fn checkbox_toggles_and_commits_once() {
        let mut doc = Html5Parser::parse_document(r#"<input type="checkbox">"#).unwrap();
        let checkbox = doc.elements_named("input")[0];
        let records = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&records);
        doc.subscribe(Box::new(move |_: &Document, _: &MutationRecord| *sink.lock() += 1));

        doc.toggle_checked(checkbox).unwrap();
        assert!(doc.is_checked(checkbox));
        doc.toggle_checked(checkbox).unwrap();
        assert!(!doc.is_checked(checkbox));
        assert_eq!(*records.lock(), 2);
    }

    #[test]
    fn disabled_controls_ignore_interaction() {
        let mut doc = Html5Parser::parse_document(r#"<input disabled><input type="checkbox" disabled>"#).unwrap();
        let inputs = doc.elements_named("input");
        let generation = doc.generation();

        doc.set_value(inputs[0], "x").unwrap();
        doc.toggle_checked(inputs[1]).unwrap();
        assert_eq!(doc.control_value(inputs[0]), "");
        assert!(!doc.is_checked(inputs[1]));
        assert_eq!(doc.generation(), generation);
    }

    #[test]
    fn details_toggle() {
        let mut doc = Html5Parser::parse_document("<details><summary>More</summary><p>x</p></details>").unwrap();
        let details = doc.elements_named("details")[0];

        doc.toggle_details(details).unwrap();
        assert!(doc.has_attribute(details, "open"));
        doc.toggle_details(details).unwrap();
        assert!(!doc.has_attribute(details, "open"));

        let summary = doc.elements_named("summary")[0];
        assert!(matches!(doc.toggle_details(summary), Err(Error::AuthoringDefect(_))));
    }

    #[test]
    fn wrong_targets() {
        let mut doc = Html5Parser::parse_document("<p>text</p>").unwrap();
        let p = doc.elements_named("p")[0];
        let text = doc.children(p)[0];

        assert!(matches!(doc.set_value(p, "x"), Err(Error::NotAFormControl(_))));
        assert!(matches!(doc.set_checked(text, true), Err(Error::NotAnElement(_))));
        assert!(matches!(doc.toggle_checked(NodeId::from(999_usize)), Err(Error::NodeNotFound(_))));
    }
}
