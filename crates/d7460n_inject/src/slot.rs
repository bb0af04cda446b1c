//! Content slots and how items are rendered into them
use d7460n_config::config;
use d7460n_config::manifest::{SlotKind, SlotSpec};
use d7460n_css3::selector::CssSelector;
use d7460n_css3::{parse_selector, query_selector};
use d7460n_html5::document::{Document, Fragment, Mutation};
use d7460n_html5::node::data::element::ControlState;
use d7460n_shared::node::NodeId;

use crate::errors::InjectError;
use crate::item::{is_truthy, Item};

/// Input types a fields slot never writes to
const UNFILLED_INPUT_TYPES: [&str; 4] = ["submit", "reset", "button", "image"];

/// A compiled slot of the manifest
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    pub name: String,
    pub kind: SlotKind,
    pub selector: CssSelector,
    /// Keys rendered as non-visible fields (table slots)
    pub hidden_keys: Vec<String>,
}

impl Slot {
    /// Compiles a slot declaration. Slots without their own hidden keys take the
    /// `inject.hidden_keys` setting.
    pub fn compile(spec: &SlotSpec) -> Result<Self, InjectError> {
        let selector = parse_selector(&spec.selector).map_err(|source| InjectError::Selector {
            slot: spec.name.clone(),
            source,
        })?;
        if selector.uses_class_or_id() {
            return Err(InjectError::AuthoringDefect(format!(
                "slot '{}' locates its target by class or id ('{}')",
                spec.name, spec.selector
            )));
        }

        let hidden_keys = match &spec.hidden_keys {
            Some(keys) => keys.clone(),
            None => config!(map "inject.hidden_keys"),
        };

        Ok(Self {
            name: spec.name.clone(),
            kind: spec.kind,
            selector,
            hidden_keys,
        })
    }

    /// The container element of the slot in the given document
    pub fn locate(&self, doc: &Document) -> Result<NodeId, InjectError> {
        query_selector(doc, &self.selector).ok_or_else(|| {
            InjectError::AuthoringDefect(format!(
                "slot '{}' has no target element matching '{}'",
                self.name, self.selector
            ))
        })
    }

    fn is_hidden_key(&self, key: &str) -> bool {
        self.hidden_keys.iter().any(|hidden| hidden == key)
    }

    /// The mutations that replace the whole content of the slot with the given items
    pub fn mutations(&self, doc: &Document, target: NodeId, items: &[Item]) -> Vec<Mutation> {
        match self.kind {
            SlotKind::Table => vec![Mutation::ReplaceChildren {
                parent: target,
                content: items.iter().map(|item| self.table_row(item)).collect(),
            }],
            SlotKind::Panel => vec![Mutation::ReplaceChildren {
                parent: target,
                content: items.first().map(description_list).into_iter().collect(),
            }],
            SlotKind::Fields => field_states(doc, target, items.first()),
        }
    }

    fn table_row(&self, item: &Item) -> Fragment {
        item.fields().fold(Fragment::element("tr"), |row, (key, value)| {
            let cell = if self.is_hidden_key(key) {
                Fragment::element("td").with_attribute("hidden", "").with_child(
                    Fragment::element("input")
                        .with_attribute("type", "hidden")
                        .with_attribute("name", key)
                        .with_attribute("value", value),
                )
            } else {
                Fragment::element("td").with_text(value)
            };
            row.with_child(cell)
        })
    }
}

fn description_list(item: &Item) -> Fragment {
    item.fields().fold(Fragment::element("dl"), |list, (key, value)| {
        list.with_child(Fragment::element("dt").with_text(key))
            .with_child(Fragment::element("dd").with_text(value))
    })
}

/// Live state for every named control inside the slot. Controls whose name is absent from the
/// item are emptied.
fn field_states(doc: &Document, target: NodeId, item: Option<&Item>) -> Vec<Mutation> {
    doc.descendants(target)
        .into_iter()
        .filter_map(|node| {
            let data = doc.element(node)?;
            if !data.is_form_control() || UNFILLED_INPUT_TYPES.contains(&data.control_type().as_str()) {
                return None;
            }
            let name = data.attribute("name").filter(|name| !name.is_empty())?;
            let value = item.and_then(|item| item.get(name));

            let state = match (data.is_checkable(), value) {
                (true, Some(value)) if data.control_type() == "radio" => ControlState {
                    checked: Some(data.attribute("value").unwrap_or("on") == value),
                    ..ControlState::default()
                },
                (true, value) => ControlState {
                    checked: Some(value.is_some_and(is_truthy)),
                    ..ControlState::default()
                },
                (false, value) => ControlState {
                    value: Some(value.unwrap_or_default().to_owned()),
                    ..ControlState::default()
                },
            };
            Some(Mutation::SetControl { node, state })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use d7460n_html5::parser::Html5Parser;
    use d7460n_html5::writer::DocumentWriter;

    fn spec(kind: SlotKind, selector: &str, hidden_keys: Option<Vec<&str>>) -> SlotSpec {
        SlotSpec {
            name: "slot".into(),
            selector: selector.into(),
            kind,
            hidden_keys: hidden_keys.map(|keys| keys.into_iter().map(str::to_string).collect()),
        }
    }

    fn apply(html: &str, slot: &Slot, items: &[Item]) -> Document {
        let mut doc = Html5Parser::parse_document(html).unwrap();
        let target = slot.locate(&doc).unwrap();
        let mutations = slot.mutations(&doc, target, items);
        doc.apply(mutations).unwrap();
        doc
    }

    #[test]
    fn table_rows_hide_configured_keys() {
        let slot = Slot::compile(&spec(SlotKind::Table, "tbody", Some(vec!["id"]))).unwrap();
        let doc = apply(
            "<table><tbody><tr><td>old</td></tr></tbody></table>",
            &slot,
            &[Item::new().with("id", "7").with("name", "Ada & co")],
        );

        let tbody = slot.locate(&doc).unwrap();
        assert_eq!(
            DocumentWriter::write_from_node(tbody, &doc),
            r#"<tbody><tr><td hidden><input type="hidden" name="id" value="7"></td><td>Ada &amp; co</td></tr></tbody>"#
        );
    }

    #[test]
    fn hidden_keys_default_to_setting() {
        let slot = Slot::compile(&spec(SlotKind::Table, "tbody", None)).unwrap();
        assert_eq!(slot.hidden_keys, vec!["id".to_string()]);
    }

    #[test]
    fn panel_shows_first_item_only() {
        let slot = Slot::compile(&spec(SlotKind::Panel, "aside", None)).unwrap();
        let items = [Item::new().with("name", "Ada"), Item::new().with("name", "Grace")];
        let doc = apply("<aside></aside>", &slot, &items);

        let aside = slot.locate(&doc).unwrap();
        assert_eq!(
            DocumentWriter::write_from_node(aside, &doc),
            "<aside><dl><dt>name</dt><dd>Ada</dd></dl></aside>"
        );

        let doc = apply("<aside><p>stale</p></aside>", &slot, &[]);
        assert!(doc.is_empty_region(slot.locate(&doc).unwrap()));
    }

    #[test]
    fn fields_take_values_and_reset_the_rest() {
        let slot = Slot::compile(&spec(SlotKind::Fields, "fieldset", None)).unwrap();
        let doc = apply(
            r#"<fieldset><input name="name" value="old"><input name="note" value="keep?">
               <input type="checkbox" name="active"><input type="radio" name="size" value="s">
               <input type="radio" name="size" value="l" checked><textarea name="bio"></textarea>
               <button name="go">Go</button></fieldset>"#,
            &slot,
            &[Item::new().with("name", "Ada").with("active", "yes").with("size", "s").with("bio", "hi")],
        );

        let inputs = doc.elements_named("input");
        assert_eq!(doc.control_value(inputs[0]), "Ada");
        assert_eq!(doc.control_value(inputs[1]), "");
        assert!(doc.is_checked(inputs[2]));
        assert!(doc.is_checked(inputs[3]));
        assert!(!doc.is_checked(inputs[4]));
        assert_eq!(doc.control_value(doc.elements_named("textarea")[0]), "hi");
        assert!(inputs.iter().all(|input| !doc.user_interacted(*input)));
    }

    #[test]
    fn class_selector_is_a_defect() {
        let err = Slot::compile(&spec(SlotKind::Panel, "aside.detail", None)).unwrap_err();
        assert!(matches!(err, InjectError::AuthoringDefect(_)));
    }

    #[test]
    fn missing_target_is_a_defect() {
        let slot = Slot::compile(&spec(SlotKind::Panel, "aside", None)).unwrap();
        let doc = Html5Parser::parse_document("<main></main>").unwrap();
        assert!(matches!(slot.locate(&doc), Err(InjectError::AuthoringDefect(_))));
    }
}
