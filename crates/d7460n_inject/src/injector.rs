use std::collections::HashSet;
use std::fmt::Display;

use d7460n_config::config;
use d7460n_config::manifest::Manifest;
use d7460n_html5::document::DocumentHandle;
use log::{debug, warn};

use crate::errors::InjectError;
use crate::item::Item;
use crate::slot::Slot;

/// Replaces the content of named slots. Every replacement is built completely, validated, and
/// committed as a single generation under the document's write lock, so readers see either the
/// old content or the new content and never anything in between.
#[derive(Debug, Clone)]
pub struct Injector {
    slots: Vec<Slot>,
    /// Largest number of items a slot accepts. Zero means no limit.
    max_items: usize,
}

impl Injector {
    /// Compiles the slots of a manifest. The item limit comes from `inject.max_items`.
    pub fn new(manifest: &Manifest) -> Result<Self, InjectError> {
        let mut names = HashSet::new();
        let mut slots = Vec::with_capacity(manifest.slots.len());

        for spec in &manifest.slots {
            if !names.insert(spec.name.as_str()) {
                return Err(InjectError::AuthoringDefect(format!(
                    "slot '{}' is declared more than once",
                    spec.name
                )));
            }
            slots.push(Slot::compile(spec)?);
        }

        Ok(Self {
            slots,
            max_items: config!(uint "inject.max_items"),
        })
    }

    #[must_use]
    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn slot(&self, name: &str) -> Option<&Slot> {
        self.slots.iter().find(|slot| slot.name == name)
    }

    /// Replaces the whole content of the slot with the given items. Returns the number of items
    /// injected. On error the document is left untouched.
    pub fn replace(&self, handle: &DocumentHandle, slot_name: &str, items: &[Item]) -> Result<usize, InjectError> {
        let slot = self
            .slot(slot_name)
            .ok_or_else(|| InjectError::AuthoringDefect(format!("unknown slot '{slot_name}'")))?;

        if self.max_items > 0 && items.len() > self.max_items {
            warn!(
                "inject: refusing {} items for slot '{slot_name}' (limit {})",
                items.len(),
                self.max_items
            );
            return Err(InjectError::TooManyItems {
                slot: slot_name.to_owned(),
                count: items.len(),
                limit: self.max_items,
            });
        }

        let mut doc = handle.get_mut();
        let target = slot.locate(&doc)?;
        let mutations = slot.mutations(&doc, target, items);
        doc.apply(mutations)?;

        debug!(
            "inject: replaced slot '{slot_name}' with {} items (generation {})",
            items.len(),
            doc.generation()
        );
        Ok(items.len())
    }

    /// Decodes a JSON payload and replaces the slot with its items. A payload that cannot be
    /// decoded is a data injection failure and leaves the slot as it was.
    pub fn inject_json(&self, handle: &DocumentHandle, slot_name: &str, payload: &str) -> Result<usize, InjectError> {
        match Item::parse_list(slot_name, payload) {
            Ok(items) => self.replace(handle, slot_name, &items),
            Err(InjectError::DataInjectionFailure { reason, .. }) => Err(self.fail(slot_name, reason)),
            Err(err) => Err(err),
        }
    }

    /// Reports that the data for a slot could not be obtained. Nothing in the document changes;
    /// the slot keeps its current content.
    pub fn fail(&self, slot_name: &str, reason: impl Display) -> InjectError {
        warn!("inject: data for slot '{slot_name}' is unavailable: {reason}");
        InjectError::DataInjectionFailure {
            slot: slot_name.to_owned(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use d7460n_config::manifest::{SlotKind, SlotSpec};
    use d7460n_html5::document::{Document, MutationRecord};
    use d7460n_html5::html_compile;
    use parking_lot::Mutex;
    use std::sync::Arc;

    const PAGE: &str = r#"<main><table><tbody></tbody></table><aside><p>nothing selected</p></aside>
        <form><fieldset><input name="name" required></fieldset></form></main>"#;

    fn injector() -> Injector {
        Injector::new(&Manifest::builtin().unwrap()).unwrap().with_max_items(0)
    }

    fn records(count: usize) -> Vec<Item> {
        (1..=count)
            .map(|idx| Item::new().with("id", &idx.to_string()).with("name", &format!("name {idx}")))
            .collect()
    }

    #[test]
    fn replaces_wholesale() {
        let handle = html_compile(PAGE).unwrap();
        let injector = injector();

        assert_eq!(injector.replace(&handle, "records", &records(3)).unwrap(), 3);
        assert_eq!(injector.replace(&handle, "records", &records(2)).unwrap(), 2);

        let doc = handle.get();
        assert_eq!(doc.elements_named("tr").len(), 2);
        let hidden_fields = doc
            .elements_named("input")
            .into_iter()
            .filter(|input| doc.attribute(*input, "type") == Some("hidden"))
            .count();
        assert_eq!(hidden_fields, 2);
    }

    #[test]
    fn one_generation_per_replacement() {
        let handle = html_compile(PAGE).unwrap();
        let records_seen: Arc<Mutex<Vec<u64>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&records_seen);
        handle
            .get_mut()
            .subscribe(Box::new(move |_: &Document, record: &MutationRecord| sink.lock().push(record.generation)));

        injector().replace(&handle, "records", &records(5)).unwrap();
        assert_eq!(*records_seen.lock(), vec![1]);
    }

    #[test]
    fn failed_payload_leaves_the_slot_untouched() {
        let handle = html_compile(PAGE).unwrap();
        let injector = injector();
        let before = handle.get().generation();

        testing_logger::setup();
        let err = injector.inject_json(&handle, "detail", "{ not json").unwrap_err();

        assert!(matches!(err, InjectError::DataInjectionFailure { ref slot, .. } if slot == "detail"));
        assert_eq!(handle.get().generation(), before);
        assert_eq!(handle.get().elements_named("p").len(), 1);
        testing_logger::validate(|captured_logs| {
            assert_eq!(captured_logs.len(), 1);
            assert_eq!(captured_logs[0].level, log::Level::Warn);
        });
    }

    #[test]
    fn too_many_items_are_refused() {
        let handle = html_compile(PAGE).unwrap();
        let err = injector().with_max_items(2).replace(&handle, "records", &records(3)).unwrap_err();

        assert!(matches!(err, InjectError::TooManyItems { count: 3, limit: 2, .. }));
        assert!(handle.get().elements_named("tr").is_empty());
    }

    #[test]
    fn unknown_slot_and_missing_target() {
        let handle = html_compile("<main></main>").unwrap();
        let injector = injector();

        assert!(matches!(injector.replace(&handle, "nope", &[]), Err(InjectError::AuthoringDefect(_))));
        assert!(matches!(injector.replace(&handle, "records", &[]), Err(InjectError::AuthoringDefect(_))));
        assert_eq!(handle.get().generation(), 0);
    }

    #[test]
    fn duplicate_slot_names_are_a_defect() {
        let slot = SlotSpec {
            name: "records".into(),
            selector: "tbody".into(),
            kind: SlotKind::Table,
            hidden_keys: None,
        };
        let manifest = Manifest {
            slots: vec![slot.clone(), slot],
            rules: Vec::new(),
        };
        assert!(matches!(Injector::new(&manifest), Err(InjectError::AuthoringDefect(_))));
    }
}
