//! D7460N structural state engine
//!
//! HTML supplies the structure, the data layer only injects content, and every piece of UI state
//! (which regions are visible, whether fields are valid, whether a button can be pressed) is
//! derived from that structure. This crate ties the workspace together: [`Page`] owns one
//! snapshot together with the compiled rules and slots of its manifest.
use std::fs;
use std::path::Path;
use std::sync::Arc;

use d7460n_shared::types::{Error, Result};

pub use d7460n_config as config;
pub use d7460n_css3 as css3;
pub use d7460n_deriver as deriver;
pub use d7460n_html5 as html5;
pub use d7460n_inject as inject;
pub use d7460n_shared as shared;

use d7460n_config::manifest::Manifest;
use d7460n_deriver::{DerivedState, RuleSet, StateDeriver, StateWatcher};
use d7460n_html5::document::{DocumentHandle, MutationRecord};
use d7460n_inject::{Injector, Item};
use log::debug;

/// A loaded page: the shared snapshot, the deriver for its visibility rules and the injector for
/// its slots.
#[derive(Debug)]
pub struct Page {
    handle: DocumentHandle,
    deriver: Arc<StateDeriver>,
    injector: Injector,
}

impl Page {
    /// Reads the markup and compiles the manifest. Any authoring defect in either fails the load.
    pub fn load(html: &str, manifest: &Manifest) -> Result<Self> {
        let handle = d7460n_html5::html_compile(html)?;
        let rules = RuleSet::from_manifest(manifest)?;
        let injector = Injector::new(manifest)?;
        debug!(
            "page: loaded {} nodes with {} rules and {} slots",
            handle.get().node_count(),
            rules.rules().len(),
            injector.slots().len()
        );

        Ok(Self {
            handle,
            deriver: Arc::new(StateDeriver::new(rules)),
            injector,
        })
    }

    /// Reads the page from a file
    pub fn open(path: &Path, manifest: &Manifest) -> Result<Self> {
        let html = fs::read_to_string(path).map_err(Error::IO)?;
        Self::load(&html, manifest)
    }

    /// Same as [`Page::load`] with the built-in manifest
    pub fn load_with_builtin(html: &str) -> Result<Self> {
        Self::load(html, &Manifest::builtin()?)
    }

    pub fn handle(&self) -> &DocumentHandle {
        &self.handle
    }

    pub fn deriver(&self) -> &StateDeriver {
        &self.deriver
    }

    pub fn injector(&self) -> &Injector {
        &self.injector
    }

    /// Derives the state of the current snapshot
    pub fn derive(&self) -> DerivedState {
        self.deriver.derive(&self.handle.get())
    }

    /// Replaces the content of a slot
    pub fn inject(&self, slot: &str, items: &[Item]) -> Result<usize> {
        Ok(self.injector.replace(&self.handle, slot, items)?)
    }

    /// Replaces the content of a slot with the items of a JSON payload
    pub fn inject_json(&self, slot: &str, payload: &str) -> Result<usize> {
        Ok(self.injector.inject_json(&self.handle, slot, payload)?)
    }

    /// Calls the listener with a freshly derived state after every committed mutation
    pub fn watch<F>(&self, listener: F) -> StateWatcher
    where
        F: Fn(&DerivedState, &MutationRecord) + Send + Sync + 'static,
    {
        StateWatcher::watch(&self.handle, Arc::clone(&self.deriver), listener)
    }

    /// The derived state tree in its printable form
    pub fn describe(&self) -> String {
        let doc = self.handle.get();
        self.deriver.derive(&doc).describe(&doc)
    }
}
