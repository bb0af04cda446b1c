//! Re-derivation driven by document mutations.
use std::sync::Arc;

use d7460n_html5::document::{Document, DocumentHandle, MutationObserver, MutationRecord, ObserverId};
use log::trace;

use crate::deriver::StateDeriver;
use crate::state::DerivedState;

/// Observer that derives a fresh state after every committed mutation and hands it to the
/// listener. Nothing derived is kept between mutations.
struct DeriveOnMutation<F> {
    deriver: Arc<StateDeriver>,
    listener: F,
}

impl<F> MutationObserver for DeriveOnMutation<F>
where
    F: Fn(&DerivedState, &MutationRecord) + Send + Sync,
{
    fn on_mutation(&self, doc: &Document, record: &MutationRecord) {
        trace!("watcher: re-deriving after generation {}", record.generation);
        let state = self.deriver.derive(doc);
        (self.listener)(&state, record);
    }
}

/// Subscription of a deriver to a document
#[derive(Debug)]
pub struct StateWatcher {
    handle: DocumentHandle,
    id: ObserverId,
}

impl StateWatcher {
    /// Starts watching. The listener runs on the thread that commits the mutation, while the
    /// document is still locked for writing; it must not lock the handle again.
    pub fn watch<F>(handle: &DocumentHandle, deriver: Arc<StateDeriver>, listener: F) -> Self
    where
        F: Fn(&DerivedState, &MutationRecord) + Send + Sync + 'static,
    {
        let id = handle.get_mut().subscribe(Box::new(DeriveOnMutation { deriver, listener }));

        Self {
            handle: handle.clone(),
            id,
        }
    }

    /// Stops watching. Returns false when the subscription was already gone.
    pub fn stop(self) -> bool {
        self.handle.get_mut().unsubscribe(self.id)
    }
}
