use crate::document::{Document, MutationRecord};

/// Identifies a subscription so it can be removed again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub(crate) u64);

/// Receives every committed mutation together with the settled document
pub trait MutationObserver: Send + Sync {
    fn on_mutation(&self, document: &Document, record: &MutationRecord);
}

impl<F> MutationObserver for F
where
    F: Fn(&Document, &MutationRecord) + Send + Sync,
{
    fn on_mutation(&self, document: &Document, record: &MutationRecord) {
        self(document, record);
    }
}
