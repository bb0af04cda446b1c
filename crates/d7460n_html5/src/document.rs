pub mod document_impl;
pub mod fragment;
pub mod handle;
pub mod mutation;
pub mod observer;

pub use document_impl::{Document, TreeIterator};
pub use fragment::Fragment;
pub use handle::DocumentHandle;
pub use mutation::{Change, ChangeKind, Mutation, MutationRecord};
pub use observer::{MutationObserver, ObserverId};
