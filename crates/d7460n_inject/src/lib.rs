//! Data injection
//!
//! The only writer of content in the d7460n model. Items fetched elsewhere are rendered into the
//! named slots of the manifest (table rows, a detail panel, form fields) and committed to the
//! snapshot in one step. Nothing here decides what is visible; that follows from the structure.
pub mod errors;
pub mod injector;
pub mod item;
pub mod slot;

pub use errors::InjectError;
pub use injector::Injector;
pub use item::Item;
pub use slot::Slot;
