//! Structural state deriver
//!
//! Given a snapshot and a compiled rule set, this crate computes which elements are visible, the
//! validation state of every form control, which buttons are actionable and the inline message
//! of every invalid field. Nothing is stored: each derivation is a pure function of the snapshot,
//! and [`watcher::StateWatcher`] re-runs it after every committed mutation.
pub mod deriver;
pub mod errors;
pub mod messages;
pub mod rules;
pub mod state;
pub mod watcher;

pub use deriver::{DeriverSettings, StateDeriver, ValidationState};
pub use rules::{Gate, RuleSet, VisibilityRule};
pub use state::DerivedState;
pub use watcher::StateWatcher;
