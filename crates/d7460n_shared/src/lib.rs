//! Shared functionality
//!
//! This crate supplies the primitives every other d7460n crate agrees on: node identifiers,
//! source locations and the common error/result types.

pub mod location;
pub mod node;
pub mod types;
