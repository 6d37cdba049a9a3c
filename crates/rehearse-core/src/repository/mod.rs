//! Repository trait definitions (ports).
//!
//! These traits define the storage interface that the infrastructure layer
//! (rehearse-infra) implements. The core crate never depends on any
//! specific storage technology.

pub mod item;
pub mod reminder;
pub mod settings;
