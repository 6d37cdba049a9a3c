//! Infrastructure layer for Rehearse.
//!
//! Contains implementations of the repository traits defined in `rehearse-core`
//! backed by SQLite, the legacy stage migrator, and the configuration loader.

pub mod config;
pub mod sqlite;
