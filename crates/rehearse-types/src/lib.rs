//! Shared domain types for Rehearse.
//!
//! This crate contains the core domain types used across the workspace:
//! review items, recall quality, per-chat settings, configuration and the
//! associated error types.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod config;
pub mod error;
pub mod item;
pub mod settings;
