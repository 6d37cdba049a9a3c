//! Business logic and repository trait definitions for Rehearse.
//!
//! This crate defines the "ports" (repository traits) that the infrastructure
//! layer implements, the pure review scheduling algorithm, and the services
//! built on top of them. It depends only on `rehearse-types` -- never on
//! `rehearse-infra` or any database crate.

pub mod mask;
pub mod reminder;
pub mod repository;
pub mod scheduler;
pub mod service;
pub mod stage;
