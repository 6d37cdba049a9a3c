//! Services orchestrating repositories for the front-end.

pub mod review;
pub mod settings;
