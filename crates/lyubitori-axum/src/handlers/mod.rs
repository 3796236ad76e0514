//! HTTP request handlers.
//!
//! Handlers are thin wrappers over the task launcher and registry.

pub mod info;
pub mod status;
pub mod tasks;
