//! Bootstrap plumbing for the `lantern` binary, split into a library so
//! the end-to-end scenarios can be driven from integration tests.

pub mod bootstrap;
pub mod bootstrappers;
pub mod error;
pub mod module;
