//! Priority-ordered capability provisioning: modules declare what they
//! provide and require as opaque tags, and the engine resolves a load order
//! with backtracking when a chosen candidate fails to initialize.

pub mod engine;
pub mod record;

pub use engine::{Engine, ModuleHooks};
pub use record::{ModuleRecord, ModuleState, PRIORITY_MAX, PRIORITY_MIN, PRIORITY_NEUTRAL};
