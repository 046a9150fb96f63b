//! Sessions: the engine owns one, each running game owns its own. Exposes
//! the per-thread Session Registry, a per-session event bus, and a minimal
//! execution environment a scripting layer can hang APIs off of.

pub mod env;
pub mod events;
pub mod registry;
pub mod session;

pub use env::ExecutionEnvironment;
pub use events::{EventBus, Handler, HookGuard, StopProcessing};
pub use registry::{current, current_or_engine, engine_session, push, set_engine_session, SessionGuard};
pub use session::Session;
