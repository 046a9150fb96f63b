//! The per-session execution environment: a namespace for registered APIs,
//! the seam a scripting layer would compile and run code through.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

/// Holds whatever named services a scripting layer wants reachable from
/// code running under a [`crate::Session`]. Lantern itself doesn't define a
/// scripting language; this is the seam an embedder plugs one into.
#[derive(Default)]
pub struct ExecutionEnvironment {
	apis: Mutex<HashMap<String, Arc<dyn Any + Send + Sync>>>,
}

impl ExecutionEnvironment {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register_api(&self, name: impl Into<String>, api: Arc<dyn Any + Send + Sync>) {
		self.apis.lock().insert(name.into(), api);
	}

	#[must_use]
	pub fn api(&self, name: &str) -> Option<Arc<dyn Any + Send + Sync>> {
		self.apis.lock().get(name).cloned()
	}

	/// Called when this environment becomes the current one for its thread.
	/// A no-op by default; an embedder's subclassed equivalent would swap in
	/// language-runtime globals here.
	pub fn activate(&self) {}

	/// Called when this environment stops being current.
	pub fn deactivate(&self) {}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn register_and_fetch_api() {
		let env = ExecutionEnvironment::new();
		env.register_api("greeter", Arc::new(String::from("hi")));

		let api = env.api("greeter").unwrap();
		assert_eq!(api.downcast_ref::<String>().unwrap(), "hi");
		assert!(env.api("missing").is_none());
	}
}
