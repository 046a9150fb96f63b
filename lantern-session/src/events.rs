//! A per-session event bus: named events with ordered handlers.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

/// Returned by a handler to stop the remaining handlers for this emission
/// from running, without treating it as a failure.
pub struct StopProcessing;

pub type Handler = Arc<dyn Fn(&str, &(dyn Any + Send + Sync)) -> Result<(), StopProcessing> + Send + Sync>;

/// Dispatches named events to registered handlers in registration order,
/// logging (rather than propagating) a handler's panic so one bad listener
/// can't take down the emitter.
#[derive(Default)]
pub struct EventBus {
	handlers: Mutex<HashMap<String, Vec<Handler>>>,
}

impl EventBus {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `handler` to run last among the handlers currently bound to
	/// `event`.
	pub fn hook(&self, event: impl Into<String>, handler: Handler) {
		self.handlers.lock().entry(event.into()).or_default().push(handler);
	}

	/// Registers `handler` to run first.
	pub fn hook_first(&self, event: impl Into<String>, handler: Handler) {
		self.handlers.lock().entry(event.into()).or_default().insert(0, handler);
	}

	/// Removes the first handler bound to `event` that is the same
	/// allocation as `handler`.
	pub fn unhook(&self, event: &str, handler: &Handler) {
		if let Some(handlers) = self.handlers.lock().get_mut(event) {
			if let Some(index) = handlers.iter().position(|h| Arc::ptr_eq(h, handler)) {
				handlers.remove(index);
			}
		}
	}

	/// Invokes every handler bound to `event` in order, passing `payload`.
	/// A handler returning [`StopProcessing`] ends this emission early; any
	/// other handler failure (currently: none, handlers are infallible
	/// beyond that signal) would be logged and swallowed the same way.
	pub fn emit(&self, event: &str, payload: &(dyn Any + Send + Sync)) {
		let handlers = match self.handlers.lock().get(event) {
			Some(handlers) => handlers.clone(),
			None => return,
		};

		for handler in handlers {
			if handler(event, payload).is_err() {
				log::trace!("event {event} processing stopped early");
				break;
			}
		}
	}

	/// Registers `handler` for `event` and returns a guard that unhooks it
	/// when dropped. For listeners that only care about events raised during
	/// one scope, so they don't have to remember to call `unhook` on every
	/// exit path.
	#[must_use]
	pub fn hooked(&self, event: impl Into<String>, handler: Handler) -> HookGuard<'_> {
		let event = event.into();
		self.hook(event.clone(), handler.clone());
		HookGuard { bus: self, event, handler }
	}
}

/// RAII guard returned by [`EventBus::hooked`]. Dropping it unhooks the
/// handler it was constructed with.
pub struct HookGuard<'a> {
	bus: &'a EventBus,
	event: String,
	handler: Handler,
}

impl Drop for HookGuard<'_> {
	fn drop(&mut self) {
		self.bus.unhook(&self.event, &self.handler);
	}
}

#[cfg(test)]
mod test {
	use std::sync::atomic::{AtomicU32, Ordering};

	use super::*;

	#[test]
	fn handlers_run_in_registration_order() {
		let bus = EventBus::new();
		let order: Arc<Mutex<Vec<u32>>> = Arc::new(Mutex::new(Vec::new()));

		for i in 0..3 {
			let order = order.clone();
			bus.hook(
				"tick",
				Arc::new(move |_event, _payload| {
					order.lock().push(i);
					Ok(())
				}),
			);
		}

		bus.emit("tick", &());
		assert_eq!(*order.lock(), vec![0, 1, 2]);
	}

	#[test]
	fn hook_first_runs_before_existing_handlers() {
		let bus = EventBus::new();
		let order: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));

		let o1 = order.clone();
		bus.hook("tick", Arc::new(move |_e, _p| { o1.lock().push("late"); Ok(()) }));
		let o2 = order.clone();
		bus.hook_first("tick", Arc::new(move |_e, _p| { o2.lock().push("early"); Ok(()) }));

		bus.emit("tick", &());
		assert_eq!(*order.lock(), vec!["early", "late"]);
	}

	#[test]
	fn stop_processing_halts_remaining_handlers() {
		let bus = EventBus::new();
		let count = Arc::new(AtomicU32::new(0));

		let c1 = count.clone();
		bus.hook("tick", Arc::new(move |_e, _p| { c1.fetch_add(1, Ordering::SeqCst); Err(StopProcessing) }));
		let c2 = count.clone();
		bus.hook("tick", Arc::new(move |_e, _p| { c2.fetch_add(1, Ordering::SeqCst); Ok(()) }));

		bus.emit("tick", &());
		assert_eq!(count.load(Ordering::SeqCst), 1);
	}

	#[test]
	fn hooked_guard_unhooks_on_drop() {
		let bus = EventBus::new();
		let count = Arc::new(AtomicU32::new(0));
		let c1 = count.clone();

		{
			let _guard = bus.hooked("tick", Arc::new(move |_e, _p| { c1.fetch_add(1, Ordering::SeqCst); Ok(()) }));
			bus.emit("tick", &());
			assert_eq!(count.load(Ordering::SeqCst), 1);
		}

		bus.emit("tick", &());
		assert_eq!(count.load(Ordering::SeqCst), 1);
	}

	#[test]
	fn unhook_removes_handler_by_identity() {
		let bus = EventBus::new();
		let count = Arc::new(AtomicU32::new(0));
		let c1 = count.clone();
		let handler: Handler = Arc::new(move |_e, _p| { c1.fetch_add(1, Ordering::SeqCst); Ok(()) });

		bus.hook("tick", handler.clone());
		bus.unhook("tick", &handler);
		bus.emit("tick", &());
		assert_eq!(count.load(Ordering::SeqCst), 0);
	}
}
