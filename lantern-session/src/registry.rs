//! The process-wide, per-thread session stack.
//!
//! Whichever session is on top of the *current thread's* stack is "current"
//! for that thread, independent of every other thread's stack. There is
//! always an implicit fallback to the registered engine session once no
//! game session is active.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use once_cell::sync::{Lazy, OnceCell};
use parking_lot::Mutex;

use crate::session::Session;

static STACKS: Lazy<Mutex<HashMap<ThreadId, Vec<Arc<Session>>>>> = Lazy::new(|| Mutex::new(HashMap::new()));
static ENGINE_SESSION: OnceCell<Arc<Session>> = OnceCell::new();

/// Registers the process's one engine session. Only the first call takes
/// effect; later calls are no-ops, since a process only ever has one.
pub fn set_engine_session(session: Arc<Session>) {
	let _ = ENGINE_SESSION.set(session);
}

#[must_use]
pub fn engine_session() -> Option<Arc<Session>> {
	ENGINE_SESSION.get().cloned()
}

/// The session on top of this thread's stack, if any.
#[must_use]
pub fn current() -> Option<Arc<Session>> {
	let stacks = STACKS.lock();
	stacks.get(&thread::current().id()).and_then(|stack| stack.last()).cloned()
}

/// `current()`, falling back to the registered engine session.
#[must_use]
pub fn current_or_engine() -> Option<Arc<Session>> {
	current().or_else(engine_session)
}

/// Makes `session` current for this thread until the returned guard drops.
/// Nested pushes on the same thread are supported: the previous session is
/// deactivated, the new one is activated, and the previous one reactivates
/// automatically when the guard pops it back off.
#[must_use]
pub fn push(session: Arc<Session>) -> SessionGuard {
	let mut stacks = STACKS.lock();
	let stack = stacks.entry(thread::current().id()).or_default();

	if let Some(previous) = stack.last() {
		previous.env.deactivate();
	}

	session.env.activate();
	stack.push(session);
	SessionGuard { _private: () }
}

/// Pops the current thread's top session. Panics if the thread's stack is
/// empty, since that indicates a mismatched push/pop. Callers should
/// always go through [`SessionGuard`] instead of calling this directly.
fn pop() -> Arc<Session> {
	let mut stacks = STACKS.lock();
	let stack = stacks.get_mut(&thread::current().id()).expect("no session stack for this thread");
	let popped = stack.pop().expect("session stack underflow");
	popped.env.deactivate();

	if let Some(next) = stack.last() {
		next.env.activate();
	}

	popped
}

/// RAII guard returned by [`push`]. Dropping it pops the session back off
/// the current thread's stack, reactivating whatever was current before.
pub struct SessionGuard {
	_private: (),
}

impl Drop for SessionGuard {
	fn drop(&mut self) {
		pop();
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn push_then_pop_restores_previous_current() {
		let engine = Arc::new(Session::new("engine", None));
		let game = Arc::new(Session::new("game", Some("mygame".into())));

		assert!(current().is_none());

		let outer = push(engine.clone());
		assert_eq!(current().unwrap().name, "engine");

		{
			let _inner = push(game.clone());
			assert_eq!(current().unwrap().name, "game");
		}

		assert_eq!(current().unwrap().name, "engine");
		drop(outer);
		assert!(current().is_none());
	}

	#[test]
	fn current_or_engine_falls_back() {
		// Exercised in isolation from other tests via a distinct thread,
		// since `ENGINE_SESSION` is process-global and set-once.
		let handle = thread::spawn(|| {
			assert!(current().is_none());
			let session = Arc::new(Session::new("engine", None));
			set_engine_session(session.clone());
			assert_eq!(current_or_engine().unwrap().name, "engine");

			let game = Arc::new(Session::new("game", None));
			let _guard = push(game);
			assert_eq!(current_or_engine().unwrap().name, "game");
		});
		handle.join().unwrap();
	}
}
