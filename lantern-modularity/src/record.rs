//! The static metadata a module declares about itself.

/// Lowest legal priority value. Candidates are tried in ascending priority
/// order, so this is the priority tried *first*.
pub const PRIORITY_MIN: i32 = -100;
/// Highest legal priority value, tried *last*.
pub const PRIORITY_MAX: i32 = 100;
pub const PRIORITY_NEUTRAL: i32 = 0;

/// A module's declared identity: what it offers (`provides`) and what it
/// needs (`requires`), each expressed as opaque capability tags.
#[derive(Debug, Clone)]
pub struct ModuleRecord {
	pub name: String,
	pub priority: i32,
	pub provides: Vec<String>,
	pub requires: Vec<String>,
}

impl ModuleRecord {
	#[must_use]
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			priority: PRIORITY_NEUTRAL,
			provides: Vec::new(),
			requires: Vec::new(),
		}
	}

	#[must_use]
	pub fn priority(mut self, priority: i32) -> Self {
		self.priority = priority.clamp(PRIORITY_MIN, PRIORITY_MAX);
		self
	}

	#[must_use]
	pub fn provides(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
		self.provides = tags.into_iter().map(Into::into).collect();
		self
	}

	#[must_use]
	pub fn requires(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
		self.requires = tags.into_iter().map(Into::into).collect();
		self
	}
}

/// A module's lifecycle state within an [`crate::Engine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleState {
	Registered,
	Loaded,
	Failed(String),
}
