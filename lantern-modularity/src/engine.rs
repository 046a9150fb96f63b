//! Priority-ordered capability resolution with backtracking: registers
//! modules, resolves their declared requirements against everyone else's
//! declared provisions, and loads/unloads them in dependency order.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use indexmap::IndexMap;

use crate::record::{ModuleRecord, ModuleState};

/// The load/unload lifecycle an embedding hangs off a registered module.
/// `provisions` maps each of this module's declared `requires` tags to the
/// name of whichever module was chosen to satisfy it.
pub trait ModuleHooks: Send + Sync {
	fn load(&self, provisions: &HashMap<String, String>) -> Result<(), String>;

	fn unload(&self) {}
}

/// Registers modules and resolves/loads/unloads them by capability tag.
#[derive(Default)]
pub struct Engine {
	available: IndexMap<String, ModuleRecord>,
	hooks: HashMap<String, Arc<dyn ModuleHooks>>,
	provisions: HashMap<String, Vec<(i32, u64, String)>>,
	requirements: HashMap<String, Vec<String>>,
	states: HashMap<String, ModuleState>,
	loaded: HashSet<String>,
	next_seq: u64,
}

impl Engine {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a module. Provisions are indexed immediately so later
	/// registrations can depend on earlier ones (and vice versa, since
	/// dependency resolution only happens at `load` time).
	pub fn register(&mut self, record: ModuleRecord, hooks: Arc<dyn ModuleHooks>) {
		let seq = self.next_seq;
		self.next_seq += 1;

		for provision in &record.provides {
			self.provisions
				.entry(provision.clone())
				.or_default()
				.push((record.priority, seq, record.name.clone()));
		}

		self.requirements.insert(record.name.clone(), record.requires.clone());
		self.states.insert(record.name.clone(), ModuleState::Registered);
		self.hooks.insert(record.name.clone(), hooks);
		self.available.insert(record.name.clone(), record);
	}

	#[must_use]
	pub fn state(&self, name: &str) -> Option<&ModuleState> {
		self.states.get(name)
	}

	#[must_use]
	pub fn is_loaded(&self, name: &str) -> bool {
		self.loaded.contains(name)
	}

	/// Loads every registered module, in registration order, logging (not
	/// propagating) any individual failure so one bad module doesn't stop
	/// the rest from loading.
	pub fn load_all(&mut self) {
		let names: Vec<String> = self.available.keys().cloned().collect();
		for name in names {
			if let Err(e) = self.load(&name) {
				log::error!("could not load module {name}: {e}");
			}
		}
	}

	/// Loads `name` and whatever dependency chain its `requires` tags
	/// resolve to. On a dependency's initialization failure, that candidate
	/// is blacklisted for this call and the whole resolution is retried from
	/// scratch; on the main module's own initialization failure, only the
	/// dependencies freshly loaded during this attempt are unwound.
	pub fn load(&mut self, name: &str) -> Result<(), String> {
		if !self.available.contains_key(name) {
			return Err(format!("no such module: {name}"));
		}

		if self.loaded.contains(name) {
			return Ok(());
		}

		log::debug!("loading module: {name}");
		let mut blacklist: HashMap<String, String> = HashMap::new();

		let (provisions, loaded_now) = loop {
			let mut provided = HashMap::new();
			let dependencies = self.resolve_dependencies(name, &mut HashSet::new(), &mut provided, &mut blacklist)?;

			let mut loaded_now = Vec::new();
			let mut retry = false;

			for dependency in dependencies.iter().rev() {
				if self.loaded.contains(dependency) {
					continue;
				}

				log::debug!("loading module: {dependency} (dependency)");
				match self.init_module(dependency, &provided) {
					Ok(()) => loaded_now.push(dependency.clone()),
					Err(e) => {
						blacklist.insert(dependency.clone(), format!("initialization failed: {e}"));
						log::warn!("loading dependency failed, unloading and re-resolving: {dependency}");

						for loaded in loaded_now.iter().rev() {
							self.exit_module(loaded);
						}

						retry = true;
						break;
					}
				}
			}

			if !retry {
				break (provided, loaded_now);
			}
		};

		log::debug!("loading module: {name} (main)");
		match self.init_module(name, &provisions) {
			Ok(()) => {
				self.states.insert(name.to_owned(), ModuleState::Loaded);
				Ok(())
			}
			Err(e) => {
				log::error!("loading {name} failed, unloading dependencies: {e}");
				for dependency in loaded_now.iter().rev() {
					self.exit_module(dependency);
				}
				self.states.insert(name.to_owned(), ModuleState::Failed(e.clone()));
				Err(e)
			}
		}
	}

	/// Calls the module's `unload` hook (if it has one) and removes it from
	/// the loaded set. A no-op if the module wasn't loaded.
	pub fn unload(&mut self, name: &str) {
		self.exit_module(name);
	}

	fn init_module(&mut self, name: &str, provisions: &HashMap<String, String>) -> Result<(), String> {
		if self.loaded.contains(name) {
			return Ok(());
		}

		let requires = self.requirements.get(name).cloned().unwrap_or_default();
		let filtered: HashMap<String, String> = provisions
			.iter()
			.filter(|(k, _)| requires.contains(k))
			.map(|(k, v)| (k.clone(), v.clone()))
			.collect();

		if let Some(hooks) = self.hooks.get(name).cloned() {
			hooks.load(&filtered)?;
		}

		self.loaded.insert(name.to_owned());
		Ok(())
	}

	fn exit_module(&mut self, name: &str) {
		if self.loaded.remove(name) {
			if let Some(hooks) = self.hooks.get(name).cloned() {
				hooks.unload();
			}
		}
	}

	fn resolve_dependencies(
		&self,
		name: &str,
		resolving: &mut HashSet<String>,
		provided: &mut HashMap<String, String>,
		blacklist: &mut HashMap<String, String>,
	) -> Result<Vec<String>, String> {
		let mut dependencies = Vec::new();
		let requires = self.requirements.get(name).cloned().unwrap_or_default();

		for requirement in requires {
			if resolving.contains(&requirement) || provided.contains_key(&requirement) {
				continue;
			}
			resolving.insert(requirement.clone());

			let candidates = self.provision_candidates_for(&requirement);
			let mut errors = Vec::new();
			let mut satisfied = false;

			for (_, _, provider) in candidates {
				if let Some(reason) = blacklist.get(&provider) {
					errors.push(format!("\"{requirement}\" candidate \"{provider}\" is blacklisted ({reason})"));
					continue;
				}

				let resolving_snapshot = resolving.clone();
				let provided_snapshot = provided.clone();

				match self.resolve_dependencies(&provider, resolving, provided, blacklist) {
					Ok(subdependencies) => {
						dependencies.push(provider.clone());

						for dependency in subdependencies {
							dependencies.retain(|d| d != &dependency);
							dependencies.push(dependency);
						}

						provided.insert(requirement.clone(), provider.clone());
						satisfied = true;
						break;
					}
					Err(e) => {
						blacklist.insert(provider.clone(), format!("import failed: {e}"));
						errors.push(e);
						*resolving = resolving_snapshot;
						*provided = provided_snapshot;
					}
				}
			}

			if !satisfied {
				let mut msg =
					format!("could not resolve dependency \"{requirement}\" for module \"{name}\": no viable candidates.");
				for error in &errors {
					for line in error.lines() {
						msg.push_str(&format!("\n   {line}"));
					}
				}
				return Err(msg);
			}
		}

		Ok(dependencies)
	}

	fn provision_candidates_for(&self, provision: &str) -> Vec<(i32, u64, String)> {
		let mut candidates = Vec::new();

		if self.available.contains_key(provision) {
			candidates.push((0, 0, provision.to_owned()));
		}

		let mut rest = self.provisions.get(provision).cloned().unwrap_or_default();
		rest.sort();
		candidates.extend(rest);
		candidates
	}
}
