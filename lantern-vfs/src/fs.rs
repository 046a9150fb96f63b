//! The composed virtual file system: mounted providers, regex-bound
//! transformers, and the derived file/listing caches.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use regex::Regex;

use crate::error::Error;
use crate::handle::{File, OpenFile, OpenMode};
use crate::path::{VPath, VPathBuf};
use crate::provider::{Provider, Transformer, TransformerFactory};

/// Wraps a [`Transformer`] so it can be stored wherever a plain
/// `Arc<dyn Provider>` is expected. Every [`Transformer`] is already a
/// `Provider` by supertrait, but turning an owned `Box<dyn Transformer>`
/// into an `Arc<dyn Provider>` needs an explicit delegating wrapper rather
/// than relying on trait object upcasting.
struct TransformerAsProvider(Arc<dyn Transformer>);

impl Provider for TransformerAsProvider {
	fn list(&self) -> Vec<VPathBuf> {
		self.0.list()
	}

	fn has(&self, path: &VPath) -> bool {
		self.0.has(path)
	}

	fn isfile(&self, path: &VPath) -> bool {
		self.0.isfile(path)
	}

	fn isdir(&self, path: &VPath) -> bool {
		self.0.isdir(path)
	}

	fn open(&self, path: &VPath, mode: OpenMode) -> Result<Box<dyn File>, Error> {
		self.0.open(path, mode)
	}
}

type CacheEntries = Vec<(Arc<dyn Provider>, VPathBuf)>;

struct Inner {
	roots: IndexMap<VPathBuf, Vec<Arc<dyn Provider>>>,
	transformers: Vec<(Regex, Vec<Arc<dyn TransformerFactory>>)>,
	file_cache: Option<HashMap<VPathBuf, CacheEntries>>,
	listing_cache: Option<HashMap<VPathBuf, HashSet<String>>>,
	on_demand: Vec<Arc<dyn Provider>>,
}

impl Inner {
	fn new() -> Self {
		Self {
			roots: IndexMap::new(),
			transformers: Vec::new(),
			file_cache: None,
			listing_cache: None,
			on_demand: Vec::new(),
		}
	}

	fn clear(&mut self) {
		self.roots.clear();
		self.transformers.clear();
		self.file_cache = None;
		self.listing_cache = None;
		self.on_demand.clear();
	}

	fn ensure_built(&mut self) {
		if self.file_cache.is_none() {
			self.build_cache();
		}
	}

	fn build_cache(&mut self) {
		log::trace!("building VFS cache");
		let mut file_cache = HashMap::new();
		file_cache.insert(VPathBuf::from("/"), Vec::new());
		let mut listing_cache = HashMap::new();
		listing_cache.insert(VPathBuf::from("/"), HashSet::new());
		self.file_cache = Some(file_cache);
		self.listing_cache = Some(listing_cache);

		let roots: Vec<(VPathBuf, Vec<Arc<dyn Provider>>)> = self
			.roots
			.iter()
			.map(|(root, providers)| (root.clone(), providers.clone()))
			.collect();

		for (root, providers) in roots {
			for provider in providers {
				self.add_provider_at_root(provider, root.clone());
			}
		}
	}

	fn add_provider_at_root(&mut self, provider: Arc<dyn Provider>, root: VPathBuf) {
		log::trace!("caching mount point {root} <- provider");
		self.cache_directory(Some(provider.clone()), Some(root.clone()), root.clone());

		for subpath in provider.list() {
			let path = VPathBuf::from(format!("{root}/{subpath}").as_str());

			if provider.isdir(&subpath) {
				self.cache_directory(Some(provider.clone()), Some(root.clone()), path);
			} else {
				self.cache_file(provider.clone(), root.clone(), path);
			}
		}
	}

	fn cache_directory(&mut self, provider: Option<Arc<dyn Provider>>, root: Option<VPathBuf>, path: VPathBuf) {
		self.listing_cache
			.as_mut()
			.unwrap()
			.entry(path.clone())
			.or_default();
		self.cache_entry(provider, root, path);
	}

	fn cache_file(&mut self, provider: Arc<dyn Provider>, root: VPathBuf, path: VPathBuf) {
		let transformers = self.transformers.clone();
		let mut consumed = false;

		for (pattern, factories) in &transformers {
			if !pattern.is_match(path.as_str()) {
				continue;
			}

			for factory in factories {
				let local = path.strip_mount(&root);
				let handle = match provider.open(&local, OpenMode::Read) {
					Ok(h) => h,
					Err(e) => {
						log::warn!("couldn't open {path} for a transformer: {e}");
						continue;
					}
				};

				consumed = self.cache_transformed_file(factory.clone(), &path, handle);
				if consumed {
					break;
				}
			}

			if consumed {
				break;
			}
		}

		if consumed {
			log::debug!("cached file {path} consumed by transformer");
		} else {
			self.cache_entry(Some(provider), Some(root), path);
		}
	}

	fn cache_transformed_file(
		&mut self,
		factory: Arc<dyn TransformerFactory>,
		path: &VPath,
		handle: Box<dyn File>,
	) -> bool {
		let instance = match factory.try_create(path, handle) {
			Ok(instance) => instance,
			Err(e) => {
				log::warn!("error while transforming {path}: {e}");
				return false;
			}
		};

		if !instance.valid() {
			return false;
		}

		log::trace!("caching transformed file: {path}");

		let parentdir = if instance.relative() {
			path.dirname().to_owned()
		} else {
			VPathBuf::from("/")
		};

		let consumes = instance.consumes();
		let instance: Arc<dyn Transformer> = Arc::from(instance);
		let wrapped: Arc<dyn Provider> = Arc::new(TransformerAsProvider(instance));
		self.add_provider_at_root(wrapped, parentdir);

		if consumes {
			self.file_cache.as_mut().unwrap().remove(path);

			if !path.is_root() {
				let parent = path.dirname().to_owned();
				let basename = path.basename().to_string();
				if let Some(children) = self.listing_cache.as_mut().unwrap().get_mut(&parent) {
					children.remove(&basename);
				}
			}
		}

		consumes
	}

	fn cache_entry(&mut self, provider: Option<Arc<dyn Provider>>, root: Option<VPathBuf>, path: VPathBuf) {
		{
			let entries = self.file_cache.as_mut().unwrap().entry(path.clone()).or_default();
			if let (Some(provider), Some(root)) = (&provider, &root) {
				if !entries.iter().any(|(p, _)| Arc::ptr_eq(p, provider)) {
					entries.push((provider.clone(), root.clone()));
				}
			}
		}

		if !path.is_root() {
			let parent = path.dirname().to_owned();
			if !self.file_cache.as_ref().unwrap().contains_key(&parent) {
				self.cache_directory(None, None, parent.clone());
			}

			let basename = path.basename().to_string();
			self.listing_cache
				.as_mut()
				.unwrap()
				.entry(parent)
				.or_default()
				.insert(basename);
		}
	}

	fn providers_for(&mut self, path: &VPath) -> Result<Vec<(Arc<dyn Provider>, VPathBuf)>, Error> {
		self.ensure_built();

		let entries = self
			.file_cache
			.as_ref()
			.unwrap()
			.get(path)
			.ok_or_else(|| Error::NotFound(path.to_owned()))?;

		Ok(entries
			.iter()
			.rev()
			.map(|(provider, mount)| (provider.clone(), mount.clone()))
			.collect())
	}

	fn exists(&mut self, path: &VPath) -> bool {
		self.ensure_built();
		self.file_cache.as_ref().unwrap().contains_key(path)
			|| self.on_demand.iter().rev().any(|p| p.has(path))
	}

	fn isdir(&mut self, path: &VPath) -> bool {
		self.ensure_built();
		if self.listing_cache.as_ref().unwrap().contains_key(path) {
			return true;
		}
		self.on_demand.iter().rev().any(|p| p.isdir(path))
	}

	fn isfile(&mut self, path: &VPath) -> bool {
		self.ensure_built();
		let cache = self.file_cache.as_ref().unwrap();
		let listing = self.listing_cache.as_ref().unwrap();
		if cache.contains_key(path) && !listing.contains_key(path) {
			return true;
		}
		if listing.contains_key(path) {
			return false;
		}
		self.on_demand.iter().rev().any(|p| p.isfile(path))
	}
}

/// A layered virtual file system: providers mounted at canonical paths,
/// regex-bound transformers, and the caches that make lookups `O(1)` after
/// the first build.
pub struct FileSystem {
	inner: Mutex<Inner>,
}

impl Default for FileSystem {
	fn default() -> Self {
		Self::new()
	}
}

impl FileSystem {
	#[must_use]
	pub fn new() -> Self {
		Self {
			inner: Mutex::new(Inner::new()),
		}
	}

	/// Empties every root, transformer, and cache.
	pub fn clear(&self) {
		self.inner.lock().clear();
	}

	/// Mounts `provider` at `path`. Multiple providers may share a mount
	/// point; the most recently mounted one serves conflicting files first.
	pub fn mount(&self, path: &VPath, provider: Arc<dyn Provider>) {
		let path = VPathBuf::from(path.as_str());
		let mut inner = self.inner.lock();
		inner.roots.entry(path.clone()).or_default().push(provider.clone());

		log::debug!("mounted provider at {path}");

		if inner.file_cache.is_none() {
			inner.build_cache();
		} else {
			inner.add_provider_at_root(provider, path);
		}
	}

	/// Unmounts `provider` from `path` by identity. Triggers a full cache
	/// rebuild.
	pub fn unmount(&self, path: &VPath, provider: &Arc<dyn Provider>) -> Result<(), Error> {
		let path = VPathBuf::from(path.as_str());
		let mut inner = self.inner.lock();

		let providers = inner
			.roots
			.get_mut(&path)
			.ok_or_else(|| Error::KeyNotFound(path.clone()))?;

		let index = providers
			.iter()
			.position(|p| Arc::ptr_eq(p, provider))
			.ok_or_else(|| Error::KeyNotFound(path.clone()))?;
		providers.remove(index);

		log::debug!("unmounted provider from {path}");
		inner.build_cache();
		Ok(())
	}

	/// Registers `factory` as a transformer for paths matching `pattern`.
	pub fn transform(&self, pattern: &str, factory: Arc<dyn TransformerFactory>) -> Result<(), regex::Error> {
		let regex = Regex::new(pattern)?;
		let mut inner = self.inner.lock();

		if let Some((_, factories)) = inner.transformers.iter_mut().find(|(p, _)| p.as_str() == regex.as_str()) {
			factories.push(factory);
		} else {
			inner.transformers.push((regex.clone(), vec![factory]));
		}

		log::debug!("added transformer for pattern {}", regex.as_str());

		if inner.file_cache.is_none() {
			inner.build_cache();
		} else {
			let paths: Vec<VPathBuf> = inner
				.file_cache
				.as_ref()
				.unwrap()
				.keys()
				.filter(|p| regex.is_match(p.as_str()))
				.cloned()
				.collect();

			for path in paths {
				let providers = match inner.file_cache.as_ref().unwrap().get(&path) {
					Some(entries) if !entries.is_empty() => entries.last().unwrap().clone(),
					_ => continue,
				};

				let local = path.strip_mount(&providers.1);
				let handle = match providers.0.open(&local, OpenMode::Read) {
					Ok(h) => h,
					Err(_) => continue,
				};

				inner.cache_transformed_file(factory_for(&inner, &regex), &path, handle);
			}
		}

		Ok(())
	}

	/// Removes `factory` as a transformer of `pattern`. Triggers a full
	/// cache rebuild.
	pub fn untransform(&self, pattern: &str, factory: &Arc<dyn TransformerFactory>) -> Result<(), Error> {
		let regex = Regex::new(pattern).map_err(|_| Error::KeyNotFound(VPathBuf::from(pattern)))?;
		let mut inner = self.inner.lock();

		let (_, factories) = inner
			.transformers
			.iter_mut()
			.find(|(p, _)| p.as_str() == regex.as_str())
			.ok_or_else(|| Error::KeyNotFound(VPathBuf::from(pattern)))?;

		let index = factories
			.iter()
			.position(|f| Arc::ptr_eq(f, factory))
			.ok_or_else(|| Error::KeyNotFound(VPathBuf::from(pattern)))?;
		factories.remove(index);

		inner.build_cache();
		Ok(())
	}

	/// Adds an unkeyed on-demand provider, consulted by `open`/`exists`/
	/// `isfile`/`isdir` after the ordinary cache misses. Not reflected by
	/// `list`/`listdir`.
	pub fn add_on_demand(&self, provider: Arc<dyn Provider>) {
		self.inner.lock().on_demand.push(provider);
	}

	/// Removes a previously added on-demand provider by identity.
	pub fn remove_on_demand(&self, provider: &Arc<dyn Provider>) -> Result<(), Error> {
		let mut inner = self.inner.lock();
		let index = inner
			.on_demand
			.iter()
			.position(|p| Arc::ptr_eq(p, provider))
			.ok_or_else(|| Error::KeyNotFound(VPathBuf::from("on-demand")))?;
		inner.on_demand.remove(index);
		Ok(())
	}

	/// Opens `path`. The most recently mounted provider serving it is tried
	/// first; a `NotFound` from a candidate falls through to the next one,
	/// any other error is remembered and surfaced only if every candidate
	/// fails.
	pub fn open(&self, path: &VPath, mode: OpenMode) -> Result<OpenFile, Error> {
		let path = VPathBuf::from(path.as_str());
		let mut inner = self.inner.lock();

		if inner.isdir(&path) {
			return Err(Error::NotAFile(path));
		}

		let candidates = match inner.providers_for(&path) {
			Ok(c) => c,
			Err(_) => Vec::new(),
		};

		let mut last_error = None;

		for (provider, mount) in &candidates {
			let local = path.strip_mount(mount);
			match provider.open(&local, mode) {
				Ok(file) => return Ok(OpenFile::new(file)),
				Err(e) if e.is_not_found() => continue,
				Err(e) => last_error = Some(e),
			}
		}

		for provider in inner.on_demand.iter().rev() {
			if !provider.has(&path) {
				continue;
			}

			match provider.open(&path, mode) {
				Ok(file) => return Ok(OpenFile::new(file)),
				Err(e) if e.is_not_found() => continue,
				Err(e) => last_error = Some(e),
			}
		}

		Err(last_error.unwrap_or_else(|| Error::NotFound(path)))
	}

	#[must_use]
	pub fn exists(&self, path: &VPath) -> bool {
		self.inner.lock().exists(path)
	}

	#[must_use]
	pub fn isfile(&self, path: &VPath) -> bool {
		self.inner.lock().isfile(path)
	}

	#[must_use]
	pub fn isdir(&self, path: &VPath) -> bool {
		self.inner.lock().isdir(path)
	}

	/// Every cached path at or below `subdir` (whole tree if `None`), made
	/// relative to `subdir` the same way a mounted provider's paths are made
	/// relative to its mount point.
	pub fn list(&self, subdir: Option<&VPath>) -> Result<HashSet<VPathBuf>, Error> {
		let mut inner = self.inner.lock();
		inner.ensure_built();

		let Some(subdir) = subdir else {
			return Ok(inner.file_cache.as_ref().unwrap().keys().cloned().collect());
		};

		let subdir = VPathBuf::from(subdir.as_str());
		if !inner.isdir(&subdir) {
			if !inner.exists(&subdir) {
				return Err(Error::NotFound(subdir));
			}
			return Err(Error::NotADirectory(subdir));
		}

		let mut out = HashSet::new();
		out.insert(VPathBuf::from("/"));
		let mut queue = VecDeque::new();
		queue.push_back(subdir.clone());

		while let Some(target) = queue.pop_front() {
			let Some(children) = inner.listing_cache.as_ref().unwrap().get(&target).cloned() else {
				continue;
			};

			for child in children {
				let path = target.as_path().join(&child);
				if inner.isdir(&path) {
					queue.push_back(path.clone());
				}
				out.insert(path.strip_mount(&subdir));
			}
		}

		Ok(out)
	}

	/// Immediate child basenames of `subdir` (root if `None`).
	pub fn listdir(&self, subdir: Option<&VPath>) -> Result<HashSet<String>, Error> {
		let mut inner = self.inner.lock();
		inner.ensure_built();

		let subdir = match subdir {
			Some(s) => VPathBuf::from(s.as_str()),
			None => VPathBuf::from("/"),
		};

		if !inner.isdir(&subdir) {
			if !inner.exists(&subdir) {
				return Err(Error::NotFound(subdir));
			}
			return Err(Error::NotADirectory(subdir));
		}

		Ok(inner
			.listing_cache
			.as_ref()
			.unwrap()
			.get(&subdir)
			.cloned()
			.unwrap_or_default())
	}
}

/// Helper for [`FileSystem::transform`]'s incremental-cache path: finds the
/// most recently registered factory for a pattern, matching how
/// `cache_file` always tries factories for a pattern in registration order.
fn factory_for(inner: &Inner, pattern: &Regex) -> Arc<dyn TransformerFactory> {
	inner
		.transformers
		.iter()
		.find(|(p, _)| p.as_str() == pattern.as_str())
		.and_then(|(_, factories)| factories.last())
		.expect("pattern was just registered")
		.clone()
}
