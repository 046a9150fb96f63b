//! A small consuming transformer: recognizes a flat archive format (4-byte
//! magic, then a sequence of `name\0 len:u32le data` entries) and exposes its
//! contents as ordinary files, the way the engine's WAD/ZIP detection in
//! `utils::io` gates which loader takes over a mounted file.

use std::collections::HashMap;
use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};
use lantern_vfs::{Error, File, OpenMode, Provider, Transformer, TransformerFactory, VPath, VPathBuf};

const MAGIC: &[u8; 4] = b"LPAK";

/// Checks for the 4-byte magic number. Ensure `bytes` starts at the file's
/// beginning.
#[must_use]
pub fn is_pak(bytes: &[u8]) -> bool {
	bytes.len() >= 4 && &bytes[0..4] == MAGIC
}

#[derive(Default)]
pub struct PakTransformerFactory;

impl TransformerFactory for PakTransformerFactory {
	fn try_create(&self, _path: &VPath, mut handle: Box<dyn File>) -> Result<Box<dyn Transformer>, Error> {
		let bytes = handle.read(None)?;
		handle.close();

		if !is_pak(&bytes) {
			return Ok(Box::new(PakTransformer { valid: false, entries: HashMap::new() }));
		}

		let entries = match parse(&bytes) {
			Some(entries) => entries,
			None => return Ok(Box::new(PakTransformer { valid: false, entries: HashMap::new() })),
		};

		Ok(Box::new(PakTransformer { valid: true, entries }))
	}
}

fn parse(bytes: &[u8]) -> Option<HashMap<VPathBuf, Vec<u8>>> {
	let mut cursor = Cursor::new(&bytes[4..]);
	let mut entries = HashMap::new();

	while (cursor.position() as usize) < cursor.get_ref().len() {
		let mut name = Vec::new();
		loop {
			let b = cursor.read_u8().ok()?;
			if b == 0 {
				break;
			}
			name.push(b);
		}

		let name = String::from_utf8(name).ok()?;
		let len = cursor.read_u32::<LittleEndian>().ok()? as usize;
		let start = cursor.position() as usize;
		let end = start.checked_add(len)?;
		let data = cursor.get_ref().get(start..end)?.to_vec();
		cursor.set_position(end as u64);

		entries.insert(VPathBuf::from(format!("/{name}").as_str()), data);
	}

	Some(entries)
}

struct PakTransformer {
	valid: bool,
	entries: HashMap<VPathBuf, Vec<u8>>,
}

impl Provider for PakTransformer {
	fn list(&self) -> Vec<VPathBuf> {
		self.entries.keys().cloned().collect()
	}

	fn isfile(&self, path: &VPath) -> bool {
		self.entries.contains_key(path)
	}

	fn isdir(&self, path: &VPath) -> bool {
		path.is_root()
	}

	fn open(&self, path: &VPath, _mode: OpenMode) -> Result<Box<dyn File>, Error> {
		let data = self
			.entries
			.get(path)
			.cloned()
			.ok_or_else(|| Error::NotFound(path.to_owned()))?;
		Ok(Box::new(PakEntry {
			path: path.to_owned(),
			data,
			pos: 0,
			open: true,
		}))
	}
}

impl Transformer for PakTransformer {
	fn valid(&self) -> bool {
		self.valid
	}

	fn consumes(&self) -> bool {
		true
	}

	fn relative(&self) -> bool {
		false
	}
}

struct PakEntry {
	path: VPathBuf,
	data: Vec<u8>,
	pos: usize,
	open: bool,
}

impl File for PakEntry {
	fn opened(&self) -> bool {
		self.open
	}

	fn readable(&self) -> bool {
		self.open
	}

	fn read(&mut self, amount: Option<usize>) -> Result<Vec<u8>, Error> {
		if !self.open {
			return Err(Error::Closed(self.path.clone()));
		}

		let end = match amount {
			Some(n) => (self.pos + n).min(self.data.len()),
			None => self.data.len(),
		};
		let out = self.data[self.pos..end].to_vec();
		self.pos = end;
		Ok(out)
	}

	fn write(&mut self, _data: &[u8]) -> Result<usize, Error> {
		Err(Error::NotWritable(self.path.clone()))
	}

	fn seek(&mut self, _offset: i64, _whence: lantern_vfs::Whence) -> Result<u64, Error> {
		Err(Error::NotSeekable(self.path.clone()))
	}

	fn tell(&self) -> Result<u64, Error> {
		Ok(self.pos as u64)
	}

	fn close(&mut self) {
		self.open = false;
	}

	fn path(&self) -> &VPathBuf {
		&self.path
	}
}

#[cfg(test)]
mod test {
	use std::sync::Arc;

	use lantern_vfs::FileSystem;

	use super::*;
	use crate::memory::MemoryProvider;

	fn build_pak(entries: &[(&str, &[u8])]) -> Vec<u8> {
		let mut out = MAGIC.to_vec();
		for (name, data) in entries {
			out.extend_from_slice(name.as_bytes());
			out.push(0);
			out.extend_from_slice(&(data.len() as u32).to_le_bytes());
			out.extend_from_slice(data);
		}
		out
	}

	#[test]
	fn recognizes_and_unpacks_entries() {
		let bytes = build_pak(&[("a.txt", b"one"), ("b.txt", b"two")]);

		let mem = MemoryProvider::new();
		mem.insert(VPath::new("/archive.pak"), bytes);

		let fs = FileSystem::new();
		fs.mount(VPath::new("/"), Arc::new(mem));
		fs.transform(r"\.pak$", Arc::new(PakTransformerFactory)).unwrap();

		assert!(!fs.exists(VPath::new("/archive.pak")));
		assert!(fs.exists(VPath::new("/a.txt")));
		assert!(fs.exists(VPath::new("/b.txt")));

		let mut handle = fs.open(VPath::new("/a.txt"), OpenMode::Read).unwrap();
		assert_eq!(handle.read_to_end().unwrap(), b"one");
	}

	#[test]
	fn rejects_files_without_the_magic_number() {
		let mem = MemoryProvider::new();
		mem.insert(VPath::new("/plain.pak"), b"not a pak file".to_vec());

		let fs = FileSystem::new();
		fs.mount(VPath::new("/"), Arc::new(mem));
		fs.transform(r"\.pak$", Arc::new(PakTransformerFactory)).unwrap();

		assert!(fs.exists(VPath::new("/plain.pak")));
	}
}
