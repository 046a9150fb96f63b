//! The compiled-module header format: 4 magic bytes identifying the
//! producing runtime, 4 little-endian timestamp bytes, then the payload.

use byteorder::{ByteOrder, LittleEndian};
use lantern_vfs::VPath;

use crate::error::ImportError;

pub const MAGIC_LEN: usize = 4;
pub const HEADER_LEN: usize = MAGIC_LEN + 4;

pub struct CompiledHeader<'a> {
	pub timestamp: u32,
	pub payload: &'a [u8],
}

/// Validates and strips the header from `bytes`, which must begin with
/// `expected_magic`. A mismatched magic number means the bytecode was
/// produced by a different (or incompatible) compiler and must be rejected
/// rather than fed to one that doesn't understand it.
pub fn decode(path: &VPath, bytes: &[u8], expected_magic: &[u8; MAGIC_LEN]) -> Result<CompiledHeader<'_>, ImportError> {
	if bytes.len() < HEADER_LEN {
		return Err(ImportError::Truncated(path.to_owned()));
	}

	if &bytes[0..MAGIC_LEN] != expected_magic {
		return Err(ImportError::BadMagic(path.to_owned()));
	}

	let timestamp = LittleEndian::read_u32(&bytes[MAGIC_LEN..HEADER_LEN]);
	Ok(CompiledHeader {
		timestamp,
		payload: &bytes[HEADER_LEN..],
	})
}

/// Prepends a header to `payload`, the inverse of [`decode`].
#[must_use]
pub fn encode(magic: &[u8; MAGIC_LEN], timestamp: u32, payload: &[u8]) -> Vec<u8> {
	let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
	out.extend_from_slice(magic);
	let mut ts_bytes = [0u8; 4];
	LittleEndian::write_u32(&mut ts_bytes, timestamp);
	out.extend_from_slice(&ts_bytes);
	out.extend_from_slice(payload);
	out
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn roundtrips_through_encode_decode() {
		let magic = *b"LTBC";
		let bytes = encode(&magic, 12345, b"payload bytes");
		let header = decode(VPath::new("/mod.ltc"), &bytes, &magic).unwrap();
		assert_eq!(header.timestamp, 12345);
		assert_eq!(header.payload, b"payload bytes");
	}

	#[test]
	fn rejects_mismatched_magic() {
		let bytes = encode(b"OTHR", 0, b"x");
		assert!(matches!(
			decode(VPath::new("/mod.ltc"), &bytes, b"LTBC"),
			Err(ImportError::BadMagic(_))
		));
	}

	#[test]
	fn rejects_truncated_header() {
		assert!(matches!(
			decode(VPath::new("/mod.ltc"), b"LT", b"LTBC"),
			Err(ImportError::Truncated(_))
		));
	}
}
