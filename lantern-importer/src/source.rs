//! Source decoding: raw bytes to a normalized `String`.

/// Decodes `bytes` as UTF-8, falling back to Latin-1 (every byte maps to a
/// codepoint, so this step never fails) when the bytes aren't valid UTF-8.
/// Then normalizes `\r\n` and bare `\r` line endings to `\n`, the way a
/// source file edited on a different platform would still parse identically.
#[must_use]
pub fn decode_source(bytes: &[u8]) -> String {
	let text = match std::str::from_utf8(bytes) {
		Ok(s) => s.to_owned(),
		Err(_) => bytes.iter().map(|&b| b as char).collect(),
	};

	normalize_line_endings(&text)
}

fn normalize_line_endings(text: &str) -> String {
	let mut out = String::with_capacity(text.len());
	let mut chars = text.chars().peekable();

	while let Some(c) = chars.next() {
		if c == '\r' {
			if chars.peek() == Some(&'\n') {
				chars.next();
			}
			out.push('\n');
		} else {
			out.push(c);
		}
	}

	out
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn decodes_valid_utf8() {
		assert_eq!(decode_source("héllo".as_bytes()), "héllo");
	}

	#[test]
	fn falls_back_to_latin1_for_invalid_utf8() {
		let bytes = [0xE9, b'x']; // 0xE9 alone is invalid UTF-8; Latin-1 'é'.
		assert_eq!(decode_source(&bytes), "éx");
	}

	#[test]
	fn normalizes_all_line_ending_styles() {
		assert_eq!(decode_source(b"a\r\nb\rc\nd"), "a\nb\nc\nd");
	}
}
