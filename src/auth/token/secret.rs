//! Secure token secret wrapper that redacts sensitive material.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

const PREVIEW_EDGE: usize = 5;

/// Redacted token secret wrapper keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// First and last five characters joined by `...`, for on-screen confirmation.
	///
	/// Secrets too short to abbreviate are fully masked.
	pub fn preview(&self) -> String {
		let count = self.0.chars().count();

		if count <= PREVIEW_EDGE * 2 {
			return "*".repeat(count);
		}

		let head = self.0.chars().take(PREVIEW_EDGE).collect::<String>();
		let tail = self.0.chars().skip(count - PREVIEW_EDGE).collect::<String>();

		format!("{head}...{tail}")
	}

	/// Base64 (no padding) SHA-256 digest, safe for logs and equality checks.
	pub fn fingerprint(&self) -> String {
		let mut hasher = Sha256::new();

		hasher.update(self.0.as_bytes());

		STANDARD_NO_PAD.encode(hasher.finalize())
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn secret_formatters_redact() {
		let secret = TokenSecret::new("super-secret");

		assert_eq!(format!("{secret:?}"), "TokenSecret(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");
	}

	#[test]
	fn preview_keeps_edges_only() {
		assert_eq!(TokenSecret::new("abcdefghijklmnop").preview(), "abcde...lmnop");
		assert_eq!(TokenSecret::new("short").preview(), "*****");
		assert_eq!(TokenSecret::new("ääääääääääöö").preview(), "äääää...äääöö");
	}

	#[test]
	fn fingerprint_is_stable_and_distinct() {
		let lhs = TokenSecret::new("token-a");

		assert_eq!(lhs.fingerprint(), TokenSecret::new("token-a").fingerprint());
		assert_ne!(lhs.fingerprint(), TokenSecret::new("token-b").fingerprint());
		assert!(!lhs.fingerprint().contains("token-a"));
	}
}
