//! Ordered scope lists requested at sign-in.

// std
use std::{slice::Iter, sync::OnceLock};
// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};
use serde::{Deserializer, Serializer, de::Error as DeError, ser::SerializeSeq};
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

/// Scopes requested when none are configured.
pub const DEFAULT_SCOPES: [&str; 2] = ["openid", "arccos/read:rounds"];

/// Errors emitted when validating scopes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ScopeValidationError {
	/// Empty scope entries are not allowed.
	#[error("Scope entries cannot be empty.")]
	Empty,
	/// Scopes cannot contain embedded whitespace characters.
	#[error("Scope contains whitespace: {scope}.")]
	ContainsWhitespace {
		/// The offending scope string.
		scope: String,
	},
	/// Scopes cannot contain characters that delimit the sign-in query string.
	#[error("Scope contains the query delimiter `{character}`: {scope}.")]
	ContainsDelimiter {
		/// The offending scope string.
		scope: String,
		/// Delimiter found in the scope.
		character: char,
	},
}

/// Ordered, deduplicated list of OAuth scopes.
///
/// Unlike a set, the list keeps the order in which scopes were first supplied because the
/// sign-in URL reproduces it verbatim. The [`fingerprint`](Self::fingerprint) helper lazily
/// caches a base64 (no padding) SHA-256 digest of the space-delimited list.
#[derive(Default)]
pub struct ScopeList {
	scopes: Arc<[String]>,
	fingerprint_cache: OnceLock<String>,
}
impl ScopeList {
	/// Creates a validated scope list from any iterator, dropping repeated entries.
	pub fn new<I, S>(scopes: I) -> Result<Self, ScopeValidationError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Ok(Self { scopes: validate(scopes)?, fingerprint_cache: OnceLock::new() })
	}

	/// `openid arccos/read:rounds`.
	pub fn rounds_default() -> Self {
		Self {
			scopes: DEFAULT_SCOPES.iter().map(|scope| (*scope).to_owned()).collect(),
			fingerprint_cache: OnceLock::new(),
		}
	}

	/// Number of distinct scopes.
	pub fn len(&self) -> usize {
		self.scopes.len()
	}

	/// Returns true if no scopes are defined.
	pub fn is_empty(&self) -> bool {
		self.scopes.is_empty()
	}

	/// Returns true if the list contains the provided scope.
	pub fn contains(&self, scope: &str) -> bool {
		self.scopes.iter().any(|candidate| candidate == scope)
	}

	/// Iterator over scopes in request order.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.scopes.iter().map(|s| s.as_str())
	}

	/// Joins the scopes with `separator`.
	///
	/// The sign-in URL uses a literal `+`, which the identity provider decodes as a space.
	pub fn joined(&self, separator: char) -> String {
		let mut buf = String::new();

		for (i, scope) in self.scopes.iter().enumerate() {
			if i > 0 {
				buf.push(separator);
			}

			buf.push_str(scope);
		}

		buf
	}

	/// Space-delimited representation.
	pub fn normalized(&self) -> String {
		self.joined(' ')
	}

	/// Stable fingerprint of the space-delimited list, cached after first use.
	pub fn fingerprint(&self) -> String {
		self.fingerprint_cache.get_or_init(|| compute_fingerprint(&self.normalized())).clone()
	}

	/// Returns the underlying slice of scope strings.
	pub fn as_slice(&self) -> &[String] {
		&self.scopes
	}
}
impl Clone for ScopeList {
	fn clone(&self) -> Self {
		Self { scopes: self.scopes.clone(), fingerprint_cache: OnceLock::new() }
	}
}
impl PartialEq for ScopeList {
	fn eq(&self, other: &Self) -> bool {
		self.scopes == other.scopes
	}
}
impl Eq for ScopeList {}
impl Debug for ScopeList {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("ScopeList").field(&self.scopes).finish()
	}
}
impl Display for ScopeList {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.normalized())
	}
}

/// Iterator over scope strings.
pub struct ScopeIter<'a> {
	inner: Iter<'a, String>,
}
impl<'a> Iterator for ScopeIter<'a> {
	type Item = &'a str;

	fn next(&mut self) -> Option<Self::Item> {
		self.inner.next().map(|s| s.as_str())
	}
}
impl<'a> IntoIterator for &'a ScopeList {
	type IntoIter = ScopeIter<'a>;
	type Item = &'a str;

	fn into_iter(self) -> Self::IntoIter {
		ScopeIter { inner: self.scopes.iter() }
	}
}
impl TryFrom<Vec<String>> for ScopeList {
	type Error = ScopeValidationError;

	fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}
impl FromStr for ScopeList {
	type Err = ScopeValidationError;

	/// Parses a space- or `+`-separated scope string.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if s.is_empty() {
			return Ok(Self::default());
		}

		let parts = s.split(|c: char| c == '+' || c.is_whitespace()).filter(|p| !p.is_empty());
		let list = Self::new(parts)?;

		if list.is_empty() {
			return Err(ScopeValidationError::Empty);
		}

		Ok(list)
	}
}
impl Serialize for ScopeList {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let mut seq = serializer.serialize_seq(Some(self.scopes.len()))?;

		for scope in self.scopes.iter() {
			seq.serialize_element(scope)?;
		}

		seq.end()
	}
}
impl<'de> Deserialize<'de> for ScopeList {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let values = <Vec<String>>::deserialize(deserializer)?;

		ScopeList::new(values).map_err(DeError::custom)
	}
}

fn validate<I, S>(scopes: I) -> Result<Arc<[String]>, ScopeValidationError>
where
	I: IntoIterator<Item = S>,
	S: Into<String>,
{
	let mut list = Vec::<String>::new();

	for scope in scopes {
		let owned: String = scope.into();

		if owned.is_empty() {
			return Err(ScopeValidationError::Empty);
		}
		if owned.chars().any(char::is_whitespace) {
			return Err(ScopeValidationError::ContainsWhitespace { scope: owned });
		}
		if let Some(character) = owned.chars().find(|c| matches!(c, '+' | '&' | '#')) {
			return Err(ScopeValidationError::ContainsDelimiter { scope: owned, character });
		}
		if !list.contains(&owned) {
			list.push(owned);
		}
	}

	Ok(Arc::from(list))
}

fn compute_fingerprint(normalized: &str) -> String {
	let mut hasher = Sha256::new();

	hasher.update(normalized.as_bytes());

	STANDARD_NO_PAD.encode(hasher.finalize())
}
