//! Form-body and query-string encoding for token requests, sign-in redirects, and resource
//! filters.
//!
//! Parameter sets are frequently partial (no client secret, no paging offset), so both
//! encoders silently skip entries whose value is absent or NaN and keep every other entry in
//! insertion order.

// self
use crate::_prelude::*;

/// Scalar parameter value; non-string values are stringified on encode.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamValue {
	/// Text value.
	Text(String),
	/// Signed integer value.
	Integer(i64),
	/// Unsigned integer value.
	Unsigned(u64),
	/// Floating-point value; NaN is treated as absent.
	Float(f64),
	/// Boolean value.
	Bool(bool),
}
impl ParamValue {
	/// Returns true when the value must be dropped from encoded output.
	pub fn is_nan(&self) -> bool {
		matches!(self, Self::Float(value) if value.is_nan())
	}

	/// Renders the value the way a browser stringifies it.
	pub fn render(&self) -> String {
		match self {
			Self::Text(value) => value.clone(),
			Self::Integer(value) => value.to_string(),
			Self::Unsigned(value) => value.to_string(),
			Self::Float(value) => render_float(*value),
			Self::Bool(value) => value.to_string(),
		}
	}
}
impl Display for ParamValue {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.render())
	}
}
impl From<&str> for ParamValue {
	fn from(value: &str) -> Self {
		Self::Text(value.to_owned())
	}
}
impl From<String> for ParamValue {
	fn from(value: String) -> Self {
		Self::Text(value)
	}
}
impl From<&String> for ParamValue {
	fn from(value: &String) -> Self {
		Self::Text(value.clone())
	}
}
impl From<i32> for ParamValue {
	fn from(value: i32) -> Self {
		Self::Integer(value.into())
	}
}
impl From<i64> for ParamValue {
	fn from(value: i64) -> Self {
		Self::Integer(value)
	}
}
impl From<u32> for ParamValue {
	fn from(value: u32) -> Self {
		Self::Unsigned(value.into())
	}
}
impl From<u64> for ParamValue {
	fn from(value: u64) -> Self {
		Self::Unsigned(value)
	}
}
impl From<usize> for ParamValue {
	fn from(value: usize) -> Self {
		Self::Unsigned(value as u64)
	}
}
impl From<f64> for ParamValue {
	fn from(value: f64) -> Self {
		Self::Float(value)
	}
}
impl From<bool> for ParamValue {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}

/// Ordered parameter list whose entries may be absent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Params(Vec<(String, Option<ParamValue>)>);
impl Params {
	/// Creates an empty parameter list.
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends a present value.
	pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
		self.push(key, Some(value.into()));

		self
	}

	/// Appends a value that may be absent.
	pub fn with_opt<V>(mut self, key: impl Into<String>, value: Option<V>) -> Self
	where
		V: Into<ParamValue>,
	{
		self.push(key, value.map(Into::into));

		self
	}

	/// Appends an entry in place.
	pub fn push(&mut self, key: impl Into<String>, value: Option<ParamValue>) {
		self.0.push((key.into(), value));
	}

	/// Number of entries, including absent ones.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true when no entries were added.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Entries that survive filtering, rendered to strings.
	pub fn retained(&self) -> impl Iterator<Item = (&str, String)> {
		self.0.iter().filter_map(|(key, value)| match value {
			Some(value) if !value.is_nan() => Some((key.as_str(), value.render())),
			_ => None,
		})
	}
}
impl<K, V> FromIterator<(K, Option<V>)> for Params
where
	K: Into<String>,
	V: Into<ParamValue>,
{
	fn from_iter<I>(iter: I) -> Self
	where
		I: IntoIterator<Item = (K, Option<V>)>,
	{
		Self(iter.into_iter().map(|(key, value)| (key.into(), value.map(Into::into))).collect())
	}
}

/// Options accepted by [`encode_query`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueryOptions {
	/// Percent-encode values like `encodeURIComponent`: everything except ASCII alphanumerics
	/// and `-_.!~*'()` is escaped as UTF-8 octets. When false the caller supplies
	/// pre-encoded or URL-safe values (e.g. scopes joined with a literal `+`).
	pub should_encode_uri_component: bool,
}
impl QueryOptions {
	/// Emits values verbatim.
	pub const RAW: Self = Self { should_encode_uri_component: false };
}
impl Default for QueryOptions {
	fn default() -> Self {
		Self { should_encode_uri_component: true }
	}
}

/// Encodes `params` as an `application/x-www-form-urlencoded` body.
pub fn encode_form(params: &Params) -> Vec<u8> {
	let mut serializer = url::form_urlencoded::Serializer::new(String::new());

	for (key, value) in params.retained() {
		serializer.append_pair(key, &value);
	}

	serializer.finish().into_bytes()
}

/// Encodes `params` as the query string that follows `?` (e.g. `limit=10&offset=0`).
pub fn encode_query(params: &Params, options: QueryOptions) -> String {
	params
		.retained()
		.map(|(key, value)| {
			if options.should_encode_uri_component {
				format!("{key}={}", encode_uri_component(&value))
			} else {
				format!("{key}={value}")
			}
		})
		.collect::<Vec<_>>()
		.join("&")
}

// Left unescaped by `encodeURIComponent` but escaped by `urlencoding`.
const URI_COMPONENT_MARKS: [char; 5] = ['!', '\'', '(', ')', '*'];

fn encode_uri_component(value: &str) -> String {
	let mut encoded = String::with_capacity(value.len());
	let mut rest = value;

	while let Some(at) = rest.find(|c| URI_COMPONENT_MARKS.contains(&c)) {
		encoded.push_str(&urlencoding::encode(&rest[..at]));
		encoded.push_str(&rest[at..=at]);

		rest = &rest[at + 1..];
	}

	encoded.push_str(&urlencoding::encode(rest));

	encoded
}

fn render_float(value: f64) -> String {
	if value.is_infinite() {
		return if value.is_sign_positive() { "Infinity".into() } else { "-Infinity".into() };
	}
	// -0 renders as 0.
	if value == 0.0 {
		return "0".into();
	}

	value.to_string()
}
