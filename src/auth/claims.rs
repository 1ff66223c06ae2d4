//! Unverified decoding of compact (`header.payload.signature`) token payloads.
//!
//! The signature segment is never checked, so everything returned here is
//! **unauthenticated** and suitable only for display and request routing (e.g. choosing the
//! user id for the rounds endpoint). Never make authorization decisions from these claims.

// crates.io
use base64::{
	Engine as _, alphabet,
	engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use serde_json::Value;
// self
use crate::{_prelude::*, auth::UserId, error::DecodeError};

/// Raw claims object.
pub type Claims = serde_json::Map<String, Value>;

// Standard alphabet after the URL-safe characters are translated; padding optional.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
	&alphabet::STANDARD,
	GeneralPurposeConfig::new()
		.with_encode_padding(false)
		.with_decode_padding_mode(DecodePaddingMode::Indifferent)
		.with_decode_allow_trailing_bits(true),
);

/// Identity view of the ID token claims.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IdentityClaims {
	/// Subject identifier assigned by the identity provider.
	pub sub: String,
	/// Rounds API user identifier.
	#[serde(rename = "custom:arccosUserId")]
	pub user_id: UserId,
	/// Email address, when the `email` scope was granted.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	/// Every other claim, verbatim.
	#[serde(flatten)]
	pub extra: BTreeMap<String, Value>,
}
impl IdentityClaims {
	/// Decodes the identity view from a compact ID token without verifying it.
	pub fn from_id_token(token: &str) -> Result<Self, DecodeError> {
		decode_payload(token)
	}
}

/// Decodes the payload segment of `token` into a claims object.
///
/// Fails when the token has fewer than two segments, when the payload is not base64, or when
/// the decoded bytes are not a UTF-8 JSON object.
pub fn decode_claims(token: &str) -> Result<Claims, DecodeError> {
	decode_payload(token)
}

/// Decodes the payload segment of `token` into any deserializable shape.
pub fn decode_payload<T>(token: &str) -> Result<T, DecodeError>
where
	T: DeserializeOwned,
{
	let mut segments = token.split('.');
	let payload = match (segments.next(), segments.next()) {
		(Some(_), Some(payload)) => payload,
		_ => return Err(DecodeError::MalformedToken { segments: token.split('.').count() }),
	};
	let translated = payload
		.chars()
		.map(|c| match c {
			'-' => '+',
			'_' => '/',
			c => c,
		})
		.collect::<String>();
	let bytes = PAYLOAD_ENGINE.decode(translated)?;
	let mut de = serde_json::Deserializer::from_slice(&bytes);

	serde_path_to_error::deserialize(&mut de).map_err(DecodeError::InvalidClaims)
}
