//! Rounds listing (`GET /protected/v1/users/{user_id}/rounds`).

// self
use crate::{_prelude::*, auth::UserId, codec::Params};

/// One recorded round of golf.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
	/// Round identifier.
	pub round_id: u64,
	/// Owning user identifier.
	pub user_id: String,
	/// Local start timestamp as reported by the API.
	pub start_date: String,
	/// Local end timestamp; absent while a round is in progress.
	#[serde(default)]
	pub end_date: Option<String>,
	/// Total strokes; absent for incomplete rounds.
	#[serde(default)]
	pub total_score: Option<i64>,
	/// Course identifier.
	pub course_id: u64,
	/// Course layout version.
	pub course_version: u32,
	/// Holes played (typically 9 or 18).
	pub number_of_holes: u32,
}

/// Pagination envelope returned alongside results.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paging {
	/// Page size.
	pub limit: u32,
	/// Offset of the first result.
	pub offset: u32,
	/// Link to the previous page.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub previous: Option<String>,
	/// Link to the next page.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub next: Option<String>,
}

/// One page of rounds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundsPage {
	/// Rounds on this page.
	pub results: Vec<Round>,
	/// Pagination metadata.
	pub paging: Paging,
}
impl RoundsPage {
	/// Returns true when the API advertises another page.
	pub fn has_next(&self) -> bool {
		self.paging.next.is_some()
	}
}

/// Optional paging filters for the rounds listing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RoundsQuery {
	/// Maximum number of rounds to return.
	pub limit: Option<u32>,
	/// Number of rounds to skip.
	pub offset: Option<u32>,
}
impl RoundsQuery {
	/// Sets the page size.
	pub fn limit(mut self, limit: u32) -> Self {
		self.limit = Some(limit);

		self
	}

	/// Sets the offset.
	pub fn offset(mut self, offset: u32) -> Self {
		self.offset = Some(offset);

		self
	}

	/// Query parameters; unset filters are omitted.
	pub fn to_params(&self) -> Params {
		Params::new().with_opt("limit", self.limit).with_opt("offset", self.offset)
	}
}

/// API path listing the rounds of `user_id`.
pub fn rounds_path(user_id: &UserId) -> String {
	format!("protected/v1/users/{user_id}/rounds")
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::codec::{self, QueryOptions};

	#[test]
	fn page_deserializes_api_payload() {
		let page: RoundsPage = serde_json::from_str(
			r#"{
				"results": [{
					"roundId": 1,
					"userId": "42",
					"startDate": "2024-05-01T08:00:00",
					"endDate": null,
					"totalScore": null,
					"courseId": 9,
					"courseVersion": 2,
					"numberOfHoles": 18
				}],
				"paging": { "limit": 10, "offset": 0, "next": "/rounds?offset=10" }
			}"#,
		)
		.expect("Rounds payload should deserialize.");

		assert_eq!(page.results.len(), 1);
		assert_eq!(page.results[0].end_date, None);
		assert_eq!(page.results[0].number_of_holes, 18);
		assert!(page.has_next());
		assert_eq!(page.paging.previous, None);
	}

	#[test]
	fn query_omits_unset_filters() {
		let none = RoundsQuery::default().to_params();
		let both = RoundsQuery::default().limit(5).offset(10).to_params();

		assert_eq!(codec::encode_query(&none, QueryOptions::default()), "");
		assert_eq!(codec::encode_query(&both, QueryOptions::default()), "limit=5&offset=10");
	}

	#[test]
	fn path_embeds_user_id() {
		let user = UserId::new("42").expect("User fixture should be valid.");

		assert_eq!(rounds_path(&user), "protected/v1/users/42/rounds");
	}
}
