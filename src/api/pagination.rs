//! Cursor-paginated collection sweeps.
//!
//! A sweep requests the first page with `limit` and the optional date range, then follows
//! `next_token` strictly sequentially. A failed first page fails the sweep; a failure on any
//! later page ends the sweep early and keeps the records gathered so far.

// std
use std::num::NonZeroUsize;
// self
use crate::{
	_prelude::*,
	api::PageOutcome,
	error::UpstreamError,
	flows::Broker,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::Resource,
};

/// Largest page size the data API accepts.
pub const MAX_PAGE_SIZE: u32 = 25;

/// Optional `start`/`end` bounds forwarded verbatim to collection endpoints.
///
/// Empty strings are treated as absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
	/// Inclusive lower bound (ISO 8601 timestamp).
	pub start: Option<String>,
	/// Exclusive upper bound (ISO 8601 timestamp).
	pub end: Option<String>,
}
impl DateRange {
	/// Builds a range from optional bounds.
	pub fn new(start: Option<impl Into<String>>, end: Option<impl Into<String>>) -> Self {
		Self { start: start.map(Into::into), end: end.map(Into::into) }
	}

	/// Lower bound, if non-empty.
	pub fn start(&self) -> Option<&str> {
		self.start.as_deref().filter(|value| !value.is_empty())
	}

	/// Upper bound, if non-empty.
	pub fn end(&self) -> Option<&str> {
		self.end.as_deref().filter(|value| !value.is_empty())
	}
}

/// Limits applied to a sweep.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PaginationPolicy {
	/// Maximum number of pages to request; `None` follows the cursor until it runs out.
	pub max_pages: Option<NonZeroUsize>,
}
impl PaginationPolicy {
	/// Policy that stops after `max_pages` pages.
	pub const fn capped(max_pages: NonZeroUsize) -> Self {
		Self { max_pages: Some(max_pages) }
	}

	fn allows_another(&self, fetched: usize) -> bool {
		self.max_pages.is_none_or(|max| fetched < max.get())
	}
}

/// Result of a collection sweep.
#[derive(Clone, Debug, PartialEq)]
pub enum SweepOutcome {
	/// Every page fetched, or a later page failed and the earlier records were kept.
	Complete(Vec<Value>),
	/// The first page failed; no records are available.
	Failed {
		/// HTTP status of the failed first page.
		status: u16,
		/// Retry-After hint, if upstream sent one.
		retry_after: Option<Duration>,
	},
}
impl SweepOutcome {
	/// Converts the outcome into the broker error taxonomy.
	pub fn into_result(self) -> Result<Vec<Value>> {
		match self {
			Self::Complete(records) => Ok(records),
			Self::Failed { status, retry_after } =>
				Err(Error::from_upstream_status(status, retry_after)),
		}
	}

	fn from_failed_page(outcome: PageOutcome) -> Self {
		match outcome {
			PageOutcome::Failed { status, retry_after } => Self::Failed { status, retry_after },
			other => Self::Failed {
				status: other.failure_status().unwrap_or_default(),
				retry_after: None,
			},
		}
	}
}

#[derive(Debug, Deserialize)]
struct CollectionPage {
	#[serde(default)]
	records: Option<Vec<Value>>,
	#[serde(default)]
	next_token: Option<String>,
}

impl Broker {
	/// Sweeps every page of the collection at `path`.
	pub async fn fetch_all(&self, path: &str, range: &DateRange) -> Result<SweepOutcome> {
		let base = self.descriptor.api_url(path)?;
		let mut records = Vec::new();
		let mut cursor = None::<String>;
		let mut fetched = 0_usize;

		loop {
			let url = collection_url(&base, range, cursor.as_deref());
			let value = match self.fetch_page(url).await? {
				PageOutcome::Success(value) => value,
				failure if fetched == 0 => return Ok(SweepOutcome::from_failed_page(failure)),
				failure => {
					tracing::warn!(
						path,
						page = fetched + 1,
						status = failure.failure_status(),
						"Pagination stopped early; keeping earlier records."
					);

					break;
				},
			};
			let page: CollectionPage = serde_path_to_error::deserialize(value)
				.map_err(|source| UpstreamError::Malformed { source })?;

			fetched += 1;
			records.extend(page.records.unwrap_or_default());

			let Some(next) = page.next_token.filter(|token| !token.is_empty()) else {
				break;
			};

			if !self.pagination.allows_another(fetched) {
				tracing::warn!(
					path,
					pages = fetched,
					"Page ceiling reached; returning partial records."
				);

				break;
			}

			cursor = Some(next);
		}

		tracing::debug!(
			path,
			pages = fetched,
			records = records.len(),
			"Collection sweep finished."
		);

		Ok(SweepOutcome::Complete(records))
	}

	/// Auth-gated sweep of one collection resource.
	///
	/// Body measurements are not paginated; their single object is returned as one record.
	pub async fn fetch_collection(
		&self,
		resource: Resource,
		range: &DateRange,
	) -> Result<Vec<Value>> {
		const KIND: FlowKind = FlowKind::Fetch;

		let span = FlowSpan::new(KIND, resource.as_str());

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async {
				if !self.is_authenticated().await {
					return Err(Error::Unauthenticated);
				}
				if !resource.is_collection() {
					return self
						.fetch_single_page(resource.path())
						.await?
						.into_result()
						.map(|body| vec![body]);
				}

				self.fetch_all(resource.path(), range).await?.into_result()
			})
			.await;

		obs::record_flow_outcome(KIND, FlowOutcome::from_success(result.is_ok()));

		result
	}
}

fn collection_url(base: &Url, range: &DateRange, cursor: Option<&str>) -> Url {
	let mut url = base.clone();
	let mut pairs = url.query_pairs_mut();

	if let Some(start) = range.start() {
		pairs.append_pair("start", start);
	}
	if let Some(end) = range.end() {
		pairs.append_pair("end", end);
	}

	pairs.append_pair("limit", &MAX_PAGE_SIZE.to_string());

	if let Some(cursor) = cursor {
		pairs.append_pair("nextToken", cursor);
	}

	drop(pairs);

	url
}

#[cfg(test)]
mod tests {
	// std
	use std::collections::HashMap;
	// self
	use super::*;

	fn base() -> Url {
		Url::parse("https://api.example.com/developer/v2/cycle")
			.expect("Base URL fixture should parse.")
	}

	#[test]
	fn first_page_carries_range_and_limit() {
		let range = DateRange::new(Some("2025-01-01T00:00:00Z"), Some(""));
		let url = collection_url(&base(), &range, None);
		let pairs: HashMap<_, _> = url.query_pairs().into_owned().collect();

		assert_eq!(pairs.get("start").map(String::as_str), Some("2025-01-01T00:00:00Z"));
		assert_eq!(pairs.get("limit").map(String::as_str), Some("25"));
		assert!(!pairs.contains_key("end"));
		assert!(!pairs.contains_key("nextToken"));
	}

	#[test]
	fn later_pages_keep_range_and_add_cursor() {
		let range = DateRange::new(Some("a"), Some("b"));
		let url = collection_url(&base(), &range, Some("tok+1"));
		let pairs: HashMap<_, _> = url.query_pairs().into_owned().collect();

		assert_eq!(pairs.get("nextToken").map(String::as_str), Some("tok+1"));
		assert_eq!(pairs.get("end").map(String::as_str), Some("b"));
	}

	#[test]
	fn null_or_missing_records_decode_as_empty() {
		for body in [
			serde_json::json!({ "records": null, "next_token": null }),
			serde_json::json!({ "next_token": "t" }),
		] {
			let page: CollectionPage =
				serde_json::from_value(body).expect("Page envelope should decode.");

			assert!(page.records.unwrap_or_default().is_empty());
		}
	}

	#[test]
	fn page_ceiling_counts_fetched_pages() {
		let policy = PaginationPolicy::capped(NonZeroUsize::MIN.saturating_add(1));

		assert!(policy.allows_another(1));
		assert!(!policy.allows_another(2));
		assert!(PaginationPolicy::default().allows_another(10_000));
	}

	#[test]
	fn sweep_failures_map_to_taxonomy() {
		assert!(matches!(
			SweepOutcome::from_failed_page(PageOutcome::Unauthorized).into_result(),
			Err(Error::Unauthenticated)
		));
		assert!(matches!(
			SweepOutcome::Failed { status: 429, retry_after: None }.into_result(),
			Err(Error::UpstreamRateLimited { .. })
		));
	}
}
