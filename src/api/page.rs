//! One authenticated GET against the data API.

// crates.io
use reqwest::StatusCode;
// self
use crate::{
	_prelude::*,
	error::UpstreamError,
	flows::Broker,
	http,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::Resource,
};

/// Result of a single upstream request that reached the server.
#[derive(Clone, Debug, PartialEq)]
pub enum PageOutcome {
	/// 2xx with a decoded JSON body.
	Success(Value),
	/// Upstream rejected the access token.
	Unauthorized,
	/// Any other non-success status.
	Failed {
		/// HTTP status code.
		status: u16,
		/// Retry-After hint, if upstream sent one.
		retry_after: Option<Duration>,
	},
}
impl PageOutcome {
	/// HTTP status of a non-success outcome.
	pub fn failure_status(&self) -> Option<u16> {
		match self {
			Self::Success(_) => None,
			Self::Unauthorized => Some(StatusCode::UNAUTHORIZED.as_u16()),
			Self::Failed { status, .. } => Some(*status),
		}
	}

	/// Converts the outcome into the broker error taxonomy.
	pub fn into_result(self) -> Result<Value> {
		match self {
			Self::Success(value) => Ok(value),
			Self::Unauthorized => Err(Error::Unauthenticated),
			Self::Failed { status, retry_after } =>
				Err(Error::from_upstream_status(status, retry_after)),
		}
	}
}

impl Broker {
	/// Performs one GET with the cached access token.
	///
	/// Does not consult the authentication gate and never retries. Network failures and
	/// undecodable success bodies are returned as errors.
	pub async fn fetch_page(&self, url: Url) -> Result<PageOutcome> {
		let access_token = self.cache.get().access_token;
		let response =
			self.http_client.get(url.clone()).bearer_auth(access_token.expose()).send().await?;
		let status = response.status();

		tracing::debug!(url = %url, status = status.as_u16(), "Fetched upstream page.");

		if status == StatusCode::UNAUTHORIZED {
			return Ok(PageOutcome::Unauthorized);
		}
		if !status.is_success() {
			let retry_after = http::parse_retry_after(response.headers());

			return Ok(PageOutcome::Failed { status: status.as_u16(), retry_after });
		}

		let body = response.bytes().await?;
		let mut de = serde_json::Deserializer::from_slice(&body);
		let value = serde_path_to_error::deserialize(&mut de)
			.map_err(|source| UpstreamError::Malformed { source })?;

		Ok(PageOutcome::Success(value))
	}

	/// Fetches one page from a path relative to the API base.
	pub async fn fetch_single_page(&self, path: &str) -> Result<PageOutcome> {
		let url = self.descriptor.api_url(path)?;

		self.fetch_page(url).await
	}

	/// Auth-gated fetch of the body measurement object.
	pub async fn fetch_body(&self) -> Result<Value> {
		const KIND: FlowKind = FlowKind::Fetch;

		let span = FlowSpan::new(KIND, "fetch_body");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async {
				if !self.is_authenticated().await {
					return Err(Error::Unauthenticated);
				}

				self.fetch_single_page(Resource::Body.path()).await?.into_result()
			})
			.await;

		obs::record_flow_outcome(KIND, FlowOutcome::from_success(result.is_ok()));

		result
	}
}
