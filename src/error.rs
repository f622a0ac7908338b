//! Broker-level error types shared across flows, fetchers, and stores.

// self
use crate::_prelude::*;

/// Broker-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical broker error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// No usable access token: never authorized, or the refresh exchange failed.
	#[error("No usable access token is available; re-authorization is required.")]
	Unauthenticated,
	/// Upstream answered with a rate-limit status.
	#[error("Upstream rate limit reached.")]
	UpstreamRateLimited {
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Upstream answered with any other non-success response.
	#[error(transparent)]
	Upstream(#[from] UpstreamError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Token endpoint rejected or failed an exchange.
	#[error("Token endpoint exchange failed: {message}.")]
	TokenEndpoint {
		/// Provider- or broker-supplied message summarizing the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
}
impl Error {
	/// Maps a non-success upstream status into the broker taxonomy.
	pub fn from_upstream_status(status: u16, retry_after: Option<Duration>) -> Self {
		match status {
			401 => Self::Unauthenticated,
			429 => Self::UpstreamRateLimited { retry_after },
			status => UpstreamError::Status { status }.into(),
		}
	}

	/// Renders the dashboard-facing error body for this error.
	///
	/// Upstream details never leak into the body; they are only logged.
	pub fn to_body(&self) -> ErrorBody {
		match self {
			Self::Unauthenticated => ErrorBody {
				status: 401,
				error: "auth_expired",
				message: "Your session has expired. Please reconnect to Whoop.",
			},
			Self::UpstreamRateLimited { .. } => ErrorBody {
				status: 429,
				error: "rate_limited",
				message: "Rate limit reached. Please wait a moment and try again.",
			},
			Self::Config(_) => ErrorBody {
				status: 500,
				error: "internal_error",
				message: "The broker is misconfigured.",
			},
			Self::Upstream(_)
			| Self::Transport(_)
			| Self::TokenEndpoint { .. }
			| Self::Storage(_) => ErrorBody {
				status: 502,
				error: "whoop_api_error",
				message: "Could not retrieve data from Whoop. Please try again later.",
			},
		}
	}
}

/// JSON error payload handed to the dashboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
	/// HTTP status the route layer should respond with.
	#[serde(skip)]
	pub status: u16,
	/// Stable machine-readable error code.
	pub error: &'static str,
	/// Human-readable message safe to show end-users.
	pub message: &'static str,
}

/// Configuration and validation failures raised by the broker.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// A required startup value is absent.
	#[error("Missing required variable `{name}`.")]
	MissingVariable {
		/// Variable name.
		name: &'static str,
	},
	/// A startup value could not be parsed.
	#[error("Variable `{name}` is invalid: {reason}.")]
	InvalidVariable {
		/// Variable name.
		name: &'static str,
		/// Parsing failure summary.
		reason: String,
	},
	/// Provider descriptor contains an invalid URL.
	#[error("Descriptor contains an invalid URL.")]
	InvalidDescriptor {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Redirect URI cannot be parsed.
	#[error("Redirect URI is invalid.")]
	InvalidRedirect {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Provider descriptor validation failed.
	#[error(transparent)]
	Descriptor(#[from] crate::provider::ProviderDescriptorError),
	/// Upstream request URL could not be composed.
	#[error("Upstream URL `{url}` is invalid.")]
	InvalidUpstreamUrl {
		/// Offending URL text.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}

/// Non-success upstream responses other than authentication and rate limiting.
#[derive(Debug, ThisError)]
pub enum UpstreamError {
	/// Upstream returned a non-2xx status.
	#[error("Upstream returned HTTP {status}.")]
	Status {
		/// HTTP status code.
		status: u16,
	},
	/// Upstream returned a success status with an undecodable body.
	#[error("Upstream returned malformed JSON.")]
	Malformed {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling upstream.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling upstream.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
impl From<ReqwestError> for Error {
	fn from(e: ReqwestError) -> Self {
		TransportError::from(e).into()
	}
}
