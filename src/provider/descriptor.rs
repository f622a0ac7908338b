//! Provider descriptor data structures shared by all flows.
//!
//! The module exposes validated endpoint metadata and the builder used to assemble it,
//! so tests can point the broker at a mock server while production uses
//! [`ProviderDescriptor::whoop`].

/// Builder API for assembling provider descriptors.
pub mod builder;

pub use builder::*;

// self
use crate::{_prelude::*, error::ConfigError};

/// Scopes requested when the user authorizes the dashboard.
pub const WHOOP_SCOPES: [&str; 6] = [
	"read:body_measurement",
	"read:recovery",
	"read:sleep",
	"read:cycles",
	"read:workout",
	"offline",
];

/// Endpoint set declared by a provider descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// Authorization endpoint used by the Authorization Code flow.
	pub authorization: Url,
	/// Token endpoint used for exchanges and refreshes.
	pub token: Url,
	/// Base URL that resource paths are appended to.
	pub api_base: Url,
}

/// Immutable provider descriptor consumed by flows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
	/// Endpoint definitions exposed by the provider.
	pub endpoints: ProviderEndpoints,
	/// Scopes requested on the authorize URL.
	pub scopes: Vec<String>,
	/// Scope sent alongside refresh-token exchanges, if the provider wants one.
	pub refresh_scope: Option<String>,
}
impl ProviderDescriptor {
	/// Creates a new builder.
	pub fn builder() -> ProviderDescriptorBuilder {
		ProviderDescriptorBuilder::new()
	}

	/// Descriptor for the production WHOOP API.
	pub fn whoop() -> Result<Self, ConfigError> {
		let parse = |raw: &str| {
			Url::parse(raw).map_err(|source| ConfigError::InvalidDescriptor { source })
		};

		Ok(Self::builder()
			.authorization_endpoint(parse("https://api.prod.whoop.com/oauth/oauth2/auth")?)
			.token_endpoint(parse("https://api.prod.whoop.com/oauth/oauth2/token")?)
			.api_base(parse("https://api.prod.whoop.com/developer")?)
			.build()?)
	}

	/// Composes the absolute URL for a path relative to the API base.
	pub fn api_url(&self, path: &str) -> Result<Url, ConfigError> {
		let raw = format!(
			"{}/{}",
			self.endpoints.api_base.as_str().trim_end_matches('/'),
			path.trim_start_matches('/')
		);

		Url::parse(&raw).map_err(|source| ConfigError::InvalidUpstreamUrl { url: raw, source })
	}
}
