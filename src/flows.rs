//! The broker and its token flows: authorization code, single-flight refresh, and the
//! authentication gate.

pub mod auth_code;
pub mod common;
pub mod gate;
pub mod refresh;

pub use common::*;
pub use gate::*;
pub use refresh::*;

// self
use crate::{
	_prelude::*,
	api::PaginationPolicy,
	auth::AuthorizationSession,
	cache::TokenCache,
	config::BrokerConfig,
	http::ReqwestHttpClient,
	oauth::BasicFacade,
	provider::ProviderDescriptor,
	store::{CredentialStore, EnvFileStore},
};

/// Single-account credential broker for one provider descriptor.
///
/// The broker owns the HTTP client, the token cache, the provider descriptor and the client
/// credentials so individual flows only deal with grant- or resource-specific logic. Clones
/// share the cache, the pending authorization state and the refresh slot.
#[derive(Clone)]
pub struct Broker {
	/// HTTP client wrapper used for every outbound request.
	pub http_client: ReqwestHttpClient,
	/// Authoritative credential cache.
	pub cache: Arc<TokenCache>,
	/// Provider descriptor that defines the OAuth and API endpoints.
	pub descriptor: ProviderDescriptor,
	/// OAuth 2.0 client identifier.
	pub client_id: String,
	/// Redirect URI registered with the provider.
	pub redirect_uri: Url,
	/// Pagination limits applied to collection sweeps.
	pub pagination: PaginationPolicy,
	/// Shared counters for refresh flow outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
	client_secret: String,
	refresh_slot: Arc<RefreshSlot>,
	pending_authorization: Arc<Mutex<Option<AuthorizationSession>>>,
}
impl Broker {
	/// Creates a broker over an existing cache with the default reqwest transport.
	pub fn new(
		descriptor: ProviderDescriptor,
		cache: Arc<TokenCache>,
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
		redirect_uri: Url,
	) -> Self {
		Self {
			http_client: ReqwestHttpClient::default(),
			cache,
			descriptor,
			client_id: client_id.into(),
			redirect_uri,
			pagination: PaginationPolicy::default(),
			refresh_metrics: Default::default(),
			client_secret: client_secret.into(),
			refresh_slot: Default::default(),
			pending_authorization: Default::default(),
		}
	}

	/// Wires a production broker from validated startup configuration.
	///
	/// Credentials are loaded from, and persisted to, the configured dotenv file.
	pub fn from_config(config: &BrokerConfig) -> Result<Self> {
		let store: Arc<dyn CredentialStore> =
			Arc::new(EnvFileStore::new(config.credentials_path.clone()));
		let cache = Arc::new(TokenCache::load(store));
		let broker = Self::new(
			ProviderDescriptor::whoop()?,
			cache,
			config.client_id.clone(),
			config.client_secret.clone(),
			config.redirect_uri.clone(),
		)
		.with_pagination(config.pagination);

		Ok(broker)
	}

	/// Replaces the HTTP transport.
	pub fn with_http_client(mut self, http_client: ReqwestHttpClient) -> Self {
		self.http_client = http_client;

		self
	}

	/// Overrides the pagination policy.
	pub fn with_pagination(mut self, pagination: PaginationPolicy) -> Self {
		self.pagination = pagination;

		self
	}

	fn facade(&self) -> Result<BasicFacade> {
		BasicFacade::from_descriptor(
			&self.descriptor,
			&self.client_id,
			&self.client_secret,
			&self.redirect_uri,
			self.http_client.clone(),
		)
		.map_err(Into::into)
	}
}
impl Debug for Broker {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Broker")
			.field("descriptor", &self.descriptor)
			.field("client_id", &self.client_id)
			.field("redirect_uri", &self.redirect_uri.as_str())
			.field("pagination", &self.pagination)
			.finish()
	}
}
