//! Internal OAuth client facade over the `oauth2` crate.
//!
//! Both grants WHOOP uses (authorization code and refresh token) go through
//! [`BasicFacade`], which posts client credentials in the form body and turns the token
//! response into a [`TokenGrant`].

pub use oauth2;

// std
use std::borrow::Cow;
// crates.io
use oauth2::{
	AccessToken, AuthType, AuthUrl, AuthorizationCode, Client, ClientId, ClientSecret,
	EndpointNotSet, EndpointSet, HttpClientError, RedirectUrl, RefreshToken, RequestTokenError,
	Scope, StandardRevocableToken, TokenResponse, TokenType, TokenUrl,
	basic::{
		BasicErrorResponse, BasicRequestTokenError, BasicRevocationErrorResponse,
		BasicTokenIntrospectionResponse,
	},
};
// self
use crate::{
	_prelude::*,
	error::{ConfigError, TransportError},
	http::{ReqwestHttpClient, ResponseMetadata, ResponseMetadataSlot},
	provider::ProviderDescriptor,
};

type WhoopClient<HasAuthUrl = EndpointNotSet, HasTokenUrl = EndpointNotSet> = Client<
	BasicErrorResponse,
	WhoopTokenResponse,
	BasicTokenIntrospectionResponse,
	StandardRevocableToken,
	BasicRevocationErrorResponse,
	HasAuthUrl,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
	HasTokenUrl,
>;
type ConfiguredClient = WhoopClient<EndpointSet, EndpointSet>;
type FacadeFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Lifetime applied when the token endpoint omits `expires_in`.
pub const DEFAULT_EXPIRES_IN: Duration = Duration::hours(1);

/// Token endpoint answer reduced to the fields the broker keeps.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenGrant {
	/// Newly issued access token.
	pub access_token: String,
	/// Rotated refresh token, when the provider issued one.
	pub refresh_token: Option<String>,
	/// Relative access token lifetime.
	pub expires_in: Duration,
}
impl TokenGrant {
	/// Absolute expiry in unix seconds, measured from `issued_at`.
	pub fn expires_at(&self, issued_at: OffsetDateTime) -> i64 {
		(issued_at + self.expires_in).unix_timestamp()
	}
}
impl Debug for TokenGrant {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenGrant")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("expires_in", &self.expires_in)
			.finish()
	}
}

/// Free-form `token_type`; WHOOP may omit it or send `null`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub(crate) struct LenientTokenType(Option<String>);
impl TokenType for LenientTokenType {}

/// Token endpoint body: only `access_token` is required.
///
/// `expires_in` is read as a signed integer so a zero or negative lifetime falls back to
/// [`DEFAULT_EXPIRES_IN`] instead of failing the exchange.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct WhoopTokenResponse {
	access_token: AccessToken,
	#[serde(default)]
	token_type: LenientTokenType,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	expires_in: Option<i64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	refresh_token: Option<RefreshToken>,
}
impl TokenResponse for WhoopTokenResponse {
	type TokenType = LenientTokenType;

	fn access_token(&self) -> &AccessToken {
		&self.access_token
	}

	fn token_type(&self) -> &Self::TokenType {
		&self.token_type
	}

	fn expires_in(&self) -> Option<std::time::Duration> {
		self.expires_in
			.and_then(|secs| u64::try_from(secs).ok())
			.filter(|secs| *secs > 0)
			.map(std::time::Duration::from_secs)
	}

	fn refresh_token(&self) -> Option<&RefreshToken> {
		self.refresh_token.as_ref()
	}

	fn scopes(&self) -> Option<&Vec<Scope>> {
		None
	}
}

pub(crate) trait OAuth2Facade
where
	Self: Send + Sync,
{
	fn refresh_token<'a, 'refresh>(
		&'a self,
		refresh_token: &'refresh str,
	) -> FacadeFuture<'a, TokenGrant>
	where
		'refresh: 'a;

	fn exchange_authorization_code<'a, 'code>(
		&'a self,
		code: &'code str,
	) -> FacadeFuture<'a, TokenGrant>
	where
		'code: 'a;
}

pub(crate) struct BasicFacade {
	oauth_client: ConfiguredClient,
	http_client: ReqwestHttpClient,
	redirect_uri: RedirectUrl,
	refresh_scope: Option<String>,
}
impl BasicFacade {
	pub(crate) fn from_descriptor(
		descriptor: &ProviderDescriptor,
		client_id: &str,
		client_secret: &str,
		redirect_uri: &Url,
		http_client: ReqwestHttpClient,
	) -> Result<Self, ConfigError> {
		let auth_url = AuthUrl::new(descriptor.endpoints.authorization.to_string())
			.map_err(|source| ConfigError::InvalidDescriptor { source })?;
		let token_url = TokenUrl::new(descriptor.endpoints.token.to_string())
			.map_err(|source| ConfigError::InvalidDescriptor { source })?;
		let redirect_uri = RedirectUrl::new(redirect_uri.to_string())
			.map_err(|source| ConfigError::InvalidRedirect { source })?;
		let oauth_client = WhoopClient::new(ClientId::new(client_id.to_owned()))
			.set_client_secret(ClientSecret::new(client_secret.to_owned()))
			.set_auth_uri(auth_url)
			.set_token_uri(token_url)
			.set_auth_type(AuthType::RequestBody);

		Ok(Self {
			oauth_client,
			http_client,
			redirect_uri,
			refresh_scope: descriptor.refresh_scope.clone(),
		})
	}
}
impl OAuth2Facade for BasicFacade {
	fn refresh_token<'a, 'refresh>(
		&'a self,
		refresh_token: &'refresh str,
	) -> FacadeFuture<'a, TokenGrant>
	where
		'refresh: 'a,
	{
		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let instrumented = self.http_client.instrumented(meta.clone());
			let refresh_secret = RefreshToken::new(refresh_token.to_owned());
			let mut request = self.oauth_client.exchange_refresh_token(&refresh_secret);

			if let Some(scope) = &self.refresh_scope {
				request = request.add_scope(Scope::new(scope.clone()));
			}

			let response = request
				.request_async(&instrumented)
				.await
				.map_err(|err| map_request_error(meta.take(), err))?;

			Ok(map_token_response(response))
		})
	}

	fn exchange_authorization_code<'a, 'code>(
		&'a self,
		code: &'code str,
	) -> FacadeFuture<'a, TokenGrant>
	where
		'code: 'a,
	{
		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let instrumented = self.http_client.instrumented(meta.clone());
			let response = self
				.oauth_client
				.exchange_code(AuthorizationCode::new(code.to_owned()))
				.set_redirect_uri(Cow::Borrowed(&self.redirect_uri))
				.request_async(&instrumented)
				.await
				.map_err(|err| map_request_error(meta.take(), err))?;

			Ok(map_token_response(response))
		})
	}
}

fn map_token_response(response: WhoopTokenResponse) -> TokenGrant {
	let expires_in = response
		.expires_in()
		.and_then(|lifetime| i64::try_from(lifetime.as_secs()).ok())
		.filter(|secs| *secs > 0)
		.map_or(DEFAULT_EXPIRES_IN, Duration::seconds);

	TokenGrant {
		access_token: response.access_token().secret().to_owned(),
		refresh_token: response.refresh_token().map(|token| token.secret().to_owned()),
		expires_in,
	}
}

fn map_request_error(
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<ReqwestError>>,
) -> Error {
	let status = meta.as_ref().and_then(|value| value.status);

	match err {
		RequestTokenError::ServerResponse(response) => map_server_response_error(response, status),
		RequestTokenError::Request(error) => map_transport_error(error, status),
		RequestTokenError::Parse(error, _body) => Error::TokenEndpoint {
			message: format!(
				"Token endpoint returned an unparseable response at `{}`",
				error.path()
			),
			status,
		},
		RequestTokenError::Other(message) => Error::TokenEndpoint {
			message: format!("Token endpoint returned an unexpected response: {message}"),
			status,
		},
	}
}

fn map_server_response_error(response: BasicErrorResponse, status: Option<u16>) -> Error {
	let message = if let Some(description) = response.error_description() {
		format!("Token endpoint returned an OAuth error: {description}")
	} else {
		format!("Token endpoint returned an OAuth error: {}", response.error().as_ref())
	};

	Error::TokenEndpoint { message, status }
}

fn map_transport_error(err: HttpClientError<ReqwestError>, status: Option<u16>) -> Error {
	match err {
		HttpClientError::Reqwest(inner) => TransportError::from(*inner).into(),
		HttpClientError::Http(inner) => TransportError::network(inner).into(),
		HttpClientError::Io(inner) => TransportError::Io(inner).into(),
		HttpClientError::Other(message) => Error::TokenEndpoint {
			message: format!(
				"HTTP client error occurred while calling the token endpoint: {message}"
			),
			status,
		},
		_ => Error::TokenEndpoint {
			message: "HTTP client error occurred while calling the token endpoint".into(),
			status,
		},
	}
}
