//! Authorization-code flow: authorize URL generation, callback validation and the code
//! exchange.

// self
use crate::{
	_prelude::*,
	auth::{AuthorizationSession, CallbackError, CallbackParams},
	flows::Broker,
	oauth::{OAuth2Facade, TokenGrant},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

impl Broker {
	/// Builds the provider authorize URL and remembers its CSRF state.
	///
	/// Only one authorization can be pending; starting another replaces the previous state.
	pub fn start_authorization(&self) -> AuthorizationSession {
		let session =
			AuthorizationSession::generate(&self.descriptor, &self.client_id, &self.redirect_uri);

		*self.pending_authorization.lock() = Some(session.clone());

		tracing::debug!("Authorization started.");

		session
	}

	/// Validates the redirect parameters and exchanges the authorization code.
	///
	/// The pending state is cleared only after a successful exchange.
	pub async fn complete_authorization(
		&self,
		params: CallbackParams,
	) -> Result<(), CallbackError> {
		if let Some(error) = params.error.as_deref() {
			tracing::warn!(error, "Provider reported an authorization error.");

			return Err(CallbackError::AccessDenied);
		}

		let state_matches = params.state.as_deref().is_some_and(|state| {
			self.pending_authorization
				.lock()
				.as_ref()
				.is_some_and(|session| session.matches_state(state))
		});

		if !state_matches {
			tracing::warn!("Authorization callback state does not match the pending session.");

			return Err(CallbackError::InvalidState);
		}

		let Some(code) = params.code.as_deref().filter(|code| !code.is_empty()) else {
			return Err(CallbackError::AuthFailed);
		};

		if !self.exchange_authorization_code(code).await {
			return Err(CallbackError::AuthFailed);
		}

		*self.pending_authorization.lock() = None;

		Ok(())
	}

	/// Exchanges an authorization code and overwrites the cached credential on success.
	///
	/// Failures are logged and reported as `false`; the cached credential stays untouched.
	pub async fn exchange_authorization_code(&self, code: &str) -> bool {
		const KIND: FlowKind = FlowKind::AuthorizationCode;

		let span = FlowSpan::new(KIND, "exchange_authorization_code");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let ok = span
			.instrument(async {
				match self.request_code_exchange(code).await {
					Ok(grant) => {
						let expires_at = grant.expires_at(OffsetDateTime::now_utc());
						let refresh_token = grant.refresh_token.unwrap_or_else(|| {
							self.cache.get().refresh_token.expose().to_owned()
						});

						self.cache.set(grant.access_token, refresh_token, expires_at);

						tracing::info!(expires_at, "Authorization code exchanged.");

						true
					},
					Err(e) => {
						tracing::error!(error = %e, "Authorization code exchange failed.");

						false
					},
				}
			})
			.await;

		obs::record_flow_outcome(KIND, FlowOutcome::from_success(ok));

		ok
	}

	async fn request_code_exchange(&self, code: &str) -> Result<TokenGrant> {
		let facade = self.facade()?;

		facade.exchange_authorization_code(code).await
	}
}
