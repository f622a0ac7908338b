//! Authorization-code handshake state (CSRF `state`, authorize URL, callback parameters).

// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::{_prelude::*, provider::ProviderDescriptor};

const STATE_LEN: usize = 32;

/// Authorization Code handshake metadata returned by
/// [`Broker::start_authorization`](crate::flows::Broker::start_authorization).
#[derive(Clone, Debug)]
pub struct AuthorizationSession {
	/// Opaque state value that must round-trip via the redirect handler.
	pub state: String,
	/// Redirect URI supplied when constructing the authorize URL.
	pub redirect_uri: Url,
	/// Fully-formed authorize URL that callers should send the end-user to.
	pub authorize_url: Url,
}
impl AuthorizationSession {
	pub(crate) fn generate(
		descriptor: &ProviderDescriptor,
		client_id: &str,
		redirect_uri: &Url,
	) -> Self {
		let state = random_string(STATE_LEN);
		let authorize_url = build_authorize_url(descriptor, client_id, redirect_uri, &state);

		Self { state, redirect_uri: redirect_uri.clone(), authorize_url }
	}

	/// Returns `true` when `returned_state` matches the session state.
	pub fn matches_state(&self, returned_state: &str) -> bool {
		!returned_state.is_empty() && returned_state == self.state
	}
}

/// Query parameters received on the authorization redirect.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct CallbackParams {
	/// Authorization code issued by the provider.
	pub code: Option<String>,
	/// Echoed CSRF state.
	pub state: Option<String>,
	/// Provider error (e.g. the user denied access).
	pub error: Option<String>,
}

/// Reasons an authorization callback cannot be completed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ThisError)]
pub enum CallbackError {
	/// The provider reported an error, usually because the user denied access.
	#[error("The user denied access.")]
	AccessDenied,
	/// The `state` parameter was missing or did not match the pending session.
	#[error("Authorization state mismatch.")]
	InvalidState,
	/// The code was missing or the token exchange failed.
	#[error("Authorization failed.")]
	AuthFailed,
}
impl CallbackError {
	/// Returns the stable code the route layer appends as `?error=<code>`.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::AccessDenied => "access_denied",
			Self::InvalidState => "invalid_state",
			Self::AuthFailed => "auth_failed",
		}
	}
}

fn build_authorize_url(
	descriptor: &ProviderDescriptor,
	client_id: &str,
	redirect_uri: &Url,
	state: &str,
) -> Url {
	let mut url = descriptor.endpoints.authorization.clone();
	let mut pairs = url.query_pairs_mut();

	pairs.append_pair("client_id", client_id);
	pairs.append_pair("redirect_uri", redirect_uri.as_str());
	pairs.append_pair("response_type", "code");

	if !descriptor.scopes.is_empty() {
		pairs.append_pair("scope", &descriptor.scopes.join(" "));
	}

	pairs.append_pair("state", state);

	drop(pairs);

	url
}

fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}

#[cfg(test)]
mod tests {
	// std
	use std::collections::HashMap;
	// self
	use super::*;

	#[test]
	fn authorize_url_carries_scopes_and_state() {
		let descriptor =
			ProviderDescriptor::whoop().expect("Production descriptor should build successfully.");
		let redirect =
			Url::parse("http://localhost:3000/callback").expect("Redirect fixture should parse.");
		let session = AuthorizationSession::generate(&descriptor, "client-id", &redirect);
		let pairs: HashMap<_, _> = session.authorize_url.query_pairs().into_owned().collect();

		assert_eq!(session.state.len(), STATE_LEN);
		assert_eq!(pairs.get("response_type"), Some(&"code".into()));
		assert_eq!(pairs.get("client_id"), Some(&"client-id".into()));
		assert_eq!(pairs.get("redirect_uri"), Some(&redirect.as_str().into()));
		assert_eq!(pairs.get("state"), Some(&session.state));
		assert_eq!(
			pairs.get("scope"),
			Some(
				&"read:body_measurement read:recovery read:sleep read:cycles read:workout offline"
					.into()
			)
		);
	}

	#[test]
	fn state_validation_rejects_mismatch_and_empty() {
		let session = AuthorizationSession {
			state: "expected".into(),
			redirect_uri: Url::parse("https://example.com/cb")
				.expect("Redirect URL fixture should parse successfully."),
			authorize_url: Url::parse("https://example.com/auth?state=expected")
				.expect("Authorization URL fixture should parse successfully."),
		};

		assert!(session.matches_state("expected"));
		assert!(!session.matches_state("other"));
		assert!(!session.matches_state(""));
	}

	#[test]
	fn callback_error_codes_are_stable() {
		assert_eq!(CallbackError::AccessDenied.as_str(), "access_denied");
		assert_eq!(CallbackError::InvalidState.as_str(), "invalid_state");
		assert_eq!(CallbackError::AuthFailed.as_str(), "auth_failed");
	}
}
