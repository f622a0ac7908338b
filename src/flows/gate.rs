//! Authentication gate in front of every upstream data call.

// self
use crate::{_prelude::*, auth::CredentialStatus, flows::Broker};

/// Serializable answer to "is the dashboard connected?".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthStatus {
	/// Whether a usable access token is available (refreshing if needed).
	pub authenticated: bool,
}

impl Broker {
	/// Reports whether a usable access token is available, refreshing when it is stale.
	///
	/// Never touches the network when no refresh token exists or when the cached access token
	/// outlives [`Credential::EXPIRY_BUFFER`](crate::auth::Credential::EXPIRY_BUFFER).
	pub async fn is_authenticated(&self) -> bool {
		match self.cache.get().status() {
			CredentialStatus::Unauthorized => false,
			CredentialStatus::Fresh => true,
			CredentialStatus::Stale => {
				tracing::debug!("Access token is stale; refreshing.");

				self.refresh().await
			},
		}
	}

	/// Status probe for the dashboard.
	pub async fn status(&self) -> AuthStatus {
		AuthStatus { authenticated: self.is_authenticated().await }
	}
}
