//! The single-account credential triple and its freshness helpers.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Lifecycle status of the cached credential at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CredentialStatus {
	/// No refresh token was ever issued; authorization is required.
	Unauthorized,
	/// The access token stays valid beyond the safety buffer.
	Fresh,
	/// The access token is missing, expired, or inside the safety buffer.
	Stale,
}

/// Access token, refresh token, and absolute expiry for the one authorized account.
///
/// The three fields are only ever replaced together, so readers never observe an access
/// token paired with another token's expiry.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
	/// Bearer token for upstream API calls; empty when none was issued yet.
	pub access_token: TokenSecret,
	/// Refresh token; empty when the account was never authorized.
	pub refresh_token: TokenSecret,
	/// Expiry of `access_token` in unix seconds; `0` means unknown/expired.
	pub expires_at: i64,
}
impl Credential {
	/// Safety margin applied before handing out an access token.
	pub const EXPIRY_BUFFER: Duration = Duration::seconds(60);

	/// Builds a credential from raw parts.
	pub fn new(
		access_token: impl Into<String>,
		refresh_token: impl Into<String>,
		expires_at: i64,
	) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			refresh_token: TokenSecret::new(refresh_token),
			expires_at,
		}
	}

	/// Returns `true` once a refresh token has been issued.
	pub fn is_authorized(&self) -> bool {
		!self.refresh_token.is_empty()
	}

	/// Computes the status at `instant` using [`Self::EXPIRY_BUFFER`].
	pub fn status_at(&self, instant: OffsetDateTime) -> CredentialStatus {
		if !self.is_authorized() {
			return CredentialStatus::Unauthorized;
		}

		let threshold = (instant + Self::EXPIRY_BUFFER).unix_timestamp();

		if !self.access_token.is_empty() && self.expires_at > threshold {
			CredentialStatus::Fresh
		} else {
			CredentialStatus::Stale
		}
	}

	/// Convenience helper that checks the status using the current UTC instant.
	pub fn status(&self) -> CredentialStatus {
		self.status_at(OffsetDateTime::now_utc())
	}

	/// Returns the expiry as a timestamp, if it is known.
	pub fn expires_at_datetime(&self) -> Option<OffsetDateTime> {
		if self.expires_at <= 0 {
			return None;
		}

		OffsetDateTime::from_unix_timestamp(self.expires_at).ok()
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credential")
			.field("access_token", &self.access_token)
			.field("refresh_token", &self.refresh_token)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn status_transitions_cover_all_states() {
		let now = macros::datetime!(2025-01-01 00:00 UTC);
		let base = now.unix_timestamp();

		assert_eq!(Credential::default().status_at(now), CredentialStatus::Unauthorized);
		assert_eq!(
			Credential::new("access", "", base + 3_600).status_at(now),
			CredentialStatus::Unauthorized
		);
		assert_eq!(
			Credential::new("access", "refresh", base + 61).status_at(now),
			CredentialStatus::Fresh
		);
		assert_eq!(
			Credential::new("access", "refresh", base + 60).status_at(now),
			CredentialStatus::Stale
		);
		assert_eq!(
			Credential::new("", "refresh", base + 3_600).status_at(now),
			CredentialStatus::Stale
		);
		assert_eq!(Credential::new("access", "refresh", 0).status_at(now), CredentialStatus::Stale);
	}

	#[test]
	fn debug_output_redacts_secrets() {
		let rendered = format!("{:?}", Credential::new("access-secret", "refresh-secret", 42));

		assert!(!rendered.contains("access-secret"));
		assert!(!rendered.contains("refresh-secret"));
		assert!(rendered.contains("expires_at: 42"));
	}

	#[test]
	fn unknown_expiry_has_no_timestamp() {
		assert!(Credential::default().expires_at_datetime().is_none());
		assert_eq!(
			Credential::new("a", "r", 1_735_689_600).expires_at_datetime(),
			Some(macros::datetime!(2025-01-01 00:00 UTC))
		);
	}
}
