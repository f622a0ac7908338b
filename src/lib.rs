//! Single-account WHOOP credential broker: single-flight token refresh, atomic dotenv
//! persistence, and paginated data aggregation behind one async API.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod flows;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod provider;
pub mod store;
#[cfg(any(test, feature = "test"))]
#[doc(hidden)]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::Credential,
		cache::TokenCache,
		flows::Broker,
		provider::ProviderDescriptor,
		store::{CredentialStore, MemoryStore},
	};

	/// Client identifier used by test brokers.
	pub const TEST_CLIENT_ID: &str = "client-test";
	/// Client secret used by test brokers.
	pub const TEST_CLIENT_SECRET: &str = "secret-test";
	/// Redirect URI used by test brokers.
	pub const TEST_REDIRECT_URI: &str = "http://localhost:3000/callback";

	/// Builds a descriptor whose endpoints all live under `base` (usually an `httpmock` server).
	pub fn test_descriptor(base: &str) -> ProviderDescriptor {
		let base = base.trim_end_matches('/');

		ProviderDescriptor::builder()
			.authorization_endpoint(
				Url::parse(&format!("{base}/oauth/oauth2/auth"))
					.expect("Mock authorization endpoint should parse successfully."),
			)
			.token_endpoint(
				Url::parse(&format!("{base}/oauth/oauth2/token"))
					.expect("Mock token endpoint should parse successfully."),
			)
			.api_base(
				Url::parse(&format!("{base}/developer"))
					.expect("Mock API base should parse successfully."),
			)
			.build()
			.expect("Mock provider descriptor should build successfully.")
	}

	/// Credential that has never been authorized.
	pub fn unauthorized_credential() -> Credential {
		Credential::default()
	}

	/// Credential whose access token stays valid for `ttl`.
	pub fn credential_expiring_in(access: &str, refresh: &str, ttl: Duration) -> Credential {
		let expires_at = (OffsetDateTime::now_utc() + ttl).unix_timestamp();

		Credential::new(access, refresh, expires_at)
	}

	/// Constructs a [`Broker`] backed by an in-memory store seeded with `seed`.
	pub fn build_test_broker(base: &str, seed: Credential) -> (Broker, Arc<MemoryStore>) {
		let store_backend = Arc::new(MemoryStore::with_credential(seed));
		let store: Arc<dyn CredentialStore> = store_backend.clone();
		let cache = Arc::new(TokenCache::load(store));
		let redirect_uri =
			Url::parse(TEST_REDIRECT_URI).expect("Test redirect URI should parse successfully.");
		let broker = Broker::new(
			test_descriptor(base),
			cache,
			TEST_CLIENT_ID,
			TEST_CLIENT_SECRET,
			redirect_uri,
		);

		(broker, store_backend)
	}
}

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		path::{Path, PathBuf},
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::Value;
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
