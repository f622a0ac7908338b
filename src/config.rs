//! Startup configuration for [`Broker::from_config`](crate::flows::Broker::from_config).
//!
//! Values come from the process environment first and fall back to the credentials file, which
//! doubles as a dotenv file holding the client registration.

// std
use std::{collections::HashMap, env, num::NonZeroUsize};
// self
use crate::{_prelude::*, api::PaginationPolicy, error::ConfigError, store::EnvFileStore};

/// OAuth client identifier variable (required).
pub const CLIENT_ID_VAR: &str = "WHOOP_CLIENT_ID";
/// OAuth client secret variable (required).
pub const CLIENT_SECRET_VAR: &str = "WHOOP_CLIENT_SECRET";
/// Redirect URI variable.
pub const REDIRECT_URI_VAR: &str = "WHOOP_REDIRECT_URI";
/// Credentials file location variable.
pub const CREDENTIALS_PATH_VAR: &str = "WHOOP_CREDENTIALS_PATH";
/// Optional pagination ceiling variable.
pub const MAX_PAGES_VAR: &str = "WHOOP_MAX_PAGES";

/// Redirect URI used when none is configured.
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:3000/callback";
/// Credentials file used when none is configured.
pub const DEFAULT_CREDENTIALS_PATH: &str = ".env";

/// Validated startup values.
#[derive(Clone)]
pub struct BrokerConfig {
	/// OAuth client identifier.
	pub client_id: String,
	/// OAuth client secret.
	pub client_secret: String,
	/// Redirect URI registered with the provider.
	pub redirect_uri: Url,
	/// Dotenv file that holds the persisted credential triple.
	pub credentials_path: PathBuf,
	/// Pagination ceiling for collection sweeps.
	pub pagination: PaginationPolicy,
}
impl BrokerConfig {
	/// Reads the configuration from the process environment and the credentials file.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| env::var(name).ok())
	}

	/// Reads the configuration through `lookup`, falling back to the credentials file.
	///
	/// Empty values count as unset.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let credentials_path = lookup(CREDENTIALS_PATH_VAR)
			.filter(|value| !value.is_empty())
			.map_or_else(|| PathBuf::from(DEFAULT_CREDENTIALS_PATH), PathBuf::from);
		let file_vars = EnvFileStore::new(&credentials_path).read_vars().unwrap_or_else(|e| {
			tracing::warn!(error = %e, "Ignoring unreadable credentials file.");

			HashMap::new()
		});
		let get = |name: &str| {
			lookup(name)
				.filter(|value| !value.is_empty())
				.or_else(|| file_vars.get(name).filter(|value| !value.is_empty()).cloned())
		};
		let client_id =
			get(CLIENT_ID_VAR).ok_or(ConfigError::MissingVariable { name: CLIENT_ID_VAR })?;
		let client_secret = get(CLIENT_SECRET_VAR)
			.ok_or(ConfigError::MissingVariable { name: CLIENT_SECRET_VAR })?;
		let redirect_uri = Url::parse(
			get(REDIRECT_URI_VAR).as_deref().unwrap_or(DEFAULT_REDIRECT_URI),
		)
		.map_err(|source| ConfigError::InvalidRedirect { source })?;
		let max_pages = get(MAX_PAGES_VAR)
			.map(|raw| {
				raw.trim().parse::<NonZeroUsize>().map_err(|e| ConfigError::InvalidVariable {
					name: MAX_PAGES_VAR,
					reason: e.to_string(),
				})
			})
			.transpose()?;

		Ok(Self {
			client_id,
			client_secret,
			redirect_uri,
			credentials_path,
			pagination: PaginationPolicy { max_pages },
		})
	}
}
impl Debug for BrokerConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("BrokerConfig")
			.field("client_id", &self.client_id)
			.field("client_secret", &"<redacted>")
			.field("redirect_uri", &self.redirect_uri.as_str())
			.field("credentials_path", &self.credentials_path)
			.field("pagination", &self.pagination)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{fs, process};
	// self
	use super::*;

	fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
		let vars = pairs
			.iter()
			.map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
			.collect::<HashMap<_, _>>();

		move |name: &str| vars.get(name).cloned()
	}

	fn missing_file() -> String {
		env::temp_dir()
			.join(format!("whoop_broker_config_missing_{}.env", process::id()))
			.display()
			.to_string()
	}

	#[test]
	fn defaults_apply_when_optional_values_are_absent() {
		let path = missing_file();
		let config = BrokerConfig::from_lookup(lookup_from(&[
			(CLIENT_ID_VAR, "id"),
			(CLIENT_SECRET_VAR, "secret"),
			(CREDENTIALS_PATH_VAR, &path),
		]))
		.expect("Required values are present.");

		assert_eq!(config.redirect_uri.as_str(), DEFAULT_REDIRECT_URI);
		assert_eq!(config.pagination, PaginationPolicy::default());
		assert!(!format!("{config:?}").contains("secret\""));
	}

	#[test]
	fn missing_secret_is_reported_by_name() {
		let path = missing_file();
		let err = BrokerConfig::from_lookup(lookup_from(&[
			(CLIENT_ID_VAR, "id"),
			(CLIENT_SECRET_VAR, ""),
			(CREDENTIALS_PATH_VAR, &path),
		]))
		.expect_err("An empty secret must be rejected.");

		assert!(matches!(err, ConfigError::MissingVariable { name: CLIENT_SECRET_VAR }));
	}

	#[test]
	fn credentials_file_backs_missing_environment_values() {
		let path = env::temp_dir().join(format!(
			"whoop_broker_config_fallback_{}_{}.env",
			process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos()
		));

		fs::write(
			&path,
			"WHOOP_CLIENT_ID=file-id\nWHOOP_CLIENT_SECRET=\"file-secret\"\nWHOOP_MAX_PAGES=4\n",
		)
		.expect("Failed to seed config fixture.");

		let path_text = path.display().to_string();
		let config = BrokerConfig::from_lookup(lookup_from(&[
			(CLIENT_ID_VAR, "env-id"),
			(CREDENTIALS_PATH_VAR, &path_text),
		]))
		.expect("File values should fill the gaps.");

		assert_eq!(config.client_id, "env-id");
		assert_eq!(config.client_secret, "file-secret");
		assert_eq!(config.pagination.max_pages.map(NonZeroUsize::get), Some(4));

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary config file {}: {e}", path.display())
		});
	}

	#[test]
	fn zero_page_ceiling_is_invalid() {
		let path = missing_file();
		let err = BrokerConfig::from_lookup(lookup_from(&[
			(CLIENT_ID_VAR, "id"),
			(CLIENT_SECRET_VAR, "secret"),
			(CREDENTIALS_PATH_VAR, &path),
			(MAX_PAGES_VAR, "0"),
		]))
		.expect_err("A zero ceiling must be rejected.");

		assert!(matches!(err, ConfigError::InvalidVariable { name: MAX_PAGES_VAR, .. }));
	}
}
