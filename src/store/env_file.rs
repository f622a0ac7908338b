//! Dotenv-style [`CredentialStore`] that shares its file with unrelated configuration.
//!
//! The credential triple lives under three `KEY=value` lines; every other line in the file
//! passes through byte-for-byte. Writes go to a sibling `<name>.tmp` file which is synced and
//! then renamed over the canonical path, so readers only ever see the old or the new file.

// std
use std::{
	collections::HashMap,
	ffi::OsString,
	fs::{self, File},
	io::{ErrorKind, Write},
};
// self
use crate::{
	_prelude::*,
	auth::Credential,
	store::{CredentialStore, StoreError},
};

/// Key holding the access token.
pub const ACCESS_TOKEN_KEY: &str = "WHOOP_ACCESS_TOKEN";
/// Key holding the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "WHOOP_REFRESH_TOKEN";
/// Key holding the access token expiry in unix seconds.
pub const EXPIRES_AT_KEY: &str = "WHOOP_TOKEN_EXPIRES_AT";

/// Persists the credential triple into a `KEY=value` file after each exchange.
#[derive(Clone, Debug)]
pub struct EnvFileStore {
	path: PathBuf,
}
impl EnvFileStore {
	/// Creates a store for the provided path; nothing is read until [`CredentialStore::load`].
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	/// Canonical file location.
	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Reads and parses the file, returning an empty map when it does not exist.
	pub fn read_vars(&self) -> Result<HashMap<String, String>, StoreError> {
		match fs::read_to_string(&self.path) {
			Ok(content) => Ok(parse_env(&content)),
			Err(e) if e.kind() == ErrorKind::NotFound => Ok(HashMap::new()),
			Err(e) => Err(StoreError::Backend {
				message: format!("Failed to read {}: {e}", self.path.display()),
			}),
		}
	}

	fn tmp_path(&self) -> PathBuf {
		let mut name = self.path.file_name().map(ToOwned::to_owned).unwrap_or_else(OsString::new);

		name.push(".tmp");

		self.path.with_file_name(name)
	}

	fn write_replacement(&self, tmp_path: &Path, contents: &str) -> Result<(), StoreError> {
		let mut file = File::create(tmp_path).map_err(|e| StoreError::Backend {
			message: format!("Failed to create {}: {e}", tmp_path.display()),
		})?;

		file.write_all(contents.as_bytes()).map_err(|e| StoreError::Backend {
			message: format!("Failed to write {}: {e}", tmp_path.display()),
		})?;
		file.sync_all().map_err(|e| StoreError::Backend {
			message: format!("Failed to sync {}: {e}", tmp_path.display()),
		})
	}
}
impl CredentialStore for EnvFileStore {
	fn load(&self) -> Credential {
		let vars = match self.read_vars() {
			Ok(vars) => vars,
			Err(e) => {
				tracing::warn!(error = %e, "Credential file is unreadable; starting unauthorized.");

				return Credential::default();
			},
		};
		let text = |key: &str| vars.get(key).cloned().unwrap_or_default();
		let expires_at = vars.get(EXPIRES_AT_KEY).and_then(|raw| raw.parse().ok()).unwrap_or(0);

		Credential::new(text(ACCESS_TOKEN_KEY), text(REFRESH_TOKEN_KEY), expires_at)
	}

	fn persist(&self, credential: &Credential) -> Result<(), StoreError> {
		let current = match fs::read_to_string(&self.path) {
			Ok(content) => content,
			Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
			Err(e) =>
				return Err(StoreError::Backend {
					message: format!("Failed to read {}: {e}", self.path.display()),
				}),
		};
		let updated = update_env_tokens(
			&current,
			credential.access_token.expose(),
			credential.refresh_token.expose(),
			credential.expires_at,
		);
		let tmp_path = self.tmp_path();

		if let Err(e) = self.write_replacement(&tmp_path, &updated) {
			let _ = fs::remove_file(&tmp_path);

			return Err(e);
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| {
			let _ = fs::remove_file(&tmp_path);

			StoreError::Backend {
				message: format!("Failed to replace {}: {e}", self.path.display()),
			}
		})
	}
}

/// Rewrites the three credential keys inside `content`, preserving every other line.
///
/// Keys already present are replaced in place; absent keys are appended in
/// access/refresh/expiry order, ahead of a trailing newline if the content has one.
pub fn update_env_tokens(content: &str, access: &str, refresh: &str, expires_at: i64) -> String {
	let expires_at = expires_at.to_string();
	let entries = [
		(ACCESS_TOKEN_KEY, access),
		(REFRESH_TOKEN_KEY, refresh),
		(EXPIRES_AT_KEY, expires_at.as_str()),
	];
	let mut seen = [false; 3];
	let mut lines = content
		.split('\n')
		.map(|line| {
			for (idx, (key, value)) in entries.iter().enumerate() {
				if line.strip_prefix(key).is_some_and(|rest| rest.starts_with('=')) {
					let eol = if line.ends_with('\r') { "\r" } else { "" };

					seen[idx] = true;

					return format!("{key}={value}{eol}");
				}
			}

			line.to_owned()
		})
		.collect::<Vec<_>>();
	let trailing = if lines.last().is_some_and(String::is_empty) { lines.pop() } else { None };

	for ((key, value), seen) in entries.iter().zip(seen) {
		if !seen {
			lines.push(format!("{key}={value}"));
		}
	}

	lines.extend(trailing);

	lines.join("\n")
}

/// Parses dotenv `content` into a map; later duplicates win.
///
/// Lines `dotenvy` rejects are skipped with a warning.
pub fn parse_env(content: &str) -> HashMap<String, String> {
	dotenvy::from_read_iter(content.as_bytes())
		.filter_map(|entry| match entry {
			Ok(pair) => Some(pair),
			Err(e) => {
				tracing::warn!(error = %e, "Skipping unparseable dotenv line.");

				None
			},
		})
		.collect()
}
