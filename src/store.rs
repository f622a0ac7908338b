//! Storage contracts and built-in credential store implementations.

pub mod env_file;
pub mod memory;

pub use env_file::*;
pub use memory::MemoryStore;

// self
use crate::{_prelude::*, auth::Credential};

/// Durable persistence for the credential triple.
///
/// Implementations are synchronous: the triple is tiny and persisted only after a token
/// exchange, so the write cost is negligible next to the network round-trip that produced it.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Reads the persisted credential; missing or unreadable state yields defaults.
	fn load(&self) -> Credential;

	/// Durably replaces the persisted credential triple.
	///
	/// A failed write must never leave a partially-updated representation observable to a
	/// subsequent [`load`](Self::load).
	fn persist(&self, credential: &Credential) -> Result<(), StoreError>;
}

/// Error type produced by [`CredentialStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
