//! Thread-safe in-memory [`CredentialStore`] implementation for tests and demos.

// self
use crate::{
	_prelude::*,
	auth::Credential,
	store::{CredentialStore, StoreError},
};

/// Storage backend that keeps the credential in-process and counts writes.
#[derive(Debug, Default)]
pub struct MemoryStore {
	credential: RwLock<Credential>,
	persisted: Mutex<usize>,
	fail_writes: Mutex<bool>,
}
impl MemoryStore {
	/// Creates a store pre-seeded with `credential`.
	pub fn with_credential(credential: Credential) -> Self {
		Self { credential: RwLock::new(credential), ..Default::default() }
	}

	/// Returns the last successfully persisted credential.
	pub fn snapshot(&self) -> Credential {
		self.credential.read().clone()
	}

	/// Number of successful [`CredentialStore::persist`] calls.
	pub fn persist_count(&self) -> usize {
		*self.persisted.lock()
	}

	/// Makes subsequent writes fail, simulating a read-only disk.
	pub fn fail_writes(&self, fail: bool) {
		*self.fail_writes.lock() = fail;
	}
}
impl CredentialStore for MemoryStore {
	fn load(&self) -> Credential {
		self.snapshot()
	}

	fn persist(&self, credential: &Credential) -> Result<(), StoreError> {
		if *self.fail_writes.lock() {
			return Err(StoreError::Backend { message: "Memory store is read-only.".into() });
		}

		*self.credential.write() = credential.clone();
		*self.persisted.lock() += 1;

		Ok(())
	}
}
