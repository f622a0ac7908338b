//! In-memory credential cache with write-through persistence.

// self
use crate::{_prelude::*, auth::Credential, store::CredentialStore};

/// Authoritative in-memory copy of the credential triple.
///
/// Reads are cheap snapshots; writes replace the whole triple under one lock and are then
/// persisted through the configured [`CredentialStore`]. Writers are serialized so the store
/// always ends up holding the triple that is in memory.
pub struct TokenCache {
	current: RwLock<Credential>,
	store: Arc<dyn CredentialStore>,
	write_lock: Mutex<()>,
}
impl TokenCache {
	/// Seeds the cache from whatever the store currently holds.
	pub fn load(store: Arc<dyn CredentialStore>) -> Self {
		let current = store.load();

		tracing::debug!(
			authorized = current.is_authorized(),
			expires_at = current.expires_at,
			"Loaded persisted credential."
		);

		Self { current: RwLock::new(current), store, write_lock: Mutex::new(()) }
	}

	/// Returns a snapshot of the current credential.
	pub fn get(&self) -> Credential {
		self.current.read().clone()
	}

	/// Replaces the triple in memory, then persists it.
	///
	/// Persistence failures are logged and swallowed; the in-memory value stays authoritative
	/// for the rest of the process lifetime.
	pub fn set(&self, access: impl Into<String>, refresh: impl Into<String>, expires_at: i64) {
		let credential = Credential::new(access, refresh, expires_at);
		let _guard = self.write_lock.lock();

		*self.current.write() = credential.clone();

		if let Err(e) = self.store.persist(&credential) {
			tracing::warn!(error = %e, "Failed to persist refreshed credential.");
		}
	}
}
impl Debug for TokenCache {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenCache").field("current", &*self.current.read()).finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::store::{EnvFileStore, MemoryStore};

	fn cache_over(store: &Arc<MemoryStore>) -> TokenCache {
		TokenCache::load(store.clone())
	}

	#[test]
	fn load_seeds_from_store() {
		let store = Arc::new(MemoryStore::with_credential(Credential::new("a", "r", 10)));
		let cache = cache_over(&store);

		assert_eq!(cache.get(), Credential::new("a", "r", 10));
		assert_eq!(store.persist_count(), 0);
	}

	#[test]
	fn set_updates_memory_and_store_together() {
		let store = Arc::new(MemoryStore::default());
		let cache = cache_over(&store);

		cache.set("access-2", "refresh-2", 99);

		assert_eq!(cache.get(), Credential::new("access-2", "refresh-2", 99));
		assert_eq!(store.snapshot(), Credential::new("access-2", "refresh-2", 99));
		assert_eq!(store.persist_count(), 1);
	}

	#[test]
	fn concurrent_writers_leave_file_matching_memory() {
		let path = std::env::temp_dir().join(format!(
			"whoop_broker_cache_concurrent_{}_{}.env",
			std::process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos(),
		));
		let cache = TokenCache::load(Arc::new(EnvFileStore::new(&path)));

		std::thread::scope(|scope| {
			for idx in 0..8_i64 {
				let cache = &cache;

				scope.spawn(move || {
					for round in 0..5_i64 {
						let stamp = idx * 100 + round;

						cache.set(format!("access-{stamp}"), format!("refresh-{stamp}"), stamp);
					}
				});
			}
		});

		assert_eq!(EnvFileStore::new(&path).load(), cache.get());

		std::fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary credential file {}: {e}", path.display())
		});
	}

	#[test]
	fn persist_failure_keeps_memory_authoritative() {
		let store = Arc::new(MemoryStore::with_credential(Credential::new("old", "r", 1)));
		let cache = cache_over(&store);

		store.fail_writes(true);
		cache.set("new", "r2", 2);

		assert_eq!(cache.get(), Credential::new("new", "r2", 2));
		assert_eq!(store.snapshot(), Credential::new("old", "r", 1));
	}
}
