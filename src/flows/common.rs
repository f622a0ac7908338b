//! Single-flight slot shared by concurrent refresh callers.

// crates.io
use async_lock::OnceCell;
// self
use crate::_prelude::*;

/// Handle to the outcome of one in-flight token exchange.
pub(crate) type PendingRefresh = Arc<OnceCell<bool>>;

/// Holds either nothing or the pending outcome of the exchange currently in flight.
///
/// The slot only guards *starting* an exchange; plain credential reads never touch it.
#[derive(Debug, Default)]
pub struct RefreshSlot(Mutex<Option<PendingRefresh>>);
impl RefreshSlot {
	/// Returns `true` when no exchange is in flight.
	pub fn is_idle(&self) -> bool {
		self.0.lock().is_none()
	}

	/// Attaches to the pending exchange or installs a new one.
	///
	/// The flag is `true` when the caller installed the cell and is expected to drive it.
	pub(crate) fn join_or_lead(&self) -> (PendingRefresh, bool) {
		let mut slot = self.0.lock();

		match slot.as_ref() {
			Some(pending) => (pending.clone(), false),
			None => {
				let pending = Arc::new(OnceCell::new());

				*slot = Some(pending.clone());

				(pending, true)
			},
		}
	}

	/// Empties the slot if it still holds `pending`.
	pub(crate) fn clear(&self, pending: &PendingRefresh) {
		let mut slot = self.0.lock();

		if slot.as_ref().is_some_and(|current| Arc::ptr_eq(current, pending)) {
			*slot = None;
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn second_caller_joins_the_first() {
		let slot = RefreshSlot::default();
		let (first, lead_first) = slot.join_or_lead();
		let (second, lead_second) = slot.join_or_lead();

		assert!(lead_first);
		assert!(!lead_second);
		assert!(Arc::ptr_eq(&first, &second));
		assert!(!slot.is_idle());
	}

	#[test]
	fn clear_ignores_stale_handles() {
		let slot = RefreshSlot::default();
		let (stale, _) = slot.join_or_lead();

		slot.clear(&stale);

		let (fresh, leader) = slot.join_or_lead();

		assert!(leader);

		slot.clear(&stale);

		assert!(!slot.is_idle());

		slot.clear(&fresh);

		assert!(slot.is_idle());
	}
}
