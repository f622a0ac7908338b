//! Upstream datasets exposed by the broker.

// self
use crate::_prelude::*;

/// WHOOP datasets the broker can proxy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
	/// Body measurements (single object, not paginated).
	Body,
	/// Recovery collection.
	Recovery,
	/// Sleep collection.
	Sleep,
	/// Physiological cycle collection.
	Cycles,
	/// Workout collection.
	Workouts,
}
impl Resource {
	/// Every resource, in the order aggregate failures are evaluated.
	pub const ALL: [Resource; 5] =
		[Resource::Body, Resource::Recovery, Resource::Sleep, Resource::Cycles, Resource::Workouts];

	/// Path relative to the API base.
	pub const fn path(self) -> &'static str {
		match self {
			Resource::Body => "/v2/user/measurement/body",
			Resource::Recovery => "/v2/recovery",
			Resource::Sleep => "/v2/activity/sleep",
			Resource::Cycles => "/v2/cycle",
			Resource::Workouts => "/v2/activity/workout",
		}
	}

	/// Returns `true` for cursor-paginated collections.
	pub const fn is_collection(self) -> bool {
		!matches!(self, Resource::Body)
	}

	/// Returns a stable label suitable for payload keys and span fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Resource::Body => "body",
			Resource::Recovery => "recovery",
			Resource::Sleep => "sleep",
			Resource::Cycles => "cycles",
			Resource::Workouts => "workouts",
		}
	}
}
impl Display for Resource {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
