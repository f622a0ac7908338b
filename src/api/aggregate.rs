//! Five-resource aggregate pull.

// crates.io
use futures_util::future;
// self
use crate::{
	_prelude::*,
	api::{DateRange, PageOutcome, SweepOutcome},
	flows::Broker,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::Resource,
};

/// Echo of the requested date range.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
	/// Requested lower bound, or `null`.
	pub start: Option<String>,
	/// Requested upper bound, or `null`.
	pub end: Option<String>,
}
impl From<&DateRange> for Period {
	fn from(range: &DateRange) -> Self {
		Self {
			start: range.start().map(ToOwned::to_owned),
			end: range.end().map(ToOwned::to_owned),
		}
	}
}

/// Every dataset for one date range, as handed to the dashboard.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AggregatePayload {
	/// UTC calendar date of the pull (`YYYY-MM-DD`).
	pub pull_date: String,
	/// Requested date range.
	pub period: Period,
	/// Body measurement object.
	pub body: Value,
	/// Recovery records.
	pub recovery: Vec<Value>,
	/// Sleep records.
	pub sleep: Vec<Value>,
	/// Cycle records.
	pub cycles: Vec<Value>,
	/// Workout records.
	pub workouts: Vec<Value>,
}

impl Broker {
	/// Fetches body, recovery, sleep, cycles and workouts concurrently.
	///
	/// Authentication is checked once up front. After every fetch has finished, the first
	/// failure in [`Resource::ALL`] order is returned and all other results are discarded.
	pub async fn fetch_all_resources(&self, range: &DateRange) -> Result<AggregatePayload> {
		const KIND: FlowKind = FlowKind::Aggregate;

		let span = FlowSpan::new(KIND, "fetch_all_resources");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.aggregate(range)).await;

		if let Err(e) = &result {
			tracing::error!(error = %e, "Aggregate pull failed.");
		}

		obs::record_flow_outcome(KIND, FlowOutcome::from_success(result.is_ok()));

		result
	}

	async fn aggregate(&self, range: &DateRange) -> Result<AggregatePayload> {
		if !self.is_authenticated().await {
			return Err(Error::Unauthenticated);
		}

		let (body, recovery, sleep, cycles, workouts) = future::join5(
			self.fetch_single_page(Resource::Body.path()),
			self.fetch_all(Resource::Recovery.path(), range),
			self.fetch_all(Resource::Sleep.path(), range),
			self.fetch_all(Resource::Cycles.path(), range),
			self.fetch_all(Resource::Workouts.path(), range),
		)
		.await;
		let body = body.and_then(PageOutcome::into_result)?;
		let recovery = recovery.and_then(SweepOutcome::into_result)?;
		let sleep = sleep.and_then(SweepOutcome::into_result)?;
		let cycles = cycles.and_then(SweepOutcome::into_result)?;
		let workouts = workouts.and_then(SweepOutcome::into_result)?;

		Ok(AggregatePayload {
			pull_date: OffsetDateTime::now_utc().date().to_string(),
			period: range.into(),
			body,
			recovery,
			sleep,
			cycles,
			workouts,
		})
	}
}
