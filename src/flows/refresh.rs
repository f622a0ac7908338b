//! Refresh token orchestration with a single-flight slot and metrics.
//!
//! [`Broker::refresh`] guarantees at most one `grant_type=refresh_token` exchange in flight.
//! Callers arriving while an exchange is pending attach to it and observe the same outcome.
//! The exchange clears the slot itself before publishing its result, so a refresh requested
//! after an outcome is known always starts a new exchange.

mod metrics;

pub use metrics::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	flows::Broker,
	oauth::{OAuth2Facade, TokenGrant},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

impl Broker {
	/// Exchanges the cached refresh token for a new credential triple.
	///
	/// Returns `true` once the cache holds the new triple. Any failure is logged and yields
	/// `false`, leaving the cached credential untouched.
	pub async fn refresh(&self) -> bool {
		let span = FlowSpan::new(FlowKind::Refresh, "refresh");
		let (pending, leader) = self.refresh_slot.join_or_lead();

		if !leader {
			self.refresh_metrics.record_coalesced();
		}

		span.instrument(async {
			*pending
				.get_or_init(|| async {
					let ok = self.exchange_refresh_token().await;

					self.refresh_slot.clear(&pending);

					ok
				})
				.await
		})
		.await
	}

	/// Returns `true` while a refresh exchange is pending.
	pub fn refresh_in_flight(&self) -> bool {
		!self.refresh_slot.is_idle()
	}

	async fn exchange_refresh_token(&self) -> bool {
		const KIND: FlowKind = FlowKind::Refresh;

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		self.refresh_metrics.record_attempt();

		let current = self.cache.get();

		if !current.is_authorized() {
			tracing::info!("No refresh token is cached; skipping refresh.");
			obs::record_flow_outcome(KIND, FlowOutcome::Failure);
			self.refresh_metrics.record_failure();

			return false;
		}

		match self.request_refresh(current.refresh_token.expose()).await {
			Ok(grant) => {
				let expires_at = grant.expires_at(OffsetDateTime::now_utc());
				let refresh_token = grant
					.refresh_token
					.unwrap_or_else(|| current.refresh_token.expose().to_owned());

				self.cache.set(grant.access_token, refresh_token, expires_at);

				tracing::info!(expires_at, "Access token refreshed.");
				obs::record_flow_outcome(KIND, FlowOutcome::Success);
				self.refresh_metrics.record_success();

				true
			},
			Err(e) => {
				tracing::error!(error = %e, "Token refresh failed.");
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
				self.refresh_metrics.record_failure();

				false
			},
		}
	}

	async fn request_refresh(&self, refresh_token: &str) -> Result<TokenGrant> {
		let facade = self.facade()?;

		facade.refresh_token(refresh_token).await
	}
}
