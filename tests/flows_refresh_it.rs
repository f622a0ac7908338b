#![cfg(feature = "test")]

// std
use std::time::Duration as StdDuration;
// crates.io
use futures_util::future;
use httpmock::prelude::*;
// self
use whoop_broker::{_preludet::*, auth::Credential};

const TOKEN_PATH: &str = "/oauth/oauth2/token";

fn token_body(access: &str, refresh: Option<&str>, expires_in: i64) -> String {
	let mut body = serde_json::json!({
		"access_token": access,
		"token_type": "bearer",
		"expires_in": expires_in,
	});

	if let Some(refresh) = refresh {
		body["refresh_token"] = refresh.into();
	}

	body.to_string()
}

fn stale_credential() -> Credential {
	credential_expiring_in("access-old", "refresh-old", Duration::minutes(-5))
}

#[tokio::test]
async fn refresh_replaces_the_whole_triple() {
	let server = MockServer::start_async().await;
	let (broker, store) = build_test_broker(&server.base_url(), stale_credential());
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(TOKEN_PATH)
				.header("content-type", "application/x-www-form-urlencoded")
				.body_includes("grant_type=refresh_token")
				.body_includes("refresh_token=refresh-old")
				.body_includes("scope=offline");
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body("access-new", Some("refresh-new"), 1_800));
		})
		.await;
	let before = OffsetDateTime::now_utc().unix_timestamp();

	assert!(broker.refresh().await);

	mock.assert_async().await;

	let cached = broker.cache.get();

	assert_eq!(cached.access_token.expose(), "access-new");
	assert_eq!(cached.refresh_token.expose(), "refresh-new");
	assert!((before + 1_800..=before + 1_805).contains(&cached.expires_at));
	assert_eq!(store.snapshot(), cached);
	assert_eq!(store.persist_count(), 1);
	assert_eq!(broker.refresh_metrics.successes(), 1);
}

#[tokio::test]
async fn refresh_accepts_a_body_without_token_type() {
	let server = MockServer::start_async().await;
	let (broker, store) = build_test_broker(&server.base_url(), stale_credential());
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"access_token":"a2","refresh_token":"r2","expires_in":3600}"#);
		})
		.await;

	assert!(broker.refresh().await);

	mock.assert_async().await;

	let cached = broker.cache.get();

	assert_eq!(cached.access_token.expose(), "a2");
	assert_eq!(cached.refresh_token.expose(), "r2");
	assert_eq!(store.snapshot(), cached);
}

#[tokio::test]
async fn refresh_keeps_previous_refresh_token_when_none_is_returned() {
	let server = MockServer::start_async().await;
	let (broker, _store) = build_test_broker(&server.base_url(), stale_credential());

	server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body("access-new", None, 600));
		})
		.await;

	assert!(broker.refresh().await);

	let cached = broker.cache.get();

	assert_eq!(cached.access_token.expose(), "access-new");
	assert_eq!(cached.refresh_token.expose(), "refresh-old");
}

#[tokio::test]
async fn concurrent_refreshes_share_one_exchange() {
	let server = MockServer::start_async().await;
	let (broker, _store) = build_test_broker(&server.base_url(), stale_credential());
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body("access-shared", Some("refresh-shared"), 3_600))
				.delay(StdDuration::from_millis(300));
		})
		.await;
	let outcomes = future::join_all((0..8).map(|_| broker.refresh())).await;

	assert!(outcomes.iter().all(|ok| *ok));

	mock.assert_calls_async(1).await;

	assert_eq!(broker.refresh_metrics.attempts(), 1);
	assert_eq!(broker.refresh_metrics.coalesced(), 7);
	assert!(!broker.refresh_in_flight());
	assert_eq!(broker.cache.get().access_token.expose(), "access-shared");
}

#[tokio::test]
async fn refresh_after_an_outcome_starts_a_new_exchange() {
	let server = MockServer::start_async().await;
	let (broker, _store) = build_test_broker(&server.base_url(), stale_credential());
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body("access-next", Some("refresh-next"), 3_600));
		})
		.await;

	assert!(broker.refresh().await);
	assert!(broker.refresh().await);

	mock.assert_calls_async(2).await;
}

#[tokio::test]
async fn failed_refresh_leaves_cache_untouched() {
	let server = MockServer::start_async().await;
	let seed = stale_credential();
	let (broker, store) = build_test_broker(&server.base_url(), seed.clone());

	server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(400)
				.header("content-type", "application/json")
				.body(
					"{\"error\":\"invalid_grant\",\"error_description\":\"Refresh token revoked\"}",
				);
		})
		.await;

	assert!(!broker.refresh().await);
	assert_eq!(broker.cache.get(), seed);
	assert_eq!(store.persist_count(), 0);
	assert_eq!(broker.refresh_metrics.failures(), 1);
	assert!(!broker.refresh_in_flight());
}

#[tokio::test]
async fn unreachable_token_endpoint_reports_false() {
	let seed = stale_credential();
	let (broker, _store) = build_test_broker("http://127.0.0.1:1", seed.clone());

	assert!(!broker.refresh().await);
	assert_eq!(broker.cache.get(), seed);
}

#[tokio::test]
async fn persistence_failure_does_not_fail_the_refresh() {
	let server = MockServer::start_async().await;
	let seed = stale_credential();
	let (broker, store) = build_test_broker(&server.base_url(), seed.clone());

	server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body("access-mem", Some("refresh-mem"), 3_600));
		})
		.await;
	store.fail_writes(true);

	assert!(broker.refresh().await);
	assert_eq!(broker.cache.get().access_token.expose(), "access-mem");
	assert_eq!(store.snapshot(), seed);
}

#[tokio::test]
async fn refresh_without_refresh_token_skips_the_network() {
	let server = MockServer::start_async().await;
	let (broker, _store) = build_test_broker(&server.base_url(), unauthorized_credential());
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200);
		})
		.await;

	assert!(!broker.refresh().await);

	mock.assert_calls_async(0).await;
}
