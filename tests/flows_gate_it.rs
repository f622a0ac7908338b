#![cfg(feature = "test")]

// crates.io
use httpmock::prelude::*;
// self
use whoop_broker::{_preludet::*, flows::AuthStatus};

const TOKEN_PATH: &str = "/oauth/oauth2/token";

#[tokio::test]
async fn never_authorized_is_rejected_without_network() {
	let server = MockServer::start_async().await;
	let (broker, _store) = build_test_broker(&server.base_url(), unauthorized_credential());
	let mock = server
		.mock_async(|when, then| {
			when.any_request();
			then.status(500);
		})
		.await;

	assert!(!broker.is_authenticated().await);
	assert_eq!(broker.status().await, AuthStatus { authenticated: false });

	mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn fresh_token_is_accepted_without_network() {
	let server = MockServer::start_async().await;
	let (broker, _store) = build_test_broker(
		&server.base_url(),
		credential_expiring_in("access", "refresh", Duration::minutes(30)),
	);
	let mock = server
		.mock_async(|when, then| {
			when.any_request();
			then.status(500);
		})
		.await;

	assert!(broker.is_authenticated().await);

	mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn token_inside_the_buffer_triggers_a_refresh() {
	let server = MockServer::start_async().await;
	let (broker, _store) = build_test_broker(
		&server.base_url(),
		credential_expiring_in("access", "refresh", Duration::seconds(30)),
	);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"access-2\",\"refresh_token\":\"refresh-2\",\"token_type\":\"bearer\",\"expires_in\":3600}",
			);
		})
		.await;

	assert!(broker.is_authenticated().await);
	assert!(broker.is_authenticated().await);

	mock.assert_calls_async(1).await;

	let status = serde_json::to_value(broker.status().await)
		.expect("Auth status should serialize to JSON.");

	assert_eq!(status, serde_json::json!({ "authenticated": true }));
}

#[tokio::test]
async fn failed_refresh_reports_unauthenticated() {
	let server = MockServer::start_async().await;
	let (broker, _store) = build_test_broker(
		&server.base_url(),
		credential_expiring_in("", "refresh", Duration::hours(1)),
	);

	server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(503);
		})
		.await;

	assert!(!broker.is_authenticated().await);
}
