// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use prompt_manager_client::{
	_preludet::*,
	auth::TokenPair,
	config::ClientConfig,
	http::{MultipartForm, ReqwestTransport},
};

fn harness(server: &MockServer, tokens: Option<TokenPair>) -> TestHarness<ReqwestTransport> {
	let config =
		ClientConfig::parse(&server.url("/api")).expect("Mock base URL should parse successfully.");
	let transport = ReqwestTransport::with_timeout(config.timeout)
		.expect("Reqwest transport should build successfully.");

	build_test_harness(config, transport, tokens)
}

#[tokio::test]
async fn request_carries_bearer_and_request_id() {
	let server = MockServer::start_async().await;
	let h = harness(&server, Some(token_pair("T1", "R1")));
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/prompts")
				.header("authorization", "Bearer T1")
				.header_exists("x-request-id");
			then.status(200).header("content-type", "application/json").body("[]");
		})
		.await;
	let response = h.client.get("/prompts").await.expect("Authorized request should succeed.");

	mock.assert_async().await;

	assert_eq!(response.status, 200);
	assert!(h.notifier.messages().is_empty());
}

#[tokio::test]
async fn unauthorized_request_refreshes_once_and_replays() {
	let server = MockServer::start_async().await;
	let h = harness(&server, Some(token_pair("T1", "R1")));
	let stale = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/prompts").header("authorization", "Bearer T1");
			then.status(401).body("{\"message\":\"Token expired\"}");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/auth/refresh-token")
				.header("content-type", "application/json")
				.json_body(json!({ "refreshToken": "R1" }));
			then.status(200).header("content-type", "application/json").body("{\"token\":\"T2\"}");
		})
		.await;
	let fresh = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/prompts").header("authorization", "Bearer T2");
			then.status(200).header("content-type", "application/json").body("[{\"texto\":\"a\"}]");
		})
		.await;
	let response = h.client.get("/prompts").await.expect("Replayed request should succeed.");

	stale.assert_calls_async(1).await;
	refresh.assert_calls_async(1).await;
	fresh.assert_calls_async(1).await;

	assert_eq!(response.status, 200);

	let stored = h.store.snapshot().expect("Tokens should remain stored after refresh.");

	assert_eq!(stored.access_token.expose(), "T2");
	assert_eq!(stored.refresh_token.expose(), "R1");
	assert!(h.notifier.messages().is_empty());
	assert_eq!(h.expiry.calls(), 0);
}

#[tokio::test]
async fn replayed_request_is_not_refreshed_twice() {
	let server = MockServer::start_async().await;
	let h = harness(&server, Some(token_pair("T1", "R1")));
	let prompts = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/prompts");
			then.status(401).body("{\"message\":\"Still unauthorized\"}");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/refresh-token");
			then.status(200).header("content-type", "application/json").body("{\"token\":\"T2\"}");
		})
		.await;
	let err = h.client.get("/prompts").await.expect_err("Second 401 should surface as an error.");

	prompts.assert_calls_async(2).await;
	refresh.assert_calls_async(1).await;

	assert!(err.is_auth_expired());
	assert_eq!(h.notifier.messages(), vec!["Still unauthorized".to_owned()]);
	assert_eq!(h.expiry.calls(), 0);
}

#[tokio::test]
async fn failed_refresh_clears_session_without_notification() {
	let server = MockServer::start_async().await;
	let h = harness(&server, Some(token_pair("T1", "R1")));
	let prompts = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/prompts");
			then.status(401);
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/refresh-token");
			then.status(403).body("{\"message\":\"Refresh token revoked\"}");
		})
		.await;
	let err = h.client.get("/prompts").await.expect_err("Failed refresh should fail the request.");

	prompts.assert_calls_async(1).await;
	refresh.assert_calls_async(1).await;

	assert!(matches!(err, Error::RefreshFailed(_)));
	assert!(h.store.snapshot().is_none());
	assert_eq!(h.expiry.calls(), 1);
	assert_eq!(h.expiry.last_path().as_deref(), Some("/login"));
	assert!(h.notifier.messages().is_empty());
}

#[tokio::test]
async fn error_notifications_prefer_server_message() {
	let server = MockServer::start_async().await;
	let h = harness(&server, Some(token_pair("T1", "R1")));

	server
		.mock_async(|when, then| {
			when.method(POST).path("/api/prompts");
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"message\":\"Invalid input\"}");
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(DELETE).path("/api/prompts/7");
			then.status(500).body("internal failure");
		})
		.await;

	let invalid = h
		.client
		.post_json("/prompts", &json!({ "texto": "" }))
		.await
		.expect_err("Validation failure should surface.");
	let internal = h.client.delete("/prompts/7").await.expect_err("Server failure should surface.");

	assert_eq!(invalid.status(), Some(400));
	assert_eq!(internal.status(), Some(500));
	assert_eq!(
		h.notifier.messages(),
		vec!["Invalid input".to_owned(), "Unexpected API error.".to_owned()],
	);
}

#[tokio::test]
async fn multipart_upload_uses_transport_boundary() {
	let server = MockServer::start_async().await;
	let h = harness(&server, Some(token_pair("T1", "R1")));
	let upload = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/prompts/import")
				.header("authorization", "Bearer T1")
				.header_exists("content-type");
			then.status(201).body("{}");
		})
		.await;
	let form = MultipartForm::new().text("source", "upload").file(
		"file",
		"prompts.txt",
		b"first\nsecond".to_vec(),
		Some("text/plain"),
	);
	let response =
		h.client.upload("/prompts/import", form).await.expect("Multipart upload should succeed.");

	upload.assert_async().await;

	assert_eq!(response.status, 201);
}
