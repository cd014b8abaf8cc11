// self
use prompt_manager_client::{_preludet::*, http::ApiRequest};

const REFRESHED: &str = "{\"token\":\"T2\"}";

#[tokio::test]
async fn concurrent_unauthorized_requests_share_one_refresh() {
	let h = scripted_harness(
		[
			ScriptedReply::Status(401, String::new()),
			ScriptedReply::Status(401, String::new()),
			ScriptedReply::Status(200, REFRESHED.into()),
			ScriptedReply::Status(200, "[]".into()),
			ScriptedReply::Status(200, "[]".into()),
		],
		Some(token_pair("T1", "R1")),
	);
	let (first, second) = tokio::join!(
		h.client.send(ApiRequest::get("/prompts")),
		h.client.send(ApiRequest::get("/prompts/1")),
	);

	first.expect("First request should succeed after the shared refresh.");
	second.expect("Second request should succeed after the shared refresh.");

	assert_eq!(h.transport.requests_to("/auth/refresh-token").len(), 1);
	assert_eq!(h.client.refresh_metrics.attempts(), 1);
	assert_eq!(h.client.refresh_metrics.coalesced(), 1);

	let replays = h
		.transport
		.requests()
		.into_iter()
		.filter(|req| req.header("authorization") == Some("Bearer T2"))
		.count();

	assert_eq!(replays, 2);
	assert!(h.notifier.messages().is_empty());
}

#[tokio::test]
async fn replay_carries_retry_marker() {
	let h = scripted_harness(
		[
			ScriptedReply::Status(401, String::new()),
			ScriptedReply::Status(200, REFRESHED.into()),
			ScriptedReply::Status(200, "[]".into()),
		],
		Some(token_pair("T1", "R1")),
	);

	h.client.send(ApiRequest::get("/prompts")).await.expect("Replay should succeed.");

	let prompts = h.transport.requests_to("/prompts");

	assert_eq!(prompts.len(), 2);
	assert!(!prompts[0].retry);
	assert_eq!(prompts[0].header("authorization"), Some("Bearer T1"));
	assert!(prompts[1].retry);
	assert_eq!(prompts[1].header("authorization"), Some("Bearer T2"));
	assert!(!h.transport.requests_to("/auth/refresh-token")[0].retry);
}

#[tokio::test]
async fn concurrent_logged_out_requests_expire_session_once() {
	let h = scripted_harness(
		[ScriptedReply::Status(401, String::new()), ScriptedReply::Status(401, String::new())],
		None,
	);
	let (first, second) = tokio::join!(
		h.client.send(ApiRequest::get("/prompts")),
		h.client.send(ApiRequest::get("/prompts/1")),
	);

	assert!(matches!(first, Err(Error::RefreshFailed(_))));
	assert!(matches!(second, Err(Error::RefreshFailed(_))));
	assert_eq!(h.expiry.calls(), 1);
	assert_eq!(h.client.refresh_metrics.attempts(), 1);
	assert!(h.transport.requests_to("/auth/refresh-token").is_empty());
	assert!(h.notifier.messages().is_empty());
}

#[tokio::test]
async fn concurrent_requests_expire_session_once() {
	let h = scripted_harness(
		[
			ScriptedReply::Status(401, String::new()),
			ScriptedReply::Status(401, String::new()),
			ScriptedReply::Status(401, "{\"message\":\"Refresh token expired\"}".into()),
		],
		Some(token_pair("T1", "R1")),
	);
	let (first, second) = tokio::join!(
		h.client.send(ApiRequest::get("/prompts")),
		h.client.send(ApiRequest::get("/prompts/1")),
	);

	assert!(matches!(first, Err(Error::RefreshFailed(_))));
	assert!(matches!(second, Err(Error::RefreshFailed(_))));
	assert_eq!(h.transport.requests_to("/auth/refresh-token").len(), 1);
	assert_eq!(h.expiry.calls(), 1);
	assert!(h.store.snapshot().is_none());
	assert!(h.notifier.messages().is_empty());
}

#[tokio::test]
async fn network_failure_is_reported_with_fallback() {
	let h = scripted_harness([ScriptedReply::NetworkFailure], Some(token_pair("T1", "R1")));
	let err =
		h.client.send(ApiRequest::get("/prompts")).await.expect_err("Network failure should fail.");

	assert!(matches!(err, Error::Transport(_)));
	assert_eq!(h.notifier.messages(), vec!["Unexpected API error.".to_owned()]);
	assert!(h.transport.requests_to("/auth/refresh-token").is_empty());
}

#[tokio::test]
async fn unauthenticated_session_still_attempts_refresh() {
	let h = scripted_harness([ScriptedReply::Status(401, String::new())], None);
	let err = h
		.client
		.send(ApiRequest::get("/prompts"))
		.await
		.expect_err("A request without tokens cannot recover from 401.");

	assert!(matches!(err, Error::RefreshFailed(_)));
	assert!(h.transport.requests_to("/auth/refresh-token").is_empty());
	assert_eq!(h.expiry.calls(), 1);
}
