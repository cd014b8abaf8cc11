// crates.io
use httpmock::prelude::*;
// self
use prompt_manager_client::{
	_preludet::*,
	client::RequestSender,
	config::ClientConfig,
	http::ReqwestTransport,
	list::{ListController, MemorySessionStore, Prompt, SessionStore},
	push::{PushFuture, PushMessage, PushSource},
};

struct OneShotPush(Option<PushMessage>);
impl PushSource for OneShotPush {
	fn next_message(&mut self) -> PushFuture<'_> {
		Box::pin(async move { Ok(self.0.take()) })
	}
}

fn prompts_body(count: usize) -> String {
	let items = (1..=count)
		.map(|i| serde_json::json!({ "id": i, "texto": format!("Prompt {i}") }))
		.collect::<Vec<_>>();

	serde_json::to_string(&items).expect("Prompt fixture should serialize.")
}

#[tokio::test]
async fn list_loads_through_authenticated_client_and_reloads_on_push() {
	let server = MockServer::start_async().await;
	let config =
		ClientConfig::parse(&server.url("/api")).expect("Mock base URL should parse successfully.");
	let transport = ReqwestTransport::with_timeout(config.timeout)
		.expect("Reqwest transport should build successfully.");
	let h = build_test_harness(config, transport, Some(token_pair("T1", "R1")));
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/prompts").header("authorization", "Bearer T1");
			then.status(200).header("content-type", "application/json").body(prompts_body(14));
		})
		.await;
	let sender: Arc<dyn RequestSender> = Arc::new(h.client.clone());
	let session = Arc::new(MemorySessionStore::default());
	let mut list: ListController<Prompt> = ListController::new(sender, session.clone());
	let first = list.load().await;

	assert_eq!(first.items.len(), 10);
	assert_eq!(first.total_pages, 2);
	assert!(session.get_item("prompt_cache").is_some());

	let second = list.go_to_page(2).await;

	assert_eq!(second.items.len(), 4);
	assert_eq!(second.items[3].text, "Prompt 14");

	mock.assert_calls_async(1).await;

	list.listen(&mut OneShotPush(Some(PushMessage::new(b"changed".to_vec()))))
		.await
		.expect("One-shot push source should not fail.");

	mock.assert_calls_async(2).await;

	assert_eq!(list.filter("prompt 1").total_items, 6);
	assert_eq!(list.last_error(), None);
}

#[tokio::test]
async fn list_failure_shows_load_message_and_notifies() {
	let h = scripted_harness(
		[ScriptedReply::Status(500, "{\"message\":\"Database offline\"}".into())],
		Some(token_pair("T1", "R1")),
	);
	let sender: Arc<dyn RequestSender> = Arc::new(h.client.clone());
	let session = Arc::new(MemorySessionStore::default());
	let mut list: ListController = ListController::new(sender, session);
	let view = list.load().await;

	assert!(view.is_empty());
	assert_eq!(list.last_error(), Some("Failed to load prompts. Please try again later."));
	assert_eq!(h.notifier.messages(), vec!["Database offline".to_owned()]);
}
