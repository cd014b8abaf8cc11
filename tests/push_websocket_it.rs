// crates.io
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;
// self
use prompt_manager_client::{
	_preludet::*,
	client::RequestSender,
	list::{ListController, MemorySessionStore, SessionStore},
	push::{PushConfig, WebSocketPushSource},
};

#[tokio::test]
async fn listener_reloads_once_per_pushed_frame() {
	let listener = TcpListener::bind("127.0.0.1:0").await.expect("Loopback listener should bind.");
	let addr = listener.local_addr().expect("Listener should report its address.");
	let server = tokio::spawn(async move {
		let (stream, _) = listener.accept().await.expect("Push client should connect.");
		let mut ws = tokio_tungstenite::accept_async(stream)
			.await
			.expect("WebSocket handshake should succeed.");

		ws.send(Message::Ping(vec![0].into())).await.expect("Ping should send.");
		ws.send(Message::Text("created".to_owned().into())).await.expect("Text should send.");
		ws.send(Message::binary(b"deleted".to_vec())).await.expect("Binary should send.");
		ws.send(Message::Close(None)).await.expect("Close should send.");

		while let Some(Ok(_)) = ws.next().await {}
	});
	let h = scripted_harness(
		[
			ScriptedReply::Status(200, "[{\"texto\":\"first\"}]".into()),
			ScriptedReply::Status(200, "[{\"texto\":\"first\"},{\"texto\":\"second\"}]".into()),
		],
		Some(token_pair("T1", "R1")),
	);
	let sender: Arc<dyn RequestSender> = Arc::new(h.client.clone());
	let session = Arc::new(MemorySessionStore::default());
	let mut list: ListController = ListController::new(sender, session.clone());
	let url = Url::parse(&format!("ws://{addr}/ws/prompts")).expect("Loopback URL should parse.");
	let mut source = WebSocketPushSource::connect(&PushConfig::new(url))
		.await
		.expect("Push channel should connect.");

	list.listen(&mut source).await.expect("Push channel should close cleanly.");

	assert_eq!(h.transport.requests_to("/prompts").len(), 2);
	assert_eq!(list.items().len(), 2);
	assert!(session.get_item("prompt_cache").is_some());

	drop(source);
	server.await.expect("Push server task should finish.");
}
