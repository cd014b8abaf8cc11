//! WebSocket-backed [`PushSource`].

// crates.io
use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, tungstenite::Message};
// self
use crate::{
	_prelude::*,
	push::{PushConfig, PushError, PushFuture, PushMessage, PushSource},
};

/// Push source reading text and binary frames from a WebSocket.
pub struct WebSocketPushSource {
	url: Url,
	stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}
impl WebSocketPushSource {
	/// Opens the channel described by `config`.
	pub async fn connect(config: &PushConfig) -> Result<Self, PushError> {
		let url = config.url.clone();
		let (stream, _) = tokio_tungstenite::connect_async(url.as_str())
			.await
			.map_err(|e| PushError::connect(&url, e))?;

		tracing::info!(url = %url, "push channel connected");

		Ok(Self { url, stream })
	}

	/// Channel URL.
	pub fn url(&self) -> &Url {
		&self.url
	}
}
impl PushSource for WebSocketPushSource {
	fn next_message(&mut self) -> PushFuture<'_> {
		Box::pin(async move {
			loop {
				match self.stream.next().await {
					Some(Ok(message @ (Message::Text(_) | Message::Binary(_)))) =>
						return Ok(Some(PushMessage::new(message.into_data().to_vec()))),
					Some(Ok(Message::Close(_))) | None => return Ok(None),
					// Ping, pong, and raw frames carry no change signal.
					Some(Ok(_)) => continue,
					Some(Err(e)) => return Err(PushError::receive(e)),
				}
			}
		})
	}
}
impl Debug for WebSocketPushSource {
	fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
		f.debug_struct("WebSocketPushSource").field("url", &self.url.as_str()).finish()
	}
}
