//! Server push channel announcing list changes.
//!
//! Messages are change signals only; their payload is never interpreted. A [`PushSource`] yields
//! messages until the channel closes, and [`crate::list::ListController::listen`] reloads the
//! list on each one.

#[cfg(feature = "websocket")] mod websocket;
#[cfg(feature = "websocket")] pub use websocket::WebSocketPushSource;

// self
use crate::_prelude::*;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Boxed future returned by [`PushSource::next_message`].
pub type PushFuture<'a> =
	Pin<Box<dyn Future<Output = Result<Option<PushMessage>, PushError>> + 'a + Send>>;

/// Stream of change notifications.
pub trait PushSource
where
	Self: Send,
{
	/// Waits for the next message; `Ok(None)` means the channel closed.
	fn next_message(&mut self) -> PushFuture<'_>;
}

/// Opaque push payload.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PushMessage(Vec<u8>);
impl PushMessage {
	/// Wraps a raw payload.
	pub fn new(payload: Vec<u8>) -> Self {
		Self(payload)
	}

	/// Raw payload bytes.
	pub fn payload(&self) -> &[u8] {
		&self.0
	}
}

/// Push channel failures.
#[derive(Debug, ThisError)]
pub enum PushError {
	/// The channel could not be opened.
	#[error("Push channel `{url}` could not be opened.")]
	Connect {
		/// Channel URL.
		url: String,
		/// Underlying failure.
		#[source]
		source: BoxError,
	},
	/// The open channel failed while receiving.
	#[error("Push channel failed while receiving.")]
	Receive {
		/// Underlying failure.
		#[source]
		source: BoxError,
	},
}
impl PushError {
	/// Wraps a connection failure for `url`.
	pub fn connect(url: &Url, src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Connect { url: url.to_string(), source: Box::new(src) }
	}

	/// Wraps a receive failure.
	pub fn receive(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Receive { source: Box::new(src) }
	}
}

/// Push channel location.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushConfig {
	/// WebSocket URL of the channel.
	#[serde(default = "PushConfig::default_url")]
	pub url: Url,
}
impl PushConfig {
	/// Default channel URL.
	pub const DEFAULT_URL: &'static str = "ws://localhost:8000/ws/prompts";

	/// Creates a config for `url`.
	pub fn new(url: Url) -> Self {
		Self { url }
	}

	fn default_url() -> Url {
		Url::parse(Self::DEFAULT_URL).unwrap_or_else(|_| unreachable!("constant URL is valid"))
	}
}
impl Default for PushConfig {
	fn default() -> Self {
		Self { url: Self::default_url() }
	}
}
