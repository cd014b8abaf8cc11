//! Authenticated API client for the prompt manager: bearer tokens, request IDs, a single
//! shared token refresh on authorization failure, user-facing error notifications, and a
//! cached, paginated prompt list that reloads on push notifications.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod list;
pub mod notify;
pub mod obs;
pub mod push;
pub mod session;
pub mod store;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// std
	use std::{
		collections::VecDeque,
		sync::atomic::{AtomicUsize, Ordering},
		task::{Context, Poll},
	};
	// self
	use crate::{
		auth::TokenPair,
		client::ApiClient,
		config::ClientConfig,
		error::TransportError,
		http::{ApiResponse, HttpTransport, OutboundRequest, TransportFuture},
		notify::Notifier,
		session::SessionExpiryHandler,
		store::{MemoryTokenStore, TokenStore},
	};

	/// Scripted reply handed out by [`ScriptedTransport`].
	#[derive(Clone, Debug)]
	pub enum ScriptedReply {
		/// Respond with the given status and raw body.
		Status(u16, String),
		/// Fail before any response arrives.
		NetworkFailure,
	}

	/// Transport that replays queued replies and records every outbound request.
	#[derive(Debug, Default)]
	pub struct ScriptedTransport {
		replies: Mutex<VecDeque<ScriptedReply>>,
		requests: Mutex<Vec<OutboundRequest>>,
	}
	impl ScriptedTransport {
		/// Builds a transport that answers with `replies` in order.
		pub fn new(replies: impl IntoIterator<Item = ScriptedReply>) -> Self {
			Self { replies: Mutex::new(replies.into_iter().collect()), requests: Default::default() }
		}

		/// Returns every request executed so far.
		pub fn requests(&self) -> Vec<OutboundRequest> {
			self.requests.lock().clone()
		}

		/// Returns the requests whose URL path ends with `suffix`.
		pub fn requests_to(&self, suffix: &str) -> Vec<OutboundRequest> {
			self.requests().into_iter().filter(|req| req.url.path().ends_with(suffix)).collect()
		}
	}
	impl HttpTransport for ScriptedTransport {
		fn execute(&self, request: OutboundRequest) -> TransportFuture<'_> {
			Box::pin(async move {
				self.requests.lock().push(request);

				// Interleave concurrent callers the way a real network round trip would.
				YieldOnce(false).await;

				let reply = self.replies.lock().pop_front();

				match reply {
					Some(ScriptedReply::Status(status, body)) =>
						Ok(ApiResponse::new(status, BTreeMap::new(), body.into_bytes())),
					Some(ScriptedReply::NetworkFailure) | None =>
						Err(TransportError::network(std::io::Error::new(
							std::io::ErrorKind::ConnectionRefused,
							"scripted transport has no reply",
						))),
				}
			})
		}
	}

	struct YieldOnce(bool);
	impl Future for YieldOnce {
		type Output = ();

		fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
			if self.0 {
				return Poll::Ready(());
			}

			self.0 = true;
			cx.waker().wake_by_ref();

			Poll::Pending
		}
	}

	/// Notifier that keeps every reported message.
	#[derive(Debug, Default)]
	pub struct RecordingNotifier(Mutex<Vec<String>>);
	impl RecordingNotifier {
		/// Returns the reported messages in order.
		pub fn messages(&self) -> Vec<String> {
			self.0.lock().clone()
		}
	}
	impl Notifier for RecordingNotifier {
		fn error(&self, message: &str) {
			self.0.lock().push(message.to_owned());
		}
	}

	/// Session-expiry hook that counts invocations and remembers the last login path.
	#[derive(Debug, Default)]
	pub struct RecordingExpiry {
		calls: AtomicUsize,
		last_path: Mutex<Option<String>>,
	}
	impl RecordingExpiry {
		/// Number of times the session was declared expired.
		pub fn calls(&self) -> usize {
			self.calls.load(Ordering::SeqCst)
		}

		/// Login path passed on the most recent call.
		pub fn last_path(&self) -> Option<String> {
			self.last_path.lock().clone()
		}
	}
	impl SessionExpiryHandler for RecordingExpiry {
		fn on_session_expired(&self, login_path: &str) {
			self.calls.fetch_add(1, Ordering::SeqCst);
			*self.last_path.lock() = Some(login_path.to_owned());
		}
	}

	/// Client wired to test doubles, plus handles to inspect them.
	pub struct TestHarness<T>
	where
		T: HttpTransport,
	{
		/// Client under test.
		pub client: ApiClient<T>,
		/// Transport shared with the client.
		pub transport: Arc<T>,
		/// Token store shared with the client.
		pub store: Arc<MemoryTokenStore>,
		/// Notification surface shared with the client.
		pub notifier: Arc<RecordingNotifier>,
		/// Session-expiry hook shared with the client.
		pub expiry: Arc<RecordingExpiry>,
	}

	/// Base URL used by scripted harnesses.
	pub const TEST_BASE_URL: &str = "http://client.test/api";

	/// Builds a [`TestHarness`] around `transport`, seeding the store with `tokens`.
	pub fn build_test_harness<T>(
		config: ClientConfig,
		transport: T,
		tokens: Option<TokenPair>,
	) -> TestHarness<T>
	where
		T: HttpTransport,
	{
		let transport = Arc::new(transport);
		let store = Arc::new(MemoryTokenStore::with_tokens(tokens));
		let notifier = Arc::new(RecordingNotifier::default());
		let expiry = Arc::new(RecordingExpiry::default());
		let store_dyn: Arc<dyn TokenStore> = store.clone();
		let client = ApiClient::with_transport(config, transport.clone(), store_dyn)
			.with_notifier(notifier.clone())
			.with_session_expiry(expiry.clone());

		TestHarness { client, transport, store, notifier, expiry }
	}

	/// Builds a scripted harness against [`TEST_BASE_URL`].
	pub fn scripted_harness(
		replies: impl IntoIterator<Item = ScriptedReply>,
		tokens: Option<TokenPair>,
	) -> TestHarness<ScriptedTransport> {
		let base = Url::parse(TEST_BASE_URL).expect("Test base URL should parse.");

		build_test_harness(ClientConfig::new(base), ScriptedTransport::new(replies), tokens)
	}

	/// Builds a scripted harness whose transport has no replies queued.
	pub fn idle_harness(tokens: Option<TokenPair>) -> TestHarness<ScriptedTransport> {
		scripted_harness(Vec::new(), tokens)
	}

	/// Convenience constructor for token fixtures.
	pub fn token_pair(access: &str, refresh: &str) -> TokenPair {
		TokenPair::new(access, refresh)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
		time::Duration as StdDuration,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use httpmock as _;
