//! Authenticated request client.
//!
//! [`ApiClient::dispatch`] is the bare request client: it injects the bearer token and a fresh
//! request ID, then classifies the response. [`ApiClient::send`] layers the refresh coordinator
//! on top: an authorization failure on a first attempt triggers one token refresh and a replay of
//! the original request, every other final failure is reported through the [`Notifier`] before it
//! is returned, and a failed refresh clears the session and invokes the
//! [`SessionExpiryHandler`].

pub mod refresh;

pub use refresh::{AuthSnapshot, RefreshMetrics};

// std
use std::sync::atomic::AtomicU64;
// crates.io
use uuid::Uuid;
// self
use crate::{
	_prelude::*,
	auth::TokenPair,
	config::ClientConfig,
	error::ConfigError,
	http::{
		AUTHORIZATION_HEADER, ApiRequest, ApiResponse, CONTENT_TYPE_HEADER, HttpTransport,
		JSON_CONTENT_TYPE, Method, MultipartForm, OutboundRequest, REQUEST_ID_HEADER,
		RequestBody,
	},
	notify::{Notifier, TracingNotifier},
	obs::{self, OpKind, OpOutcome, OpSpan},
	session::{LogSessionExpiry, SessionExpiryHandler},
	store::TokenStore,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

/// Boxed future returned by [`RequestSender::send`].
pub type SendFuture<'a> = Pin<Box<dyn Future<Output = Result<ApiResponse>> + 'a + Send>>;

/// The `send` contract consumed by collaborators such as the list controller.
pub trait RequestSender
where
	Self: Send + Sync,
{
	/// Sends `request` with token injection, refresh-and-retry, and error reporting.
	fn send(&self, request: ApiRequest) -> SendFuture<'_>;
}

/// Shared API client.
///
/// Cloning is cheap; clones share the transport, token store, hooks, metrics, and the refresh
/// guard, so concurrent authorization failures across clones still coalesce into one refresh.
pub struct ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Base URL, timeout, auth endpoints, and fallback message.
	pub config: ClientConfig,
	/// Transport used for ordinary and refresh calls.
	pub transport: Arc<T>,
	/// Source of truth for the token pair.
	pub store: Arc<dyn TokenStore>,
	/// Surface receiving user-facing error messages.
	pub notifier: Arc<dyn Notifier>,
	/// Hook invoked after a failed refresh cleared the session.
	pub session_expiry: Arc<dyn SessionExpiryHandler>,
	/// Shared counters for refresh outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
	refresh_guard: Arc<AsyncMutex<()>>,
	refresh_generation: Arc<AtomicU64>,
}
impl<T> ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a client that reuses the caller-provided transport.
	///
	/// Notifications default to [`TracingNotifier`] and session expiry to [`LogSessionExpiry`].
	pub fn with_transport(
		config: ClientConfig,
		transport: impl Into<Arc<T>>,
		store: Arc<dyn TokenStore>,
	) -> Self {
		Self {
			config,
			transport: transport.into(),
			store,
			notifier: Arc::new(TracingNotifier),
			session_expiry: Arc::new(LogSessionExpiry),
			refresh_metrics: Default::default(),
			refresh_guard: Arc::new(AsyncMutex::new(())),
			refresh_generation: Default::default(),
		}
	}

	/// Replaces the notification surface.
	pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
		self.notifier = notifier;

		self
	}

	/// Replaces the session-expiry hook.
	pub fn with_session_expiry(mut self, handler: Arc<dyn SessionExpiryHandler>) -> Self {
		self.session_expiry = handler;

		self
	}

	/// Builds the outbound form of `request` for the given credentials.
	///
	/// - `Authorization: Bearer <access token>` replaces any caller value when `tokens` is present.
	/// - A fresh `X-Request-ID` always replaces any caller value.
	/// - JSON bodies default to `Content-Type: application/json`.
	/// - Multipart bodies lose every content-type header so the transport can set the boundary.
	pub fn prepare(
		&self,
		request: &ApiRequest,
		tokens: Option<&TokenPair>,
	) -> Result<OutboundRequest, ConfigError> {
		let url = self.config.endpoint(&request.path)?;
		let mut headers = request.headers.clone();

		if let Some(pair) = tokens {
			remove_header(&mut headers, AUTHORIZATION_HEADER);
			headers.insert(AUTHORIZATION_HEADER.into(), pair.access_token.bearer());
		}

		remove_header(&mut headers, REQUEST_ID_HEADER);
		headers.insert(REQUEST_ID_HEADER.into(), new_request_id());

		match &request.body {
			RequestBody::Multipart(_) => remove_header(&mut headers, CONTENT_TYPE_HEADER),
			RequestBody::Json(_) =>
				if !has_header(&headers, CONTENT_TYPE_HEADER) {
					headers.insert(CONTENT_TYPE_HEADER.into(), JSON_CONTENT_TYPE.into());
				},
			RequestBody::Empty => (),
		}

		Ok(OutboundRequest {
			method: request.method,
			url,
			headers,
			body: request.body.clone(),
			retry: request.retry,
		})
	}

	/// Sends a single attempt: no refresh, no notification.
	///
	/// Transport failures and non-2xx statuses propagate unchanged.
	pub async fn dispatch(&self, request: &ApiRequest) -> Result<ApiResponse> {
		self.attempt(request).await.1
	}

	/// Sends `request` through the full pipeline (refresh-and-retry plus error reporting).
	pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
		const KIND: OpKind = OpKind::Send;

		let span = OpSpan::new(KIND, "send");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span.instrument(self.send_with_refresh(request)).await;

		match &result {
			Ok(_) => obs::record_op_outcome(KIND, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(KIND, OpOutcome::Failure),
		}

		result
	}

	/// Sends `request` and decodes the JSON body into `R`.
	pub async fn send_json<R>(&self, request: ApiRequest) -> Result<R>
	where
		R: for<'de> Deserialize<'de>,
	{
		self.send(request).await?.json().map_err(|source| Error::Decode { source })
	}

	/// `GET path`.
	pub async fn get(&self, path: &str) -> Result<ApiResponse> {
		self.send(ApiRequest::get(path)).await
	}

	/// `POST path` with a JSON body.
	pub async fn post_json<B>(&self, path: &str, body: &B) -> Result<ApiResponse>
	where
		B: ?Sized + Serialize,
	{
		let request = ApiRequest::post(path).json(body).map_err(ConfigError::from)?;

		self.send(request).await
	}

	/// `PUT path` with a JSON body.
	pub async fn put_json<B>(&self, path: &str, body: &B) -> Result<ApiResponse>
	where
		B: ?Sized + Serialize,
	{
		let request = ApiRequest::new(Method::Put, path).json(body).map_err(ConfigError::from)?;

		self.send(request).await
	}

	/// `DELETE path`.
	pub async fn delete(&self, path: &str) -> Result<ApiResponse> {
		self.send(ApiRequest::new(Method::Delete, path)).await
	}

	/// `POST path` with a multipart body.
	pub async fn upload(&self, path: &str, form: MultipartForm) -> Result<ApiResponse> {
		self.send(ApiRequest::post(path).multipart(form)).await
	}

	async fn send_with_refresh(&self, mut request: ApiRequest) -> Result<ApiResponse> {
		loop {
			let (sent_with, result) = self.attempt(&request).await;

			match result {
				Ok(response) => return Ok(response),
				Err(err) if err.is_auth_expired() && !request.retry => {
					tracing::debug!(
						method = %request.method,
						path = %request.path,
						"authorization failed; refreshing token before replay"
					);

					self.refresh_after_auth_failure(&sent_with).await?;

					request.retry = true;
				},
				Err(err) => {
					self.report(&request, &err);

					return Err(err);
				},
			}
		}
	}

	/// Runs one attempt and returns the credentials it was sent with.
	async fn attempt(&self, request: &ApiRequest) -> (AuthSnapshot, Result<ApiResponse>) {
		// Read before the tokens so a refresh finishing in between is never missed.
		let generation = self.refresh_generation();
		let tokens = match self.store.get().await {
			Ok(tokens) => tokens,
			Err(err) => return (AuthSnapshot { access_token: None, generation }, Err(err.into())),
		};
		let sent_with = AuthSnapshot {
			access_token: tokens.as_ref().map(|pair| pair.access_token.clone()),
			generation,
		};
		let result = match self.prepare(request, tokens.as_ref()) {
			Ok(outbound) => self.execute(outbound).await,
			Err(err) => Err(err.into()),
		};

		(sent_with, result)
	}

	async fn execute(&self, outbound: OutboundRequest) -> Result<ApiResponse> {
		let response = self.transport.execute(outbound).await?;

		response.error_for_status()
	}

	fn report(&self, request: &ApiRequest, err: &Error) {
		let message = err.user_message(&self.config.fallback_message);

		tracing::warn!(
			method = %request.method,
			path = %request.path,
			status = err.status(),
			retried = request.retry,
			error = %err,
			"request failed"
		);

		self.notifier.error(message);
	}
}
#[cfg(feature = "reqwest")]
impl ApiClient<ReqwestTransport> {
	/// Creates a client with its own reqwest transport honoring `config.timeout`.
	pub fn new(config: ClientConfig, store: Arc<dyn TokenStore>) -> Result<Self> {
		config.validate()?;

		let transport = ReqwestTransport::with_timeout(config.timeout)?;

		Ok(Self::with_transport(config, transport, store))
	}
}
impl<T> Clone for ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			config: self.config.clone(),
			transport: self.transport.clone(),
			store: self.store.clone(),
			notifier: self.notifier.clone(),
			session_expiry: self.session_expiry.clone(),
			refresh_metrics: self.refresh_metrics.clone(),
			refresh_guard: self.refresh_guard.clone(),
			refresh_generation: self.refresh_generation.clone(),
		}
	}
}
impl<T> Debug for ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiClient")
			.field("base_url", &self.config.base_url.as_str())
			.field("timeout", &self.config.timeout)
			.field("refresh_path", &self.config.refresh_path)
			.finish()
	}
}
impl<T> RequestSender for ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn send(&self, request: ApiRequest) -> SendFuture<'_> {
		Box::pin(ApiClient::send(self, request))
	}
}

fn new_request_id() -> String {
	Uuid::new_v4().to_string()
}

fn has_header(headers: &BTreeMap<String, String>, name: &str) -> bool {
	headers.keys().any(|key| key.eq_ignore_ascii_case(name))
}

fn remove_header(headers: &mut BTreeMap<String, String>, name: &str) {
	headers.retain(|key, _| !key.eq_ignore_ascii_case(name));
}
