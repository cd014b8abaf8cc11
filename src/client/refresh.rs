//! Token refresh coordination with a shared singleflight guard.
//!
//! A request that fails authorization on its first attempt calls
//! [`ApiClient::refresh_after_auth_failure`] with the [`AuthSnapshot`] of that attempt: the access
//! token it carried and the refresh generation (completed refreshes) observed before it was sent.
//! The call acquires the client-wide refresh guard, then:
//!
//! - if a refresh finished since the snapshot, or the stored token differs from the one sent, the
//!   caller replays when tokens are stored and fails with [`RefreshError::SessionCleared`] when
//!   the store is empty, never re-running the expiry hook;
//! - otherwise this caller performs the `POST {refresh_path}` exchange.
//!
//! A failed exchange clears the token store and invokes the session-expiry hook exactly once.

mod metrics;

pub use metrics::RefreshMetrics;

// std
use std::sync::atomic::Ordering;
// self
use crate::{
	_prelude::*,
	auth::{TokenPair, TokenSecret},
	client::{ApiClient, new_request_id},
	error::RefreshError,
	http::{
		ApiRequest, CONTENT_TYPE_HEADER, HttpTransport, JSON_CONTENT_TYPE, OutboundRequest,
		REQUEST_ID_HEADER, RequestBody,
	},
	obs::{self, OpKind, OpOutcome, OpSpan},
	store::StoreError,
};

/// Credentials an attempt was sent with.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthSnapshot {
	/// Access token attached to the attempt, if any.
	pub access_token: Option<TokenSecret>,
	/// [`ApiClient::refresh_generation`] observed before the attempt read the token store.
	pub generation: u64,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
	token: TokenSecret,
	#[serde(default, rename = "refreshToken")]
	refresh_token: Option<TokenSecret>,
}

impl<T> ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Number of refresh exchanges finished by this client and its clones, successful or not.
	pub fn refresh_generation(&self) -> u64 {
		self.refresh_generation.load(Ordering::Acquire)
	}

	/// Ensures a usable access token exists after an authorization failure.
	///
	/// `sent_with` describes the failed attempt; see [`AuthSnapshot`].
	pub async fn refresh_after_auth_failure(
		&self,
		sent_with: &AuthSnapshot,
	) -> Result<(), RefreshError> {
		let _singleflight = self.refresh_guard.lock().await;
		let current = self.store.get().await.map_err(RefreshError::Storage)?;
		let superseded = self.refresh_generation() != sent_with.generation
			|| current.as_ref().map(|pair| &pair.access_token) != sent_with.access_token.as_ref();

		if superseded {
			return match current {
				Some(_) => {
					self.refresh_metrics.record_coalesced();
					tracing::debug!("access token already replaced by a concurrent refresh");

					Ok(())
				},
				None => Err(RefreshError::SessionCleared),
			};
		}

		let result = self.refresh_access_token(current).await;

		self.refresh_generation.fetch_add(1, Ordering::AcqRel);

		match result {
			Ok(()) => Ok(()),
			Err(err) => {
				self.expire_session(&err).await.map_err(RefreshError::Storage)?;

				Err(err)
			},
		}
	}

	/// Calls the refresh endpoint and stores the new access token.
	async fn refresh_access_token(&self, current: Option<TokenPair>) -> Result<(), RefreshError> {
		const KIND: OpKind = OpKind::Refresh;

		let span = OpSpan::new(KIND, "refresh_access_token");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);
		self.refresh_metrics.record_attempt();

		let result = span
			.instrument(async move {
				let pair = current
					.filter(|pair| !pair.refresh_token.is_blank())
					.ok_or(RefreshError::MissingRefreshToken)?;
				let outbound = self.refresh_request(&pair.refresh_token)?;
				let response =
					self.transport.execute(outbound).await.map_err(RefreshError::Transport)?;

				if !response.is_success() {
					return Err(RefreshError::Rejected {
						status: response.status,
						message: response.server_message(),
					});
				}

				let body: RefreshResponse =
					response.json().map_err(|source| RefreshError::Malformed { source })?;

				if body.token.is_blank() {
					return Err(RefreshError::EmptyToken);
				}

				let mut updated = pair.with_access_token(body.token);

				if let Some(rotated) = body.refresh_token.filter(|secret| !secret.is_blank()) {
					updated = updated.with_refresh_token(rotated);
				}

				self.store.set(updated).await.map_err(RefreshError::Storage)?;

				tracing::debug!("access token refreshed");

				Ok(())
			})
			.await;

		match &result {
			Ok(_) => {
				self.refresh_metrics.record_success();
				obs::record_op_outcome(KIND, OpOutcome::Success);
			},
			Err(_) => {
				self.refresh_metrics.record_failure();
				obs::record_op_outcome(KIND, OpOutcome::Failure);
			},
		}

		result
	}

	/// Builds the unauthenticated refresh call.
	fn refresh_request(
		&self,
		refresh_token: &TokenSecret,
	) -> Result<OutboundRequest, RefreshError> {
		let url =
			self.config.endpoint(&self.config.refresh_path).map_err(RefreshError::Endpoint)?;
		let body = serde_json::json!({ "refreshToken": refresh_token.expose() });
		let request = ApiRequest::post(self.config.refresh_path.as_str())
			.header(CONTENT_TYPE_HEADER, JSON_CONTENT_TYPE)
			.header(REQUEST_ID_HEADER, new_request_id())
			.body(RequestBody::Json(body));

		Ok(OutboundRequest {
			method: request.method,
			url,
			headers: request.headers,
			body: request.body,
			retry: false,
		})
	}

	/// Clears the token store and runs the expiry hook.
	///
	/// The hook runs even when clearing fails; the store error is then returned so callers learn
	/// that stale tokens are still stored.
	async fn expire_session(&self, cause: &RefreshError) -> Result<(), StoreError> {
		tracing::warn!(
			error = %cause,
			login_path = %self.config.login_path,
			"token refresh failed; clearing session"
		);

		let cleared = self.store.clear().await;

		if let Err(err) = &cleared {
			tracing::error!(error = %err, "failed to clear token store after refresh failure");
		}

		self.session_expiry.on_session_expired(&self.config.login_path);

		cleared
	}
}
