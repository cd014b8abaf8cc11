//! Access/refresh token pair persisted by token stores.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Credentials attached to outbound requests and exchanged on refresh.
///
/// The serialized form uses the `token` / `refreshToken` keys so file-backed stores stay
/// compatible with the web client's local storage layout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
	/// Short-lived bearer token.
	#[serde(rename = "token")]
	pub access_token: TokenSecret,
	/// Longer-lived token exchanged for a new access token.
	#[serde(rename = "refreshToken")]
	pub refresh_token: TokenSecret,
}
impl TokenPair {
	/// Creates a pair from raw token strings.
	pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			refresh_token: TokenSecret::new(refresh_token),
		}
	}

	/// Returns a copy with the access token replaced and the refresh token kept.
	pub fn with_access_token(&self, access_token: TokenSecret) -> Self {
		Self { access_token, refresh_token: self.refresh_token.clone() }
	}

	/// Returns a copy with the refresh token replaced.
	pub fn with_refresh_token(mut self, refresh_token: TokenSecret) -> Self {
		self.refresh_token = refresh_token;

		self
	}
}
