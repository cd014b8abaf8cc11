//! Client configuration: API base URL, timeout, auth endpoints, and user-facing defaults.

// self
use crate::{_prelude::*, error::ConfigError};

/// Settings shared by the request client and the refresh coordinator.
///
/// Values deserialize with defaults for every field except `base_url`, so a minimal
/// configuration only names the API root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
	/// API root every request path is appended to (e.g. `https://app.example.com/api`).
	pub base_url: Url,
	/// Total timeout applied to each call, including the refresh call.
	#[serde(default = "ClientConfig::default_timeout")]
	pub timeout: StdDuration,
	/// Path of the unauthenticated refresh endpoint, relative to `base_url`.
	#[serde(default = "ClientConfig::default_refresh_path")]
	pub refresh_path: String,
	/// Login entry point handed to the session-expiry hook.
	#[serde(default = "ClientConfig::default_login_path")]
	pub login_path: String,
	/// Message reported when a failed response carries no server message.
	#[serde(default = "ClientConfig::default_fallback_message")]
	pub fallback_message: String,
}
impl ClientConfig {
	/// Default total request timeout.
	pub const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(10);
	/// Default refresh endpoint path.
	pub const DEFAULT_REFRESH_PATH: &'static str = "/auth/refresh-token";
	/// Default login entry point.
	pub const DEFAULT_LOGIN_PATH: &'static str = "/login";
	/// Default user-facing error message.
	pub const DEFAULT_FALLBACK_MESSAGE: &'static str = "Unexpected API error.";

	/// Creates a configuration for `base_url` with default settings.
	pub fn new(base_url: Url) -> Self {
		Self {
			base_url,
			timeout: Self::DEFAULT_TIMEOUT,
			refresh_path: Self::DEFAULT_REFRESH_PATH.into(),
			login_path: Self::DEFAULT_LOGIN_PATH.into(),
			fallback_message: Self::DEFAULT_FALLBACK_MESSAGE.into(),
		}
	}

	/// Parses `base_url` and creates a configuration with default settings.
	pub fn parse(base_url: &str) -> Result<Self, ConfigError> {
		let url = Url::parse(base_url).map_err(|source| ConfigError::InvalidEndpoint {
			endpoint: base_url.to_owned(),
			source,
		})?;

		Ok(Self::new(url))
	}

	/// Overrides the total request timeout.
	pub fn with_timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Overrides the refresh endpoint path.
	pub fn with_refresh_path(mut self, path: impl Into<String>) -> Self {
		self.refresh_path = path.into();

		self
	}

	/// Overrides the login entry point.
	pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
		self.login_path = path.into();

		self
	}

	/// Overrides the fallback user-facing error message.
	pub fn with_fallback_message(mut self, message: impl Into<String>) -> Self {
		self.fallback_message = message.into();

		self
	}

	/// Checks paths and the timeout.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.timeout.is_zero() {
			return Err(ConfigError::ZeroTimeout);
		}

		ensure_rooted("refresh", &self.refresh_path)?;
		ensure_rooted("login", &self.login_path)?;
		self.endpoint(&self.refresh_path).map(|_| ())
	}

	/// Resolves a request path against `base_url`.
	///
	/// Paths are appended to the base path (`/api` + `/prompts` → `/api/prompts`) rather than
	/// resolved with URL reference semantics. Absolute `http(s)` URLs pass through unchanged.
	pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
		let raw = if path.starts_with("http://") || path.starts_with("https://") {
			path.to_owned()
		} else {
			let base = self.base_url.as_str().trim_end_matches('/');
			let path = path.trim_start_matches('/');

			format!("{base}/{path}")
		};

		Url::parse(&raw)
			.map_err(|source| ConfigError::InvalidEndpoint { endpoint: path.to_owned(), source })
	}

	fn default_timeout() -> StdDuration {
		Self::DEFAULT_TIMEOUT
	}

	fn default_refresh_path() -> String {
		Self::DEFAULT_REFRESH_PATH.into()
	}

	fn default_login_path() -> String {
		Self::DEFAULT_LOGIN_PATH.into()
	}

	fn default_fallback_message() -> String {
		Self::DEFAULT_FALLBACK_MESSAGE.into()
	}
}

fn ensure_rooted(field: &'static str, value: &str) -> Result<(), ConfigError> {
	if value.starts_with('/') {
		Ok(())
	} else {
		Err(ConfigError::RelativePath { field, value: value.to_owned() })
	}
}
