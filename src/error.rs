//! Client-level error types shared across the request pipeline, stores, and the list controller.

// self
use crate::_prelude::*;

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// No response was received (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Token refresh failed; stored credentials have been cleared.
	#[error(transparent)]
	RefreshFailed(#[from] RefreshError),

	/// The server answered with a non-success status other than an authorization failure.
	#[error("Request failed with HTTP status {status}.")]
	HttpStatus {
		/// HTTP status code.
		status: u16,
		/// Server-supplied `message` field, when the body carried one.
		message: Option<String>,
	},
	/// The server rejected the credentials attached to the request.
	#[error("Request was not authorized (HTTP status {status}).")]
	AuthExpired {
		/// HTTP status code.
		status: u16,
		/// Server-supplied `message` field, when the body carried one.
		message: Option<String>,
	},
	/// A successful response body could not be decoded into the requested type.
	#[error("Response body could not be decoded.")]
	Decode {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// A list selection was empty or unknown.
	#[error("Please select a valid prompt.")]
	InvalidSelection,
}
impl Error {
	/// Returns `true` when the error represents an authorization failure.
	pub fn is_auth_expired(&self) -> bool {
		matches!(self, Self::AuthExpired { .. })
	}

	/// Returns the HTTP status carried by the error, if a response was received.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::HttpStatus { status, .. } | Self::AuthExpired { status, .. } => Some(*status),
			_ => None,
		}
	}

	/// Returns the server-supplied message, if any.
	pub fn server_message(&self) -> Option<&str> {
		match self {
			Self::HttpStatus { message, .. } | Self::AuthExpired { message, .. } =>
				message.as_deref(),
			_ => None,
		}
	}

	/// Message shown to users: the server message when present, else `fallback`.
	pub fn user_message<'a>(&'a self, fallback: &'a str) -> &'a str {
		self.server_message().filter(|message| !message.trim().is_empty()).unwrap_or(fallback)
	}
}

/// Configuration and validation failures raised by the client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// A configured path or request path does not form a valid URL.
	#[error("Endpoint `{endpoint}` does not form a valid URL.")]
	InvalidEndpoint {
		/// Offending path or URL.
		endpoint: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Relative paths must start with `/`.
	#[error("The {field} path must start with `/`: {value}.")]
	RelativePath {
		/// Configuration field name.
		field: &'static str,
		/// Supplied value.
		value: String,
	},
	/// The request timeout must be non-zero.
	#[error("The request timeout must be greater than zero.")]
	ZeroTimeout,
	/// Page size must be non-zero.
	#[error("The page size must be greater than zero.")]
	ZeroPageSize,
	/// Request body could not be serialized.
	#[error("Request body could not be serialized.")]
	Serialize(#[from] serde_json::Error),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO, timeout). No response was received.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The call exceeded the configured total timeout.
	#[error("The API call timed out.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the API.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a transport-specific timeout error.
	pub fn timeout(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Timeout { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::timeout(e) } else { Self::network(e) }
	}
}

/// Reasons a token refresh could not produce a usable access token.
#[derive(Debug, ThisError)]
pub enum RefreshError {
	/// No refresh token was stored.
	#[error("No refresh token is available.")]
	MissingRefreshToken,
	/// The refresh endpoint is misconfigured.
	#[error("Refresh endpoint is misconfigured.")]
	Endpoint(#[source] ConfigError),
	/// The refresh endpoint could not be reached.
	#[error("Refresh endpoint could not be reached.")]
	Transport(#[source] TransportError),
	/// The refresh endpoint rejected the request.
	#[error("Refresh endpoint returned HTTP status {status}.")]
	Rejected {
		/// HTTP status code.
		status: u16,
		/// Server-supplied `message` field, when present.
		message: Option<String>,
	},
	/// The refresh endpoint answered with a body that carries no usable token.
	#[error("Refresh endpoint returned malformed JSON.")]
	Malformed {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// The refresh endpoint answered with an empty token.
	#[error("Refresh endpoint returned an empty token.")]
	EmptyToken,
	/// A concurrent refresh already failed and cleared the session.
	#[error("Session was cleared by a concurrent refresh failure.")]
	SessionCleared,
	/// The token store could not be updated.
	#[error("Refreshed token could not be stored.")]
	Storage(#[source] crate::store::StoreError),
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn user_message_prefers_server_message() {
		let err = Error::HttpStatus { status: 422, message: Some("Invalid input".into()) };

		assert_eq!(err.user_message("fallback"), "Invalid input");
		assert_eq!(err.status(), Some(422));
	}

	#[test]
	fn user_message_falls_back_for_blank_or_missing_messages() {
		let blank = Error::HttpStatus { status: 500, message: Some("  ".into()) };
		let missing = Error::AuthExpired { status: 401, message: None };
		let network = Error::from(TransportError::Io(std::io::Error::other("reset")));

		assert_eq!(blank.user_message("fallback"), "fallback");
		assert_eq!(missing.user_message("fallback"), "fallback");
		assert_eq!(network.user_message("fallback"), "fallback");
		assert!(missing.is_auth_expired());
		assert!(!network.is_auth_expired());
	}

	#[test]
	fn refresh_error_is_exposed_as_source() {
		let err = Error::from(RefreshError::Rejected { status: 403, message: None });

		assert!(matches!(err, Error::RefreshFailed(_)));
		assert_eq!(err.to_string(), "Refresh endpoint returned HTTP status 403.");
	}
}
