//! Session-expiry capability invoked when credentials can no longer be refreshed.

/// Called once per failed refresh, after the token store has been cleared.
///
/// A browser front end navigates to `login_path`; other hosts may prompt for credentials or
/// shut down a worker.
pub trait SessionExpiryHandler
where
	Self: Send + Sync,
{
	/// Handles an expired session.
	fn on_session_expired(&self, login_path: &str);
}

/// Default handler that only records the expiry as a `tracing` warning.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSessionExpiry;
impl SessionExpiryHandler for LogSessionExpiry {
	fn on_session_expired(&self, login_path: &str) {
		tracing::warn!(login_path, "session expired; login required");
	}
}

impl<F> SessionExpiryHandler for F
where
	F: Fn(&str) + Send + Sync,
{
	fn on_session_expired(&self, login_path: &str) {
		self(login_path)
	}
}
