//! User-facing notification surface for final, non-recoverable request errors.

/// Receives one human-readable message per failed request that the client gives up on.
pub trait Notifier
where
	Self: Send + Sync,
{
	/// Reports an error message to the user.
	fn error(&self, message: &str);
}

/// Default notifier that emits the message as a `tracing` error event.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;
impl Notifier for TracingNotifier {
	fn error(&self, message: &str) {
		tracing::error!(
			target: "prompt_manager_client::notify",
			user_message = message,
			"request failed"
		);
	}
}
