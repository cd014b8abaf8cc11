//! Session-scoped cache storage for list payloads.
//!
//! Entries expire by elapsed time only; there is no content hash or server-provided version, so
//! a change made elsewhere stays invisible until the window lapses or a push message invalidates
//! the entry.

// self
use crate::_prelude::*;

/// Key/value storage scoped to one user session (the analogue of browser session storage).
pub trait SessionStore
where
	Self: Send + Sync,
{
	/// Returns the raw value stored under `key`.
	fn get_item(&self, key: &str) -> Option<String>;

	/// Stores `value` under `key`, replacing any previous value.
	fn set_item(&self, key: &str, value: String);

	/// Removes `key`.
	fn remove_item(&self, key: &str);
}

/// Thread-safe in-process [`SessionStore`].
#[derive(Clone, Debug, Default)]
pub struct MemorySessionStore(Arc<RwLock<HashMap<String, String>>>);
impl SessionStore for MemorySessionStore {
	fn get_item(&self, key: &str) -> Option<String> {
		self.0.read().get(key).cloned()
	}

	fn set_item(&self, key: &str, value: String) {
		self.0.write().insert(key.to_owned(), value);
	}

	fn remove_item(&self, key: &str) {
		self.0.write().remove(key);
	}
}

/// Cached payload plus the instant it was fetched, stored as `{ "timestamp", "data" }`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
	/// Fetch instant in Unix milliseconds.
	pub timestamp: i64,
	/// Raw response payload.
	pub data: serde_json::Value,
}
impl CacheEntry {
	/// Creates an entry fetched at `now`.
	pub fn new(now: OffsetDateTime, data: serde_json::Value) -> Self {
		let millis = now.unix_timestamp_nanos() / 1_000_000;

		Self { timestamp: i64::try_from(millis).unwrap_or(i64::MAX), data }
	}

	/// Returns the fetch instant, if the timestamp is representable.
	pub fn fetched_at(&self) -> Option<OffsetDateTime> {
		OffsetDateTime::from_unix_timestamp_nanos(i128::from(self.timestamp) * 1_000_000).ok()
	}

	/// Returns `true` while less than `ttl` has elapsed since the fetch.
	pub fn is_fresh(&self, now: OffsetDateTime, ttl: Duration) -> bool {
		self.fetched_at().is_some_and(|fetched_at| now - fetched_at < ttl)
	}
}

/// Reads the entry under `key`, returning its payload only while it is fresh.
///
/// Entries that fail to parse are treated as absent.
pub fn read_fresh(
	store: &dyn SessionStore,
	key: &str,
	now: OffsetDateTime,
	ttl: Duration,
) -> Option<serde_json::Value> {
	let raw = store.get_item(key)?;
	let entry = match serde_json::from_str::<CacheEntry>(&raw) {
		Ok(entry) => entry,
		Err(err) => {
			tracing::debug!(key, error = %err, "ignoring unreadable cache entry");

			return None;
		},
	};

	if entry.is_fresh(now, ttl) { Some(entry.data) } else { None }
}

/// Writes `data` under `key` with `now` as its fetch instant.
pub fn write(store: &dyn SessionStore, key: &str, now: OffsetDateTime, data: serde_json::Value) {
	match serde_json::to_string(&CacheEntry::new(now, data)) {
		Ok(raw) => store.set_item(key, raw),
		Err(err) => tracing::warn!(key, error = %err, "failed to serialize cache entry"),
	}
}
