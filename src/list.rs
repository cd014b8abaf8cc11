//! Cached, filterable, paginated prompt list.
//!
//! [`ListController`] owns the view state (loaded items, query, current page, last error) and
//! talks to the API exclusively through a [`RequestSender`], so token injection, refresh, and error
//! notification come from the client. Loaded payloads are cached in a [`SessionStore`] for a fixed
//! window, and a push message from the server invalidates that cache and reloads.

pub mod cache;
pub mod page;

pub use cache::{CacheEntry, MemorySessionStore, SessionStore};
pub use page::PageView;

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	client::RequestSender,
	error::ConfigError,
	http::ApiRequest,
	obs::{self, OpKind, OpOutcome, OpSpan},
	push::{PushError, PushMessage, PushSource},
};

/// An item the list controller can display and filter.
pub trait ListItem
where
	Self: Clone + Send + Sync + DeserializeOwned,
{
	/// Text matched by the search filter and by selections.
	fn search_text(&self) -> &str;
}

/// Prompt record as served by the prompt endpoint.
///
/// Only the display text is interpreted; every other field is kept verbatim.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
	/// Prompt text (`texto` on the wire).
	#[serde(rename = "texto")]
	pub text: String,
	/// Remaining fields.
	#[serde(flatten)]
	pub extra: serde_json::Map<String, serde_json::Value>,
}
impl Prompt {
	/// Creates a prompt with no extra fields.
	pub fn new(text: impl Into<String>) -> Self {
		Self { text: text.into(), extra: Default::default() }
	}
}
impl ListItem for Prompt {
	fn search_text(&self) -> &str {
		&self.text
	}
}

/// Endpoint, cache, and paging parameters for a [`ListController`].
#[derive(Clone, Debug)]
pub struct ListSettings {
	/// Path of the list endpoint, relative to the client base URL.
	pub path: String,
	/// Session-store key of the cache entry.
	pub cache_key: String,
	/// Freshness window of the cache entry.
	pub cache_ttl: Duration,
	/// Items per page.
	pub page_size: usize,
	/// Message recorded when the list cannot be fetched.
	pub load_error_message: String,
}
impl ListSettings {
	/// Default list endpoint.
	pub const DEFAULT_PATH: &'static str = "/prompts";
	/// Default cache key.
	pub const DEFAULT_CACHE_KEY: &'static str = "prompt_cache";
	/// Default cache freshness window.
	pub const DEFAULT_CACHE_TTL: Duration = Duration::minutes(5);
	/// Default page size.
	pub const DEFAULT_PAGE_SIZE: usize = 10;
	/// Default load failure message.
	pub const DEFAULT_LOAD_ERROR_MESSAGE: &'static str =
		"Failed to load prompts. Please try again later.";

	/// Overrides the list endpoint.
	pub fn with_path(mut self, path: impl Into<String>) -> Self {
		self.path = path.into();

		self
	}

	/// Overrides the cache key.
	pub fn with_cache_key(mut self, key: impl Into<String>) -> Self {
		self.cache_key = key.into();

		self
	}

	/// Overrides the cache freshness window.
	pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
		self.cache_ttl = ttl;

		self
	}

	/// Overrides the page size.
	pub fn with_page_size(mut self, page_size: usize) -> Self {
		self.page_size = page_size;

		self
	}

	/// Rejects settings the controller cannot work with.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.page_size == 0 {
			return Err(ConfigError::ZeroPageSize);
		}
		if !self.path.starts_with('/') {
			return Err(ConfigError::RelativePath { field: "list", value: self.path.clone() });
		}

		Ok(())
	}
}
impl Default for ListSettings {
	fn default() -> Self {
		Self {
			path: Self::DEFAULT_PATH.into(),
			cache_key: Self::DEFAULT_CACHE_KEY.into(),
			cache_ttl: Self::DEFAULT_CACHE_TTL,
			page_size: Self::DEFAULT_PAGE_SIZE,
			load_error_message: Self::DEFAULT_LOAD_ERROR_MESSAGE.into(),
		}
	}
}

/// Loads, caches, filters, and paginates a list of items.
pub struct ListController<I = Prompt>
where
	I: ListItem,
{
	sender: Arc<dyn RequestSender>,
	session: Arc<dyn SessionStore>,
	settings: ListSettings,
	items: Vec<I>,
	query: String,
	current_page: usize,
	last_error: Option<String>,
}
impl<I> ListController<I>
where
	I: ListItem,
{
	/// Creates a controller with default [`ListSettings`].
	pub fn new(sender: Arc<dyn RequestSender>, session: Arc<dyn SessionStore>) -> Self {
		Self {
			sender,
			session,
			settings: ListSettings::default(),
			items: Vec::new(),
			query: String::new(),
			current_page: 1,
			last_error: None,
		}
	}

	/// Replaces the settings after validating them.
	pub fn with_settings(mut self, settings: ListSettings) -> Result<Self> {
		settings.validate()?;

		self.settings = settings;

		Ok(self)
	}

	/// Active settings.
	pub fn settings(&self) -> &ListSettings {
		&self.settings
	}

	/// Every loaded item, ignoring the filter.
	pub fn items(&self) -> &[I] {
		&self.items
	}

	/// Active filter query.
	pub fn query(&self) -> &str {
		&self.query
	}

	/// 1-based current page.
	pub fn current_page(&self) -> usize {
		self.current_page
	}

	/// Message recorded by the most recent failed load, cleared by the next successful one.
	pub fn last_error(&self) -> Option<&str> {
		self.last_error.as_deref()
	}

	/// Loads the list (from cache when fresh) and renders the current page.
	pub async fn load(&mut self) -> PageView<I> {
		self.load_at(OffsetDateTime::now_utc()).await
	}

	/// [`Self::load`] with an explicit clock reading.
	///
	/// A fresh cache entry is used without a network call. Otherwise the list endpoint is fetched
	/// and a successful payload is cached with `now` as its fetch instant. A failed fetch records
	/// [`ListSettings::load_error_message`] and renders an empty list.
	pub async fn load_at(&mut self, now: OffsetDateTime) -> PageView<I> {
		const KIND: OpKind = OpKind::ListLoad;

		let span = OpSpan::new(KIND, "load");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span.instrument(self.fetch_items(now)).await;

		match result {
			Ok(items) => {
				obs::record_op_outcome(KIND, OpOutcome::Success);

				self.items = items;
				self.last_error = None;
			},
			Err(err) => {
				obs::record_op_outcome(KIND, OpOutcome::Failure);
				tracing::error!(error = %err, path = %self.settings.path, "failed to load list");

				self.items = Vec::new();
				self.last_error = Some(self.settings.load_error_message.clone());
			},
		}

		self.view()
	}

	async fn fetch_items(&self, now: OffsetDateTime) -> Result<Vec<I>> {
		let ListSettings { path, cache_key, cache_ttl, .. } = &self.settings;

		if let Some(data) = cache::read_fresh(self.session.as_ref(), cache_key, now, *cache_ttl) {
			let cached: Result<Vec<I>, _> = serde_path_to_error::deserialize(data);

			match cached {
				Ok(items) => {
					tracing::debug!(count = items.len(), "list served from cache");

					return Ok(items);
				},
				Err(err) => tracing::debug!(error = %err, "cached list has an unexpected shape"),
			}
		}

		let response = self.sender.send(ApiRequest::get(path.as_str())).await?;
		let data: serde_json::Value =
			response.json().map_err(|source| Error::Decode { source })?;
		let items: Vec<I> = serde_path_to_error::deserialize(data.clone())
			.map_err(|source| Error::Decode { source })?;

		cache::write(self.session.as_ref(), cache_key, now, data);

		Ok(items)
	}

	/// Renders the current page of the filtered list without loading.
	pub fn view(&self) -> PageView<I> {
		let filtered = page::filter_items(&self.items, &self.query);

		page::paginate(&filtered, self.current_page, self.settings.page_size)
	}

	/// Applies a case-insensitive filter. The current page is kept, so a short result can leave
	/// it empty until the caller navigates.
	pub fn filter(&mut self, query: impl Into<String>) -> PageView<I> {
		self.query = query.into();

		self.view()
	}

	/// Moves to the 1-based `page` and reloads (the cache normally answers).
	pub async fn go_to_page(&mut self, page: usize) -> PageView<I> {
		self.current_page = page.max(1);

		self.load().await
	}

	/// Drops the cached payload so the next load hits the network.
	pub fn invalidate(&self) {
		self.session.remove_item(&self.settings.cache_key);
	}

	/// Handles a push notification: the payload is ignored, the cache is dropped, and the list
	/// reloads.
	pub async fn on_push(&mut self, message: &PushMessage) -> PageView<I> {
		tracing::info!(bytes = message.payload().len(), "list update pushed; reloading");

		self.invalidate();

		self.load().await
	}

	/// Reloads on every message from `source` until it closes.
	pub async fn listen<S>(&mut self, source: &mut S) -> Result<(), PushError>
	where
		S: ?Sized + PushSource,
	{
		while let Some(message) = source.next_message().await? {
			self.on_push(&message).await;
		}

		tracing::info!("push channel closed");

		Ok(())
	}

	/// Resolves a user selection against the loaded items.
	///
	/// Fails with [`Error::InvalidSelection`] when nothing is selected or the text matches no item.
	pub fn select(&self, selection: Option<&str>) -> Result<&I> {
		let selection = selection.map(str::trim).filter(|s| !s.is_empty());
		let item = selection
			.and_then(|s| self.items.iter().find(|item| item.search_text() == s))
			.ok_or(Error::InvalidSelection)?;

		tracing::info!(selection = item.search_text(), "prompt selected");

		Ok(item)
	}
}
impl<I> Debug for ListController<I>
where
	I: ListItem,
{
	fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
		f.debug_struct("ListController")
			.field("settings", &self.settings)
			.field("items", &self.items.len())
			.field("query", &self.query)
			.field("current_page", &self.current_page)
			.field("last_error", &self.last_error)
			.finish()
	}
}
