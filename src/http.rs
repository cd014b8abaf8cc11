//! Request/response models and the transport seam.
//!
//! [`HttpTransport`] is the client's only dependency on an HTTP stack. The client prepares an
//! [`OutboundRequest`] (absolute URL, final headers, body) and hands it to the transport, which
//! reports either a response of any status or a [`TransportError`] when no response arrived.
//! Status classification happens above the transport, so custom transports stay trivial.

// self
use crate::{_prelude::*, error::TransportError};

/// Header carrying the per-request correlation identifier.
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";
/// Header carrying the bearer credential.
pub const AUTHORIZATION_HEADER: &str = "Authorization";
/// Header describing the body encoding.
pub const CONTENT_TYPE_HEADER: &str = "Content-Type";
/// Default body encoding.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<ApiResponse, TransportError>> + 'a + Send>>;

/// Executes prepared requests.
///
/// Implementations must return `Ok` for every response that arrived, whatever its status, and
/// reserve `Err` for failures where no response exists (connect, TLS, timeout, body read).
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and resolves with the raw response.
	fn execute(&self, request: OutboundRequest) -> TransportFuture<'_>;
}

/// HTTP methods used by the API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
	/// `GET`.
	Get,
	/// `POST`.
	Post,
	/// `PUT`.
	Put,
	/// `PATCH`.
	Patch,
	/// `DELETE`.
	Delete,
}
impl Method {
	/// Returns the canonical method token.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Put => "PUT",
			Method::Patch => "PATCH",
			Method::Delete => "DELETE",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Request payload.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum RequestBody {
	/// No body.
	#[default]
	Empty,
	/// JSON document (the default encoding).
	Json(serde_json::Value),
	/// Multipart upload; the transport owns the boundary-aware content type.
	Multipart(MultipartForm),
}
impl RequestBody {
	/// Serializes `value` into a JSON body.
	pub fn json<T>(value: &T) -> Result<Self, serde_json::Error>
	where
		T: ?Sized + Serialize,
	{
		serde_json::to_value(value).map(Self::Json)
	}

	/// Returns `true` for multipart uploads.
	pub fn is_multipart(&self) -> bool {
		matches!(self, Self::Multipart(_))
	}
}

/// Ordered multipart form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MultipartForm {
	/// Form parts in submission order.
	pub parts: Vec<MultipartPart>,
}
impl MultipartForm {
	/// Creates an empty form.
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends a text field.
	pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.parts
			.push(MultipartPart { name: name.into(), content: PartContent::Text(value.into()) });

		self
	}

	/// Appends a file field.
	pub fn file(
		mut self,
		name: impl Into<String>,
		file_name: impl Into<String>,
		bytes: impl Into<Vec<u8>>,
		mime: Option<&str>,
	) -> Self {
		self.parts.push(MultipartPart {
			name: name.into(),
			content: PartContent::File {
				file_name: file_name.into(),
				bytes: bytes.into(),
				mime: mime.map(str::to_owned),
			},
		});

		self
	}
}

/// Single multipart field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultipartPart {
	/// Field name.
	pub name: String,
	/// Field content.
	pub content: PartContent,
}

/// Multipart field content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PartContent {
	/// Plain text value.
	Text(String),
	/// Binary file.
	File {
		/// File name reported to the server.
		file_name: String,
		/// File contents.
		bytes: Vec<u8>,
		/// Optional MIME type.
		mime: Option<String>,
	},
}

/// Caller-facing request description.
///
/// `retry` is the retry marker: it is set by the client when the request is replayed after a
/// token refresh, and a request carrying it never triggers another refresh.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: Method,
	/// Path relative to the configured base URL, or an absolute URL.
	pub path: String,
	/// Caller-supplied headers.
	pub headers: BTreeMap<String, String>,
	/// Payload.
	pub body: RequestBody,
	/// Retry marker.
	pub retry: bool,
}
impl ApiRequest {
	/// Creates a request with no headers and no body.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self {
			method,
			path: path.into(),
			headers: BTreeMap::new(),
			body: RequestBody::Empty,
			retry: false,
		}
	}

	/// Shorthand for a `GET` request.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::Get, path)
	}

	/// Shorthand for a `POST` request.
	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::Post, path)
	}

	/// Adds or replaces a header.
	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.insert(name.into(), value.into());

		self
	}

	/// Replaces the body.
	pub fn body(mut self, body: RequestBody) -> Self {
		self.body = body;

		self
	}

	/// Serializes `value` as the JSON body.
	pub fn json<T>(self, value: &T) -> Result<Self, serde_json::Error>
	where
		T: ?Sized + Serialize,
	{
		Ok(self.body(RequestBody::json(value)?))
	}

	/// Uses `form` as a multipart body.
	pub fn multipart(self, form: MultipartForm) -> Self {
		self.body(RequestBody::Multipart(form))
	}
}

/// Fully prepared request handed to an [`HttpTransport`].
#[derive(Clone, Debug, PartialEq)]
pub struct OutboundRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute URL.
	pub url: Url,
	/// Final header set.
	pub headers: BTreeMap<String, String>,
	/// Payload.
	pub body: RequestBody,
	/// Retry marker copied from the originating [`ApiRequest`].
	pub retry: bool,
}
impl OutboundRequest {
	/// Case-insensitive header lookup.
	pub fn header(&self, name: &str) -> Option<&str> {
		header_value(&self.headers, name)
	}
}

/// Raw response received from the API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response headers with lowercase names.
	pub headers: BTreeMap<String, String>,
	/// Response body.
	pub body: Vec<u8>,
}
impl ApiResponse {
	/// Creates a response, lowercasing header names.
	pub fn new(status: u16, headers: BTreeMap<String, String>, body: Vec<u8>) -> Self {
		let headers = headers.into_iter().map(|(k, v)| (k.to_ascii_lowercase(), v)).collect();

		Self { status, headers, body }
	}

	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Returns `true` for statuses that signal rejected credentials.
	pub fn is_auth_failure(&self) -> bool {
		self.status == 401
	}

	/// Case-insensitive header lookup.
	pub fn header(&self, name: &str) -> Option<&str> {
		header_value(&self.headers, name)
	}

	/// Decodes the body as JSON, reporting the failing path on error.
	pub fn json<T>(&self) -> Result<T, serde_path_to_error::Error<serde_json::Error>>
	where
		T: for<'de> Deserialize<'de>,
	{
		let mut de = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut de)
	}

	/// Extracts the top-level `message` field from a JSON body, if present.
	pub fn server_message(&self) -> Option<String> {
		#[derive(Deserialize)]
		struct Envelope {
			message: Option<String>,
		}

		serde_json::from_slice::<Envelope>(&self.body)
			.ok()
			.and_then(|envelope| envelope.message)
			.filter(|message| !message.trim().is_empty())
	}

	/// Converts a non-2xx response into the matching error.
	pub fn error_for_status(self) -> Result<Self> {
		if self.is_success() {
			return Ok(self);
		}

		let message = self.server_message();

		if self.is_auth_failure() {
			Err(Error::AuthExpired { status: self.status, message })
		} else {
			Err(Error::HttpStatus { status: self.status, message })
		}
	}
}

fn header_value<'a>(headers: &'a BTreeMap<String, String>, name: &str) -> Option<&'a str> {
	headers.iter().find(|(key, _)| key.eq_ignore_ascii_case(name)).map(|(_, value)| value.as_str())
}

/// Reqwest-backed transport with a fixed total timeout.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Builds a transport whose calls time out after `timeout`.
	pub fn with_timeout(timeout: StdDuration) -> Result<Self, crate::error::ConfigError> {
		let client = ReqwestClient::builder().timeout(timeout).build()?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	fn build(&self, request: OutboundRequest) -> Result<reqwest::RequestBuilder, TransportError> {
		let method = match request.method {
			Method::Get => reqwest::Method::GET,
			Method::Post => reqwest::Method::POST,
			Method::Put => reqwest::Method::PUT,
			Method::Patch => reqwest::Method::PATCH,
			Method::Delete => reqwest::Method::DELETE,
		};
		let mut builder = self.0.request(method, request.url);

		for (name, value) in &request.headers {
			builder = builder.header(name.as_str(), value.as_str());
		}

		builder = match request.body {
			RequestBody::Empty => builder,
			RequestBody::Json(value) =>
				builder.body(serde_json::to_vec(&value).map_err(TransportError::network)?),
			RequestBody::Multipart(form) => builder.multipart(multipart_form(form)?),
		};

		Ok(builder)
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn execute(&self, request: OutboundRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			let response = self.build(request)?.send().await?;
			let status = response.status().as_u16();
			let headers = response
				.headers()
				.iter()
				.filter_map(|(name, value)| {
					value.to_str().ok().map(|value| (name.as_str().to_owned(), value.to_owned()))
				})
				.collect();
			let body = response.bytes().await?.to_vec();

			Ok(ApiResponse::new(status, headers, body))
		})
	}
}

#[cfg(feature = "reqwest")]
fn multipart_form(form: MultipartForm) -> Result<reqwest::multipart::Form, TransportError> {
	use reqwest::multipart::{Form, Part};

	let mut out = Form::new();

	for part in form.parts {
		out = match part.content {
			PartContent::Text(value) => out.text(part.name, value),
			PartContent::File { file_name, bytes, mime } => {
				let mut file = Part::bytes(bytes).file_name(file_name);

				if let Some(mime) = mime {
					file = file.mime_str(&mime)?;
				}

				out.part(part.name, file)
			},
		};
	}

	Ok(out)
}
