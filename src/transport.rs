//! Transport primitives for admin API and token endpoint calls.
//!
//! [`HttpTransport`] is the crate's only dependency on an HTTP stack. It executes a fully prepared
//! [`ApiRequest`] and hands back a [`RawResponse`] for every status, success or failure, so that
//! callers can always inspect headers such as `Location`. [`ReqwestTransport`] is the production
//! implementation; tests plug in deterministic fakes.

// crates.io
use http::{
	HeaderMap, HeaderName, HeaderValue, Method,
	header::{CONTENT_TYPE, LOCATION, RETRY_AFTER},
};
use percent_encoding::percent_decode_str;
use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, error::TransportError};
#[cfg(feature = "reqwest")] use crate::{config::ClientConfig, error::ConfigError};

/// Boxed future returned by [`HttpTransport::send`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<RawResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of executing a prepared request.
///
/// Implementations must not retry, follow authentication challenges, or inspect the status code;
/// those concerns live in [`RetryingTransport`](crate::retry::RetryingTransport) and
/// [`KeycloakClient`](crate::client::KeycloakClient).
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` once and returns the raw response.
	fn send(&self, request: ApiRequest) -> TransportFuture<'_>;
}
impl<T> HttpTransport for Arc<T>
where
	T: ?Sized + HttpTransport,
{
	fn send(&self, request: ApiRequest) -> TransportFuture<'_> {
		(**self).send(request)
	}
}

/// A fully prepared request.
///
/// Bodies are owned buffers, so a request can be replayed byte-for-byte after a reauthentication.
#[derive(Clone, Debug)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute request URL.
	pub url: Url,
	/// Request headers.
	pub headers: HeaderMap,
	/// Optional request body.
	pub body: Option<Vec<u8>>,
	/// Per-attempt deadline overriding the client timeout.
	pub timeout: Option<Duration>,
}
impl ApiRequest {
	/// Creates a request without headers or body.
	pub fn new(method: Method, url: Url) -> Self {
		Self { method, url, headers: HeaderMap::new(), body: None, timeout: None }
	}

	/// Shorthand for a `GET` request.
	pub fn get(url: Url) -> Self {
		Self::new(Method::GET, url)
	}

	/// Shorthand for a `DELETE` request.
	pub fn delete(url: Url) -> Self {
		Self::new(Method::DELETE, url)
	}

	/// Sets a header, replacing any previous value.
	pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(name, value);

		self
	}

	/// Sets a raw body along with its content type.
	pub fn body(mut self, content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
		self.headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
		self.body = Some(body.into());

		self
	}

	/// Serializes `value` as the JSON body.
	pub fn json<T>(self, value: &T) -> Result<Self, TransportError>
	where
		T: ?Sized + Serialize,
	{
		let body = serde_json::to_vec(value)
			.map_err(|e| TransportError::InvalidRequest { reason: e.to_string() })?;

		Ok(self.body("application/json", body))
	}

	/// Sets a per-attempt deadline.
	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout = Some(timeout);

		self
	}
}

/// Status, headers, and body of a completed exchange.
#[derive(Clone, Debug, Default)]
pub struct RawResponse {
	status: u16,
	headers: HeaderMap,
	body: Vec<u8>,
}
impl RawResponse {
	/// Assembles a response from its parts.
	pub fn new(status: u16, headers: HeaderMap, body: Vec<u8>) -> Self {
		Self { status, headers, body }
	}

	/// HTTP status code.
	pub fn status(&self) -> u16 {
		self.status
	}

	/// Response headers.
	pub fn headers(&self) -> &HeaderMap {
		&self.headers
	}

	/// Raw response body.
	pub fn body(&self) -> &[u8] {
		&self.body
	}

	/// Returns true for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Returns the `Location` header, if present and valid UTF-8.
	pub fn location(&self) -> Option<&str> {
		self.headers.get(LOCATION).and_then(|value| value.to_str().ok())
	}

	/// Identifier of a created resource, taken from the `Location` header.
	///
	/// Returns an empty string when the header is absent or has no trailing segment.
	pub fn resource_id(&self) -> String {
		self.location().map(resource_id_from_location).unwrap_or_default()
	}

	/// Returns the `Retry-After` hint as a relative duration.
	pub fn retry_after(&self) -> Option<Duration> {
		parse_retry_after(&self.headers)
	}

	/// Decodes the body as JSON, reporting the failing path on mismatch.
	pub fn json<T>(&self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let mut de = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut de)
			.map_err(|source| Error::Decode { source, status: self.status })
	}
}

/// Extracts the trailing path segment of a `Location` header value.
///
/// Absolute and relative URLs are accepted; query strings, fragments, and trailing slashes are
/// ignored. The segment is split on real path separators before percent-decoding, so an encoded
/// `%2F` stays inside the identifier. Returns an empty string when no segment exists.
pub fn resource_id_from_location(location: &str) -> String {
	if location.is_empty() {
		return String::new();
	}

	let Ok(base) = Url::parse("http://location.invalid/") else {
		return String::new();
	};
	let Ok(url) = Url::options().base_url(Some(&base)).parse(location) else {
		return String::new();
	};
	let Some(segment) = url.path().trim_end_matches('/').rsplit('/').next() else {
		return String::new();
	};

	match percent_decode_str(segment).decode_utf8() {
		Ok(decoded) => decoded.into_owned(),
		Err(_) => segment.to_owned(),
	}
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::from_secs(secs));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return delta.try_into().ok();
		}
	}

	None
}

/// Production transport backed by a shared [`ReqwestClient`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	const MAX_IDLE_PER_HOST: usize = 100;

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client honouring the timeout and TLS material of `config`.
	///
	/// Cookies are kept for the lifetime of the client so sticky-session load balancers in front
	/// of Keycloak route the token and admin calls consistently.
	pub fn from_config(config: &ClientConfig) -> Result<Self, ConfigError> {
		let tls = &config.tls;
		let mut builder = ReqwestClient::builder()
			.timeout(config.timeout)
			.cookie_store(true)
			.pool_max_idle_per_host(Self::MAX_IDLE_PER_HOST)
			.danger_accept_invalid_certs(tls.insecure_skip_verify);

		if let Some(ca_cert) = tls.ca_cert.as_deref() {
			builder = builder.add_root_certificate(reqwest::Certificate::from_pem(ca_cert.as_bytes())?);
		}
		if let Some(client_cert) = &tls.client_cert {
			let pem = format!("{}\n{}", client_cert.certificate, client_cert.private_key);

			builder = builder.identity(reqwest::Identity::from_pem(pem.as_bytes())?);
		}

		Ok(Self(builder.build()?))
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn send(&self, request: ApiRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			let ApiRequest { method, url, headers, body, timeout } = request;
			let mut builder = self.0.request(method, url.clone()).headers(headers);

			if let Some(body) = body {
				builder = builder.body(body);
			}
			if let Some(timeout) = timeout {
				builder = builder.timeout(timeout);
			}

			let response = builder.send().await.map_err(|e| map_reqwest_error(&url, e))?;
			let status = response.status().as_u16();
			let headers = response.headers().to_owned();
			let body = response.bytes().await.map_err(|e| map_reqwest_error(&url, e))?;

			Ok(RawResponse::new(status, headers, body.to_vec()))
		})
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(url: &Url, e: ReqwestError) -> TransportError {
	if e.is_builder() {
		TransportError::InvalidRequest { reason: e.to_string() }
	} else {
		TransportError::network(url, e)
	}
}
