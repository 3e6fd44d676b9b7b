//! Client-level error types shared across authentication, transport, and admin calls.

// self
use crate::{_prelude::*, api_error::ApiError};

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem, raised before any network activity.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS) surfaced unchanged once retries are exhausted.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Token endpoint rejected a login.
	#[error(transparent)]
	AuthEndpoint(#[from] AuthEndpointError),
	/// Admin API returned a classified non-2xx response.
	#[error(transparent)]
	Api(#[from] ApiError),
	/// Client assertion could not be produced.
	#[error(transparent)]
	Signing(#[from] SigningError),

	/// A successful response body did not match the expected shape.
	#[error("Response body with status {status} could not be decoded.")]
	Decode {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the response.
		status: u16,
	},
}
impl Error {
	/// Returns the classified admin API error, if this is one.
	pub fn api_error(&self) -> Option<&ApiError> {
		match self {
			Self::Api(e) => Some(e),
			_ => None,
		}
	}

	/// Returns true when the error is a 404 [`ApiError`].
	pub fn is_not_found(&self) -> bool {
		self.api_error().is_some_and(ApiError::is_not_found)
	}

	/// Returns true when the error is a 409 [`ApiError`].
	pub fn is_conflict(&self) -> bool {
		self.api_error().is_some_and(ApiError::is_conflict)
	}
}

/// Configuration and validation failures raised while constructing a client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// The server URL was empty.
	#[error("A Keycloak server URL is required.")]
	MissingUrl,
	/// The server or admin URL could not be parsed.
	#[error("The {field} `{value}` is not a valid URL.")]
	InvalidUrl {
		/// Which configuration field failed validation.
		field: &'static str,
		/// Offending value.
		value: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// The URL parsed but cannot be used as an HTTP base.
	#[error("The {field} `{value}` must be an absolute http(s) URL.")]
	UnsupportedScheme {
		/// Which configuration field failed validation.
		field: &'static str,
		/// Offending value.
		value: String,
	},
	/// The client identifier was empty.
	#[error("A client id is required.")]
	MissingClientId,
	/// Neither a pre-supplied token nor a grant could be resolved.
	#[error(
		"An authentication method is required: configure a password grant, a client secret, JWT client authentication, or an access token."
	)]
	MissingAuthMethod,
	/// An additional header has an invalid name or value.
	#[error("Header `{name}` is not a valid HTTP header.")]
	InvalidHeader {
		/// Header name as configured.
		name: String,
	},
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

/// Transport-level failures (network, IO, request construction).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling {url}.")]
	Network {
		/// Request URL (without query).
		url: String,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The request could not be handed to the HTTP client.
	#[error("Request could not be built: {reason}.")]
	InvalidRequest {
		/// Human-readable reason.
		reason: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(url: &Url, src: impl 'static + Send + Sync + std::error::Error) -> Self {
		let mut url = url.clone();

		url.set_query(None);

		Self::Network { url: url.into(), source: Box::new(src) }
	}

	/// Returns true when the failure happened on the wire and may be retried.
	pub fn is_network(&self) -> bool {
		matches!(self, Self::Network { .. })
	}
}

/// Non-200 response from the OpenID Connect token endpoint.
#[derive(Debug, ThisError)]
#[error("Token endpoint {url} responded with status {status}.")]
pub struct AuthEndpointError {
	/// HTTP status code returned by the token endpoint.
	pub status: u16,
	/// Token endpoint URL.
	pub url: String,
	/// Truncated response body for diagnostics.
	pub body_preview: String,
}
impl AuthEndpointError {
	const BODY_PREVIEW_LIMIT: usize = 256;

	pub(crate) fn new(status: u16, url: &Url, body: &[u8]) -> Self {
		Self { status, url: url.to_string(), body_preview: truncate_preview(body) }
	}
}

/// Failures while resolving or signing a JWT client assertion.
#[derive(Debug, ThisError)]
pub enum SigningError {
	/// The configured algorithm is not RSA, ECDSA, or Ed25519 based.
	#[error("Unsupported signing method: {0}.")]
	UnsupportedAlgorithm(String),
	/// The PEM signing key does not match the algorithm family.
	#[error("Signing key is not a valid {family} private key.")]
	InvalidKey {
		/// Key family label.
		family: &'static str,
		/// Underlying key parsing failure.
		#[source]
		source: BoxError,
	},
	/// JWT client authentication was selected without a signing key.
	#[error("No signing key is configured for JWT client authentication.")]
	MissingKey,
	/// The pre-signed token file could not be read.
	#[error("Failed to read JWT token from file `{path}`.")]
	TokenFile {
		/// File path as configured.
		path: String,
		/// Underlying IO failure.
		#[source]
		source: std::io::Error,
	},
	/// Encoding the signed assertion failed.
	#[error("Failed to create signed JWT.")]
	Encode(#[source] jsonwebtoken::errors::Error),
	/// Producing the P-521 signature failed.
	#[error("Failed to create signed JWT.")]
	Sign(#[source] p521::ecdsa::Error),
}

fn truncate_preview(body: &[u8]) -> String {
	let text = String::from_utf8_lossy(body);

	if text.chars().count() <= AuthEndpointError::BODY_PREVIEW_LIMIT {
		return text.into_owned();
	}

	let mut buf = text.chars().take(AuthEndpointError::BODY_PREVIEW_LIMIT).collect::<String>();

	buf.push('…');

	buf
}
