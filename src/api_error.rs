//! Classification of non-2xx admin API responses.
//!
//! Keycloak is inconsistent about error bodies: some endpoints return an `ErrorRepresentation`
//! with `errorMessage`, others a bare `{"error": "..."}`, and proxies in front of it return plain
//! text or HTML. [`parse`] tries each shape in that order before falling back to the status text.

// crates.io
use http::StatusCode;
// self
use crate::{_prelude::*, transport::RawResponse};

/// Bodies at or above this size are never copied into the error message.
pub const BODY_MESSAGE_LIMIT: usize = 1024;

/// Classified admin API failure.
#[derive(Clone, Debug, ThisError)]
#[error("{message}")]
pub struct ApiError {
	/// HTTP status code.
	pub status: u16,
	/// Human-readable message extracted from the body or derived from the status.
	pub message: String,
	/// Raw response body.
	pub body: Vec<u8>,
	response: Option<Box<RawResponse>>,
}
impl ApiError {
	/// Returns the response that produced this error, when it was attached.
	pub fn response(&self) -> Option<&RawResponse> {
		self.response.as_deref()
	}

	/// Returns true for 4xx statuses.
	pub fn is_client_error(&self) -> bool {
		(400..500).contains(&self.status)
	}

	/// Returns true for 5xx statuses.
	pub fn is_server_error(&self) -> bool {
		(500..600).contains(&self.status)
	}

	/// Returns true for 404 Not Found.
	pub fn is_not_found(&self) -> bool {
		self.status == StatusCode::NOT_FOUND.as_u16()
	}

	/// Returns true for 409 Conflict.
	pub fn is_conflict(&self) -> bool {
		self.status == StatusCode::CONFLICT.as_u16()
	}

	fn with_response(mut self, response: RawResponse) -> Self {
		self.response = Some(Box::new(response));

		self
	}
}

#[derive(Deserialize)]
struct ErrorRepresentation {
	#[serde(rename = "errorMessage")]
	error_message: Option<String>,
}

#[derive(Deserialize)]
struct SimpleError {
	#[serde(default)]
	error: String,
}

/// Builds an [`ApiError`] from a status code and body.
pub fn parse(status: u16, body: &[u8]) -> ApiError {
	let message = serde_json::from_slice::<ErrorRepresentation>(body)
		.ok()
		.and_then(|rep| rep.error_message)
		.or_else(|| {
			serde_json::from_slice::<SimpleError>(body)
				.ok()
				.map(|simple| simple.error)
				.filter(|error| !error.is_empty())
		})
		.unwrap_or_else(|| fallback_message(status, body));

	ApiError { status, message, body: body.to_vec(), response: None }
}

/// Returns `None` for 2xx statuses and a parsed [`ApiError`] otherwise.
pub fn classify(status: u16, body: &[u8]) -> Option<ApiError> {
	if (200..300).contains(&status) { None } else { Some(parse(status, body)) }
}

/// Classifies a response, attaching it to the resulting error.
pub fn check_response(response: &RawResponse) -> Result<(), ApiError> {
	match classify(response.status(), response.body()) {
		Some(err) => Err(err.with_response(response.clone())),
		None => Ok(()),
	}
}

/// Returns true when `err` (or any error in its source chain) is a 404 [`ApiError`].
pub fn is_not_found(err: &(dyn StdError + 'static)) -> bool {
	find_api_error(err).is_some_and(ApiError::is_not_found)
}

/// Returns true when `err` (or any error in its source chain) is a 409 [`ApiError`].
pub fn is_conflict(err: &(dyn StdError + 'static)) -> bool {
	find_api_error(err).is_some_and(ApiError::is_conflict)
}

/// Returns true when `err` (or any error in its source chain) is a 4xx [`ApiError`].
pub fn is_client_error(err: &(dyn StdError + 'static)) -> bool {
	find_api_error(err).is_some_and(ApiError::is_client_error)
}

/// Returns true when `err` (or any error in its source chain) is a 5xx [`ApiError`].
pub fn is_server_error(err: &(dyn StdError + 'static)) -> bool {
	find_api_error(err).is_some_and(ApiError::is_server_error)
}

/// Walks the source chain looking for an [`ApiError`].
///
/// [`Error::Api`] is transparent, so its `source()` skips the inner error; it is unwrapped
/// explicitly.
pub fn find_api_error<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a ApiError> {
	let mut current = Some(err);

	while let Some(err) = current {
		if let Some(api) = err.downcast_ref::<ApiError>() {
			return Some(api);
		}
		if let Some(Error::Api(api)) = err.downcast_ref::<Error>() {
			return Some(api);
		}

		current = err.source();
	}

	None
}

fn fallback_message(status: u16, body: &[u8]) -> String {
	let mut message = StatusCode::from_u16(status)
		.ok()
		.and_then(|code| code.canonical_reason())
		.map(str::to_owned)
		.unwrap_or_else(|| format!("HTTP {status}"));

	if !body.is_empty() && body.len() < BODY_MESSAGE_LIMIT {
		message.push_str(": ");
		message.push_str(&String::from_utf8_lossy(body));
	}

	message
}
