//! Transport-level retry policy.
//!
//! Retries here are independent of reauthentication: they cover network failures, throttling,
//! and transient server errors. 4xx responses other than 429 always pass straight through so the
//! caller (or [`KeycloakClient`](crate::client::KeycloakClient)) can react to them.

// self
use crate::{
	_prelude::*,
	obs,
	transport::{ApiRequest, HttpTransport, RawResponse, TransportFuture},
};

/// Outcome of a single transport attempt, as seen by [`RetryPolicy::should_retry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttemptOutcome {
	/// The server answered with this status code.
	Status(u16),
	/// The request failed before a response was received.
	NetworkError,
}

/// Bounded retry configuration with a capped, jittered exponential backoff.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
	/// Maximum number of retries after the first attempt (default 5).
	pub max_retries: u32,
	/// Base wait before the first retry (default 1 second).
	pub min_wait: Duration,
	/// Ceiling for any single wait, including `Retry-After` hints (default 60 seconds).
	pub max_wait: Duration,
}
impl RetryPolicy {
	/// Policy that never retries.
	pub const fn disabled() -> Self {
		Self { max_retries: 0, min_wait: Duration::ZERO, max_wait: Duration::ZERO }
	}

	/// Returns true when the attempt should be repeated.
	///
	/// Network errors, status 0, 429, and every 5xx except 501 are considered transient.
	pub fn should_retry(outcome: AttemptOutcome) -> bool {
		match outcome {
			AttemptOutcome::NetworkError => true,
			AttemptOutcome::Status(0 | 429) => true,
			AttemptOutcome::Status(501) => false,
			AttemptOutcome::Status(status) => status >= 500,
		}
	}

	/// Wait before retry number `attempt` (zero based).
	pub fn backoff(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
		if let Some(hint) = retry_after {
			return hint.min(self.max_wait);
		}

		let ceiling = self
			.min_wait
			.checked_mul(2_u32.saturating_pow(attempt))
			.unwrap_or(self.max_wait)
			.min(self.max_wait);
		let half = ceiling / 2;

		if half.is_zero() {
			return ceiling;
		}

		half + rand::random_range(Duration::ZERO..=half)
	}
}
impl Default for RetryPolicy {
	fn default() -> Self {
		Self { max_retries: 5, min_wait: Duration::from_secs(1), max_wait: Duration::from_secs(60) }
	}
}

/// Applies a [`RetryPolicy`] on top of any [`HttpTransport`].
#[derive(Debug)]
pub struct RetryingTransport<T>
where
	T: ?Sized + HttpTransport,
{
	inner: Arc<T>,
	policy: RetryPolicy,
}
impl<T> RetryingTransport<T>
where
	T: ?Sized + HttpTransport,
{
	/// Wraps `inner` with `policy`.
	pub fn new(inner: Arc<T>, policy: RetryPolicy) -> Self {
		Self { inner, policy }
	}

	/// Returns the wrapped transport.
	pub fn inner(&self) -> &Arc<T> {
		&self.inner
	}

	/// Returns the active policy.
	pub fn policy(&self) -> RetryPolicy {
		self.policy
	}

	async fn send_with_retries(&self, request: ApiRequest) -> Result<RawResponse, crate::error::TransportError> {
		let mut attempt = 0;

		loop {
			let result = self.inner.send(request.clone()).await;
			let outcome = match &result {
				Ok(response) => AttemptOutcome::Status(response.status()),
				Err(e) if e.is_network() => AttemptOutcome::NetworkError,
				Err(_) => return result,
			};

			if attempt >= self.policy.max_retries || !RetryPolicy::should_retry(outcome) {
				return result;
			}

			let retry_after = result.as_ref().ok().and_then(RawResponse::retry_after);
			let wait = self.policy.backoff(attempt, retry_after);

			obs::debug_event!(
				method = %request.method,
				url = %request.url,
				?outcome,
				attempt = attempt + 1,
				wait_ms = wait.as_millis() as u64,
				"Retrying transient failure."
			);

			obs::record_retry(outcome);
			drop(result);
			tokio::time::sleep(wait).await;

			attempt += 1;
		}
	}
}
impl<T> Clone for RetryingTransport<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self { inner: self.inner.clone(), policy: self.policy }
	}
}
impl<T> HttpTransport for RetryingTransport<T>
where
	T: ?Sized + HttpTransport,
{
	fn send(&self, request: ApiRequest) -> TransportFuture<'_> {
		Box::pin(self.send_with_retries(request))
	}
}
