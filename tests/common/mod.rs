//! In-memory Keycloak stand-in shared by the integration tests.

#![allow(dead_code)]

// std
use std::{
	collections::VecDeque,
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};
// crates.io
use parking_lot::Mutex;
// self
use keycloak_admin_client::{
	ClientConfig, KeycloakClient,
	http::{HeaderMap, HeaderValue, header::AUTHORIZATION},
	retry::RetryPolicy,
	transport::{ApiRequest, HttpTransport, RawResponse, TransportFuture},
};

pub const BASE_URL: &str = "https://kc.example.com";
pub const TOKEN_PATH: &str = "/realms/master/protocol/openid-connect/token";

/// Issues `token-N` on every token call and only accepts the newest token on admin calls.
///
/// Admin responses can be scripted per call; unscripted calls answer 200 with `{}` when the
/// bearer is current and 401 otherwise.
#[derive(Default)]
pub struct FakeKeycloak {
	pub token_calls: AtomicUsize,
	pub token_requests: Mutex<Vec<ApiRequest>>,
	pub admin_requests: Mutex<Vec<ApiRequest>>,
	token_statuses: Mutex<VecDeque<u16>>,
	admin_script: Mutex<VecDeque<RawResponse>>,
	valid_token: Mutex<Option<String>>,
	token_delay: Duration,
}
impl FakeKeycloak {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn with_token_delay(delay: Duration) -> Arc<Self> {
		Arc::new(Self { token_delay: delay, ..Default::default() })
	}

	/// Accepts `token` without ever issuing it, as for a pre-supplied token.
	pub fn accepting(token: &str) -> Arc<Self> {
		let fake = Self::default();

		*fake.valid_token.lock() = Some(token.to_owned());

		Arc::new(fake)
	}

	/// Makes every previously issued token invalid.
	pub fn revoke(&self) {
		*self.valid_token.lock() = None;
	}

	/// Queues statuses for the next token calls; 200 afterwards.
	pub fn script_token_statuses(&self, statuses: impl IntoIterator<Item = u16>) {
		self.token_statuses.lock().extend(statuses);
	}

	/// Queues responses for the next admin calls, regardless of the bearer.
	pub fn script_admin(&self, responses: impl IntoIterator<Item = RawResponse>) {
		self.admin_script.lock().extend(responses);
	}

	pub fn token_calls(&self) -> usize {
		self.token_calls.load(Ordering::SeqCst)
	}

	pub fn admin_calls(&self) -> usize {
		self.admin_requests.lock().len()
	}

	pub fn admin_authorizations(&self) -> Vec<String> {
		self.admin_requests.lock().iter().map(authorization).collect()
	}

	fn issue(&self, request: ApiRequest) -> TransportFuture<'_> {
		let n = self.token_calls.fetch_add(1, Ordering::SeqCst) + 1;
		let status = self.token_statuses.lock().pop_front().unwrap_or(200);

		self.token_requests.lock().push(request);

		let response = if status == 200 {
			let token = format!("token-{n}");

			*self.valid_token.lock() = Some(token.clone());

			json(
				200,
				&format!(
					r#"{{"access_token":"{token}","refresh_token":"refresh-{n}","token_type":"Bearer"}}"#
				),
			)
		} else {
			json(status, r#"{"error":"invalid_grant"}"#)
		};
		let delay = self.token_delay;

		Box::pin(async move {
			if !delay.is_zero() {
				tokio::time::sleep(delay).await;
			}

			Ok(response)
		})
	}

	fn admin(&self, request: ApiRequest) -> TransportFuture<'_> {
		let scripted = self.admin_script.lock().pop_front();
		let response = scripted.unwrap_or_else(|| {
			let current = self.valid_token.lock().clone();
			let presented = authorization(&request);
			let accepted = current.is_some_and(|token| {
				presented.eq_ignore_ascii_case(&format!("bearer {token}"))
			});

			if accepted { json(200, "{}") } else { json(401, r#"{"error":"HTTP 401 Unauthorized"}"#) }
		});

		self.admin_requests.lock().push(request);

		Box::pin(async move { Ok(response) })
	}
}
impl HttpTransport for FakeKeycloak {
	fn send(&self, request: ApiRequest) -> TransportFuture<'_> {
		if request.url.path() == TOKEN_PATH { self.issue(request) } else { self.admin(request) }
	}
}

pub fn json(status: u16, body: &str) -> RawResponse {
	let mut headers = HeaderMap::new();

	headers.insert("content-type", HeaderValue::from_static("application/json"));

	RawResponse::new(status, headers, body.as_bytes().to_vec())
}

pub fn authorization(request: &ApiRequest) -> String {
	request
		.headers
		.get(AUTHORIZATION)
		.and_then(|value| value.to_str().ok())
		.unwrap_or_default()
		.to_owned()
}

pub fn form(request: &ApiRequest) -> Vec<(String, String)> {
	let body = request.body.as_deref().unwrap_or_default();

	keycloak_admin_client::url::form_urlencoded::parse(body).into_owned().collect()
}

pub fn form_value(request: &ApiRequest, key: &str) -> Option<String> {
	form(request).into_iter().find(|(k, _)| k == key).map(|(_, v)| v)
}

pub fn fast_retries(max_retries: u32) -> RetryPolicy {
	RetryPolicy {
		max_retries,
		min_wait: Duration::from_millis(1),
		max_wait: Duration::from_millis(4),
	}
}

pub fn secret_config() -> ClientConfig {
	ClientConfig::new(BASE_URL, "operator")
		.with_client_secret("operator-secret")
		.with_retry_policy(fast_retries(2))
}

pub fn client(config: &ClientConfig, fake: &Arc<FakeKeycloak>) -> KeycloakClient<FakeKeycloak> {
	KeycloakClient::with_transport(config, fake.clone()).expect("Client should build from a valid config.")
}
