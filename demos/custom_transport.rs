//! Drives the client over a hand-written transport instead of reqwest.
//!
//! 1. Implement [`HttpTransport`] and answer every request with a [`RawResponse`].
//! 2. Hand the transport to [`KeycloakClient::with_transport`]; retries and reauthentication are
//!    layered on top of it.
//! 3. Use the typed helpers, or [`RequestDoer::execute`] for anything they do not cover.

// std
use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};
// crates.io
use color_eyre::Result;
// self
use keycloak_admin_client::{
	ClientConfig, KeycloakClient, RequestDoer,
	http::{HeaderMap, Method, header::AUTHORIZATION},
	transport::{ApiRequest, HttpTransport, RawResponse, TransportFuture},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let transport = Arc::new(InMemoryKeycloak::default());
	let config = ClientConfig::new("https://keycloak.internal", "realm-operator")
		.with_client_secret("demo-secret")
		.with_user_agent("custom-transport-demo/0.1");
	let client = KeycloakClient::with_transport(&config, transport.clone())?;
	let info = client.server_info().get().await?.into_value().unwrap_or_default();

	println!("Connected to Keycloak {}.", info.system_info.version);

	// The in-memory server rejects the first token once it rotated; the client refreshes and
	// replays the call without the caller noticing.
	transport.rotate();

	let realm = client.realms().get("master").await?;

	println!(
		"Realm lookup returned {} after {} token requests.",
		realm.status(),
		transport.token_calls.load(Ordering::SeqCst),
	);

	let raw = client
		.execute(ApiRequest::new(
			Method::GET,
			client.admin_base().join("admin/realms/master/clients")?,
		))
		.await?;

	println!("Raw clients call answered {} with {} bytes.", raw.status(), raw.body().len());

	Ok(())
}

#[derive(Default)]
struct InMemoryKeycloak {
	token_calls: AtomicUsize,
	generation: AtomicUsize,
}
impl InMemoryKeycloak {
	fn rotate(&self) {
		self.generation.fetch_add(1, Ordering::SeqCst);
	}

	fn current_token(&self) -> String {
		format!("demo-token-{}", self.generation.load(Ordering::SeqCst))
	}
}
impl HttpTransport for InMemoryKeycloak {
	fn send(&self, request: ApiRequest) -> TransportFuture<'_> {
		let response = if request.url.path().ends_with("/protocol/openid-connect/token") {
			self.token_calls.fetch_add(1, Ordering::SeqCst);

			reply(200, format!(r#"{{"access_token":"{}","token_type":"Bearer"}}"#, self.current_token()))
		} else {
			let expected = format!("Bearer {}", self.current_token());
			let presented = request.headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());

			match (presented == Some(expected.as_str()), request.url.path()) {
				(false, _) => reply(401, r#"{"error":"HTTP 401 Unauthorized"}"#.into()),
				(true, "/admin/serverinfo") => reply(200, r#"{"systemInfo":{"version":"26.0.5"}}"#.into()),
				(true, "/admin/realms/master") => reply(200, r#"{"realm":"master","enabled":true}"#.into()),
				(true, _) => reply(200, "[]".into()),
			}
		};

		Box::pin(async move { Ok(response) })
	}
}

fn reply(status: u16, body: String) -> RawResponse {
	RawResponse::new(status, HeaderMap::new(), body.into_bytes())
}
