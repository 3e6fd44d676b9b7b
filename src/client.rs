//! Authenticated admin API client.
//!
//! [`KeycloakClient`] runs the per-call state machine:
//!
//! 1. Lazy login on first use, at most once across all clones.
//! 2. Snapshot the access token and send the request through the retrying transport.
//! 3. On 401/403, take the auth guard and refresh only if the token still matches the snapshot, so
//!    concurrent failures share one refresh.
//! 4. Replay the byte-identical request exactly once with the current token and return whatever
//!    comes back.

// crates.io
use http::{
	HeaderMap, HeaderValue, Method,
	header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
};
// self
use crate::{
	_prelude::*,
	admin::{ClientsClient, GroupsClient, RealmsClient, RolesClient, ServerInfoClient, UsersClient},
	auth::{AuthMetrics, Authenticator, CredentialStore, GrantType, TokenSnapshot},
	config::{ClientConfig, Endpoints, ResolvedConfig},
	doer::{DoFuture, RequestDoer},
	error::TransportError,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	retry::RetryingTransport,
	transport::{ApiRequest, HttpTransport, RawResponse},
};
#[cfg(feature = "reqwest")] use crate::transport::ReqwestTransport;

const JSON: &str = "application/json";

/// [`KeycloakClient`] backed by reqwest.
#[cfg(feature = "reqwest")]
pub type ReqwestKeycloakClient = KeycloakClient<ReqwestTransport>;

/// Shared, cheaply clonable admin API client.
pub struct KeycloakClient<T>
where
	T: ?Sized + HttpTransport,
{
	inner: Arc<ClientInner<T>>,
}
impl<T> KeycloakClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Builds a client over a custom transport without touching the network.
	pub fn with_transport(config: &ClientConfig, transport: Arc<T>) -> Result<Self> {
		Ok(Self::from_resolved(config.validate()?, transport))
	}

	/// Builds a client over a custom transport and logs in when `initial_login` is set.
	pub async fn connect_with_transport(
		config: &ClientConfig,
		transport: Arc<T>,
	) -> Result<Self> {
		let client = Self::with_transport(config, transport)?;

		if config.initial_login {
			client.login().await?;
		}

		Ok(client)
	}

	fn from_resolved(resolved: ResolvedConfig, transport: Arc<T>) -> Self {
		let ResolvedConfig { endpoints, credentials, headers, retry } = resolved;
		let authenticator = Authenticator::new(&endpoints, headers.clone());

		Self {
			inner: Arc::new(ClientInner {
				transport: RetryingTransport::new(transport, retry),
				authenticator,
				store: CredentialStore::new(credentials),
				endpoints,
				headers,
			}),
		}
	}

	/// Logs in now, marking the lazy login as done.
	///
	/// A no-op for pre-supplied tokens.
	pub async fn login(&self) -> Result<()> {
		let inner = &self.inner;
		let _guard = inner.store.lock_auth().await;
		let result = inner.authenticator.login(&inner.transport, &inner.store).await;

		inner.store.mark_initialized();

		result
	}

	/// Re-exchanges the configured grant, falling back to a full login on 400.
	pub async fn refresh(&self) -> Result<()> {
		let inner = &self.inner;
		let _guard = inner.store.lock_auth().await;

		inner.authenticator.refresh(&inner.transport, &inner.store).await
	}

	/// Resolved endpoint URLs.
	pub fn endpoints(&self) -> &Endpoints {
		&self.inner.endpoints
	}

	/// Base URL for admin API paths.
	pub fn admin_base(&self) -> &Url {
		&self.inner.endpoints.admin_base
	}

	/// Selected grant.
	pub fn grant(&self) -> GrantType {
		self.inner.store.credentials().grant
	}

	/// Current access token and type.
	pub fn token(&self) -> TokenSnapshot {
		self.inner.store.snapshot()
	}

	/// Token endpoint counters.
	pub fn auth_metrics(&self) -> &AuthMetrics {
		self.inner.authenticator.metrics()
	}

	/// Returns this client as a shareable [`RequestDoer`].
	pub fn doer(&self) -> Arc<dyn RequestDoer> {
		Arc::new(self.clone())
	}

	/// Server info API.
	pub fn server_info(&self) -> ServerInfoClient {
		ServerInfoClient::new(self.doer(), self.admin_base().clone())
	}

	/// Realms API.
	pub fn realms(&self) -> RealmsClient {
		RealmsClient::new(self.doer(), self.admin_base().clone())
	}

	/// Groups API.
	pub fn groups(&self) -> GroupsClient {
		GroupsClient::new(self.doer(), self.admin_base().clone())
	}

	/// Realm roles API.
	pub fn roles(&self) -> RolesClient {
		RolesClient::new(self.doer(), self.admin_base().clone())
	}

	/// Users API.
	pub fn users(&self) -> UsersClient {
		UsersClient::new(self.doer(), self.admin_base().clone())
	}

	/// Clients and client roles API.
	pub fn clients(&self) -> ClientsClient {
		ClientsClient::new(self.doer(), self.admin_base().clone())
	}

	async fn send(&self, request: ApiRequest) -> Result<RawResponse> {
		const KIND: FlowKind = FlowKind::Request;

		let span = FlowSpan::request(&request.method, &request.url);

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.send_authenticated(request)).await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	async fn send_authenticated(&self, request: ApiRequest) -> Result<RawResponse> {
		self.ensure_logged_in().await?;

		let before = self.inner.store.snapshot();
		let response = self.inner.transport.send(self.authorize(request.clone(), &before)?).await?;
		let status = response.status();

		if !matches!(status, 401 | 403) {
			return Ok(response);
		}

		drop(response);
		obs::record_reauthentication(status);
		obs::debug_event!(status, "Admin API rejected the token, reauthenticating.");

		self.reauthenticate(&before).await?;

		let current = self.inner.store.snapshot();

		Ok(self.inner.transport.send(self.authorize(request, &current)?).await?)
	}

	async fn ensure_logged_in(&self) -> Result<()> {
		let inner = &self.inner;

		if inner.store.is_initialized() {
			return Ok(());
		}

		let _guard = inner.store.lock_auth().await;

		if inner.store.is_initialized() {
			return Ok(());
		}

		let result = inner.authenticator.login(&inner.transport, &inner.store).await;

		inner.store.mark_initialized();

		result
	}

	async fn reauthenticate(&self, before: &TokenSnapshot) -> Result<()> {
		let inner = &self.inner;
		let _guard = inner.store.lock_auth().await;
		let current = inner.store.snapshot();

		if current != *before {
			inner.authenticator.metrics().record_refresh_skip();
			obs::debug_event!(
				fingerprint = current.fingerprint().as_deref().unwrap_or("none"),
				"Token already rotated by a concurrent caller, skipping refresh."
			);

			return Ok(());
		}

		inner.authenticator.refresh(&inner.transport, &inner.store).await
	}

	fn authorize(&self, mut request: ApiRequest, token: &TokenSnapshot) -> Result<ApiRequest> {
		let headers = &mut request.headers;

		merge(headers, &self.inner.headers);

		if let Some(authorization) = token.authorization() {
			let mut value = HeaderValue::from_str(&authorization).map_err(|_| {
				TransportError::InvalidRequest {
					reason: "access token is not a valid header value".into(),
				}
			})?;

			value.set_sensitive(true);
			headers.insert(AUTHORIZATION, value);
		}

		headers.insert(ACCEPT, HeaderValue::from_static(JSON));

		if matches!(request.method, Method::POST | Method::PUT | Method::DELETE)
			&& !headers.contains_key(CONTENT_TYPE)
		{
			headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON));
		}

		Ok(request)
	}
}
#[cfg(feature = "reqwest")]
impl KeycloakClient<ReqwestTransport> {
	/// Builds a reqwest-backed client without touching the network.
	///
	/// The first admin call performs the login.
	pub fn new(config: &ClientConfig) -> Result<Self> {
		let resolved = config.validate()?;
		let transport = ReqwestTransport::from_config(config)?;

		Ok(Self::from_resolved(resolved, Arc::new(transport)))
	}

	/// Builds a reqwest-backed client and logs in when `initial_login` is set.
	pub async fn connect(config: &ClientConfig) -> Result<Self> {
		let client = Self::new(config)?;

		if config.initial_login {
			client.login().await?;
		}

		Ok(client)
	}
}
impl<T> Clone for KeycloakClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self { inner: self.inner.clone() }
	}
}
impl<T> Debug for KeycloakClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("KeycloakClient")
			.field("admin_base", &self.inner.endpoints.admin_base.as_str())
			.field("token_url", &self.inner.endpoints.token_url.as_str())
			.field("grant", &self.grant())
			.finish()
	}
}
impl<T> RequestDoer for KeycloakClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn execute(&self, request: ApiRequest) -> DoFuture<'_> {
		Box::pin(self.send(request))
	}
}

struct ClientInner<T>
where
	T: ?Sized + HttpTransport,
{
	transport: RetryingTransport<T>,
	authenticator: Authenticator,
	store: CredentialStore,
	endpoints: Endpoints,
	headers: HeaderMap,
}

fn merge(target: &mut HeaderMap, extra: &HeaderMap) {
	for (name, value) in extra {
		target.insert(name.clone(), value.clone());
	}
}
