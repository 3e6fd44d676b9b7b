//! Token endpoint exchange for login and refresh.
//!
//! Refresh deliberately re-submits the configured grant instead of a `refresh_token` grant.
//! When the token endpoint answers a refresh with 400 the authenticator falls back to a full login,
//! which covers sessions that Keycloak has already expired.

// crates.io
use http::{HeaderMap, Method};
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	auth::{
		AuthMetrics, CredentialStore, Credentials, GrantType, TokenSecret,
		jwt::{self, CLIENT_ASSERTION_TYPE},
	},
	config::Endpoints,
	error::AuthEndpointError,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	transport::{ApiRequest, HttpTransport, RawResponse},
};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const DEFAULT_TOKEN_TYPE: &str = "Bearer";

/// Successful token endpoint payload.
#[derive(Clone, Debug, Deserialize)]
pub struct TokenResponse {
	/// Issued access token.
	pub access_token: TokenSecret,
	/// Issued refresh token, if any.
	#[serde(default)]
	pub refresh_token: Option<TokenSecret>,
	/// Token type, normally `Bearer`.
	#[serde(default)]
	pub token_type: Option<String>,
}

/// Performs token endpoint exchanges and writes the results into a [`CredentialStore`].
#[derive(Debug)]
pub struct Authenticator {
	token_url: Url,
	audience: String,
	headers: HeaderMap,
	metrics: Arc<AuthMetrics>,
}
impl Authenticator {
	/// Creates an authenticator for the resolved endpoints.
	///
	/// `headers` (additional headers and `User-Agent`) are attached to every token request.
	pub fn new(endpoints: &Endpoints, headers: HeaderMap) -> Self {
		Self {
			token_url: endpoints.token_url.clone(),
			audience: endpoints.issuer.clone(),
			headers,
			metrics: Default::default(),
		}
	}

	/// Token endpoint URL.
	pub fn token_url(&self) -> &Url {
		&self.token_url
	}

	/// Shared exchange counters.
	pub fn metrics(&self) -> &Arc<AuthMetrics> {
		&self.metrics
	}

	/// Obtains a fresh token with the configured grant.
	///
	/// Does nothing for a pre-supplied token. Any status other than 200 is an
	/// [`AuthEndpointError`].
	pub async fn login<T>(&self, transport: &T, store: &CredentialStore) -> Result<()>
	where
		T: ?Sized + HttpTransport,
	{
		const KIND: FlowKind = FlowKind::Login;

		if store.credentials().grant == GrantType::Provided {
			return Ok(());
		}

		let span = FlowSpan::new(KIND, "login");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async {
				self.metrics.record_login();

				let response = self.exchange(transport, store.credentials()).await?;

				if response.status() != 200 {
					return Err(AuthEndpointError::new(response.status(), &self.token_url, response.body()).into());
				}

				self.install(store, &response)
			})
			.await;

		self.finish(KIND, &result);

		result
	}

	/// Re-exchanges the configured grant, falling back to [`Authenticator::login`] on 400.
	pub async fn refresh<T>(&self, transport: &T, store: &CredentialStore) -> Result<()>
	where
		T: ?Sized + HttpTransport,
	{
		const KIND: FlowKind = FlowKind::Refresh;

		if store.credentials().grant == GrantType::Provided {
			return Ok(());
		}

		let span = FlowSpan::new(KIND, "refresh");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async {
				self.metrics.record_refresh();

				let response = self.exchange(transport, store.credentials()).await?;

				match response.status() {
					200 => self.install(store, &response),
					400 => {
						obs::debug_event!(
							token_url = %self.token_url,
							"Refresh rejected with 400, falling back to login."
						);
						self.metrics.record_refresh_fallback();

						self.login(transport, store).await
					},
					status => Err(AuthEndpointError::new(status, &self.token_url, response.body()).into()),
				}
			})
			.await;

		self.finish(KIND, &result);

		result
	}

	/// Encodes the token request form for `credentials`.
	pub fn form(&self, credentials: &Credentials) -> Result<String> {
		let mut form = form_urlencoded::Serializer::new(String::new());

		form.append_pair("client_id", &credentials.client_id);
		form.append_pair("grant_type", credentials.grant.as_str());

		match credentials.grant {
			GrantType::Password => {
				if let Some(password) = &credentials.password {
					form.append_pair("username", &password.username);
					form.append_pair("password", password.password.expose());
				}
				if let Some(secret) = &credentials.client_secret {
					form.append_pair("client_secret", secret.expose());
				}
			},
			GrantType::ClientCredentials => match &credentials.jwt {
				Some(material) => {
					let assertion =
						jwt::resolve_assertion(material, &credentials.client_id, &self.audience)?;

					form.append_pair("client_assertion_type", CLIENT_ASSERTION_TYPE);
					form.append_pair("client_assertion", &assertion);
				},
				None => {
					form.append_pair(
						"client_secret",
						credentials.client_secret.as_ref().map(TokenSecret::expose).unwrap_or_default(),
					);
				},
			},
			GrantType::Provided => {},
		}

		Ok(form.finish())
	}

	async fn exchange<T>(&self, transport: &T, credentials: &Credentials) -> Result<RawResponse>
	where
		T: ?Sized + HttpTransport,
	{
		let form = self.form(credentials)?;
		let mut request = ApiRequest::new(Method::POST, self.token_url.clone());

		request.headers = self.headers.clone();

		Ok(transport.send(request.body(FORM_CONTENT_TYPE, form)).await?)
	}

	fn install(&self, store: &CredentialStore, response: &RawResponse) -> Result<()> {
		let token = response.json::<TokenResponse>()?;
		let token_type = token
			.token_type
			.filter(|token_type| !token_type.is_empty())
			.unwrap_or_else(|| DEFAULT_TOKEN_TYPE.into());

		obs::debug_event!(
			fingerprint = %token.access_token.fingerprint(),
			refresh_token = token.refresh_token.is_some(),
			"Stored new access token."
		);

		store.replace(token.access_token, token.refresh_token, token_type);

		Ok(())
	}

	fn finish(&self, kind: FlowKind, result: &Result<()>) {
		match result {
			Ok(()) => obs::record_flow_outcome(kind, FlowOutcome::Success),
			Err(_) => {
				self.metrics.record_failure();
				obs::record_flow_outcome(kind, FlowOutcome::Failure);
			},
		}
	}
}
