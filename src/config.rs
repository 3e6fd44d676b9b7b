//! Client construction options and their one-time validation.
//!
//! [`ClientConfig`] is a plain value with documented defaults and `with_*` builders. Nothing is
//! checked until [`ClientConfig::validate`] runs (from
//! [`KeycloakClient::new`](crate::client::KeycloakClient::new)), which resolves URLs, the grant,
//! and static headers in one step and never touches the network.

// std
use std::path::PathBuf;
// crates.io
use http::{HeaderMap, HeaderName, HeaderValue, header::USER_AGENT};
// self
use crate::{
	_prelude::*,
	auth::{Credentials, TokenSecret},
	error::ConfigError,
	retry::RetryPolicy,
};

/// Realm used for the token endpoint unless overridden.
pub const DEFAULT_REALM: &str = "master";
/// Default per-attempt timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Username/password pair for the `password` grant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PasswordGrant {
	/// Resource owner username.
	pub username: String,
	/// Resource owner password.
	pub password: TokenSecret,
}

/// JWT-bearer client authentication material.
///
/// At login the assertion is taken from `token`, then from the trimmed contents of `token_file`,
/// and is otherwise signed from `signing_key` with `algorithm`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JwtAuth {
	/// Signing algorithm name, such as `RS256`, `ES512`, or `EdDSA`.
	pub algorithm: String,
	/// PEM encoded private key.
	pub signing_key: Option<TokenSecret>,
	/// Pre-signed assertion.
	pub token: Option<TokenSecret>,
	/// File holding a pre-signed assertion, read on every login.
	pub token_file: Option<PathBuf>,
}
impl JwtAuth {
	/// Signs fresh assertions with a PEM private key.
	pub fn signed(algorithm: impl Into<String>, signing_key: impl Into<String>) -> Self {
		Self {
			algorithm: algorithm.into(),
			signing_key: Some(TokenSecret::new(signing_key)),
			..Default::default()
		}
	}

	/// Uses a pre-signed assertion.
	pub fn presigned(token: impl Into<String>) -> Self {
		Self { token: Some(TokenSecret::new(token)), ..Default::default() }
	}

	/// Reads a pre-signed assertion from `path` on every login.
	pub fn from_file(path: impl Into<PathBuf>) -> Self {
		Self { token_file: Some(path.into()), ..Default::default() }
	}

	/// Returns true when at least one assertion source is configured.
	pub fn has_material(&self) -> bool {
		let present = |secret: &Option<TokenSecret>| secret.as_ref().is_some_and(|s| !s.is_empty());

		present(&self.token)
			|| present(&self.signing_key)
			|| self.token_file.as_ref().is_some_and(|path| !path.as_os_str().is_empty())
	}
}

/// PEM encoded client certificate and private key for mutual TLS.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientCertificate {
	/// Certificate chain.
	pub certificate: String,
	/// Private key.
	pub private_key: String,
}

/// TLS settings applied to the HTTP client.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TlsConfig {
	/// Extra trusted root certificate (PEM).
	pub ca_cert: Option<String>,
	/// Disables server certificate verification.
	pub insecure_skip_verify: bool,
	/// Client identity for mutual TLS.
	pub client_cert: Option<ClientCertificate>,
}

/// Options for [`KeycloakClient`](crate::client::KeycloakClient).
#[derive(Clone, Debug)]
pub struct ClientConfig {
	/// Keycloak server URL, such as `https://sso.example.com`.
	pub base_url: String,
	/// Separate URL for admin API calls; defaults to `base_url`.
	pub admin_url: Option<String>,
	/// Path prefix appended to both URLs, such as `/auth` for legacy distributions.
	pub base_path: String,
	/// Realm holding the client used to authenticate (default `master`).
	pub realm: String,
	/// OAuth client identifier.
	pub client_id: String,
	/// Client secret for `client_credentials`, or an optional secret for `password`.
	pub client_secret: Option<TokenSecret>,
	/// Resource owner credentials.
	pub password_grant: Option<PasswordGrant>,
	/// JWT-bearer client authentication.
	pub jwt: Option<JwtAuth>,
	/// Pre-supplied access token; disables every token endpoint call.
	pub access_token: Option<TokenSecret>,
	/// Per-attempt timeout (default 60 seconds).
	pub timeout: Duration,
	/// TLS settings.
	pub tls: TlsConfig,
	/// Headers attached to every token endpoint and admin API request.
	pub additional_headers: BTreeMap<String, String>,
	/// `User-Agent` header value.
	pub user_agent: Option<String>,
	/// Log in eagerly from [`KeycloakClient::connect`](crate::client::KeycloakClient::connect)
	/// (default `true`).
	pub initial_login: bool,
	/// Transport retry policy.
	pub retry: RetryPolicy,
}
impl ClientConfig {
	/// Creates a configuration with the documented defaults.
	pub fn new(base_url: impl Into<String>, client_id: impl Into<String>) -> Self {
		Self {
			base_url: base_url.into(),
			admin_url: None,
			base_path: String::new(),
			realm: DEFAULT_REALM.into(),
			client_id: client_id.into(),
			client_secret: None,
			password_grant: None,
			jwt: None,
			access_token: None,
			timeout: DEFAULT_TIMEOUT,
			tls: TlsConfig::default(),
			additional_headers: BTreeMap::new(),
			user_agent: None,
			initial_login: true,
			retry: RetryPolicy::default(),
		}
	}

	/// Overrides the authentication realm.
	pub fn with_realm(mut self, realm: impl Into<String>) -> Self {
		self.realm = realm.into();

		self
	}

	/// Sets the path prefix, such as `/auth`.
	pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
		self.base_path = base_path.into();

		self
	}

	/// Sends admin API calls to a separate URL.
	pub fn with_admin_url(mut self, admin_url: impl Into<String>) -> Self {
		self.admin_url = Some(admin_url.into());

		self
	}

	/// Sets the client secret.
	pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
		self.client_secret = Some(TokenSecret::new(secret));

		self
	}

	/// Selects the `password` grant.
	pub fn with_password_grant(
		mut self,
		username: impl Into<String>,
		password: impl Into<String>,
	) -> Self {
		self.password_grant =
			Some(PasswordGrant { username: username.into(), password: TokenSecret::new(password) });

		self
	}

	/// Selects JWT-bearer client authentication.
	pub fn with_jwt_auth(mut self, jwt: JwtAuth) -> Self {
		self.jwt = Some(jwt);

		self
	}

	/// Uses a pre-supplied access token instead of logging in.
	pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(TokenSecret::new(token));

		self
	}

	/// Overrides the per-attempt timeout.
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Trusts an extra root certificate.
	pub fn with_ca_cert(mut self, pem: impl Into<String>) -> Self {
		self.tls.ca_cert = Some(pem.into());

		self
	}

	/// Disables server certificate verification.
	pub fn with_tls_insecure_skip_verify(mut self, skip: bool) -> Self {
		self.tls.insecure_skip_verify = skip;

		self
	}

	/// Presents a client certificate for mutual TLS.
	pub fn with_client_certificate(
		mut self,
		certificate: impl Into<String>,
		private_key: impl Into<String>,
	) -> Self {
		self.tls.client_cert = Some(ClientCertificate {
			certificate: certificate.into(),
			private_key: private_key.into(),
		});

		self
	}

	/// Sets the `User-Agent` header.
	pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.user_agent = Some(user_agent.into());

		self
	}

	/// Adds one header to every request.
	pub fn with_additional_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.additional_headers.insert(name.into(), value.into());

		self
	}

	/// Replaces the additional headers.
	pub fn with_additional_headers(mut self, headers: BTreeMap<String, String>) -> Self {
		self.additional_headers = headers;

		self
	}

	/// Controls the eager login performed by
	/// [`KeycloakClient::connect`](crate::client::KeycloakClient::connect).
	pub fn with_initial_login(mut self, initial_login: bool) -> Self {
		self.initial_login = initial_login;

		self
	}

	/// Overrides the transport retry policy.
	pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
		self.retry = retry;

		self
	}

	/// Resolves URLs, credentials, and static headers.
	pub fn validate(&self) -> Result<ResolvedConfig, ConfigError> {
		if self.base_url.trim().is_empty() {
			return Err(ConfigError::MissingUrl);
		}

		let auth_base = parse_base("base URL", &self.base_url, &self.base_path)?;
		let admin_base = match self.admin_url.as_deref().filter(|url| !url.trim().is_empty()) {
			Some(admin_url) => parse_base("admin URL", admin_url, &self.base_path)?,
			None => auth_base.clone(),
		};
		let credentials = Credentials::resolve(self)?;
		let endpoints = Endpoints {
			token_url: join_segments(
				&auth_base,
				["realms", self.realm.as_str(), "protocol", "openid-connect", "token"],
			),
			issuer: join_segments(&admin_base, ["realms", self.realm.as_str()]).to_string(),
			auth_base,
			admin_base,
		};
		let headers = self.static_headers()?;

		Ok(ResolvedConfig { endpoints, credentials, headers, retry: self.retry })
	}

	fn static_headers(&self) -> Result<HeaderMap, ConfigError> {
		let mut headers = HeaderMap::new();

		for (name, value) in &self.additional_headers {
			let invalid = || ConfigError::InvalidHeader { name: name.clone() };
			let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
			let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;

			headers.insert(header_name, header_value);
		}

		if let Some(user_agent) = self.user_agent.as_deref().filter(|ua| !ua.is_empty()) {
			let value = HeaderValue::from_str(user_agent)
				.map_err(|_| ConfigError::InvalidHeader { name: USER_AGENT.to_string() })?;

			headers.insert(USER_AGENT, value);
		}

		Ok(headers)
	}
}

/// URLs derived from a [`ClientConfig`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoints {
	/// Base for token endpoint calls (`base_url` + `base_path`).
	pub auth_base: Url,
	/// Base for admin API calls (`admin_url` + `base_path`, or `auth_base`).
	pub admin_base: Url,
	/// `{auth_base}/realms/{realm}/protocol/openid-connect/token`.
	pub token_url: Url,
	/// `{admin_base}/realms/{realm}`, the audience of signed client assertions.
	pub issuer: String,
}

/// Validated form of a [`ClientConfig`].
#[derive(Clone, Debug)]
pub struct ResolvedConfig {
	/// Derived URLs.
	pub endpoints: Endpoints,
	/// Resolved credentials and grant.
	pub credentials: Credentials,
	/// Additional headers plus `User-Agent`, attached to every request.
	pub headers: HeaderMap,
	/// Transport retry policy.
	pub retry: RetryPolicy,
}

/// Appends percent-encoded path segments to `base`.
pub fn join_segments<I, S>(base: &Url, segments: I) -> Url
where
	I: IntoIterator<Item = S>,
	S: AsRef<str>,
{
	let mut url = base.clone();

	if let Ok(mut path) = url.path_segments_mut() {
		path.pop_if_empty().extend(segments);
	}

	url
}

fn parse_base(field: &'static str, url: &str, base_path: &str) -> Result<Url, ConfigError> {
	let raw = format!("{}{}", url.trim().trim_end_matches('/'), base_path.trim_end_matches('/'));
	let parsed = Url::parse(&raw)
		.map_err(|source| ConfigError::InvalidUrl { field, value: raw.clone(), source })?;

	if parsed.cannot_be_a_base() || !matches!(parsed.scheme(), "http" | "https") {
		return Err(ConfigError::UnsupportedScheme { field, value: raw });
	}

	Ok(parsed)
}
