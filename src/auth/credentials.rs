//! Credential material and the shared session token store.

// crates.io
use async_lock::MutexGuard as AsyncMutexGuard;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	config::{ClientConfig, JwtAuth, PasswordGrant},
	error::ConfigError,
};

/// How the client obtains access tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GrantType {
	/// Resource owner password grant.
	Password,
	/// Client credentials grant, authenticated by a secret or a JWT assertion.
	ClientCredentials,
	/// Pre-supplied access token; the token endpoint is never called.
	Provided,
}
impl GrantType {
	/// Returns the `grant_type` form value (`provided` has no wire form).
	pub const fn as_str(self) -> &'static str {
		match self {
			GrantType::Password => "password",
			GrantType::ClientCredentials => "client_credentials",
			GrantType::Provided => "provided",
		}
	}
}
impl Display for GrantType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Static credential material resolved from a [`ClientConfig`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
	/// OAuth client identifier.
	pub client_id: String,
	/// Optional client secret.
	pub client_secret: Option<TokenSecret>,
	/// Resource owner credentials.
	pub password: Option<PasswordGrant>,
	/// JWT-bearer material.
	pub jwt: Option<JwtAuth>,
	/// Pre-supplied access token.
	pub access_token: Option<TokenSecret>,
	/// Selected grant.
	pub grant: GrantType,
}
impl Credentials {
	/// Picks the grant from the configured material.
	///
	/// A pre-supplied token wins, then the password grant, then JWT material, then a bare client
	/// secret. Fails with [`ConfigError::MissingAuthMethod`] when none is usable.
	pub fn resolve(config: &ClientConfig) -> Result<Self, ConfigError> {
		if config.client_id.trim().is_empty() {
			return Err(ConfigError::MissingClientId);
		}

		let non_empty = |secret: &Option<TokenSecret>| secret.clone().filter(|s| !s.is_empty());
		let client_secret = non_empty(&config.client_secret);
		let access_token = non_empty(&config.access_token);
		let jwt = config.jwt.clone().filter(JwtAuth::has_material);
		let grant = if access_token.is_some() {
			GrantType::Provided
		} else if config.password_grant.is_some() {
			GrantType::Password
		} else if jwt.is_some() || client_secret.is_some() {
			GrantType::ClientCredentials
		} else {
			return Err(ConfigError::MissingAuthMethod);
		};

		Ok(Self {
			client_id: config.client_id.clone(),
			client_secret,
			password: config.password_grant.clone(),
			jwt,
			access_token,
			grant,
		})
	}
}

/// Point-in-time copy of the session token.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenSnapshot {
	/// Current access token, if any.
	pub access_token: Option<TokenSecret>,
	/// Token type reported by the token endpoint.
	pub token_type: String,
}
impl TokenSnapshot {
	/// `Authorization` header value, or `None` before the first login.
	pub fn authorization(&self) -> Option<String> {
		self.access_token
			.as_ref()
			.map(|token| format!("{} {}", self.token_type, token.expose()))
	}

	/// Log-safe identifier of the access token.
	pub fn fingerprint(&self) -> Option<String> {
		self.access_token.as_ref().map(TokenSecret::fingerprint)
	}
}

#[derive(Debug, Default)]
struct Session {
	access_token: Option<TokenSecret>,
	refresh_token: Option<TokenSecret>,
	token_type: String,
	initialized: bool,
}

/// Session tokens shared by every clone of a client.
///
/// Token fields and the lazy-login flag sit behind one short-lived lock that is never held across
/// I/O. Token endpoint calls are serialized separately through [`CredentialStore::lock_auth`].
#[derive(Debug)]
pub struct CredentialStore {
	credentials: Credentials,
	session: Mutex<Session>,
	auth_guard: AsyncMutex<()>,
}
impl CredentialStore {
	/// Token type used for pre-supplied tokens.
	pub const PROVIDED_TOKEN_TYPE: &'static str = "bearer";

	/// Creates a store; pre-supplied tokens are installed immediately.
	pub fn new(credentials: Credentials) -> Self {
		let mut session = Session::default();

		if credentials.grant == GrantType::Provided {
			session.access_token = credentials.access_token.clone();
			session.token_type = Self::PROVIDED_TOKEN_TYPE.into();
			session.initialized = true;
		}

		Self { credentials, session: Mutex::new(session), auth_guard: AsyncMutex::new(()) }
	}

	/// Static credential material.
	pub fn credentials(&self) -> &Credentials {
		&self.credentials
	}

	/// Copies the current access token and type.
	pub fn snapshot(&self) -> TokenSnapshot {
		let session = self.session.lock();

		TokenSnapshot { access_token: session.access_token.clone(), token_type: session.token_type.clone() }
	}

	/// Returns true once a login has been started (or a token was supplied).
	pub fn is_initialized(&self) -> bool {
		self.session.lock().initialized
	}

	/// Returns true when the token endpoint issued a refresh token.
	pub fn has_refresh_token(&self) -> bool {
		self.session.lock().refresh_token.is_some()
	}

	/// Marks the lazy login as started; returns false if it already was.
	pub(crate) fn mark_initialized(&self) -> bool {
		let mut session = self.session.lock();

		!std::mem::replace(&mut session.initialized, true)
	}

	/// Overwrites the session tokens in place.
	pub(crate) fn replace(
		&self,
		access_token: TokenSecret,
		refresh_token: Option<TokenSecret>,
		token_type: String,
	) {
		let mut session = self.session.lock();

		session.access_token = Some(access_token);
		session.refresh_token = refresh_token;
		session.token_type = token_type;
	}

	/// Serializes token endpoint calls.
	pub(crate) async fn lock_auth(&self) -> AsyncMutexGuard<'_, ()> {
		self.auth_guard.lock().await
	}
}
