//! Client endpoints and client roles.
//!
//! Paths take the client's internal id (the `id` field), not its `clientId`; use
//! [`ClientsClient::find_by_client_id`] to translate.

// crates.io
use http::Method;
// self
use crate::{
	_prelude::*,
	admin::{AdminApi, ApiResponse, Extra, ListQuery, RoleRepresentation},
	doer::RequestDoer,
};

/// Client representation; unmodelled fields are kept in `extra`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRepresentation {
	/// Internal id.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub id: Option<String>,
	/// Public client identifier.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub client_id: Option<String>,
	/// Display name.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	/// Whether the client may be used.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub enabled: Option<bool>,
	/// Public clients have no secret.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub public_client: Option<bool>,
	/// Whether the client has a service account (`client_credentials`).
	#[serde(skip_serializing_if = "Option::is_none")]
	pub service_accounts_enabled: Option<bool>,
	/// Allowed redirect URIs.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub redirect_uris: Option<Vec<String>>,
	/// Remaining fields.
	#[serde(flatten)]
	pub extra: Extra,
}
impl ClientRepresentation {
	/// Representation with just a `clientId`.
	pub fn with_client_id(client_id: impl Into<String>) -> Self {
		Self { client_id: Some(client_id.into()), ..Default::default() }
	}
}

/// Clients API.
#[derive(Clone, Debug)]
pub struct ClientsClient {
	api: AdminApi,
}
impl ClientsClient {
	/// Creates a helper over `doer` rooted at `base`.
	pub fn new(doer: Arc<dyn RequestDoer>, base: Url) -> Self {
		Self { api: AdminApi::new(doer, base) }
	}

	/// `GET /admin/realms/{realm}/clients`.
	pub async fn list(
		&self,
		realm: &str,
		query: &ListQuery,
	) -> Result<ApiResponse<Vec<ClientRepresentation>>> {
		let mut url = self.api.url(["realms", realm, "clients"]);

		query.apply(&mut url);

		self.api.get(url).await
	}

	/// Finds a client by its `clientId`; `value` is `None` when there is no such client.
	pub async fn find_by_client_id(
		&self,
		realm: &str,
		client_id: &str,
	) -> Result<ApiResponse<ClientRepresentation>> {
		let mut url = self.api.url(["realms", realm, "clients"]);

		url.query_pairs_mut().append_pair("clientId", client_id);

		let ApiResponse { value, raw } = self.api.get::<Vec<ClientRepresentation>>(url).await?;
		let value = value
			.unwrap_or_default()
			.into_iter()
			.find(|client| client.client_id.as_deref() == Some(client_id));

		Ok(ApiResponse { value, raw })
	}

	/// `GET /admin/realms/{realm}/clients/{id}`.
	pub async fn get(&self, realm: &str, id: &str) -> Result<ApiResponse<ClientRepresentation>> {
		self.api.get(self.api.url(["realms", realm, "clients", id])).await
	}

	/// `POST /admin/realms/{realm}/clients`; the new internal id is in [`ApiResponse::resource_id`].
	pub async fn create(
		&self,
		realm: &str,
		client: &ClientRepresentation,
	) -> Result<ApiResponse<()>> {
		self.api.write(Method::POST, self.api.url(["realms", realm, "clients"]), client).await
	}

	/// `DELETE /admin/realms/{realm}/clients/{id}`.
	pub async fn delete(&self, realm: &str, id: &str) -> Result<ApiResponse<()>> {
		self.api.delete(self.api.url(["realms", realm, "clients", id])).await
	}

	/// `GET /admin/realms/{realm}/clients/{id}/roles`.
	pub async fn roles(
		&self,
		realm: &str,
		id: &str,
		query: &ListQuery,
	) -> Result<ApiResponse<Vec<RoleRepresentation>>> {
		let mut url = self.api.url(["realms", realm, "clients", id, "roles"]);

		query.apply(&mut url);

		self.api.get(url).await
	}

	/// `GET /admin/realms/{realm}/clients/{id}/roles/{name}`.
	pub async fn role(
		&self,
		realm: &str,
		id: &str,
		name: &str,
	) -> Result<ApiResponse<RoleRepresentation>> {
		self.api.get(self.api.url(["realms", realm, "clients", id, "roles", name])).await
	}

	/// `POST /admin/realms/{realm}/clients/{id}/roles`.
	pub async fn create_role(
		&self,
		realm: &str,
		id: &str,
		role: &RoleRepresentation,
	) -> Result<ApiResponse<()>> {
		self.api.write(Method::POST, self.api.url(["realms", realm, "clients", id, "roles"]), role).await
	}

	/// `DELETE /admin/realms/{realm}/clients/{id}/roles/{name}`.
	pub async fn delete_role(&self, realm: &str, id: &str, name: &str) -> Result<ApiResponse<()>> {
		self.api.delete(self.api.url(["realms", realm, "clients", id, "roles", name])).await
	}
}
