//! Group endpoints, including child groups and role mappings.

// crates.io
use http::Method;
// self
use crate::{
	_prelude::*,
	admin::{AdminApi, ApiResponse, Extra, ListQuery, RoleRepresentation},
	doer::RequestDoer,
};

/// Group representation; unmodelled fields are kept in `extra`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRepresentation {
	/// Group id.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub id: Option<String>,
	/// Group name.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	/// Slash-separated path from the top-level group.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub path: Option<String>,
	/// Parent group id, for child groups.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub parent_id: Option<String>,
	/// Number of direct children.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub sub_group_count: Option<u64>,
	/// Direct children, when the server inlines them.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub sub_groups: Option<Vec<GroupRepresentation>>,
	/// Group attributes.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub attributes: Option<BTreeMap<String, Vec<String>>>,
	/// Names of realm roles mapped to the group.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub realm_roles: Option<Vec<String>>,
	/// Names of client roles mapped to the group, keyed by client id.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub client_roles: Option<BTreeMap<String, Vec<String>>>,
	/// Remaining fields.
	#[serde(flatten)]
	pub extra: Extra,
}
impl GroupRepresentation {
	/// Representation with just a group name.
	pub fn named(name: impl Into<String>) -> Self {
		Self { name: Some(name.into()), ..Default::default() }
	}
}

/// Client role mappings of one client.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientMappingsRepresentation {
	/// Client internal id.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub id: Option<String>,
	/// Client id.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub client: Option<String>,
	/// Mapped roles.
	#[serde(default)]
	pub mappings: Vec<RoleRepresentation>,
}

/// All role mappings of a group.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingsRepresentation {
	/// Realm role mappings.
	#[serde(default)]
	pub realm_mappings: Vec<RoleRepresentation>,
	/// Client role mappings keyed by client id.
	#[serde(default)]
	pub client_mappings: BTreeMap<String, ClientMappingsRepresentation>,
}

/// Groups API.
#[derive(Clone, Debug)]
pub struct GroupsClient {
	api: AdminApi,
}
impl GroupsClient {
	/// Creates a helper over `doer` rooted at `base`.
	pub fn new(doer: Arc<dyn RequestDoer>, base: Url) -> Self {
		Self { api: AdminApi::new(doer, base) }
	}

	/// `GET /admin/realms/{realm}/groups`.
	pub async fn list(
		&self,
		realm: &str,
		query: &ListQuery,
	) -> Result<ApiResponse<Vec<GroupRepresentation>>> {
		let mut url = self.api.url(["realms", realm, "groups"]);

		query.apply(&mut url);

		self.api.get(url).await
	}

	/// `GET /admin/realms/{realm}/groups/{id}`.
	pub async fn get(&self, realm: &str, group_id: &str) -> Result<ApiResponse<GroupRepresentation>> {
		self.api.get(self.api.url(["realms", realm, "groups", group_id])).await
	}

	/// `POST /admin/realms/{realm}/groups`; the new id is in [`ApiResponse::resource_id`].
	pub async fn create(
		&self,
		realm: &str,
		group: &GroupRepresentation,
	) -> Result<ApiResponse<()>> {
		self.api.write(Method::POST, self.api.url(["realms", realm, "groups"]), group).await
	}

	/// `PUT /admin/realms/{realm}/groups/{id}`.
	pub async fn update(
		&self,
		realm: &str,
		group_id: &str,
		group: &GroupRepresentation,
	) -> Result<ApiResponse<()>> {
		self.api.write(Method::PUT, self.api.url(["realms", realm, "groups", group_id]), group).await
	}

	/// `DELETE /admin/realms/{realm}/groups/{id}`.
	pub async fn delete(&self, realm: &str, group_id: &str) -> Result<ApiResponse<()>> {
		self.api.delete(self.api.url(["realms", realm, "groups", group_id])).await
	}

	/// `GET /admin/realms/{realm}/groups/{id}/children`.
	pub async fn children(
		&self,
		realm: &str,
		parent_id: &str,
		query: &ListQuery,
	) -> Result<ApiResponse<Vec<GroupRepresentation>>> {
		let mut url = self.api.url(["realms", realm, "groups", parent_id, "children"]);

		query.apply(&mut url);

		self.api.get(url).await
	}

	/// `POST /admin/realms/{realm}/groups/{id}/children`.
	pub async fn create_child(
		&self,
		realm: &str,
		parent_id: &str,
		group: &GroupRepresentation,
	) -> Result<ApiResponse<()>> {
		let url = self.api.url(["realms", realm, "groups", parent_id, "children"]);

		self.api.write(Method::POST, url, group).await
	}

	/// Finds a top-level group by exact name.
	///
	/// The server-side search also matches nested groups, so the result is filtered again
	/// locally. `value` is `None` when nothing matches.
	pub async fn find_by_name(
		&self,
		realm: &str,
		name: &str,
	) -> Result<ApiResponse<GroupRepresentation>> {
		let listed = self.list(realm, &ListQuery::exact(name)).await?;

		Ok(pick_by_name(listed, name))
	}

	/// Finds a direct child of `parent_id` by exact name.
	pub async fn find_child_by_name(
		&self,
		realm: &str,
		parent_id: &str,
		name: &str,
	) -> Result<ApiResponse<GroupRepresentation>> {
		let listed = self.children(realm, parent_id, &ListQuery::exact(name)).await?;

		Ok(pick_by_name(listed, name))
	}

	/// `GET /admin/realms/{realm}/groups/{id}/role-mappings`.
	pub async fn role_mappings(
		&self,
		realm: &str,
		group_id: &str,
	) -> Result<ApiResponse<MappingsRepresentation>> {
		self.api.get(self.api.url(["realms", realm, "groups", group_id, "role-mappings"])).await
	}

	/// `GET /admin/realms/{realm}/groups/{id}/role-mappings/realm`.
	pub async fn realm_role_mappings(
		&self,
		realm: &str,
		group_id: &str,
	) -> Result<ApiResponse<Vec<RoleRepresentation>>> {
		self.api.get(self.realm_mappings_url(realm, group_id)).await
	}

	/// `POST /admin/realms/{realm}/groups/{id}/role-mappings/realm`.
	pub async fn add_realm_role_mappings(
		&self,
		realm: &str,
		group_id: &str,
		roles: &[RoleRepresentation],
	) -> Result<ApiResponse<()>> {
		self.api.write(Method::POST, self.realm_mappings_url(realm, group_id), roles).await
	}

	/// `DELETE /admin/realms/{realm}/groups/{id}/role-mappings/realm` with the roles as body.
	pub async fn delete_realm_role_mappings(
		&self,
		realm: &str,
		group_id: &str,
		roles: &[RoleRepresentation],
	) -> Result<ApiResponse<()>> {
		self.api.write(Method::DELETE, self.realm_mappings_url(realm, group_id), roles).await
	}

	/// `GET /admin/realms/{realm}/groups/{id}/role-mappings/clients/{client}`.
	///
	/// `client` is the client's internal id, not its `clientId`.
	pub async fn client_role_mappings(
		&self,
		realm: &str,
		group_id: &str,
		client: &str,
	) -> Result<ApiResponse<Vec<RoleRepresentation>>> {
		self.api.get(self.client_mappings_url(realm, group_id, client)).await
	}

	/// `POST /admin/realms/{realm}/groups/{id}/role-mappings/clients/{client}`.
	pub async fn add_client_role_mappings(
		&self,
		realm: &str,
		group_id: &str,
		client: &str,
		roles: &[RoleRepresentation],
	) -> Result<ApiResponse<()>> {
		self.api.write(Method::POST, self.client_mappings_url(realm, group_id, client), roles).await
	}

	/// `DELETE /admin/realms/{realm}/groups/{id}/role-mappings/clients/{client}`.
	pub async fn delete_client_role_mappings(
		&self,
		realm: &str,
		group_id: &str,
		client: &str,
		roles: &[RoleRepresentation],
	) -> Result<ApiResponse<()>> {
		self.api
			.write(Method::DELETE, self.client_mappings_url(realm, group_id, client), roles)
			.await
	}

	fn realm_mappings_url(&self, realm: &str, group_id: &str) -> Url {
		self.api.url(["realms", realm, "groups", group_id, "role-mappings", "realm"])
	}

	fn client_mappings_url(&self, realm: &str, group_id: &str, client: &str) -> Url {
		self.api.url(["realms", realm, "groups", group_id, "role-mappings", "clients", client])
	}
}

fn pick_by_name(
	listed: ApiResponse<Vec<GroupRepresentation>>,
	name: &str,
) -> ApiResponse<GroupRepresentation> {
	let ApiResponse { value, raw } = listed;
	let value = value
		.unwrap_or_default()
		.into_iter()
		.find(|group| group.name.as_deref() == Some(name));

	ApiResponse { value, raw }
}
