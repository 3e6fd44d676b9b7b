//! User endpoints: the declarative user profile, user lookup, and realm role mappings.

// crates.io
use http::Method;
// self
use crate::{
	_prelude::*,
	admin::{AdminApi, ApiResponse, Extra, RoleRepresentation},
	doer::RequestDoer,
	transport::ApiRequest,
};

/// User representation; unmodelled fields are kept in `extra`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRepresentation {
	/// User id.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub id: Option<String>,
	/// Login name.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub username: Option<String>,
	/// Email address.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	/// Given name.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub first_name: Option<String>,
	/// Family name.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub last_name: Option<String>,
	/// Whether the account can log in.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub enabled: Option<bool>,
	/// Whether the email address is verified.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub email_verified: Option<bool>,
	/// Custom attributes.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub attributes: Option<BTreeMap<String, Vec<String>>>,
	/// Group paths to join on creation.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub groups: Option<Vec<String>>,
	/// Remaining fields.
	#[serde(flatten)]
	pub extra: Extra,
}
impl UserRepresentation {
	/// Representation with just a username.
	pub fn named(username: impl Into<String>) -> Self {
		Self { username: Some(username.into()), ..Default::default() }
	}
}

/// One attribute of the declarative user profile.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileAttribute {
	/// Attribute name.
	pub name: String,
	/// Label shown in forms; may be a `${message.key}` reference.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub display_name: Option<String>,
	/// Attribute group the attribute is rendered in.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub group: Option<String>,
	/// Whether the attribute holds several values.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub multivalued: Option<bool>,
	/// Validators, permissions, requirement rules and the like.
	#[serde(flatten)]
	pub extra: Extra,
}

/// Attribute group of the declarative user profile.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileGroup {
	/// Group name.
	pub name: String,
	/// Heading shown above the group.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub display_header: Option<String>,
	/// Description shown under the heading.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub display_description: Option<String>,
	/// Remaining fields.
	#[serde(flatten)]
	pub extra: Extra,
}

/// Realm-wide user profile configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileConfig {
	/// Profile attributes, in display order.
	#[serde(default)]
	pub attributes: Vec<UserProfileAttribute>,
	/// Attribute groups.
	#[serde(default)]
	pub groups: Vec<UserProfileGroup>,
	/// Policy for attributes not declared in the profile (`ENABLED`, `ADMIN_EDIT`, ...).
	#[serde(skip_serializing_if = "Option::is_none")]
	pub unmanaged_attribute_policy: Option<String>,
	/// Remaining fields.
	#[serde(flatten)]
	pub extra: Extra,
}
impl UserProfileConfig {
	/// Looks up an attribute by name.
	pub fn attribute(&self, name: &str) -> Option<&UserProfileAttribute> {
		self.attributes.iter().find(|attribute| attribute.name == name)
	}
}

/// Users API.
#[derive(Clone, Debug)]
pub struct UsersClient {
	api: AdminApi,
}
impl UsersClient {
	/// Creates a helper over `doer` rooted at `base`.
	pub fn new(doer: Arc<dyn RequestDoer>, base: Url) -> Self {
		Self { api: AdminApi::new(doer, base) }
	}

	/// `GET /admin/realms/{realm}/users/profile`.
	pub async fn profile(&self, realm: &str) -> Result<ApiResponse<UserProfileConfig>> {
		self.api.get(self.api.url(["realms", realm, "users", "profile"])).await
	}

	/// `PUT /admin/realms/{realm}/users/profile`; the server answers with the stored profile.
	pub async fn update_profile(
		&self,
		realm: &str,
		profile: &UserProfileConfig,
	) -> Result<ApiResponse<UserProfileConfig>> {
		let request = ApiRequest::new(Method::PUT, self.api.url(["realms", realm, "users", "profile"]))
			.json(profile)?;

		self.api.fetch(request).await
	}

	/// Finds a user by exact username; `value` is `None` when there is no such user.
	pub async fn find_by_username(
		&self,
		realm: &str,
		username: &str,
	) -> Result<ApiResponse<UserRepresentation>> {
		let mut url = self.api.url(["realms", realm, "users"]);

		url.query_pairs_mut().append_pair("username", username).append_pair("exact", "true");

		let ApiResponse { value, raw } = self.api.get::<Vec<UserRepresentation>>(url).await?;

		Ok(ApiResponse { value: value.and_then(|users| users.into_iter().next()), raw })
	}

	/// `POST /admin/realms/{realm}/users`; the new id is in [`ApiResponse::resource_id`].
	pub async fn create(&self, realm: &str, user: &UserRepresentation) -> Result<ApiResponse<()>> {
		self.api.write(Method::POST, self.api.url(["realms", realm, "users"]), user).await
	}

	/// `GET /admin/realms/{realm}/users/{id}/role-mappings/realm`.
	pub async fn realm_role_mappings(
		&self,
		realm: &str,
		user_id: &str,
	) -> Result<ApiResponse<Vec<RoleRepresentation>>> {
		self.api.get(self.realm_mappings_url(realm, user_id)).await
	}

	/// `POST /admin/realms/{realm}/users/{id}/role-mappings/realm`.
	pub async fn add_realm_role_mappings(
		&self,
		realm: &str,
		user_id: &str,
		roles: &[RoleRepresentation],
	) -> Result<ApiResponse<()>> {
		self.api.write(Method::POST, self.realm_mappings_url(realm, user_id), roles).await
	}

	fn realm_mappings_url(&self, realm: &str, user_id: &str) -> Url {
		self.api.url(["realms", realm, "users", user_id, "role-mappings", "realm"])
	}
}
