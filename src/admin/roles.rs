//! Realm role endpoints.

// crates.io
use http::Method;
// self
use crate::{
	_prelude::*,
	admin::{AdminApi, ApiResponse, Extra, ListQuery},
	doer::RequestDoer,
};

/// Role representation, used both for realm roles and role mappings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleRepresentation {
	/// Role id.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub id: Option<String>,
	/// Role name.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	/// Free-form description.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	/// Whether this is a composite role.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub composite: Option<bool>,
	/// Whether the role belongs to a client rather than the realm.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub client_role: Option<bool>,
	/// Realm or client id the role belongs to.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub container_id: Option<String>,
	/// Remaining fields.
	#[serde(flatten)]
	pub extra: Extra,
}
impl RoleRepresentation {
	/// Representation with just a role name.
	pub fn named(name: impl Into<String>) -> Self {
		Self { name: Some(name.into()), ..Default::default() }
	}
}

/// Realm roles API.
#[derive(Clone, Debug)]
pub struct RolesClient {
	api: AdminApi,
}
impl RolesClient {
	/// Creates a helper over `doer` rooted at `base`.
	pub fn new(doer: Arc<dyn RequestDoer>, base: Url) -> Self {
		Self { api: AdminApi::new(doer, base) }
	}

	/// `GET /admin/realms/{realm}/roles`.
	pub async fn list(
		&self,
		realm: &str,
		query: &ListQuery,
	) -> Result<ApiResponse<Vec<RoleRepresentation>>> {
		let mut url = self.api.url(["realms", realm, "roles"]);

		query.apply(&mut url);

		self.api.get(url).await
	}

	/// `GET /admin/realms/{realm}/roles/{name}`.
	pub async fn get(&self, realm: &str, name: &str) -> Result<ApiResponse<RoleRepresentation>> {
		self.api.get(self.api.url(["realms", realm, "roles", name])).await
	}

	/// `POST /admin/realms/{realm}/roles`.
	pub async fn create(
		&self,
		realm: &str,
		role: &RoleRepresentation,
	) -> Result<ApiResponse<()>> {
		self.api.write(Method::POST, self.api.url(["realms", realm, "roles"]), role).await
	}

	/// `DELETE /admin/realms/{realm}/roles/{name}`.
	pub async fn delete(&self, realm: &str, name: &str) -> Result<ApiResponse<()>> {
		self.api.delete(self.api.url(["realms", realm, "roles", name])).await
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::admin::test_support::{FakeDoer, base, json};

	#[tokio::test]
	async fn list_applies_query_and_decodes() {
		let doer = FakeDoer::replying(vec![json(
			200,
			r#"[{"id":"1","name":"viewer","composite":false},{"id":"2","name":"editor","composite":true}]"#,
		)]);
		let query = ListQuery { brief_representation: Some(true), ..Default::default() };
		let roles = RolesClient::new(doer.clone(), base())
			.list("test", &query)
			.await
			.expect("Roles should load.")
			.into_value()
			.unwrap_or_default();

		assert_eq!(roles.len(), 2);
		assert_eq!(roles[1].name.as_deref(), Some("editor"));
		assert_eq!(roles[1].composite, Some(true));
		assert_eq!(
			doer.last().url.as_str(),
			"https://kc.example.com/auth/admin/realms/test/roles?briefRepresentation=true",
		);
	}

	#[tokio::test]
	async fn empty_list_body_yields_none() {
		let doer = FakeDoer::replying(vec![json(200, "")]);
		let response = RolesClient::new(doer, base())
			.list("test", &ListQuery::default())
			.await
			.expect("Empty list should not fail.");

		assert_eq!(response.status(), 200);
		assert!(response.value.is_none());
	}

	#[tokio::test]
	async fn create_reports_location_id() {
		let mut headers = http::HeaderMap::new();

		headers.insert(
			http::header::LOCATION,
			http::HeaderValue::from_static(
				"https://kc.example.com/auth/admin/realms/test/roles/auditor",
			),
		);

		let doer = FakeDoer::replying(vec![crate::transport::RawResponse::new(
			201,
			headers,
			Vec::new(),
		)]);
		let response = RolesClient::new(doer.clone(), base())
			.create("test", &RoleRepresentation::named("auditor"))
			.await
			.expect("Role should be created.");

		assert_eq!(response.resource_id(), "auditor");
		assert_eq!(doer.last().body.as_deref(), Some(&br#"{"name":"auditor"}"#[..]));
	}

	#[tokio::test]
	async fn role_names_are_path_encoded() {
		let doer = FakeDoer::replying(vec![json(204, "")]);

		RolesClient::new(doer.clone(), base())
			.delete("test", "ops/admin")
			.await
			.expect("Role should be deleted.");

		let request = doer.last();

		assert_eq!(request.method, Method::DELETE);
		assert_eq!(request.url.path(), "/auth/admin/realms/test/roles/ops%2Fadmin");
	}

	#[tokio::test]
	async fn conflicts_are_classified() {
		let doer = FakeDoer::replying(vec![json(
			409,
			r#"{"errorMessage":"Role with name auditor already exists"}"#,
		)]);
		let err = RolesClient::new(doer, base())
			.create("test", &RoleRepresentation::named("auditor"))
			.await
			.expect_err("409 should fail.");

		assert!(err.is_conflict());
		assert!(crate::api_error::is_conflict(&err));
	}
}
