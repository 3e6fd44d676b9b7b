//! Realm endpoints.

// crates.io
use http::Method;
// self
use crate::{
	_prelude::*,
	admin::{AdminApi, ApiResponse, Extra},
	doer::RequestDoer,
};

/// Realm representation; unmodelled fields are kept in `extra`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealmRepresentation {
	/// Internal id.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub id: Option<String>,
	/// Realm name.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub realm: Option<String>,
	/// Display name.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub display_name: Option<String>,
	/// Whether the realm is enabled.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub enabled: Option<bool>,
	/// Remaining fields.
	#[serde(flatten)]
	pub extra: Extra,
}
impl RealmRepresentation {
	/// Representation with just a realm name.
	pub fn named(realm: impl Into<String>) -> Self {
		Self { realm: Some(realm.into()), ..Default::default() }
	}
}

/// Realms API.
#[derive(Clone, Debug)]
pub struct RealmsClient {
	api: AdminApi,
}
impl RealmsClient {
	/// Creates a helper over `doer` rooted at `base`.
	pub fn new(doer: Arc<dyn RequestDoer>, base: Url) -> Self {
		Self { api: AdminApi::new(doer, base) }
	}

	/// `GET /admin/realms/{realm}`.
	pub async fn get(&self, realm: &str) -> Result<ApiResponse<RealmRepresentation>> {
		self.api.get(self.api.url(["realms", realm])).await
	}

	/// `POST /admin/realms`.
	pub async fn create(&self, representation: &RealmRepresentation) -> Result<ApiResponse<()>> {
		self.api.write(Method::POST, self.api.url(["realms"]), representation).await
	}

	/// `PUT /admin/realms/{realm}`.
	pub async fn update(
		&self,
		realm: &str,
		representation: &RealmRepresentation,
	) -> Result<ApiResponse<()>> {
		self.api.write(Method::PUT, self.api.url(["realms", realm]), representation).await
	}

	/// `DELETE /admin/realms/{realm}`.
	pub async fn delete(&self, realm: &str) -> Result<ApiResponse<()>> {
		self.api.delete(self.api.url(["realms", realm])).await
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::admin::test_support::{FakeDoer, base, json};

	#[tokio::test]
	async fn get_keeps_unknown_fields() {
		let doer = FakeDoer::replying(vec![json(
			200,
			r#"{"id":"r-1","realm":"test","enabled":true,"sslRequired":"external"}"#,
		)]);
		let realm = RealmsClient::new(doer.clone(), base())
			.get("test")
			.await
			.expect("Realm should load.")
			.into_value()
			.expect("Realm body should decode.");

		assert_eq!(realm.realm.as_deref(), Some("test"));
		assert_eq!(realm.enabled, Some(true));
		assert_eq!(realm.extra["sslRequired"], "external");
		assert_eq!(doer.last().url.path(), "/auth/admin/realms/test");
	}

	#[tokio::test]
	async fn create_posts_json_body() {
		let doer = FakeDoer::replying(vec![json(201, "")]);
		let response = RealmsClient::new(doer.clone(), base())
			.create(&RealmRepresentation::named("ops"))
			.await
			.expect("Realm should be created.");
		let request = doer.last();

		assert_eq!(response.status(), 201);
		assert_eq!(request.method, Method::POST);
		assert_eq!(request.url.path(), "/auth/admin/realms");
		assert_eq!(request.body.as_deref(), Some(&br#"{"realm":"ops"}"#[..]));
	}

	#[tokio::test]
	async fn missing_realm_is_not_found() {
		let doer = FakeDoer::replying(vec![json(404, r#"{"error":"Realm not found."}"#)]);
		let err = RealmsClient::new(doer, base()).delete("gone").await.expect_err("404 should fail.");

		assert!(err.is_not_found());
		assert_eq!(err.to_string(), "Realm not found.");
	}
}
