//! Server info endpoint.

// self
use crate::{
	_prelude::*,
	admin::{AdminApi, ApiResponse},
	doer::RequestDoer,
};

/// `systemInfo` section of the server info.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemInfo {
	/// Keycloak server version.
	pub version: String,
}

/// One registered component type.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentType {
	/// Component provider id.
	pub id: String,
}

/// One SPI and its providers.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderType {
	/// Whether the SPI is internal.
	pub internal: bool,
	/// Providers keyed by id.
	pub providers: BTreeMap<String, serde_json::Value>,
}

/// One installed theme.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
	/// Theme name.
	pub name: String,
	/// Supported locales.
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub locales: Vec<String>,
}

/// `GET /admin/serverinfo` payload.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerInfo {
	/// Server version details.
	pub system_info: SystemInfo,
	/// Component types keyed by SPI.
	pub component_types: BTreeMap<String, Vec<ComponentType>>,
	/// SPIs keyed by name.
	#[serde(rename = "providers")]
	pub provider_types: BTreeMap<String, ProviderType>,
	/// Themes keyed by type (`login`, `account`, ...).
	pub themes: BTreeMap<String, Vec<Theme>>,
}
impl ServerInfo {
	/// Returns true when the named SPI has a provider with `provider_id`.
	pub fn has_provider(&self, spi: &str, provider_id: &str) -> bool {
		self.provider_types.get(spi).is_some_and(|spi| spi.providers.contains_key(provider_id))
	}
}

/// Server info API.
#[derive(Clone, Debug)]
pub struct ServerInfoClient {
	api: AdminApi,
}
impl ServerInfoClient {
	/// Creates a helper over `doer` rooted at `base`.
	pub fn new(doer: Arc<dyn RequestDoer>, base: Url) -> Self {
		Self { api: AdminApi::new(doer, base) }
	}

	/// Fetches the server info.
	pub async fn get(&self) -> Result<ApiResponse<ServerInfo>> {
		self.api.get(self.api.url(["serverinfo"])).await
	}
}
