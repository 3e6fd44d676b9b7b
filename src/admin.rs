//! Typed helpers for the admin endpoints the operator reconciles.
//!
//! Every helper holds an `Arc<dyn RequestDoer>` and a base URL; none of them ever sees a
//! credential. Successful calls return an [`ApiResponse`] with the decoded payload and the raw
//! response (for example to read the `Location` of a created resource). Failures are classified
//! into [`ApiError`](crate::api_error::ApiError), which still carries the raw response.

pub mod clients;
pub mod groups;
pub mod realms;
pub mod roles;
pub mod server;
pub mod users;

pub use clients::*;
pub use groups::*;
pub use realms::*;
pub use roles::*;
pub use server::*;
pub use users::*;

// crates.io
use http::Method;
// self
use crate::{
	_prelude::*,
	api_error,
	config::join_segments,
	doer::RequestDoer,
	transport::{ApiRequest, RawResponse},
};

/// Unknown representation fields, kept so that they round-trip unchanged.
pub type Extra = serde_json::Map<String, serde_json::Value>;

/// Decoded payload plus the response it came from.
#[derive(Clone, Debug)]
pub struct ApiResponse<T> {
	/// Decoded body; `None` for empty bodies and write operations.
	pub value: Option<T>,
	/// Raw response.
	pub raw: RawResponse,
}
impl<T> ApiResponse<T> {
	/// HTTP status code.
	pub fn status(&self) -> u16 {
		self.raw.status()
	}

	/// Identifier from the `Location` header of a create call, or an empty string.
	pub fn resource_id(&self) -> String {
		self.raw.resource_id()
	}

	/// Discards the raw response.
	pub fn into_value(self) -> Option<T> {
		self.value
	}
}

/// Shared plumbing for the typed helpers.
#[derive(Clone)]
struct AdminApi {
	doer: Arc<dyn RequestDoer>,
	base: Url,
}
impl AdminApi {
	fn new(doer: Arc<dyn RequestDoer>, base: Url) -> Self {
		Self { doer, base }
	}

	fn url<const N: usize>(&self, segments: [&str; N]) -> Url {
		join_segments(&self.base, ["admin"].into_iter().chain(segments))
	}

	async fn get<T>(&self, url: Url) -> Result<ApiResponse<T>>
	where
		T: DeserializeOwned,
	{
		self.fetch(ApiRequest::get(url)).await
	}

	async fn write<B>(&self, method: Method, url: Url, body: &B) -> Result<ApiResponse<()>>
	where
		B: ?Sized + Serialize,
	{
		let request = ApiRequest::new(method, url).json(body)?;

		Ok(ApiResponse { value: None, raw: self.call(request).await? })
	}

	async fn delete(&self, url: Url) -> Result<ApiResponse<()>> {
		Ok(ApiResponse { value: None, raw: self.call(ApiRequest::delete(url)).await? })
	}

	async fn fetch<T>(&self, request: ApiRequest) -> Result<ApiResponse<T>>
	where
		T: DeserializeOwned,
	{
		let raw = self.call(request).await?;
		let value = if raw.body().iter().all(u8::is_ascii_whitespace) { None } else { Some(raw.json()?) };

		Ok(ApiResponse { value, raw })
	}

	async fn call(&self, request: ApiRequest) -> Result<RawResponse> {
		let raw = self.doer.execute(request).await?;

		api_error::check_response(&raw)?;

		Ok(raw)
	}
}
impl Debug for AdminApi {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AdminApi").field("base", &self.base.as_str()).finish_non_exhaustive()
	}
}

/// Paging and search options shared by list endpoints.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListQuery {
	/// Substring (or exact, see `exact`) name filter.
	pub search: Option<String>,
	/// Match `search` exactly.
	pub exact: Option<bool>,
	/// Offset of the first result.
	pub first: Option<u32>,
	/// Maximum number of results.
	pub max: Option<u32>,
	/// Return brief representations.
	pub brief_representation: Option<bool>,
}
impl ListQuery {
	/// Exact-name search.
	pub fn exact(name: impl Into<String>) -> Self {
		Self { search: Some(name.into()), exact: Some(true), ..Default::default() }
	}

	/// Sets the page window.
	pub fn with_page(mut self, first: u32, max: u32) -> Self {
		self.first = Some(first);
		self.max = Some(max);

		self
	}

	fn apply(&self, url: &mut Url) {
		let mut pairs = Vec::new();

		if let Some(search) = &self.search {
			pairs.push(("search", search.clone()));
		}
		if let Some(exact) = self.exact {
			pairs.push(("exact", exact.to_string()));
		}
		if let Some(first) = self.first {
			pairs.push(("first", first.to_string()));
		}
		if let Some(max) = self.max {
			pairs.push(("max", max.to_string()));
		}
		if let Some(brief) = self.brief_representation {
			pairs.push(("briefRepresentation", brief.to_string()));
		}
		if !pairs.is_empty() {
			url.query_pairs_mut().extend_pairs(pairs);
		}
	}
}
