//! The single capability collaborators use to reach the admin API.

// self
use crate::{
	_prelude::*,
	transport::{ApiRequest, RawResponse},
};

/// Boxed future returned by [`RequestDoer::execute`].
pub type DoFuture<'a> = Pin<Box<dyn Future<Output = Result<RawResponse>> + 'a + Send>>;

/// Executes prepared admin API requests.
///
/// Implementations own authentication and retries. Callers never see credentials; they get the
/// final [`RawResponse`] for every status and classify it themselves, typically with
/// [`check_response`](crate::api_error::check_response).
pub trait RequestDoer
where
	Self: 'static + Send + Sync,
{
	/// Sends `request`, reauthenticating and replaying it at most once on 401/403.
	fn execute(&self, request: ApiRequest) -> DoFuture<'_>;
}
impl<T> RequestDoer for Arc<T>
where
	T: ?Sized + RequestDoer,
{
	fn execute(&self, request: ApiRequest) -> DoFuture<'_> {
		(**self).execute(request)
	}
}
