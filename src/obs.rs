//! Optional observability helpers for authentication and request flows.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `keycloak_admin_client.flow` with the `flow`
//!   and `stage` (call site) fields, plus debug events for retries and reauthentication.
//! - Enable `metrics` to increment the `keycloak_admin_client_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Flow kinds observed by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Initial (or fallback) token endpoint login.
	Login,
	/// Reauthentication after a 401/403.
	Refresh,
	/// Authenticated admin API call.
	Request,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Login => "login",
			FlowKind::Refresh => "refresh",
			FlowKind::Request => "request",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a flow.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Emits a `DEBUG` event when the `tracing` feature is enabled; expands to nothing otherwise.
#[cfg(feature = "tracing")]
macro_rules! debug_event {
	($($arg:tt)*) => {
		::tracing::debug!($($arg)*)
	};
}
#[cfg(not(feature = "tracing"))]
macro_rules! debug_event {
	($($arg:tt)*) => {};
}
pub(crate) use debug_event;
