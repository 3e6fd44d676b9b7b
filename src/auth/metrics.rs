// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for token endpoint activity.
#[derive(Debug, Default)]
pub struct AuthMetrics {
	logins: AtomicU64,
	refreshes: AtomicU64,
	refresh_fallbacks: AtomicU64,
	refresh_skips: AtomicU64,
	failures: AtomicU64,
}
impl AuthMetrics {
	/// Returns the number of login exchanges sent to the token endpoint.
	pub fn logins(&self) -> u64 {
		self.logins.load(Ordering::Relaxed)
	}

	/// Returns the number of refresh exchanges sent to the token endpoint.
	pub fn refreshes(&self) -> u64 {
		self.refreshes.load(Ordering::Relaxed)
	}

	/// Returns how often a refresh was rejected with 400 and replaced by a login.
	pub fn refresh_fallbacks(&self) -> u64 {
		self.refresh_fallbacks.load(Ordering::Relaxed)
	}

	/// Returns how often a 401/403 found the token already rotated by another caller.
	pub fn refresh_skips(&self) -> u64 {
		self.refresh_skips.load(Ordering::Relaxed)
	}

	/// Returns the number of failed login or refresh calls.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record_login(&self) {
		self.logins.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh(&self) {
		self.refreshes.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh_fallback(&self) {
		self.refresh_fallbacks.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh_skip(&self) {
		self.refresh_skips.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}
}
