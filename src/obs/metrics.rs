// self
use crate::{
	obs::{FlowKind, FlowOutcome},
	retry::AttemptOutcome,
};

/// Records a flow outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"keycloak_admin_client_flow_total",
			"flow" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Records a reauthentication triggered by the given admin API status (401 or 403).
pub fn record_reauthentication(status: u16) {
	#[cfg(feature = "metrics")]
	{
		let label = if status == 403 { "forbidden" } else { "unauthorized" };

		metrics::counter!("keycloak_admin_client_reauth_total", "trigger" => label).increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = status;
	}
}

/// Records a transport-level retry.
pub fn record_retry(outcome: AttemptOutcome) {
	#[cfg(feature = "metrics")]
	{
		let label = match outcome {
			AttemptOutcome::NetworkError => "network",
			AttemptOutcome::Status(429) => "throttled",
			AttemptOutcome::Status(_) => "server",
		};

		metrics::counter!("keycloak_admin_client_retry_total", "cause" => label).increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}
