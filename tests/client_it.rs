mod common;

// std
use std::{sync::Arc, time::Duration};
// crates.io
use color_eyre::Result;
// self
use common::*;
use keycloak_admin_client::{
	ClientConfig, Error, KeycloakClient, RequestDoer,
	auth::GrantType,
	error::ConfigError,
	http::{Method, header::USER_AGENT},
	transport::ApiRequest,
	url::Url,
};

fn admin_url(path: &str) -> Url {
	Url::parse(&format!("{BASE_URL}{path}")).expect("Admin URL fixture should parse.")
}

fn get(path: &str) -> ApiRequest {
	ApiRequest::get(admin_url(path))
}

#[tokio::test]
async fn first_call_logs_in_lazily() -> Result<()> {
	let fake = FakeKeycloak::new();
	let client = client(&secret_config(), &fake);

	assert_eq!(fake.token_calls(), 0);

	let response = client.execute(get("/admin/realms/master")).await?;

	assert_eq!(response.status(), 200);
	assert_eq!(fake.token_calls(), 1);
	assert_eq!(fake.admin_authorizations(), vec!["Bearer token-1"]);

	client.execute(get("/admin/realms/master")).await?;

	assert_eq!(fake.token_calls(), 1);

	Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_calls_share_one_login() -> Result<()> {
	let fake = FakeKeycloak::with_token_delay(Duration::from_millis(30));
	let client = client(&secret_config(), &fake);
	let tasks = (0..5)
		.map(|_| {
			let client = client.clone();

			tokio::spawn(async move { client.execute(get("/admin/realms/master")).await })
		})
		.collect::<Vec<_>>();

	for task in tasks {
		assert_eq!(task.await??.status(), 200);
	}

	assert_eq!(fake.token_calls(), 1);
	assert_eq!(client.auth_metrics().logins(), 1);

	Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_rejections_share_one_refresh() -> Result<()> {
	let fake = FakeKeycloak::with_token_delay(Duration::from_millis(30));
	let client = client(&secret_config(), &fake);

	client.login().await?;
	fake.revoke();

	let tasks = (0..3)
		.map(|_| {
			let client = client.clone();

			tokio::spawn(async move { client.execute(get("/admin/realms/master/groups")).await })
		})
		.collect::<Vec<_>>();

	for task in tasks {
		assert_eq!(task.await??.status(), 200);
	}

	assert_eq!(fake.token_calls(), 2);
	assert_eq!(client.auth_metrics().refreshes(), 1);
	assert_eq!(client.token().authorization().as_deref(), Some("Bearer token-2"));

	Ok(())
}

#[tokio::test]
async fn rejected_request_is_replayed_byte_for_byte() -> Result<()> {
	let fake = FakeKeycloak::new();
	let client = client(&secret_config(), &fake);
	let body = br#"{"name":"platform","attributes":{"team":["core"]}}"#.to_vec();

	client.login().await?;
	fake.revoke();

	let request = ApiRequest::new(Method::POST, admin_url("/admin/realms/master/groups"))
		.body("application/json", body.clone());
	let response = client.execute(request).await?;

	assert_eq!(response.status(), 200);

	let sent = fake.admin_requests.lock().clone();

	assert_eq!(sent.len(), 2);
	assert_eq!(sent[0].body.as_deref(), Some(body.as_slice()));
	assert_eq!(sent[1].body, sent[0].body);
	assert_eq!(sent[1].method, Method::POST);
	assert_eq!(sent[1].url, sent[0].url);
	assert_eq!(authorization(&sent[0]), "Bearer token-1");
	assert_eq!(authorization(&sent[1]), "Bearer token-2");

	Ok(())
}

#[tokio::test]
async fn replay_happens_at_most_once() -> Result<()> {
	let fake = FakeKeycloak::new();
	let client = client(&secret_config(), &fake);

	client.login().await?;
	fake.script_admin([json(401, "{}"), json(403, r#"{"error":"Forbidden"}"#)]);

	let response = client.execute(get("/admin/realms/master")).await?;

	assert_eq!(response.status(), 403);
	assert_eq!(fake.admin_calls(), 2);
	assert_eq!(fake.token_calls(), 2);

	Ok(())
}

#[tokio::test]
async fn forbidden_first_attempt_refreshes_and_replays() -> Result<()> {
	let fake = FakeKeycloak::new();
	let client = client(&secret_config(), &fake);

	client.login().await?;
	fake.script_admin([json(403, r#"{"error":"HTTP 403 Forbidden"}"#)]);

	let response = client.execute(get("/admin/realms/master/groups")).await?;

	assert_eq!(response.status(), 200);
	assert_eq!(fake.token_calls(), 2);
	assert_eq!(client.auth_metrics().refreshes(), 1);
	assert_eq!(fake.admin_authorizations(), vec!["Bearer token-1", "Bearer token-2"]);

	Ok(())
}

#[tokio::test]
async fn refresh_rejected_with_400_falls_back_to_login() -> Result<()> {
	let fake = FakeKeycloak::new();
	let client = client(&secret_config(), &fake);

	client.login().await?;
	fake.revoke();
	fake.script_token_statuses([400]);

	let response = client.execute(get("/admin/realms/master")).await?;
	let metrics = client.auth_metrics();

	assert_eq!(response.status(), 200);
	assert_eq!(fake.token_calls(), 3);
	assert_eq!(metrics.refreshes(), 1);
	assert_eq!(metrics.refresh_fallbacks(), 1);
	assert_eq!(metrics.logins(), 2);
	assert_eq!(fake.admin_authorizations().last().map(String::as_str), Some("Bearer token-3"));

	Ok(())
}

#[tokio::test]
async fn refresh_resubmits_the_configured_grant() -> Result<()> {
	let fake = FakeKeycloak::new();
	let client = client(&secret_config(), &fake);

	client.login().await?;
	client.refresh().await?;

	let requests = fake.token_requests.lock().clone();

	assert_eq!(requests.len(), 2);
	assert_eq!(form(&requests[0]), form(&requests[1]));
	assert_eq!(form_value(&requests[1], "grant_type").as_deref(), Some("client_credentials"));
	assert!(form_value(&requests[1], "refresh_token").is_none());

	Ok(())
}

#[tokio::test]
async fn failed_refresh_surfaces_the_token_endpoint_status() {
	let fake = FakeKeycloak::new();
	let client = client(&secret_config(), &fake);

	client.login().await.expect("Initial login should succeed.");
	fake.revoke();
	fake.script_token_statuses([401]);

	let err = client
		.execute(get("/admin/realms/master"))
		.await
		.expect_err("A rejected refresh should fail the call.");

	assert!(matches!(err, Error::AuthEndpoint(ref e) if e.status == 401));
	assert_eq!(fake.admin_calls(), 1);
	assert_eq!(client.auth_metrics().failures(), 1);
}

#[tokio::test]
async fn failed_lazy_login_is_retried_through_reauthentication() {
	let fake = FakeKeycloak::new();
	let client = client(&secret_config(), &fake);

	fake.script_token_statuses([401]);

	let err = client
		.execute(get("/admin/realms/master"))
		.await
		.expect_err("A rejected login should fail the first call.");

	assert!(matches!(err, Error::AuthEndpoint(ref e) if e.status == 401));
	assert_eq!(fake.admin_calls(), 0);

	let response = client
		.execute(get("/admin/realms/master"))
		.await
		.expect("The next call should recover through a refresh.");

	assert_eq!(response.status(), 200);
	assert_eq!(fake.token_calls(), 2);
	assert_eq!(fake.admin_authorizations(), vec!["", "Bearer token-2"]);
}

#[tokio::test]
async fn provided_token_never_reaches_the_token_endpoint() -> Result<()> {
	let fake = FakeKeycloak::accepting("static-token");
	let config = ClientConfig::new(BASE_URL, "operator").with_access_token("static-token");
	let client = KeycloakClient::connect_with_transport(&config, fake.clone()).await?;

	assert_eq!(client.grant(), GrantType::Provided);

	let response = client.execute(get("/admin/realms/master")).await?;

	assert_eq!(response.status(), 200);
	assert_eq!(fake.admin_authorizations(), vec!["bearer static-token"]);

	fake.revoke();

	let response = client.execute(get("/admin/realms/master")).await?;

	assert_eq!(response.status(), 401);
	assert_eq!(fake.admin_calls(), 3);
	assert_eq!(fake.token_calls(), 0);

	client.refresh().await?;
	client.login().await?;

	assert_eq!(fake.token_calls(), 0);

	Ok(())
}

#[tokio::test]
async fn initial_login_runs_on_connect() -> Result<()> {
	let fake = FakeKeycloak::new();
	let client = KeycloakClient::connect_with_transport(&secret_config(), fake.clone()).await?;

	assert_eq!(fake.token_calls(), 1);

	client.execute(get("/admin/serverinfo")).await?;

	assert_eq!(fake.token_calls(), 1);

	let lazy = secret_config().with_initial_login(false);
	let fake = FakeKeycloak::new();

	KeycloakClient::connect_with_transport(&lazy, fake.clone()).await?;

	assert_eq!(fake.token_calls(), 0);

	Ok(())
}

#[tokio::test]
async fn password_grant_form_and_headers() -> Result<()> {
	let fake = FakeKeycloak::new();
	let config = ClientConfig::new(BASE_URL, "admin-cli")
		.with_password_grant("admin", "p@ss word")
		.with_user_agent("operator-test/1.0")
		.with_additional_header("X-Request-Source", "reconciler");
	let client = client(&config, &fake);

	client.execute(get("/admin/realms/master")).await?;

	let token_request = fake.token_requests.lock()[0].clone();
	let admin_request = fake.admin_requests.lock()[0].clone();

	assert_eq!(token_request.method, Method::POST);
	assert_eq!(form_value(&token_request, "grant_type").as_deref(), Some("password"));
	assert_eq!(form_value(&token_request, "client_id").as_deref(), Some("admin-cli"));
	assert_eq!(form_value(&token_request, "username").as_deref(), Some("admin"));
	assert_eq!(form_value(&token_request, "password").as_deref(), Some("p@ss word"));
	assert!(form_value(&token_request, "client_secret").is_none());

	for request in [&token_request, &admin_request] {
		assert_eq!(request.headers.get(USER_AGENT).and_then(|v| v.to_str().ok()), Some("operator-test/1.0"));
		assert_eq!(
			request.headers.get("x-request-source").and_then(|v| v.to_str().ok()),
			Some("reconciler"),
		);
	}

	Ok(())
}

#[tokio::test]
async fn transient_admin_failures_are_retried() -> Result<()> {
	let fake = FakeKeycloak::new();
	let client = client(&secret_config(), &fake);

	client.login().await?;
	fake.script_admin([json(503, ""), json(502, ""), json(200, r#"{"realm":"master"}"#)]);

	let response = client.execute(get("/admin/realms/master")).await?;

	assert_eq!(response.status(), 200);
	assert_eq!(fake.admin_calls(), 3);

	fake.script_admin([json(503, ""), json(503, ""), json(503, "")]);

	let response = client.execute(get("/admin/realms/master")).await?;

	assert_eq!(response.status(), 503);
	assert_eq!(fake.admin_calls(), 6);

	fake.script_admin([json(501, ""), json(200, "{}")]);

	let response = client.execute(get("/admin/realms/master")).await?;

	assert_eq!(response.status(), 501);
	assert_eq!(fake.admin_calls(), 7);

	Ok(())
}

#[tokio::test]
async fn typed_helpers_go_through_the_authenticated_doer() -> Result<()> {
	let fake = FakeKeycloak::new();
	let client = client(&secret_config(), &fake);

	fake.script_admin([json(200, r#"[{"id":"g-7","name":"ops"}]"#)]);

	let found = client.groups().find_by_name("master", "ops").await?;

	assert_eq!(found.value.and_then(|group| group.id).as_deref(), Some("g-7"));
	assert_eq!(fake.admin_authorizations(), vec!["Bearer token-1"]);

	let doer: Arc<dyn RequestDoer> = client.doer();
	let response = doer.execute(get("/admin/realms/master")).await?;

	assert_eq!(response.status(), 200);

	Ok(())
}

#[test]
fn invalid_configs_fail_before_any_network_call() {
	let fake = FakeKeycloak::new();
	let cases = [
		(ClientConfig::new("  ", "operator").with_client_secret("s"), "missing URL"),
		(ClientConfig::new("ftp://kc.example.com", "operator").with_client_secret("s"), "scheme"),
		(ClientConfig::new("not a url", "operator").with_client_secret("s"), "invalid URL"),
		(ClientConfig::new(BASE_URL, "").with_client_secret("s"), "missing client id"),
		(ClientConfig::new(BASE_URL, "operator"), "missing auth method"),
		(
			ClientConfig::new(BASE_URL, "operator")
				.with_client_secret("s")
				.with_additional_header("bad header", "v"),
			"invalid header",
		),
	];

	for (config, case) in cases {
		let err = KeycloakClient::with_transport(&config, fake.clone())
			.expect_err("Invalid configuration should be rejected.");
		let config_err = match err {
			Error::Config(config_err) => config_err,
			other => panic!("Expected a configuration error for {case}, got {other:?}."),
		};

		match case {
			"missing URL" => assert!(matches!(config_err, ConfigError::MissingUrl)),
			"scheme" => assert!(matches!(config_err, ConfigError::UnsupportedScheme { .. })),
			"invalid URL" => assert!(matches!(config_err, ConfigError::InvalidUrl { .. })),
			"missing client id" => assert!(matches!(config_err, ConfigError::MissingClientId)),
			"missing auth method" => assert!(matches!(config_err, ConfigError::MissingAuthMethod)),
			_ => assert!(matches!(config_err, ConfigError::InvalidHeader { .. })),
		}
	}

	assert_eq!(fake.token_calls(), 0);
	assert_eq!(fake.admin_calls(), 0);
}
