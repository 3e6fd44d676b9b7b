mod common;

// std
use std::{collections::HashSet, fs};
// crates.io
use color_eyre::Result;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
// self
use common::*;
use keycloak_admin_client::{
	ClientConfig, RequestDoer,
	auth::{
		JwtSigner, SigningAlgorithm,
		jwt::{ASSERTION_TTL, AssertionClaims, CLIENT_ASSERTION_TYPE},
	},
	config::JwtAuth,
	transport::ApiRequest,
	url::Url,
};

const AUDIENCE: &str = "https://kc.example.com/realms/master";

fn fixture(name: &str) -> String {
	fs::read_to_string(format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR")))
		.expect("Key fixture should be readable.")
}

fn decode(token: &str, algorithm: Algorithm, key: DecodingKey) -> AssertionClaims {
	let mut validation = Validation::new(algorithm);

	validation.set_audience(&[AUDIENCE]);
	validation.set_issuer(&["operator"]);
	validation.set_required_spec_claims(&["exp", "aud", "iss", "sub"]);

	jsonwebtoken::decode::<AssertionClaims>(token, &key, &validation)
		.expect("Assertion should verify with the matching public key.")
		.claims
}

#[test]
fn assertions_verify_for_each_key_family() {
	let cases = [
		(
			SigningAlgorithm::Rs256,
			Algorithm::RS256,
			"rsa_private.pem",
			DecodingKey::from_rsa_pem(fixture("rsa_public.pem").as_bytes()),
		),
		(
			SigningAlgorithm::Ps384,
			Algorithm::PS384,
			"rsa_private.pem",
			DecodingKey::from_rsa_pem(fixture("rsa_public.pem").as_bytes()),
		),
		(
			SigningAlgorithm::Es256,
			Algorithm::ES256,
			"ec_private.pem",
			DecodingKey::from_ec_pem(fixture("ec_public.pem").as_bytes()),
		),
		(
			SigningAlgorithm::Es256,
			Algorithm::ES256,
			"ec_sec1_private.pem",
			DecodingKey::from_ec_pem(fixture("ec_public.pem").as_bytes()),
		),
		(
			SigningAlgorithm::Es384,
			Algorithm::ES384,
			"p384_sec1_private.pem",
			DecodingKey::from_ec_pem(fixture("p384_public.pem").as_bytes()),
		),
		(
			SigningAlgorithm::EdDsa,
			Algorithm::EdDSA,
			"ed25519_private.pem",
			DecodingKey::from_ed_pem(fixture("ed25519_public.pem").as_bytes()),
		),
	];

	for (algorithm, jose, private_key, public_key) in cases {
		let signer = JwtSigner::from_pem(algorithm, &fixture(private_key))
			.expect("Private key fixture should parse.");
		let token = signer.sign("operator", AUDIENCE).expect("Assertion should be signed.");
		let header = jsonwebtoken::decode_header(&token).expect("Header should decode.");
		let claims = decode(&token, jose, public_key.expect("Public key fixture should parse."));

		assert_eq!(header.alg, jose);
		assert_eq!(claims.sub, "operator");
		assert_eq!(claims.exp - claims.iat, ASSERTION_TTL.as_secs() as i64);
		assert_eq!(claims.jti.len(), 32);
	}
}

#[test]
fn every_assertion_gets_a_fresh_jti() {
	let signer = JwtSigner::from_pem(SigningAlgorithm::Rs256, &fixture("rsa_private.pem"))
		.expect("Private key fixture should parse.");
	let key = || {
		DecodingKey::from_rsa_pem(fixture("rsa_public.pem").as_bytes())
			.expect("Public key fixture should parse.")
	};
	let ids = (0..5)
		.map(|_| {
			let token = signer.sign("operator", AUDIENCE).expect("Assertion should be signed.");

			decode(&token, Algorithm::RS256, key()).jti
		})
		.collect::<HashSet<_>>();

	assert_eq!(ids.len(), 5);
}

#[test]
fn ecparam_genkey_output_is_accepted() {
	let pem = format!(
		"-----BEGIN EC PARAMETERS-----\nBggqhkjOPQMBBw==\n-----END EC PARAMETERS-----\n{}",
		fixture("ec_sec1_private.pem"),
	);
	let signer =
		JwtSigner::from_pem(SigningAlgorithm::Es256, &pem).expect("SEC1 key with parameters should parse.");
	let token = signer.sign("operator", AUDIENCE).expect("Assertion should be signed.");
	let claims = decode(
		&token,
		Algorithm::ES256,
		DecodingKey::from_ec_pem(fixture("ec_public.pem").as_bytes())
			.expect("Public key fixture should parse."),
	);

	assert_eq!(claims.iss, "operator");
}

#[test]
fn key_family_must_match_the_algorithm() {
	let err = JwtSigner::from_pem(SigningAlgorithm::Es256, &fixture("rsa_private.pem"))
		.expect_err("An RSA key must not load as ECDSA.");

	assert!(err.to_string().contains("ECDSA"));
}

#[tokio::test]
async fn login_sends_a_signed_client_assertion() -> Result<()> {
	let fake = FakeKeycloak::new();
	let config = ClientConfig::new(BASE_URL, "operator")
		.with_jwt_auth(JwtAuth::signed("ES256", fixture("ec_private.pem")));
	let client = client(&config, &fake);

	client
		.execute(ApiRequest::get(Url::parse(&format!("{BASE_URL}/admin/realms/master"))?))
		.await?;

	let token_request = fake.token_requests.lock()[0].clone();
	let assertion = form_value(&token_request, "client_assertion")
		.expect("Token request should carry a client assertion.");
	let claims = decode(
		&assertion,
		Algorithm::ES256,
		DecodingKey::from_ec_pem(fixture("ec_public.pem").as_bytes())?,
	);

	assert_eq!(form_value(&token_request, "grant_type").as_deref(), Some("client_credentials"));
	assert_eq!(
		form_value(&token_request, "client_assertion_type").as_deref(),
		Some(CLIENT_ASSERTION_TYPE),
	);
	assert!(form_value(&token_request, "client_secret").is_none());
	assert_eq!(claims.aud, AUDIENCE);

	Ok(())
}

#[tokio::test]
async fn each_login_signs_a_new_assertion() -> Result<()> {
	let fake = FakeKeycloak::new();
	let config = ClientConfig::new(BASE_URL, "operator")
		.with_jwt_auth(JwtAuth::signed("RS256", fixture("rsa_private.pem")));
	let client = client(&config, &fake);

	client.login().await?;
	client.refresh().await?;

	let requests = fake.token_requests.lock().clone();
	let first = form_value(&requests[0], "client_assertion");
	let second = form_value(&requests[1], "client_assertion");

	assert!(first.is_some());
	assert_ne!(first, second);

	Ok(())
}

#[tokio::test]
async fn presigned_token_file_is_sent_trimmed() -> Result<()> {
	let path = std::env::temp_dir().join(format!("kc-assertion-{}.jwt", std::process::id()));

	fs::write(&path, "header.payload.signature\n\n")?;

	let fake = FakeKeycloak::new();
	let config =
		ClientConfig::new(BASE_URL, "operator").with_jwt_auth(JwtAuth::from_file(path.clone()));
	let client = client(&config, &fake);

	client.login().await?;
	fs::remove_file(&path)?;

	let token_request = fake.token_requests.lock()[0].clone();

	assert_eq!(
		form_value(&token_request, "client_assertion").as_deref(),
		Some("header.payload.signature"),
	);

	Ok(())
}
