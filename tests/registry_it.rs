// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::json;
// self
use weixin_broker::{
	auth::CredentialKind,
	broker::Broker,
	error::{ConfigError, Error},
	http::ReqwestHttpClient,
	oauth::{OAuthCodeRequest, OAuthScope},
	registry::TenantRegistry,
	signature::{self, SignatureRequest},
	store::MemoryCache,
};

fn registry_json(server: &MockServer) -> String {
	json!({
		"settings": { "max_ticket_attempts": 3 },
		"tenants": [
			{
				"app_id": "wx-direct",
				"secret": "direct-secret",
				"name": "Direct",
				"signature_token": "push-token",
				"subscribe_url": "https://mp.example.com/subscribe",
				"oauth_redirect_uri": "https://example.com/oauth/return?uri=",
				"origin": { "flavor": "platform", "base_url": server.base_url() },
			},
			{
				"app_id": "wx-proxied",
				"secret": "proxied-secret",
				"origin": {
					"flavor": "proxy",
					"base_url": server.url("/proxy/"),
					"username": "svc",
					"password": "pw",
				},
			},
		],
	})
	.to_string()
}

fn broker(server: &MockServer) -> Broker {
	let registry = TenantRegistry::from_json(
		&registry_json(server),
		Arc::new(MemoryCache::default()),
		ReqwestHttpClient::new().expect("HTTP client should build."),
	)
	.expect("Registry document should load.");

	Broker::new(Arc::new(registry))
}

#[tokio::test]
async fn tenants_resolve_to_their_own_origin_flavor() -> Result<()> {
	let server = MockServer::start_async().await;
	let platform = server
		.mock_async(|when, then| {
			when.method(GET).path("/cgi-bin/token").query_param("appid", "wx-direct");
			then.status(200).json_body(json!({ "access_token": "direct-token", "expires_in": 7200 }));
		})
		.await;
	let proxy = server
		.mock_async(|when, then| {
			when.method(POST).path("/proxy/token");
			then.status(200).json_body(json!({
				"code": "00",
				"data": { "access_token": "proxied-token", "expires_in": 7200 },
			}));
		})
		.await;
	let broker = broker(&server);

	assert_eq!(broker.registry().len(), 2);
	assert_eq!(broker.name("wx-direct")?, "Direct");
	assert_eq!(broker.name("wx-proxied")?, "wx-proxied");
	assert_eq!(broker.access_token("wx-direct").await?.expose(), "direct-token");
	assert_eq!(broker.access_token("wx-proxied").await?.expose(), "proxied-token");

	broker.access_token("wx-direct").await?;

	platform.assert_calls_async(1).await;
	proxy.assert_calls_async(1).await;

	broker.evict("wx-direct", CredentialKind::Token).await?;
	broker.access_token("wx-direct").await?;

	platform.assert_calls_async(2).await;

	Ok(())
}

#[tokio::test]
async fn unknown_tenants_are_reported() {
	let server = MockServer::start_async().await;
	let broker = broker(&server);
	let err = broker.access_token("wx-nobody").await.expect_err("Unknown tenant should fail.");

	assert!(matches!(err, Error::TenantNotFound { ref app_id } if app_id == "wx-nobody"));
}

#[tokio::test]
async fn derivation_helpers_use_tenant_configuration() {
	let server = MockServer::start_async().await;
	let broker = broker(&server);
	let url = broker
		.authorize_url("wx-direct", &OAuthCodeRequest {
			uri: "https://app.example.com/home".into(),
			scope: OAuthScope::Base,
			state: "s1".into(),
		})
		.expect("Authorize URL should build.");

	assert_eq!(
		url.query(),
		Some(
			"appid=wx-direct&redirect_uri=https%3A%2F%2Fexample.com%2Foauth%2Freturn%3Furi%3Dhttps%3A%2F%2Fapp.example.com%2Fhome&response_type=code&scope=snsapi_base&state=s1"
		)
	);
	assert_eq!(url.fragment(), Some("wechat_redirect"));
	assert_eq!(
		broker.subscribe_url("wx-direct").expect("Tenant should resolve."),
		Some("https://mp.example.com/subscribe".into())
	);

	let request = SignatureRequest {
		signature: signature::push_signature("push-token", "1700000000", "abc"),
		timestamp: "1700000000".into(),
		nonce: "abc".into(),
	};

	broker.verify_signature("wx-direct", &request).expect("Signature should verify.");

	assert!(matches!(
		broker.verify_signature("wx-proxied", &request),
		Err(Error::SignatureMismatch)
	));
}

#[test]
fn malformed_documents_are_rejected() {
	let err = TenantRegistry::from_json(
		r#"{"tenants":[{"app_id":"wx one","secret":"s"}]}"#,
		Arc::new(MemoryCache::default()),
		ReqwestHttpClient::new().expect("HTTP client should build."),
	)
	.expect_err("Whitespace app id should be rejected.");

	match err {
		Error::Config(ConfigError::RegistryParse { source }) =>
			assert_eq!(source.path().to_string(), "tenants[0].app_id"),
		other => panic!("Unexpected error: {other:?}."),
	}

	let duplicate = json!({
		"tenants": [
			{ "app_id": "wx-same", "secret": "a" },
			{ "app_id": "wx-same", "secret": "b" },
		],
	})
	.to_string();
	let err = TenantRegistry::from_json(
		&duplicate,
		Arc::new(MemoryCache::default()),
		ReqwestHttpClient::new().expect("HTTP client should build."),
	)
	.expect_err("Duplicate tenants should be rejected.");

	assert!(matches!(err, Error::Config(ConfigError::DuplicateTenant { .. })));
}
