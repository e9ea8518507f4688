//! Demonstrates loading a tenant registry from JSON and signing a JS-API page configuration
//! against a mocked platform origin.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::json;
// self
use weixin_broker::{
	broker::Broker, http::ReqwestHttpClient, registry::TenantRegistry, store::MemoryCache,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/cgi-bin/token");
			then.status(200).json_body(json!({ "access_token": "demo-token", "expires_in": 7200 }));
		})
		.await;
	let ticket_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/cgi-bin/ticket/getticket").query_param("access_token", "demo-token");
			then.status(200).json_body(
				json!({ "errcode": 0, "errmsg": "ok", "ticket": "demo-ticket", "expires_in": 7200 }),
			);
		})
		.await;
	let document = json!({
		"tenants": [{
			"app_id": "wx-demo",
			"secret": "demo-secret",
			"origin": { "flavor": "platform", "base_url": server.base_url() },
		}],
	});
	let registry = TenantRegistry::from_json(
		&document.to_string(),
		Arc::new(MemoryCache::default()),
		ReqwestHttpClient::new()?,
	)?;
	let broker = Broker::new(Arc::new(registry));
	let config = broker.jsapi_config("wx-demo", "https://shop.example.com/checkout").await?;

	println!("JS-API config: {}.", serde_json::to_string_pretty(&config)?);

	token_mock.assert_async().await;
	ticket_mock.assert_async().await;

	Ok(())
}
