//! JS-API page configuration signing.

// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::{_prelude::*, auth::AppId, signature};

/// Length of generated nonces.
pub const NONCE_LEN: usize = 10;

/// Configuration handed to the JS-SDK on a web page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsApiConfig {
	/// Enables SDK debug mode; always `false` when signed here.
	pub debug: bool,
	/// Application id.
	pub app_id: String,
	/// Unix timestamp in seconds.
	pub timestamp: i64,
	/// Random nonce.
	pub nonce_str: String,
	/// Lowercase hex SHA-1 signature.
	pub signature: String,
}
impl JsApiConfig {
	/// Signs `url` with `ticket` using the current time and a fresh nonce.
	pub fn sign(app_id: &AppId, ticket: &str, url: &str) -> Self {
		Self::sign_with(
			app_id,
			ticket,
			url,
			OffsetDateTime::now_utc().unix_timestamp(),
			random_string(NONCE_LEN),
		)
	}

	/// Signs `url` with `ticket` using the supplied timestamp and nonce.
	pub fn sign_with(
		app_id: &AppId,
		ticket: &str,
		url: &str,
		timestamp: i64,
		nonce_str: impl Into<String>,
	) -> Self {
		let nonce_str = nonce_str.into();
		let signature = signature::sha1_hex(&format!(
			"jsapi_ticket={ticket}&noncestr={nonce_str}&timestamp={timestamp}&url={url}"
		));

		Self { debug: false, app_id: app_id.to_string(), timestamp, nonce_str, signature }
	}
}

fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}
