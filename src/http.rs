//! Transport primitives for credential origin calls.
//!
//! [`ReqwestHttpClient`] wraps a shared [`ReqwestClient`] so every origin uses the same timeout and
//! redirect policy. [`send_and_decode`] dispatches one request and decodes its JSON body with
//! path-aware diagnostics.

// std
use std::ops::Deref;
// crates.io
use reqwest::{RequestBuilder, redirect::Policy};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	error::{ConfigError, OriginError, TransportError},
};

/// Default upper bound for a single origin round trip.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Credential endpoints answer directly, so clients built here never follow redirects. Configure
/// any custom [`ReqwestClient`] passed to [`ReqwestHttpClient::with_client`] the same way.
#[derive(Clone, Debug)]
pub struct ReqwestHttpClient(pub ReqwestClient);
impl ReqwestHttpClient {
	/// Builds a client bounded by [`DEFAULT_TIMEOUT`].
	pub fn new() -> Result<Self, ConfigError> {
		Self::with_timeout(DEFAULT_TIMEOUT)
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client whose requests fail after `timeout`.
	pub fn with_timeout(timeout: Duration) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder().timeout(timeout).redirect(Policy::none()).build()?;

		Ok(Self(client))
	}
}
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

/// Sends `request` and decodes the JSON body into `T`.
///
/// Non-2xx statuses are not treated as failures on their own; both origins report failures in the
/// body, so the body is always decoded and the status is kept for diagnostics.
pub async fn send_and_decode<T>(request: RequestBuilder) -> Result<T>
where
	T: DeserializeOwned,
{
	let response = request.send().await.map_err(map_reqwest_error)?;
	let status = response.status().as_u16();
	let body = response.bytes().await.map_err(map_reqwest_error)?;
	let mut deserializer = serde_json::Deserializer::from_slice(&body);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| OriginError::Decode { source, status: Some(status) }.into())
}

/// Classifies a reqwest failure.
pub fn map_reqwest_error(e: ReqwestError) -> Error {
	if e.is_builder() {
		ConfigError::from(e).into()
	} else {
		TransportError::from(e).into()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn new_client_keeps_default_timeout() {
		let client = ReqwestHttpClient::new().expect("HTTP client should build.");
		let _: &ReqwestClient = client.as_ref();

		assert!(format!("{client:?}").contains("10s"));
	}
}
