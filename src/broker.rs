//! Account-level facade resolving tenants and delegating to their caches and helpers.

// self
use crate::{
	_prelude::*,
	auth::{CredentialKind, CredentialRecord},
	jsapi::JsApiConfig,
	oauth::{self, OAuthCodeRequest},
	registry::TenantRegistry,
	signature::{self, SignatureRequest},
};

/// Entry point for business code that works with several tenants by application id.
#[derive(Clone, Debug)]
pub struct Broker {
	registry: Arc<TenantRegistry>,
}
impl Broker {
	/// Wraps a shared registry.
	pub fn new(registry: Arc<TenantRegistry>) -> Self {
		Self { registry }
	}

	/// Underlying registry.
	pub fn registry(&self) -> &TenantRegistry {
		&self.registry
	}

	/// Display name of the tenant.
	pub fn name(&self, app_id: &str) -> Result<String> {
		Ok(self.registry.resolve(app_id)?.config.name.clone())
	}

	/// Subscribe landing page of the tenant, if configured.
	pub fn subscribe_url(&self, app_id: &str) -> Result<Option<String>> {
		Ok(self.registry.resolve(app_id)?.config.subscribe_url.clone())
	}

	/// Currently valid access token of the tenant.
	pub async fn access_token(&self, app_id: &str) -> Result<CredentialRecord> {
		self.registry.resolve(app_id)?.cache.access_token().await
	}

	/// Currently valid JS-API ticket of the tenant.
	pub async fn jsapi_ticket(&self, app_id: &str) -> Result<CredentialRecord> {
		self.registry.resolve(app_id)?.cache.jsapi_ticket().await
	}

	/// Signed JS-API configuration for the page at `url`.
	pub async fn jsapi_config(&self, app_id: &str, url: &str) -> Result<JsApiConfig> {
		let tenant = self.registry.resolve(app_id)?;
		let ticket = tenant.cache.jsapi_ticket().await?;

		Ok(JsApiConfig::sign(&tenant.config.app_id, ticket.expose(), url))
	}

	/// OAuth authorization link for the tenant.
	pub fn authorize_url(&self, app_id: &str, request: &OAuthCodeRequest) -> Result<Url> {
		oauth::authorize_url(&self.registry.resolve(app_id)?.config, request)
	}

	/// Verifies a server-push signature against the tenant's signature token.
	///
	/// Tenants without a signature token reject every request.
	pub fn verify_signature(&self, app_id: &str, request: &SignatureRequest) -> Result<()> {
		let tenant = self.registry.resolve(app_id)?;
		let Some(token) = tenant.config.signature_token.as_ref() else {
			tracing::warn!(app_id, "push signature received for tenant without signature token");

			return Err(Error::SignatureMismatch);
		};

		signature::verify_push_signature(token.expose(), request)
	}

	/// Drops the tenant's cached credential of `kind` from memory and the distributed cache.
	pub async fn evict(&self, app_id: &str, kind: CredentialKind) -> Result<()> {
		self.registry.resolve(app_id)?.cache.evict(kind).await
	}
}
