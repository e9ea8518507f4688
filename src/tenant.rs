//! Tenant identity and origin configuration.
//!
//! A tenant is one platform account identified by its [`AppId`]. Configurations are immutable
//! once built; the registry owns them and hands shared references to each tenant's credential
//! cache.

/// Builder API for assembling tenant configurations.
pub mod builder;

pub use builder::*;

// self
use crate::{
	_prelude::*,
	auth::{AppId, CredentialSecret},
};

/// Where a tenant's credentials come from.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "flavor", rename_all = "snake_case")]
pub enum OriginFlavor {
	/// Call the platform directly.
	Platform {
		/// Overrides the public platform host.
		#[serde(default)]
		base_url: Option<Url>,
	},
	/// Call an internal credential proxy.
	Proxy {
		/// Proxy root; `token` and `ticket` are appended.
		base_url: Url,
		/// HTTP basic username.
		username: String,
		/// HTTP basic password.
		password: CredentialSecret,
	},
}
impl Default for OriginFlavor {
	fn default() -> Self {
		Self::Platform { base_url: None }
	}
}

/// Immutable tenant configuration.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "TenantConfigBuilder")]
pub struct TenantConfig {
	/// Application id.
	pub app_id: AppId,
	/// Application secret presented to the origin.
	pub secret: CredentialSecret,
	/// Display name; defaults to the application id.
	pub name: String,
	/// Credential origin flavor.
	pub origin: OriginFlavor,
	/// Token used to verify server-push signatures.
	pub signature_token: Option<CredentialSecret>,
	/// Follow/subscribe landing page for the account.
	pub subscribe_url: Option<String>,
	/// Prefix prepended to OAuth redirect targets.
	pub oauth_redirect_uri: Option<String>,
}
impl TenantConfig {
	/// Creates a new builder for the provided application id.
	pub fn builder(app_id: AppId) -> TenantConfigBuilder {
		TenantConfigBuilder::new(app_id)
	}
}
impl TryFrom<TenantConfigBuilder> for TenantConfig {
	type Error = TenantConfigError;

	fn try_from(builder: TenantConfigBuilder) -> Result<Self, Self::Error> {
		builder.build()
	}
}
