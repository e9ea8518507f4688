// std
use std::net::IpAddr;
// crates.io
use url::Host;
// self
use crate::{
	_prelude::*,
	auth::{AppId, CredentialSecret},
	tenant::{OriginFlavor, TenantConfig},
};

/// Errors raised while constructing or validating tenant configurations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum TenantConfigError {
	/// The application secret is required.
	#[error("Tenant `{app_id}` is missing its application secret.")]
	MissingSecret {
		/// Tenant missing the secret.
		app_id: String,
	},
	/// Origin endpoints must use HTTPS unless they point at a loopback host.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Proxy origins need both basic credentials.
	#[error("Proxy origin for tenant `{app_id}` requires a username and a password.")]
	EmptyProxyCredentials {
		/// Tenant with incomplete proxy credentials.
		app_id: String,
	},
}

/// Builder for [`TenantConfig`] values.
#[derive(Debug, Deserialize)]
pub struct TenantConfigBuilder {
	/// Application id of the tenant being constructed.
	pub app_id: AppId,
	/// Application secret.
	#[serde(default)]
	pub secret: Option<CredentialSecret>,
	/// Optional display name.
	#[serde(default)]
	pub name: Option<String>,
	/// Origin flavor; defaults to the public platform.
	#[serde(default)]
	pub origin: OriginFlavor,
	/// Optional push signature token.
	#[serde(default)]
	pub signature_token: Option<CredentialSecret>,
	/// Optional subscribe landing page.
	#[serde(default)]
	pub subscribe_url: Option<String>,
	/// Optional OAuth redirect prefix.
	#[serde(default)]
	pub oauth_redirect_uri: Option<String>,
}
impl TenantConfigBuilder {
	/// Creates a new builder seeded with the provided application id.
	pub fn new(app_id: AppId) -> Self {
		Self {
			app_id,
			secret: None,
			name: None,
			origin: OriginFlavor::default(),
			signature_token: None,
			subscribe_url: None,
			oauth_redirect_uri: None,
		}
	}

	/// Sets the application secret.
	pub fn secret(mut self, secret: impl Into<String>) -> Self {
		self.secret = Some(CredentialSecret::new(secret));

		self
	}

	/// Sets the display name.
	pub fn name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());

		self
	}

	/// Fetches from the platform at a custom host.
	pub fn platform_base_url(mut self, base_url: Url) -> Self {
		self.origin = OriginFlavor::Platform { base_url: Some(base_url) };

		self
	}

	/// Fetches from a credential proxy authenticated with HTTP basic credentials.
	pub fn proxy(
		mut self,
		base_url: Url,
		username: impl Into<String>,
		password: impl Into<String>,
	) -> Self {
		self.origin = OriginFlavor::Proxy {
			base_url,
			username: username.into(),
			password: CredentialSecret::new(password),
		};

		self
	}

	/// Sets the push signature token.
	pub fn signature_token(mut self, token: impl Into<String>) -> Self {
		self.signature_token = Some(CredentialSecret::new(token));

		self
	}

	/// Sets the subscribe landing page.
	pub fn subscribe_url(mut self, url: impl Into<String>) -> Self {
		self.subscribe_url = Some(url.into());

		self
	}

	/// Sets the OAuth redirect prefix.
	pub fn oauth_redirect_uri(mut self, prefix: impl Into<String>) -> Self {
		self.oauth_redirect_uri = Some(prefix.into());

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<TenantConfig, TenantConfigError> {
		let secret = self
			.secret
			.filter(|secret| !secret.is_empty())
			.ok_or_else(|| TenantConfigError::MissingSecret { app_id: self.app_id.to_string() })?;
		let config = TenantConfig {
			name: self.name.unwrap_or_else(|| self.app_id.to_string()),
			app_id: self.app_id,
			secret,
			origin: self.origin,
			signature_token: self.signature_token.filter(|token| !token.is_empty()),
			subscribe_url: self.subscribe_url,
			oauth_redirect_uri: self.oauth_redirect_uri,
		};

		config.validate()?;

		Ok(config)
	}
}

impl TenantConfig {
	fn validate(&self) -> Result<(), TenantConfigError> {
		match &self.origin {
			OriginFlavor::Platform { base_url: Some(base_url) } =>
				validate_endpoint("platform", base_url),
			OriginFlavor::Platform { base_url: None } => Ok(()),
			OriginFlavor::Proxy { base_url, username, password } => {
				validate_endpoint("proxy", base_url)?;

				if username.is_empty() || password.is_empty() {
					return Err(TenantConfigError::EmptyProxyCredentials {
						app_id: self.app_id.to_string(),
					});
				}

				Ok(())
			},
		}
	}
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), TenantConfigError> {
	if url.scheme() == "https" || (url.scheme() == "http" && is_loopback(url)) {
		Ok(())
	} else {
		Err(TenantConfigError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host() {
		Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(Host::Ipv4(ip)) => IpAddr::V4(ip).is_loopback(),
		Some(Host::Ipv6(ip)) => IpAddr::V6(ip).is_loopback(),
		None => false,
	}
}
