//! Remote credential origins.
//!
//! An origin turns a tenant's identity and secret into a fresh access token, and an access token
//! into a fresh JS-API ticket. Two flavors ship with the crate:
//!
//! - [`PlatformOrigin`] calls the platform's `cgi-bin` endpoints directly.
//! - [`ProxyOrigin`] calls an internal credential proxy that holds the platform credentials on the
//!   broker's behalf and authenticates callers with HTTP basic credentials.
//!
//! Both are selected from a tenant's [`OriginFlavor`] through [`origin_for`].

pub mod dto;
#[cfg(feature = "reqwest")] pub mod platform;
#[cfg(feature = "reqwest")] pub mod proxy;

#[cfg(feature = "reqwest")] pub use platform::PlatformOrigin;
#[cfg(feature = "reqwest")] pub use proxy::ProxyOrigin;

// self
use crate::{_prelude::*, auth::CredentialSecret, tenant::TenantConfig};
#[cfg(feature = "reqwest")]
use crate::{error::ConfigError, http::ReqwestHttpClient, tenant::OriginFlavor};

/// Boxed future returned by [`CredentialOrigin`] operations.
pub type OriginFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Origin error codes signalling that the presented access token is invalid or expired.
pub const TOKEN_INVALID_CODES: [&str; 2] = ["40001", "42001"];

/// Credential value plus lifetime as issued by an origin.
#[derive(Clone, PartialEq, Eq)]
pub struct IssuedCredential {
	/// Raw credential string.
	pub value: String,
	/// Lifetime in whole seconds.
	pub expires_in: u64,
}
impl IssuedCredential {
	/// Creates a new issued credential.
	pub fn new(value: impl Into<String>, expires_in: u64) -> Self {
		Self { value: value.into(), expires_in }
	}
}
impl Debug for IssuedCredential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("IssuedCredential")
			.field("value", &"<redacted>")
			.field("expires_in", &self.expires_in)
			.finish()
	}
}

/// Issues access tokens and JS-API tickets for a tenant.
///
/// Implementations must be shareable across tasks; the credential cache holds them behind
/// `Arc<dyn CredentialOrigin>` and serializes calls per credential kind.
pub trait CredentialOrigin
where
	Self: Send + Sync,
{
	/// Fetches a fresh access token for `tenant`.
	fn fetch_token<'a>(&'a self, tenant: &'a TenantConfig) -> OriginFuture<'a, IssuedCredential>;

	/// Fetches a fresh JS-API ticket for `tenant`.
	///
	/// `token` carries the current access token when [`ticket_requires_token`] is `true`.
	///
	/// [`ticket_requires_token`]: CredentialOrigin::ticket_requires_token
	fn fetch_ticket<'a>(
		&'a self,
		tenant: &'a TenantConfig,
		token: Option<&'a CredentialSecret>,
	) -> OriginFuture<'a, IssuedCredential>;

	/// Whether ticket fetches need a valid access token first.
	fn ticket_requires_token(&self) -> bool {
		true
	}
}

/// Builds the origin matching the tenant's configured flavor.
#[cfg(feature = "reqwest")]
pub fn origin_for(
	config: &TenantConfig,
	http: ReqwestHttpClient,
) -> Result<Arc<dyn CredentialOrigin>, ConfigError> {
	let origin: Arc<dyn CredentialOrigin> = match &config.origin {
		OriginFlavor::Platform { base_url } => Arc::new(match base_url {
			Some(base) => PlatformOrigin::with_base_url(http, base.clone())?,
			None => PlatformOrigin::new(http)?,
		}),
		OriginFlavor::Proxy { base_url, username, password } => Arc::new(ProxyOrigin::new(
			http,
			base_url.clone(),
			username.clone(),
			password.clone(),
		)?),
	};

	Ok(origin)
}

/// Appends `path` segments to `base`, keeping any path prefix already present on the base.
#[cfg(feature = "reqwest")]
pub(crate) fn join_endpoint(base: &Url, path: &'static str) -> Result<Url, ConfigError> {
	let mut url = base.clone();

	url.path_segments_mut()
		.map_err(|_| ConfigError::InvalidEndpoint { base: base.to_string(), path })?
		.pop_if_empty()
		.extend(path.split('/').filter(|segment| !segment.is_empty()));

	Ok(url)
}
