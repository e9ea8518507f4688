//! Origin talking to an internal credential proxy.

// self
use crate::{
	_prelude::*,
	auth::{CredentialKind, CredentialSecret},
	error::ConfigError,
	http::{self, ReqwestHttpClient},
	origin::{CredentialOrigin, IssuedCredential, OriginFuture, dto::ProxyReply, join_endpoint},
	tenant::TenantConfig,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProxyRequest<'a> {
	app_id: &'a str,
	secret: &'a str,
}

/// Fetches credentials from a proxy that owns the platform relationship.
///
/// Both endpoints take `POST` with HTTP basic credentials and a `{appId, secret}` JSON body. The
/// proxy resolves tickets itself, so ticket fetches need no access token.
#[derive(Clone)]
pub struct ProxyOrigin {
	http: ReqwestHttpClient,
	token_endpoint: Url,
	ticket_endpoint: Url,
	username: String,
	password: CredentialSecret,
}
impl ProxyOrigin {
	/// Creates a proxy origin rooted at `base`.
	pub fn new(
		http: ReqwestHttpClient,
		base: Url,
		username: impl Into<String>,
		password: CredentialSecret,
	) -> Result<Self, ConfigError> {
		Ok(Self {
			token_endpoint: join_endpoint(&base, "token")?,
			ticket_endpoint: join_endpoint(&base, "ticket")?,
			http,
			username: username.into(),
			password,
		})
	}

	async fn request(
		&self,
		kind: CredentialKind,
		tenant: &TenantConfig,
		endpoint: &Url,
	) -> Result<IssuedCredential> {
		let body = ProxyRequest { app_id: tenant.app_id.as_ref(), secret: tenant.secret.expose() };
		let request = self
			.http
			.post(endpoint.clone())
			.basic_auth(&self.username, Some(self.password.expose()))
			.json(&body);
		let reply: ProxyReply = http::send_and_decode(request).await?;

		tracing::debug!(app_id = %tenant.app_id, %kind, code = %reply.code, "proxy origin replied");

		reply.into_issued(kind)
	}
}
impl Debug for ProxyOrigin {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ProxyOrigin")
			.field("token_endpoint", &self.token_endpoint.as_str())
			.field("ticket_endpoint", &self.ticket_endpoint.as_str())
			.field("username", &self.username)
			.finish_non_exhaustive()
	}
}
impl CredentialOrigin for ProxyOrigin {
	fn fetch_token<'a>(&'a self, tenant: &'a TenantConfig) -> OriginFuture<'a, IssuedCredential> {
		Box::pin(self.request(CredentialKind::Token, tenant, &self.token_endpoint))
	}

	fn fetch_ticket<'a>(
		&'a self,
		tenant: &'a TenantConfig,
		_token: Option<&'a CredentialSecret>,
	) -> OriginFuture<'a, IssuedCredential> {
		Box::pin(self.request(CredentialKind::Ticket, tenant, &self.ticket_endpoint))
	}

	fn ticket_requires_token(&self) -> bool {
		false
	}
}
