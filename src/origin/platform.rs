//! Origin talking to the platform's `cgi-bin` credential endpoints.

// self
use crate::{
	_prelude::*,
	auth::{CredentialKind, CredentialSecret},
	error::ConfigError,
	http::{self, ReqwestHttpClient},
	origin::{CredentialOrigin, IssuedCredential, OriginFuture, dto::PlatformReply, join_endpoint},
	tenant::TenantConfig,
};

/// Public platform API host.
pub const PLATFORM_BASE_URL: &str = "https://api.weixin.qq.com";

const TOKEN_PATH: &str = "cgi-bin/token";
const TICKET_PATH: &str = "cgi-bin/ticket/getticket";

/// Fetches credentials straight from the platform.
///
/// Token: `GET {base}/cgi-bin/token?grant_type=client_credential&appid=..&secret=..`.
/// Ticket: `GET {base}/cgi-bin/ticket/getticket?type=jsapi&access_token=..`.
#[derive(Clone, Debug)]
pub struct PlatformOrigin {
	http: ReqwestHttpClient,
	token_endpoint: Url,
	ticket_endpoint: Url,
}
impl PlatformOrigin {
	/// Targets the public platform host.
	pub fn new(http: ReqwestHttpClient) -> Result<Self, ConfigError> {
		Self::with_base_url(http, Url::parse(PLATFORM_BASE_URL)?)
	}

	/// Targets a custom host, such as a regional gateway or a local mock.
	pub fn with_base_url(http: ReqwestHttpClient, base: Url) -> Result<Self, ConfigError> {
		Ok(Self {
			token_endpoint: join_endpoint(&base, TOKEN_PATH)?,
			ticket_endpoint: join_endpoint(&base, TICKET_PATH)?,
			http,
		})
	}

	async fn request(
		&self,
		kind: CredentialKind,
		tenant: &TenantConfig,
		endpoint: &Url,
		query: &[(&str, &str)],
	) -> Result<IssuedCredential> {
		let reply: PlatformReply =
			http::send_and_decode(self.http.get(endpoint.clone()).query(query)).await?;

		tracing::debug!(
			app_id = %tenant.app_id,
			%kind,
			errcode = reply.errcode,
			"platform origin replied"
		);

		reply.into_issued(kind)
	}
}
impl CredentialOrigin for PlatformOrigin {
	fn fetch_token<'a>(&'a self, tenant: &'a TenantConfig) -> OriginFuture<'a, IssuedCredential> {
		Box::pin(async move {
			let query = [
				("grant_type", "client_credential"),
				("appid", tenant.app_id.as_ref()),
				("secret", tenant.secret.expose()),
			];

			self.request(CredentialKind::Token, tenant, &self.token_endpoint, &query).await
		})
	}

	fn fetch_ticket<'a>(
		&'a self,
		tenant: &'a TenantConfig,
		token: Option<&'a CredentialSecret>,
	) -> OriginFuture<'a, IssuedCredential> {
		Box::pin(async move {
			let Some(token) = token else {
				return Err(Error::CredentialUnavailable {
					kind: CredentialKind::Ticket,
					reason: "ticket fetch requires an access token".into(),
				});
			};
			let query = [("type", "jsapi"), ("access_token", token.expose())];

			self.request(CredentialKind::Ticket, tenant, &self.ticket_endpoint, &query).await
		})
	}
}
