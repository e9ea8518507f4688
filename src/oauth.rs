//! OAuth web authorization URL construction.

// self
use crate::{_prelude::*, error::ConfigError, tenant::TenantConfig};

/// Web authorization endpoint.
pub const AUTHORIZE_ENDPOINT: &str = "https://open.weixin.qq.com/connect/oauth2/authorize";

/// Fragment the platform requires on authorization links.
pub const AUTHORIZE_FRAGMENT: &str = "wechat_redirect";

/// Authorization scopes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OAuthScope {
	/// Silent authorization yielding only the open id.
	#[default]
	#[serde(rename = "snsapi_base")]
	Base,
	/// Interactive authorization granting profile access.
	#[serde(rename = "snsapi_userinfo")]
	UserInfo,
}
impl OAuthScope {
	/// Wire value of the scope.
	pub const fn as_str(self) -> &'static str {
		match self {
			OAuthScope::Base => "snsapi_base",
			OAuthScope::UserInfo => "snsapi_userinfo",
		}
	}
}
impl Display for OAuthScope {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Caller parameters for an authorization link.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthCodeRequest {
	/// Redirect target; appended to the tenant's redirect prefix when one is configured.
	pub uri: String,
	/// Requested scope.
	#[serde(default)]
	pub scope: OAuthScope,
	/// Opaque state echoed back on redirect.
	#[serde(default)]
	pub state: String,
}

/// Builds the authorization link for `config`.
///
/// Query pairs are emitted in key order: `appid`, `redirect_uri`, `response_type`, `scope`,
/// `state`.
pub fn authorize_url(config: &TenantConfig, request: &OAuthCodeRequest) -> Result<Url> {
	let mut url = Url::parse(AUTHORIZE_ENDPOINT).map_err(ConfigError::from)?;
	let redirect_uri = match config.oauth_redirect_uri.as_deref() {
		Some(prefix) => format!("{prefix}{}", request.uri),
		None => request.uri.clone(),
	};
	let mut pairs = url.query_pairs_mut();

	pairs.append_pair("appid", &config.app_id);
	pairs.append_pair("redirect_uri", &redirect_uri);
	pairs.append_pair("response_type", "code");
	pairs.append_pair("scope", request.scope.as_str());
	pairs.append_pair("state", &request.state);

	drop(pairs);

	url.set_fragment(Some(AUTHORIZE_FRAGMENT));

	Ok(url)
}
