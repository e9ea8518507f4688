//! Credential kinds, cached records, and redacted secrets.

pub mod record;
pub mod secret;

// self
use crate::_prelude::*;

/// Credential kinds cached per tenant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
	/// Bearer access token required by most platform calls.
	Token,
	/// JS-API ticket derived from a valid access token, used for client-side signing.
	Ticket,
}
impl CredentialKind {
	/// Returns a stable label suitable for span, metric, or log fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CredentialKind::Token => "access_token",
			CredentialKind::Ticket => "jsapi_ticket",
		}
	}
}
impl Display for CredentialKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
