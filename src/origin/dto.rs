//! Wire payloads returned by the credential origins and their mapping onto broker results.

// self
use crate::{_prelude::*, auth::CredentialKind, error::OriginError, origin::IssuedCredential};

/// Proxy success code.
pub const PROXY_SUCCESS_CODE: &str = "00";

/// Reply from the platform's `cgi-bin/token` and `cgi-bin/ticket/getticket` endpoints.
///
/// Successful ticket replies still carry `errcode = 0` and `errmsg = "ok"`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PlatformReply {
	/// Platform error code; `0` or absent on success.
	#[serde(default)]
	pub errcode: i64,
	/// Platform error message.
	#[serde(default)]
	pub errmsg: String,
	/// Access token, present on token replies.
	#[serde(default)]
	pub access_token: Option<String>,
	/// JS-API ticket, present on ticket replies.
	#[serde(default)]
	pub ticket: Option<String>,
	/// Lifetime in seconds.
	#[serde(default)]
	pub expires_in: u64,
}
impl PlatformReply {
	/// Maps the reply onto an issued credential of `kind`.
	pub fn into_issued(self, kind: CredentialKind) -> Result<IssuedCredential> {
		let code = self.errcode.to_string();
		let value = match kind {
			CredentialKind::Token => self.access_token,
			CredentialKind::Ticket => self.ticket,
		}
		.unwrap_or_default();

		if self.errcode != 0 || (value.is_empty() && self.expires_in == 0) {
			return Err(origin_failure(code, self.errmsg).into());
		}

		issued(kind, value, self.expires_in)
	}
}

/// Envelope returned by the credential proxy.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProxyReply {
	/// Proxy status code; [`PROXY_SUCCESS_CODE`] on success.
	#[serde(default)]
	pub code: String,
	/// Proxy status message.
	#[serde(default)]
	pub message: String,
	/// Issued credential payload.
	#[serde(default)]
	pub data: Option<ProxyCredential>,
}
impl ProxyReply {
	/// Maps the envelope onto an issued credential of `kind`.
	pub fn into_issued(self, kind: CredentialKind) -> Result<IssuedCredential> {
		if self.code != PROXY_SUCCESS_CODE {
			return Err(origin_failure(self.code, self.message).into());
		}

		let data = self.data.unwrap_or_default();
		let value = match kind {
			CredentialKind::Token => data.access_token,
			CredentialKind::Ticket => data.ticket,
		}
		.unwrap_or_default();

		issued(kind, value, data.expires_in)
	}
}

/// Credential payload nested inside [`ProxyReply`].
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProxyCredential {
	/// Access token, present on token replies.
	#[serde(default)]
	pub access_token: Option<String>,
	/// JS-API ticket, present on ticket replies.
	#[serde(default)]
	pub ticket: Option<String>,
	/// Lifetime in seconds.
	#[serde(default)]
	pub expires_in: u64,
}

fn origin_failure(code: String, message: String) -> OriginError {
	if message.is_empty() {
		OriginError::Unspecified { code }
	} else {
		OriginError::Rejected { code, message }
	}
}

fn issued(kind: CredentialKind, value: String, expires_in: u64) -> Result<IssuedCredential> {
	if value.is_empty() {
		return Err(Error::CredentialUnavailable {
			kind,
			reason: "origin reported success without a value".into(),
		});
	}
	if expires_in == 0 {
		return Err(Error::CredentialUnavailable {
			kind,
			reason: "origin reported success without a lifetime".into(),
		});
	}

	Ok(IssuedCredential::new(value, expires_in))
}
