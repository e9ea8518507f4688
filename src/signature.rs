//! SHA-1 signing helpers used by the JS-API config and server-push verification.

// crates.io
use sha1::{Digest, Sha1};
// self
use crate::_prelude::*;

/// Lowercase hex SHA-1 digest of `input`.
pub fn sha1_hex(input: &str) -> String {
	hex::encode(Sha1::digest(input.as_bytes()))
}

/// Query parameters the platform attaches to server-push callbacks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRequest {
	/// Signature supplied by the platform.
	pub signature: String,
	/// Unix timestamp, as sent.
	pub timestamp: String,
	/// Random nonce, as sent.
	pub nonce: String,
}

/// Computes the push signature: the lexicographically sorted `[nonce, timestamp, token]`,
/// concatenated and SHA-1 hashed.
pub fn push_signature(token: &str, timestamp: &str, nonce: &str) -> String {
	let mut parts = [nonce, timestamp, token];

	parts.sort_unstable();

	sha1_hex(&parts.concat())
}

/// Checks `request` against the tenant's signature `token`.
pub fn verify_push_signature(token: &str, request: &SignatureRequest) -> Result<()> {
	if push_signature(token, &request.timestamp, &request.nonce) == request.signature {
		Ok(())
	} else {
		Err(Error::SignatureMismatch)
	}
}
