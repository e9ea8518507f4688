//! Credential record snapshots handed to callers.

// self
use crate::{
	_prelude::*,
	auth::credential::{CredentialKind, secret::CredentialSecret},
};

/// Snapshot of a live cached credential.
///
/// Records are produced by the credential cache only; `remaining_seconds` reflects the slot's
/// countdown at the moment the snapshot was taken.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialRecord {
	/// Credential kind this record holds.
	pub kind: CredentialKind,
	/// Token or ticket value; callers must avoid logging it.
	pub value: CredentialSecret,
	/// Whole seconds left before the cache discards the record.
	pub remaining_seconds: u64,
}
impl CredentialRecord {
	/// Returns the raw credential string.
	pub fn expose(&self) -> &str {
		self.value.expose()
	}

	/// Remaining lifetime as a [`Duration`].
	pub fn expires_in(&self) -> Duration {
		Duration::from_secs(self.remaining_seconds)
	}
}
impl Debug for CredentialRecord {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialRecord")
			.field("kind", &self.kind)
			.field("value", &"<redacted>")
			.field("remaining_seconds", &self.remaining_seconds)
			.finish()
	}
}
