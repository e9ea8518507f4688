//! Observability helpers for credential acquisition.
//!
//! - Every [`CredentialCache::acquire`](crate::cache::CredentialCache::acquire) runs inside a
//!   `weixin_broker.acquire` span carrying the `kind` and `app_id` fields.
//! - Enable `metrics` to increment the `weixin_broker_acquire_total` counter for every call,
//!   labeled by `kind` + `outcome`.

mod metrics;
mod tracing;

pub use self::metrics::*;
pub use self::tracing::*;

// self
use crate::_prelude::*;

/// Which tier satisfied an acquisition, or failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AcquireOutcome {
	/// Served from the in-memory slot.
	Memory,
	/// Adopted from the distributed cache.
	Distributed,
	/// Fetched from the credential origin.
	Origin,
	/// Error propagated back to the caller.
	Failure,
}
impl AcquireOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			AcquireOutcome::Memory => "memory",
			AcquireOutcome::Distributed => "distributed",
			AcquireOutcome::Origin => "origin",
			AcquireOutcome::Failure => "failure",
		}
	}
}
impl Display for AcquireOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
