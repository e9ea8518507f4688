//! Distributed cache contract and built-in implementations.
//!
//! The broker writes every credential it fetches from the origin through to a shared TTL
//! key-value store so sibling processes serving the same tenant can adopt it instead of hitting
//! the origin again. Keys follow `{kind-prefix}{app-id}`.

pub mod memory;
#[cfg(feature = "redis")] pub mod redis;

pub use memory::MemoryCache;
#[cfg(feature = "redis")] pub use redis::RedisCache;

// self
use crate::{
	_prelude::*,
	auth::{AppId, CredentialKind},
};

/// Boxed future returned by [`DistributedCache`] operations.
pub type CacheFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, CacheError>> + 'a + Send>>;

/// Shared key-value store with per-key TTL used for cross-process credential reuse.
pub trait DistributedCache
where
	Self: Send + Sync,
{
	/// Fetches the value stored at `key`, if present.
	fn get<'a>(&'a self, key: &'a CacheKey) -> CacheFuture<'a, Option<String>>;

	/// Returns the remaining TTL of `key`; `None` when absent or stored without expiry.
	fn ttl<'a>(&'a self, key: &'a CacheKey) -> CacheFuture<'a, Option<Duration>>;

	/// Stores `value` at `key`, expiring after `ttl`.
	fn set<'a>(&'a self, key: &'a CacheKey, value: &'a str, ttl: Duration) -> CacheFuture<'a, ()>;

	/// Deletes `key`; deleting a missing key succeeds.
	fn del<'a>(&'a self, key: &'a CacheKey) -> CacheFuture<'a, ()>;
}

/// Error type produced by [`DistributedCache`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum CacheError {
	/// Stored payload could not be interpreted.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Tenant-scoped distributed cache key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey(String);
impl CacheKey {
	/// Builds a key by prefixing the application id.
	pub fn new(prefix: &str, app_id: &AppId) -> Self {
		Self(format!("{prefix}{app_id}"))
	}

	/// Builds the key for `kind` using the default prefixes.
	pub fn for_kind(kind: CredentialKind, app_id: &AppId) -> Self {
		Self::new(default_prefix(kind), app_id)
	}

	/// Returns the rendered key.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for CacheKey {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Display for CacheKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// Default key prefix for access tokens.
pub const ACCESS_TOKEN_PREFIX: &str = "wx-access-token:";
/// Default key prefix for JS-API tickets.
pub const JSAPI_TICKET_PREFIX: &str = "wx-jsapi-ticket:";

/// Returns the default key prefix for `kind`.
pub const fn default_prefix(kind: CredentialKind) -> &'static str {
	match kind {
		CredentialKind::Token => ACCESS_TOKEN_PREFIX,
		CredentialKind::Ticket => JSAPI_TICKET_PREFIX,
	}
}
