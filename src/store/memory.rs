//! Thread-safe in-memory [`DistributedCache`] for single-instance deployments and tests.

// crates.io
use tokio::time::Instant;
// self
use crate::{
	_prelude::*,
	store::{CacheError, CacheFuture, CacheKey, DistributedCache},
};

type EntryMap = Arc<RwLock<HashMap<CacheKey, MemoryEntry>>>;

#[derive(Clone, Debug)]
struct MemoryEntry {
	value: String,
	expires_at: Instant,
}
impl MemoryEntry {
	fn remaining(&self, now: Instant) -> Option<Duration> {
		let left = self.expires_at.saturating_duration_since(now);

		(!left.is_zero()).then_some(left)
	}
}

/// TTL-aware key-value store that keeps entries in-process.
///
/// Expiry is measured on the tokio clock so paused-time tests observe it deterministically.
#[derive(Clone, Debug, Default)]
pub struct MemoryCache(EntryMap);
impl MemoryCache {
	/// Number of entries that have not yet expired.
	pub fn len(&self) -> usize {
		let now = Instant::now();

		self.0.read().values().filter(|entry| entry.remaining(now).is_some()).count()
	}

	/// Returns `true` if no live entry remains.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn get_now(map: &EntryMap, key: &CacheKey) -> Option<String> {
		let now = Instant::now();
		let mut guard = map.write();

		match guard.get(key) {
			Some(entry) if entry.remaining(now).is_some() => Some(entry.value.clone()),
			Some(_) => {
				guard.remove(key);

				None
			},
			None => None,
		}
	}

	fn ttl_now(map: &EntryMap, key: &CacheKey) -> Option<Duration> {
		map.read().get(key).and_then(|entry| entry.remaining(Instant::now()))
	}

	fn set_now(
		map: &EntryMap,
		key: &CacheKey,
		value: &str,
		ttl: Duration,
	) -> Result<(), CacheError> {
		if ttl.is_zero() {
			return Err(CacheError::Backend { message: format!("TTL for {key} must be positive") });
		}

		let expires_at = Instant::now().checked_add(ttl).ok_or_else(|| CacheError::Backend {
			message: format!("TTL of {}s for {key} is out of range", ttl.as_secs()),
		})?;

		map.write().insert(key.clone(), MemoryEntry { value: value.to_owned(), expires_at });

		Ok(())
	}
}
impl DistributedCache for MemoryCache {
	fn get<'a>(&'a self, key: &'a CacheKey) -> CacheFuture<'a, Option<String>> {
		Box::pin(async move { Ok(Self::get_now(&self.0, key)) })
	}

	fn ttl<'a>(&'a self, key: &'a CacheKey) -> CacheFuture<'a, Option<Duration>> {
		Box::pin(async move { Ok(Self::ttl_now(&self.0, key)) })
	}

	fn set<'a>(&'a self, key: &'a CacheKey, value: &'a str, ttl: Duration) -> CacheFuture<'a, ()> {
		Box::pin(async move { Self::set_now(&self.0, key, value, ttl) })
	}

	fn del<'a>(&'a self, key: &'a CacheKey) -> CacheFuture<'a, ()> {
		Box::pin(async move {
			self.0.write().remove(key);

			Ok(())
		})
	}
}
