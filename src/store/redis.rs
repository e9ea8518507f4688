//! Redis-backed [`DistributedCache`] shared by every broker process of a deployment.

// crates.io
use redis::{AsyncCommands, Client, RedisError, aio::ConnectionManager};
// self
use crate::{
	_prelude::*,
	store::{CacheError, CacheFuture, CacheKey, DistributedCache},
};

/// Distributed cache backed by a multiplexed Redis connection.
#[derive(Clone)]
pub struct RedisCache {
	connection: ConnectionManager,
}
impl RedisCache {
	/// Connects to the Redis server at `url` (for example `redis://127.0.0.1/`).
	pub async fn connect(url: &str) -> Result<Self, CacheError> {
		let client = Client::open(url).map_err(backend)?;
		let connection = ConnectionManager::new(client).await.map_err(backend)?;

		Ok(Self { connection })
	}

	/// Wraps an existing connection manager.
	pub fn with_connection(connection: ConnectionManager) -> Self {
		Self { connection }
	}
}
impl Debug for RedisCache {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("RedisCache(..)")
	}
}
impl DistributedCache for RedisCache {
	fn get<'a>(&'a self, key: &'a CacheKey) -> CacheFuture<'a, Option<String>> {
		let mut connection = self.connection.clone();

		Box::pin(async move { connection.get::<_, Option<String>>(key.as_str()).await.map_err(backend) })
	}

	fn ttl<'a>(&'a self, key: &'a CacheKey) -> CacheFuture<'a, Option<Duration>> {
		let mut connection = self.connection.clone();

		Box::pin(async move {
			// Redis answers -2 for a missing key and -1 for a key without expiry.
			let seconds = connection.ttl::<_, i64>(key.as_str()).await.map_err(backend)?;

			Ok(u64::try_from(seconds).ok().filter(|s| *s > 0).map(Duration::from_secs))
		})
	}

	fn set<'a>(&'a self, key: &'a CacheKey, value: &'a str, ttl: Duration) -> CacheFuture<'a, ()> {
		let mut connection = self.connection.clone();

		Box::pin(async move {
			connection
				.set_ex::<_, _, ()>(key.as_str(), value, ttl.as_secs().max(1))
				.await
				.map_err(backend)
		})
	}

	fn del<'a>(&'a self, key: &'a CacheKey) -> CacheFuture<'a, ()> {
		let mut connection = self.connection.clone();

		Box::pin(async move { connection.del::<_, ()>(key.as_str()).await.map_err(backend) })
	}
}

fn backend(e: RedisError) -> CacheError {
	CacheError::Backend { message: e.to_string() }
}
