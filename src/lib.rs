//! Multi-tenant Weixin credential broker: single-flight access token and JS-API ticket caching
//! with countdown expiry, distributed write-through, and self-healing ticket refresh.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod broker;
pub mod cache;
pub mod error;
#[cfg(feature = "reqwest")] pub mod http;
pub mod jsapi;
pub mod oauth;
pub mod obs;
pub mod origin;
pub mod registry;
pub mod signature;
pub mod store;
pub mod tenant;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and scripted collaborators for tests; enabled via `cfg(test)` or
	//! the `test` crate feature.

	pub use std::{
		collections::VecDeque,
		sync::atomic::{AtomicUsize, Ordering},
	};

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::{AppId, CredentialSecret},
		cache::{CacheSettings, CredentialCache},
		error::OriginError,
		origin::{CredentialOrigin, IssuedCredential, OriginFuture},
		store::{DistributedCache, MemoryCache},
		tenant::TenantConfig,
	};

	/// One scripted origin reply.
	#[derive(Clone, Debug)]
	pub enum Script {
		/// Issue the given value with the given lifetime in seconds.
		Issue(&'static str, u64),
		/// Reject with the given error code and message.
		Reject(&'static str, &'static str),
	}
	impl Script {
		fn into_result(self) -> Result<IssuedCredential> {
			match self {
				Self::Issue(value, expires_in) => Ok(IssuedCredential::new(value, expires_in)),
				Self::Reject(code, message) if message.is_empty() =>
					Err(OriginError::Unspecified { code: code.into() }.into()),
				Self::Reject(code, message) =>
					Err(OriginError::Rejected { code: code.into(), message: message.into() }.into()),
			}
		}
	}

	/// Origin fake that replays queued scripts and counts calls.
	///
	/// The last script of each queue repeats once the queue is drained.
	#[derive(Debug, Default)]
	pub struct ScriptedOrigin {
		tokens: Mutex<VecDeque<Script>>,
		tickets: Mutex<VecDeque<Script>>,
		token_calls: AtomicUsize,
		ticket_calls: AtomicUsize,
		seen_tokens: Mutex<Vec<String>>,
		latency: Option<Duration>,
	}
	impl ScriptedOrigin {
		/// Queues a token reply.
		pub fn token(self, script: Script) -> Self {
			self.tokens.lock().push_back(script);

			self
		}

		/// Queues a ticket reply.
		pub fn ticket(self, script: Script) -> Self {
			self.tickets.lock().push_back(script);

			self
		}

		/// Delays every reply by the provided duration.
		pub fn with_latency(mut self, latency: Duration) -> Self {
			self.latency = Some(latency);

			self
		}

		/// Number of token fetches observed so far.
		pub fn token_calls(&self) -> usize {
			self.token_calls.load(Ordering::SeqCst)
		}

		/// Number of ticket fetches observed so far.
		pub fn ticket_calls(&self) -> usize {
			self.ticket_calls.load(Ordering::SeqCst)
		}

		/// Tokens presented to ticket fetches, in call order.
		pub fn seen_tokens(&self) -> Vec<String> {
			self.seen_tokens.lock().clone()
		}

		fn next(queue: &Mutex<VecDeque<Script>>) -> Script {
			let mut queue = queue.lock();

			if queue.len() > 1 {
				queue.pop_front().unwrap_or(Script::Reject("-1", ""))
			} else {
				queue.front().cloned().unwrap_or(Script::Reject("-1", ""))
			}
		}

		async fn pause(&self) {
			if let Some(latency) = self.latency {
				tokio::time::sleep(latency).await;
			}
		}
	}
	impl CredentialOrigin for ScriptedOrigin {
		fn fetch_token<'a>(&'a self, _tenant: &'a TenantConfig) -> OriginFuture<'a, IssuedCredential> {
			Box::pin(async move {
				self.token_calls.fetch_add(1, Ordering::SeqCst);
				self.pause().await;

				Self::next(&self.tokens).into_result()
			})
		}

		fn fetch_ticket<'a>(
			&'a self,
			_tenant: &'a TenantConfig,
			token: Option<&'a CredentialSecret>,
		) -> OriginFuture<'a, IssuedCredential> {
			Box::pin(async move {
				self.ticket_calls.fetch_add(1, Ordering::SeqCst);

				if let Some(token) = token {
					self.seen_tokens.lock().push(token.expose().to_owned());
				}

				self.pause().await;

				Self::next(&self.tickets).into_result()
			})
		}
	}

	/// Builds a platform-flavored tenant configuration for the provided app id.
	pub fn test_tenant(app_id: &str) -> TenantConfig {
		TenantConfig::builder(AppId::new(app_id).expect("Test app id should be valid."))
			.secret("test-secret")
			.signature_token("test-signature-token")
			.build()
			.expect("Test tenant configuration should build.")
	}

	/// Builds a credential cache wired to the provided origin and a fresh in-memory distributed
	/// cache.
	pub fn build_test_cache(
		app_id: &str,
		origin: Arc<ScriptedOrigin>,
	) -> (CredentialCache, Arc<MemoryCache>) {
		let distributed = Arc::new(MemoryCache::default());
		let cache = build_test_cache_with(app_id, origin, distributed.clone());

		(cache, distributed)
	}

	/// Builds a credential cache wired to the provided origin and distributed cache.
	pub fn build_test_cache_with(
		app_id: &str,
		origin: Arc<ScriptedOrigin>,
		distributed: Arc<MemoryCache>,
	) -> CredentialCache {
		let origin: Arc<dyn CredentialOrigin> = origin;
		let distributed: Arc<dyn DistributedCache> = distributed;

		CredentialCache::new(
			Arc::new(test_tenant(app_id)),
			origin,
			distributed,
			CacheSettings::default(),
		)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::{Arc, Weak},
		time::Duration,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
