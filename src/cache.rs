//! Per-tenant credential cache.
//!
//! Each [`CredentialCache`] owns one slot per [`CredentialKind`]. Acquisition walks the tiers in
//! order (in-memory slot, distributed cache, origin) while holding the slot's gate, so at most one
//! origin fetch is in flight per tenant and kind. Records expire on their own through a per-slot
//! countdown task.
//!
//! Lock order is always ticket gate before token gate: ticket acquisition may need a fresh access
//! token, token acquisition never touches the ticket slot.

mod metrics;
mod slot;

pub use self::metrics::AcquireMetrics;

// self
use crate::{
	_prelude::*,
	auth::{CredentialKind, CredentialRecord},
	obs::{self, AcquireOutcome, AcquireSpan},
	origin::{CredentialOrigin, IssuedCredential},
	store::{self, CacheKey, DistributedCache},
	tenant::TenantConfig,
};
use slot::CredentialSlot;

/// Tunables shared by every tenant's cache.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
	/// Distributed cache key prefix for access tokens.
	pub token_prefix: String,
	/// Distributed cache key prefix for JS-API tickets.
	pub ticket_prefix: String,
	/// Upper bound on ticket fetches per acquisition when the origin keeps rejecting the access
	/// token. Values below 1 are treated as 1.
	pub max_ticket_attempts: u32,
}
impl CacheSettings {
	/// Key prefix used for `kind`.
	pub fn prefix(&self, kind: CredentialKind) -> &str {
		match kind {
			CredentialKind::Token => &self.token_prefix,
			CredentialKind::Ticket => &self.ticket_prefix,
		}
	}

	fn ticket_attempts(&self) -> u32 {
		self.max_ticket_attempts.max(1)
	}
}
impl Default for CacheSettings {
	fn default() -> Self {
		Self {
			token_prefix: store::ACCESS_TOKEN_PREFIX.into(),
			ticket_prefix: store::JSAPI_TICKET_PREFIX.into(),
			max_ticket_attempts: 2,
		}
	}
}

/// Credential cache for one tenant.
pub struct CredentialCache {
	config: Arc<TenantConfig>,
	origin: Arc<dyn CredentialOrigin>,
	distributed: Arc<dyn DistributedCache>,
	settings: CacheSettings,
	token: CredentialSlot,
	ticket: CredentialSlot,
	token_key: CacheKey,
	ticket_key: CacheKey,
	metrics: AcquireMetrics,
}
impl CredentialCache {
	/// Creates an empty cache for `config`.
	pub fn new(
		config: Arc<TenantConfig>,
		origin: Arc<dyn CredentialOrigin>,
		distributed: Arc<dyn DistributedCache>,
		settings: CacheSettings,
	) -> Self {
		let app_id = &config.app_id;

		Self {
			token: CredentialSlot::new(CredentialKind::Token, app_id.clone()),
			ticket: CredentialSlot::new(CredentialKind::Ticket, app_id.clone()),
			token_key: CacheKey::new(settings.prefix(CredentialKind::Token), app_id),
			ticket_key: CacheKey::new(settings.prefix(CredentialKind::Ticket), app_id),
			config,
			origin,
			distributed,
			settings,
			metrics: Default::default(),
		}
	}

	/// Tenant configuration this cache serves.
	pub fn config(&self) -> &TenantConfig {
		&self.config
	}

	/// Acquisition counters for this tenant.
	///
	/// Token acquisitions made on behalf of a ticket fetch are counted too.
	pub fn metrics(&self) -> &AcquireMetrics {
		&self.metrics
	}

	/// Returns a currently valid credential of `kind`, fetching it if needed.
	pub async fn acquire(&self, kind: CredentialKind) -> Result<CredentialRecord> {
		let span = AcquireSpan::new(kind, &self.config.app_id);
		let result = span
			.instrument(async {
				match kind {
					CredentialKind::Token => self.acquire_token().await,
					CredentialKind::Ticket => self.acquire_ticket().await,
				}
			})
			.await;

		self.observe(kind, result)
	}

	/// Shorthand for `acquire(CredentialKind::Token)`.
	pub async fn access_token(&self) -> Result<CredentialRecord> {
		self.acquire(CredentialKind::Token).await
	}

	/// Shorthand for `acquire(CredentialKind::Ticket)`.
	pub async fn jsapi_ticket(&self) -> Result<CredentialRecord> {
		self.acquire(CredentialKind::Ticket).await
	}

	/// Drops the in-memory record of `kind` and stops its countdown.
	///
	/// The distributed entry is kept; use [`evict`](Self::evict) to remove it too.
	pub fn invalidate(&self, kind: CredentialKind) -> bool {
		self.slot(kind).invalidate()
	}

	/// Drops the in-memory record of `kind` and deletes its distributed entry.
	pub async fn evict(&self, kind: CredentialKind) -> Result<()> {
		self.invalidate(kind);
		self.distributed.del(self.key(kind)).await?;

		Ok(())
	}

	/// Snapshot of the in-memory record of `kind` without fetching.
	pub fn peek(&self, kind: CredentialKind) -> Option<CredentialRecord> {
		self.slot(kind).peek()
	}

	fn slot(&self, kind: CredentialKind) -> &CredentialSlot {
		match kind {
			CredentialKind::Token => &self.token,
			CredentialKind::Ticket => &self.ticket,
		}
	}

	fn key(&self, kind: CredentialKind) -> &CacheKey {
		match kind {
			CredentialKind::Token => &self.token_key,
			CredentialKind::Ticket => &self.ticket_key,
		}
	}

	async fn acquire_token(&self) -> Result<(CredentialRecord, AcquireOutcome)> {
		let slot = &self.token;
		let _gate = slot.gate.lock().await;

		if let Some(hit) = self.cached(slot).await? {
			return Ok(hit);
		}

		let issued = self.origin.fetch_token(&self.config).await?;

		Ok((self.store_issued(slot, issued).await?, AcquireOutcome::Origin))
	}

	async fn acquire_ticket(&self) -> Result<(CredentialRecord, AcquireOutcome)> {
		let slot = &self.ticket;
		let _gate = slot.gate.lock().await;
		let attempts = self.settings.ticket_attempts();

		for attempt in 1..=attempts {
			if let Some(hit) = self.cached(slot).await? {
				return Ok(hit);
			}

			let token = if self.origin.ticket_requires_token() {
				Some(self.observe(CredentialKind::Token, self.acquire_token().await)?.value)
			} else {
				None
			};

			match self.origin.fetch_ticket(&self.config, token.as_ref()).await {
				Ok(issued) =>
					return Ok((self.store_issued(slot, issued).await?, AcquireOutcome::Origin)),
				Err(e) if e.is_token_invalid() => {
					tracing::warn!(
						app_id = %self.config.app_id,
						attempt,
						error = %e,
						"origin rejected the access token, discarding it"
					);

					self.token.invalidate();
					self.distributed.del(&self.token_key).await?;
				},
				Err(e) => return Err(e),
			}
		}

		Err(Error::CredentialUnavailable {
			kind: CredentialKind::Ticket,
			reason: format!("access token was rejected on all {attempts} ticket attempts"),
		})
	}

	fn observe(
		&self,
		kind: CredentialKind,
		result: Result<(CredentialRecord, AcquireOutcome)>,
	) -> Result<CredentialRecord> {
		let outcome = result.as_ref().map_or(AcquireOutcome::Failure, |(_, outcome)| *outcome);

		obs::record_acquire_outcome(kind, outcome);
		self.metrics.record(kind, outcome);

		match result {
			Ok((record, _)) => Ok(record),
			Err(e) => {
				tracing::error!(app_id = %self.config.app_id, %kind, error = %e, "credential acquisition failed");

				Err(e)
			},
		}
	}

	/// Memory then distributed lookup; caller must hold the slot gate.
	async fn cached(
		&self,
		slot: &CredentialSlot,
	) -> Result<Option<(CredentialRecord, AcquireOutcome)>> {
		if let Some(record) = slot.peek() {
			tracing::debug!(app_id = %self.config.app_id, kind = %slot.kind(), source = "memory");

			return Ok(Some((record, AcquireOutcome::Memory)));
		}

		let key = self.key(slot.kind());
		let Some(value) = self.distributed.get(key).await? else { return Ok(None) };
		let remaining = self.distributed.ttl(key).await?.map_or(0, |ttl| ttl.as_secs());

		if value.is_empty() || remaining == 0 {
			return Ok(None);
		}

		let record = slot.install(value, remaining)?;

		tracing::debug!(
			app_id = %self.config.app_id,
			kind = %slot.kind(),
			source = "distributed",
			remaining
		);

		Ok(Some((record, AcquireOutcome::Distributed)))
	}

	async fn store_issued(
		&self,
		slot: &CredentialSlot,
		issued: IssuedCredential,
	) -> Result<CredentialRecord> {
		let kind = slot.kind();
		let record = slot.install(issued.value, issued.expires_in)?;

		if let Err(e) =
			self.distributed.set(self.key(kind), record.expose(), record.expires_in()).await
		{
			tracing::warn!(
				app_id = %self.config.app_id,
				%kind,
				error = %e,
				"distributed cache write-through failed"
			);
		}

		tracing::debug!(
			app_id = %self.config.app_id,
			%kind,
			source = "origin",
			remaining = record.remaining_seconds
		);

		Ok(record)
	}
}
impl Debug for CredentialCache {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialCache")
			.field("app_id", &self.config.app_id)
			.field("settings", &self.settings)
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use tokio::time;
	// self
	use super::*;
	use crate::{
		_preludet::*,
		error::{OriginError, TransportError},
		store::{CacheError, CacheFuture, MemoryCache},
	};

	const APP: &str = "wx-cache";

	fn token_key() -> CacheKey {
		CacheKey::new(store::ACCESS_TOKEN_PREFIX, &test_tenant(APP).app_id)
	}

	fn ticket_key() -> CacheKey {
		CacheKey::new(store::JSAPI_TICKET_PREFIX, &test_tenant(APP).app_id)
	}

	#[tokio::test(start_paused = true)]
	async fn concurrent_callers_share_one_origin_fetch() {
		let origin = Arc::new(
			ScriptedOrigin::default()
				.token(Script::Issue("tok1", 7200))
				.with_latency(Duration::from_millis(200)),
		);
		let (cache, _) = build_test_cache(APP, origin.clone());
		let cache = Arc::new(cache);
		let handles = (0..16)
			.map(|_| {
				let cache = cache.clone();

				tokio::spawn(async move { cache.access_token().await })
			})
			.collect::<Vec<_>>();

		for handle in handles {
			let record = handle
				.await
				.expect("Acquisition task should not panic.")
				.expect("Acquisition should succeed.");

			assert_eq!(record.expose(), "tok1");
		}

		assert_eq!(origin.token_calls(), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn concurrent_token_and_ticket_callers_fetch_each_once() {
		let origin = Arc::new(
			ScriptedOrigin::default()
				.token(Script::Issue("tok1", 7200))
				.ticket(Script::Issue("tkt1", 7200))
				.with_latency(Duration::from_millis(200)),
		);
		let (cache, _) = build_test_cache(APP, origin.clone());
		let cache = Arc::new(cache);
		let handles = (0..16)
			.map(|i| {
				let cache = cache.clone();
				let kind = if i % 2 == 0 { CredentialKind::Ticket } else { CredentialKind::Token };

				tokio::spawn(async move { (kind, cache.acquire(kind).await) })
			})
			.collect::<Vec<_>>();

		for handle in handles {
			let (kind, result) = handle.await.expect("Acquisition task should not panic.");
			let record = result.expect("Acquisition should succeed.");
			let expected = match kind {
				CredentialKind::Token => "tok1",
				CredentialKind::Ticket => "tkt1",
			};

			assert_eq!(record.expose(), expected);
		}

		assert_eq!(origin.token_calls(), 1);
		assert_eq!(origin.ticket_calls(), 1);
		assert_eq!(origin.seen_tokens(), vec!["tok1".to_owned()]);
	}

	#[tokio::test(start_paused = true)]
	async fn distributed_ticket_skips_token_fetch() {
		let origin = Arc::new(
			ScriptedOrigin::default()
				.token(Script::Issue("tok1", 7200))
				.ticket(Script::Issue("fresh", 7200)),
		);
		let distributed = Arc::new(MemoryCache::default());

		distributed
			.set(&ticket_key(), "shared-ticket", Duration::from_secs(300))
			.await
			.expect("Seeding the distributed cache should succeed.");

		let cache = build_test_cache_with(APP, origin.clone(), distributed);
		let ticket = cache.jsapi_ticket().await.expect("Adoption should succeed.");

		assert_eq!(ticket.expose(), "shared-ticket");
		assert_eq!(ticket.remaining_seconds, 300);
		assert_eq!(origin.token_calls(), 0);
		assert_eq!(origin.ticket_calls(), 0);
		assert!(cache.peek(CredentialKind::Token).is_none());
		assert_eq!(cache.metrics().count(CredentialKind::Ticket, AcquireOutcome::Distributed), 1);
		assert_eq!(cache.metrics().total(CredentialKind::Token), 0);
	}

	#[tokio::test(start_paused = true)]
	async fn distributed_entry_is_preferred_over_origin() {
		let origin = Arc::new(ScriptedOrigin::default().token(Script::Issue("fresh", 7200)));
		let distributed = Arc::new(MemoryCache::default());

		distributed
			.set(&token_key(), "shared", Duration::from_secs(600))
			.await
			.expect("Seeding the distributed cache should succeed.");

		let cache = build_test_cache_with(APP, origin.clone(), distributed);
		let record = cache.access_token().await.expect("Acquisition should succeed.");

		assert_eq!(record.expose(), "shared");
		assert_eq!(record.remaining_seconds, 600);
		assert_eq!(origin.token_calls(), 0);

		let again = cache.access_token().await.expect("Memory hit should succeed.");

		assert_eq!(again, record);
		assert_eq!(origin.token_calls(), 0);
	}

	#[tokio::test(start_paused = true)]
	async fn records_expire_without_callers() {
		let origin = Arc::new(ScriptedOrigin::default().token(Script::Issue("short", 3)));
		let (cache, _) = build_test_cache(APP, origin);

		cache.access_token().await.expect("Acquisition should succeed.");

		assert!(cache.peek(CredentialKind::Token).is_some());

		time::sleep(Duration::from_millis(3_500)).await;

		assert!(cache.peek(CredentialKind::Token).is_none());
	}

	#[tokio::test(start_paused = true)]
	async fn origin_token_is_written_through() {
		let origin = Arc::new(ScriptedOrigin::default().token(Script::Issue("tok1", 7200)));
		let (cache, distributed) = build_test_cache(APP, origin.clone());
		let record = cache.access_token().await.expect("Acquisition should succeed.");

		assert_eq!(record.expose(), "tok1");
		assert_eq!(record.remaining_seconds, 7200);
		assert_eq!(
			distributed.get(&token_key()).await.expect("Distributed read should succeed."),
			Some("tok1".into())
		);
		assert_eq!(
			distributed.ttl(&token_key()).await.expect("Distributed TTL should succeed."),
			Some(Duration::from_secs(7200))
		);

		// A second process sharing the distributed cache adopts the entry.
		time::sleep(Duration::from_secs(10)).await;

		let sibling_origin = Arc::new(ScriptedOrigin::default().token(Script::Issue("other", 7200)));
		let sibling = build_test_cache_with(APP, sibling_origin.clone(), distributed);
		let adopted = sibling.access_token().await.expect("Adoption should succeed.");

		assert_eq!(adopted.expose(), "tok1");
		assert!((7189..=7191).contains(&adopted.remaining_seconds));
		assert_eq!(sibling_origin.token_calls(), 0);
	}

	#[tokio::test(start_paused = true)]
	async fn ticket_recovers_from_rejected_token_once() {
		let origin = Arc::new(
			ScriptedOrigin::default()
				.token(Script::Issue("tok1", 7200))
				.token(Script::Issue("tok2", 7200))
				.ticket(Script::Reject("42001", "access_token expired"))
				.ticket(Script::Issue("tkt", 7200)),
		);
		let (cache, distributed) = build_test_cache(APP, origin.clone());
		let ticket = cache.jsapi_ticket().await.expect("Ticket should succeed on retry.");

		assert_eq!(ticket.expose(), "tkt");
		assert_eq!(origin.token_calls(), 2);
		assert_eq!(origin.ticket_calls(), 2);
		assert_eq!(origin.seen_tokens(), vec!["tok1".to_owned(), "tok2".to_owned()]);
		assert_eq!(cache.metrics().count(CredentialKind::Token, AcquireOutcome::Origin), 2);
		assert_eq!(cache.metrics().count(CredentialKind::Ticket, AcquireOutcome::Origin), 1);
		assert_eq!(
			cache.peek(CredentialKind::Token).map(|record| record.expose().to_owned()),
			Some("tok2".into())
		);
		assert_eq!(
			distributed.get(&token_key()).await.expect("Distributed read should succeed."),
			Some("tok2".into())
		);
		assert_eq!(
			distributed.get(&ticket_key()).await.expect("Distributed read should succeed."),
			Some("tkt".into())
		);
	}

	#[tokio::test(start_paused = true)]
	async fn ticket_retry_is_bounded() {
		let origin = Arc::new(
			ScriptedOrigin::default()
				.token(Script::Issue("tok", 7200))
				.ticket(Script::Reject("40001", "invalid credential")),
		);
		let (cache, _) = build_test_cache(APP, origin.clone());
		let err = cache.jsapi_ticket().await.expect_err("Ticket must eventually give up.");

		assert!(matches!(err, Error::CredentialUnavailable { kind: CredentialKind::Ticket, .. }));
		assert_eq!(origin.ticket_calls(), 2);
		assert_eq!(origin.token_calls(), 2);
		assert!(cache.peek(CredentialKind::Ticket).is_none());
	}

	#[tokio::test(start_paused = true)]
	async fn origin_errors_propagate_and_cache_nothing() {
		let origin =
			Arc::new(ScriptedOrigin::default().token(Script::Reject("40013", "invalid appid")));
		let (cache, distributed) = build_test_cache(APP, origin);
		let err = cache.access_token().await.expect_err("Origin rejection should propagate.");

		assert!(matches!(
			err,
			Error::Origin(OriginError::Rejected { ref code, .. }) if code == "40013"
		));
		assert!(cache.peek(CredentialKind::Token).is_none());
		assert!(distributed.is_empty());

		let err = cache.jsapi_ticket().await.expect_err("Ticket needs a token.");

		assert!(matches!(err, Error::Origin(_)));
		assert_eq!(cache.metrics().count(CredentialKind::Token, AcquireOutcome::Failure), 2);
		assert_eq!(cache.metrics().count(CredentialKind::Ticket, AcquireOutcome::Failure), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn oversized_lifetime_is_served_from_memory() {
		let origin = Arc::new(ScriptedOrigin::default().token(Script::Issue("tok", u64::MAX)));
		let (cache, distributed) = build_test_cache(APP, origin.clone());
		let record = cache.access_token().await.expect("Oversized lifetime should not fail.");

		assert_eq!(record.expose(), "tok");
		assert_eq!(record.remaining_seconds, u64::MAX);
		assert!(distributed.is_empty());

		cache.access_token().await.expect("Memory hit should succeed.");

		assert_eq!(origin.token_calls(), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn evict_removes_both_tiers() {
		let origin = Arc::new(ScriptedOrigin::default().token(Script::Issue("tok1", 7200)));
		let (cache, distributed) = build_test_cache(APP, origin.clone());

		cache.access_token().await.expect("Acquisition should succeed.");
		cache.evict(CredentialKind::Token).await.expect("Eviction should succeed.");

		assert!(cache.peek(CredentialKind::Token).is_none());
		assert!(distributed.is_empty());

		cache.access_token().await.expect("Reacquisition should succeed.");

		assert_eq!(origin.token_calls(), 2);
	}

	#[derive(Debug, Default)]
	struct FlakyCache {
		fail_reads: bool,
	}
	impl DistributedCache for FlakyCache {
		fn get<'a>(&'a self, _key: &'a CacheKey) -> CacheFuture<'a, Option<String>> {
			Box::pin(async move {
				if self.fail_reads {
					Err(CacheError::Backend { message: "read refused".into() })
				} else {
					Ok(None)
				}
			})
		}

		fn ttl<'a>(&'a self, _key: &'a CacheKey) -> CacheFuture<'a, Option<Duration>> {
			Box::pin(async { Ok(None) })
		}

		fn set<'a>(
			&'a self,
			_key: &'a CacheKey,
			_value: &'a str,
			_ttl: Duration,
		) -> CacheFuture<'a, ()> {
			Box::pin(async { Err(CacheError::Backend { message: "write refused".into() }) })
		}

		fn del<'a>(&'a self, _key: &'a CacheKey) -> CacheFuture<'a, ()> {
			Box::pin(async { Ok(()) })
		}
	}

	fn flaky_cache(origin: Arc<ScriptedOrigin>, fail_reads: bool) -> CredentialCache {
		CredentialCache::new(
			Arc::new(test_tenant(APP)),
			origin,
			Arc::new(FlakyCache { fail_reads }),
			CacheSettings::default(),
		)
	}

	#[tokio::test(start_paused = true)]
	async fn write_through_failure_is_not_raised() {
		let origin = Arc::new(ScriptedOrigin::default().token(Script::Issue("tok1", 7200)));
		let cache = flaky_cache(origin, false);
		let record = cache.access_token().await.expect("Write-through failure must be swallowed.");

		assert_eq!(record.expose(), "tok1");
	}

	#[tokio::test(start_paused = true)]
	async fn distributed_read_failure_is_transport_error() {
		let origin = Arc::new(ScriptedOrigin::default().token(Script::Issue("tok1", 7200)));
		let cache = flaky_cache(origin.clone(), true);
		let err = cache.access_token().await.expect_err("Read failure should propagate.");

		assert!(matches!(err, Error::Transport(TransportError::Cache(_))));
		assert_eq!(origin.token_calls(), 0);
	}

	#[test]
	fn settings_deserialize_with_defaults() {
		let settings: CacheSettings = serde_json::from_str(r#"{"max_ticket_attempts":0}"#)
			.expect("Settings should deserialize.");

		assert_eq!(settings.token_prefix, "wx-access-token:");
		assert_eq!(settings.ticket_attempts(), 1);
		assert_eq!(CacheSettings::default().ticket_attempts(), 2);
	}
}
