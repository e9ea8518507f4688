//! Per-kind credential slot with a self-expiring countdown.

// crates.io
use tokio::{
	task::JoinHandle,
	time::{self, Instant},
};
// self
use crate::{
	_prelude::*,
	auth::{AppId, CredentialKind, CredentialRecord, CredentialSecret},
};

const TICK: Duration = Duration::from_secs(1);

/// Holds at most one live credential of one kind for one tenant.
///
/// `gate` serializes the whole acquisition sequence; `state` is only locked for short synchronous
/// sections and never across `.await`.
pub(crate) struct CredentialSlot {
	kind: CredentialKind,
	app_id: AppId,
	pub(crate) gate: AsyncMutex<()>,
	state: Arc<Mutex<SlotState>>,
}
impl CredentialSlot {
	pub(crate) fn new(kind: CredentialKind, app_id: AppId) -> Self {
		Self { kind, app_id, gate: AsyncMutex::new(()), state: Default::default() }
	}

	pub(crate) fn kind(&self) -> CredentialKind {
		self.kind
	}

	/// Snapshot of the live record, if any.
	pub(crate) fn peek(&self) -> Option<CredentialRecord> {
		self.state.lock().live.as_ref().map(|live| live.snapshot(self.kind))
	}

	/// Replaces the live record and restarts the countdown.
	///
	/// Must be called from within a tokio runtime.
	pub(crate) fn install(&self, value: String, remaining: u64) -> Result<CredentialRecord> {
		if value.is_empty() || remaining == 0 {
			return Err(Error::CredentialUnavailable {
				kind: self.kind,
				reason: "record requires a non-empty value and a positive lifetime".into(),
			});
		}

		let mut state = self.state.lock();

		state.generation = state.generation.wrapping_add(1);

		if let Some(previous) = state.live.take() {
			previous.countdown.abort();
		}

		let countdown = tokio::spawn(countdown(
			Arc::downgrade(&self.state),
			state.generation,
			self.kind,
			self.app_id.clone(),
		));
		let live = LiveRecord { value: CredentialSecret::new(value), remaining, countdown };
		let record = live.snapshot(self.kind);

		state.live = Some(live);

		Ok(record)
	}

	/// Clears the live record and stops its countdown. Returns `true` if a record was cleared.
	pub(crate) fn invalidate(&self) -> bool {
		let mut state = self.state.lock();

		state.generation = state.generation.wrapping_add(1);

		match state.live.take() {
			Some(previous) => {
				previous.countdown.abort();

				true
			},
			None => false,
		}
	}
}
impl Drop for CredentialSlot {
	fn drop(&mut self) {
		if let Some(live) = self.state.lock().live.take() {
			live.countdown.abort();
		}
	}
}

#[derive(Default)]
struct SlotState {
	generation: u64,
	live: Option<LiveRecord>,
}

struct LiveRecord {
	value: CredentialSecret,
	remaining: u64,
	countdown: JoinHandle<()>,
}
impl LiveRecord {
	fn snapshot(&self, kind: CredentialKind) -> CredentialRecord {
		CredentialRecord { kind, value: self.value.clone(), remaining_seconds: self.remaining }
	}
}

async fn countdown(
	state: Weak<Mutex<SlotState>>,
	generation: u64,
	kind: CredentialKind,
	app_id: AppId,
) {
	let mut ticker = time::interval_at(Instant::now() + TICK, TICK);

	loop {
		ticker.tick().await;

		let Some(shared) = state.upgrade() else { return };
		let mut guard = shared.lock();

		if guard.generation != generation {
			return;
		}

		let Some(live) = guard.live.as_mut() else { return };

		live.remaining = live.remaining.saturating_sub(1);

		tracing::trace!(%app_id, %kind, remaining = live.remaining, "credential countdown");

		if live.remaining == 0 {
			// The handle belongs to this task; dropping it detaches rather than aborts.
			guard.live = None;

			tracing::debug!(%app_id, %kind, "credential expired");

			return;
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn slot() -> CredentialSlot {
		CredentialSlot::new(
			CredentialKind::Token,
			AppId::new("wx-slot").expect("App id fixture should be valid."),
		)
	}

	#[tokio::test(start_paused = true)]
	async fn countdown_decrements_and_clears() {
		let slot = slot();
		let record = slot.install("tok".into(), 3).expect("Record should install.");

		assert_eq!(record.remaining_seconds, 3);

		time::sleep(Duration::from_millis(1_500)).await;

		assert_eq!(slot.peek().map(|r| r.remaining_seconds), Some(2));

		time::sleep(Duration::from_secs(2)).await;

		assert!(slot.peek().is_none());
	}

	#[tokio::test(start_paused = true)]
	async fn replacing_record_stops_previous_countdown() {
		let slot = slot();

		slot.install("old".into(), 2).expect("First record should install.");
		time::sleep(Duration::from_millis(500)).await;
		slot.install("new".into(), 10).expect("Second record should install.");
		time::sleep(Duration::from_millis(2_800)).await;

		let record = slot.peek().expect("Newer record must survive the old countdown.");

		assert_eq!(record.expose(), "new");
		assert_eq!(record.remaining_seconds, 8);
	}

	#[tokio::test]
	async fn install_rejects_malformed_records() {
		let slot = slot();

		assert!(matches!(
			slot.install(String::new(), 10),
			Err(Error::CredentialUnavailable { kind: CredentialKind::Token, .. })
		));
		assert!(slot.install("tok".into(), 0).is_err());
		assert!(slot.peek().is_none());
	}

	#[tokio::test]
	async fn invalidate_clears_live_record() {
		let slot = slot();

		slot.install("tok".into(), 60).expect("Record should install.");

		assert!(slot.invalidate());
		assert!(slot.peek().is_none());
		assert!(!slot.invalidate());
	}
}
