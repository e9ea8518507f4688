// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::{auth::CredentialKind, obs::AcquireOutcome};

const OUTCOMES: usize = 4;

/// Thread-safe acquisition counters for one tenant, labeled by kind and outcome.
#[derive(Debug, Default)]
pub struct AcquireMetrics {
	token: [AtomicU64; OUTCOMES],
	ticket: [AtomicU64; OUTCOMES],
}
impl AcquireMetrics {
	/// Returns how many acquisitions of `kind` ended with `outcome`.
	pub fn count(&self, kind: CredentialKind, outcome: AcquireOutcome) -> u64 {
		self.row(kind)[Self::column(outcome)].load(Ordering::Relaxed)
	}

	/// Returns the number of acquisitions of `kind`, successful or not.
	pub fn total(&self, kind: CredentialKind) -> u64 {
		self.row(kind).iter().map(|counter| counter.load(Ordering::Relaxed)).sum()
	}

	pub(crate) fn record(&self, kind: CredentialKind, outcome: AcquireOutcome) {
		self.row(kind)[Self::column(outcome)].fetch_add(1, Ordering::Relaxed);
	}

	fn row(&self, kind: CredentialKind) -> &[AtomicU64; OUTCOMES] {
		match kind {
			CredentialKind::Token => &self.token,
			CredentialKind::Ticket => &self.ticket,
		}
	}

	fn column(outcome: AcquireOutcome) -> usize {
		match outcome {
			AcquireOutcome::Memory => 0,
			AcquireOutcome::Distributed => 1,
			AcquireOutcome::Origin => 2,
			AcquireOutcome::Failure => 3,
		}
	}
}
