// crates.io
use tracing::{Span, instrument::Instrumented};
// self
use crate::{
	_prelude::*,
	auth::{AppId, CredentialKind},
};

/// Span wrapper used around each credential acquisition.
#[derive(Clone, Debug)]
pub struct AcquireSpan {
	span: Span,
}
impl AcquireSpan {
	/// Creates a new span tagged with the credential kind and tenant.
	pub fn new(kind: CredentialKind, app_id: &AppId) -> Self {
		let span = tracing::info_span!(
			"weixin_broker.acquire",
			kind = kind.as_str(),
			app_id = %app_id
		);

		Self { span }
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> Instrumented<Fut>
	where
		Fut: Future,
	{
		tracing::Instrument::instrument(fut, self.span.clone())
	}
}
