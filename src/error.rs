//! Broker-level error types shared across the cache, origins, stores, and registry.

// self
use crate::{_prelude::*, auth::CredentialKind, origin, store::CacheError};

/// Broker-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical broker error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure reaching the origin or the distributed cache.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// The origin answered but reported a failure.
	#[error(transparent)]
	Origin(#[from] OriginError),

	/// No tier could produce a valid credential.
	#[error("No valid {kind} could be produced: {reason}.")]
	CredentialUnavailable {
		/// Credential kind that was requested.
		kind: CredentialKind,
		/// Broker-supplied reason string.
		reason: String,
	},
	/// The application id is not registered.
	#[error("Tenant `{app_id}` is not registered.")]
	TenantNotFound {
		/// Application id that failed to resolve.
		app_id: String,
	},
	/// A push signature did not match the tenant's signature token.
	#[error("Push signature is invalid.")]
	SignatureMismatch,
}
impl Error {
	/// Returns `true` when the origin reported the presented access token as invalid or expired.
	pub fn is_token_invalid(&self) -> bool {
		matches!(self, Self::Origin(err) if err.is_token_invalid())
	}
}
impl From<CacheError> for Error {
	fn from(e: CacheError) -> Self {
		Self::Transport(e.into())
	}
}

/// Configuration and validation failures raised by the broker.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// An origin endpoint could not be derived from its base URL.
	#[error("Endpoint `{path}` cannot be derived from base URL {base}.")]
	InvalidEndpoint {
		/// Base URL supplied by the tenant configuration.
		base: String,
		/// Path that was being appended.
		path: &'static str,
	},
	/// A built-in URL failed to parse.
	#[error("URL is invalid.")]
	InvalidUrl(#[from] url::ParseError),
	/// Tenant configuration failed validation.
	#[error(transparent)]
	Tenant(#[from] crate::tenant::TenantConfigError),
	/// Two tenants share the same application id.
	#[error("Tenant `{app_id}` is registered more than once.")]
	DuplicateTenant {
		/// Duplicated application id.
		app_id: String,
	},
	/// Registry document could not be parsed.
	#[error("Registry configuration is malformed.")]
	RegistryParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, timeout, distributed cache).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the credential origin.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The origin did not answer within the configured timeout.
	#[error("Credential origin did not respond within the configured timeout.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
	/// Distributed cache round trip failed.
	#[error("Distributed cache failure: {0}")]
	Cache(#[from] CacheError),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a transport-specific timeout error.
	pub fn timeout(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Timeout { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::timeout(e) } else { Self::network(e) }
	}
}

/// Failures reported by (or decoded from) the credential origin.
#[derive(Debug, ThisError)]
pub enum OriginError {
	/// Origin rejected the request with an explanatory message.
	#[error("Origin rejected the request ({code}): {message}.")]
	Rejected {
		/// Origin error code.
		code: String,
		/// Origin error message.
		message: String,
	},
	/// Origin failed without a message.
	#[error("Origin request failed with code {code} and no message.")]
	Unspecified {
		/// Origin error code.
		code: String,
	},
	/// Origin responded with JSON that could not be parsed.
	#[error("Origin returned malformed JSON.")]
	Decode {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}
impl OriginError {
	/// Returns the origin error code, when one was reported.
	pub fn code(&self) -> Option<&str> {
		match self {
			Self::Rejected { code, .. } | Self::Unspecified { code } => Some(code),
			Self::Decode { .. } => None,
		}
	}

	/// Returns `true` for the codes the platform uses to flag an invalid or expired access token.
	pub fn is_token_invalid(&self) -> bool {
		self.code().is_some_and(|code| origin::TOKEN_INVALID_CODES.contains(&code))
	}
}
