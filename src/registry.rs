//! Tenant registry resolving application ids to configurations and credential caches.

// self
use crate::{
	_prelude::*,
	auth::AppId,
	cache::{CacheSettings, CredentialCache},
	error::ConfigError,
	origin::CredentialOrigin,
	store::DistributedCache,
	tenant::TenantConfig,
};
#[cfg(feature = "reqwest")] use crate::{http::ReqwestHttpClient, origin};

/// One registered tenant.
#[derive(Debug)]
pub struct Tenant {
	/// Immutable tenant configuration.
	pub config: Arc<TenantConfig>,
	/// Credential cache serving this tenant.
	pub cache: CredentialCache,
}

/// Registry document: shared cache settings plus the tenant list.
#[derive(Debug, Default, Deserialize)]
pub struct RegistryConfig {
	/// Settings applied to every tenant's cache.
	#[serde(default)]
	pub settings: CacheSettings,
	/// Tenant configurations.
	#[serde(default)]
	pub tenants: Vec<TenantConfig>,
}

/// Maps application ids to tenants.
///
/// Built once at startup and shared by reference; registration takes a write lock, resolution a
/// read lock.
pub struct TenantRegistry {
	distributed: Arc<dyn DistributedCache>,
	settings: CacheSettings,
	tenants: RwLock<BTreeMap<AppId, Arc<Tenant>>>,
}
impl TenantRegistry {
	/// Creates an empty registry whose caches share `distributed`.
	pub fn new(distributed: Arc<dyn DistributedCache>, settings: CacheSettings) -> Self {
		Self { distributed, settings, tenants: Default::default() }
	}

	/// Builds a registry from a parsed document, wiring each tenant to its configured origin.
	#[cfg(feature = "reqwest")]
	pub fn from_config(
		config: RegistryConfig,
		distributed: Arc<dyn DistributedCache>,
		http: ReqwestHttpClient,
	) -> Result<Self> {
		let registry = Self::new(distributed, config.settings);

		for tenant in config.tenants {
			registry.register(tenant, http.clone())?;
		}

		Ok(registry)
	}

	/// Parses a JSON registry document and builds the registry.
	#[cfg(feature = "reqwest")]
	pub fn from_json(
		json: &str,
		distributed: Arc<dyn DistributedCache>,
		http: ReqwestHttpClient,
	) -> Result<Self> {
		let mut deserializer = serde_json::Deserializer::from_str(json);
		let config: RegistryConfig = serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| ConfigError::RegistryParse { source })?;

		Self::from_config(config, distributed, http)
	}

	/// Registers `config` with the origin matching its flavor.
	#[cfg(feature = "reqwest")]
	pub fn register(&self, config: TenantConfig, http: ReqwestHttpClient) -> Result<Arc<Tenant>> {
		let origin = origin::origin_for(&config, http)?;

		self.register_with_origin(config, origin)
	}

	/// Registers `config` with a caller-supplied origin.
	pub fn register_with_origin(
		&self,
		config: TenantConfig,
		origin: Arc<dyn CredentialOrigin>,
	) -> Result<Arc<Tenant>> {
		let mut tenants = self.tenants.write();

		if tenants.contains_key(&config.app_id) {
			return Err(ConfigError::DuplicateTenant { app_id: config.app_id.to_string() }.into());
		}

		let config = Arc::new(config);
		let cache = CredentialCache::new(
			config.clone(),
			origin,
			self.distributed.clone(),
			self.settings.clone(),
		);
		let tenant = Arc::new(Tenant { config: config.clone(), cache });

		tenants.insert(config.app_id.clone(), tenant.clone());

		tracing::debug!(app_id = %config.app_id, name = %config.name, "tenant registered");

		Ok(tenant)
	}

	/// Looks up the tenant registered under `app_id`.
	pub fn resolve(&self, app_id: &str) -> Result<Arc<Tenant>> {
		self.tenants
			.read()
			.get(app_id)
			.cloned()
			.ok_or_else(|| Error::TenantNotFound { app_id: app_id.to_owned() })
	}

	/// Number of registered tenants.
	pub fn len(&self) -> usize {
		self.tenants.read().len()
	}

	/// Returns `true` when no tenant is registered.
	pub fn is_empty(&self) -> bool {
		self.tenants.read().is_empty()
	}

	/// Registered application ids in ascending order.
	pub fn app_ids(&self) -> Vec<AppId> {
		self.tenants.read().keys().cloned().collect()
	}
}
impl Debug for TenantRegistry {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TenantRegistry")
			.field("settings", &self.settings)
			.field("app_ids", &self.app_ids())
			.finish_non_exhaustive()
	}
}
