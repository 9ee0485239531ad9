//! Converter registry
//!
//! Maps runtime types to converters. A lookup picks the converter whose key
//! is the closest ancestor of the requested type (the type itself first);
//! among registrations for the same key, the latest wins. Keys registered as
//! `"<namespace>.<TypeName>"` paths are resolved through the registry's
//! [`TypeCatalog`] the first time they are needed.
//!
//! The registry is built and populated at startup, optionally frozen, and
//! then shared read-only across request threads.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use once_cell::sync::{Lazy, OnceCell};
use parking_lot::RwLock;
use tracing::{debug, error, trace};
use urlparams_conf::ConverterSettings;
use urlparams_core::{
	ConfigResult, ConfigurationError, EntityStore, StaticCatalog, TypeCatalog, TypeKey, TypeRef,
};

use crate::builtin::{PassthroughConverter, builtin_converters};
use crate::converter::Converter;

struct Registration {
	key: TypeKey,
	resolved: OnceCell<TypeRef>,
	sequence: usize,
	converter: Arc<dyn Converter>,
}

impl Registration {
	fn new(key: TypeKey, sequence: usize, converter: Arc<dyn Converter>) -> Self {
		let resolved = OnceCell::new();
		if let TypeKey::Concrete(ty) = &key {
			let _ = resolved.set(ty.clone());
		}
		Self {
			key,
			resolved,
			sequence,
			converter,
		}
	}

	fn resolve(&self, catalog: &dyn TypeCatalog) -> ConfigResult<&TypeRef> {
		self.resolved.get_or_try_init(|| {
			let ty = self.key.resolve(catalog)?;
			trace!(key = %self.key, resolved = %ty, "deferred converter key resolved");
			Ok(ty)
		})
	}
}

/// A registered `(key, converter)` pair, for introspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationInfo {
	pub key: String,
	pub converter: String,
	pub deferred: bool,
	/// Depth of the resolved key below `builtins.object`, `None` while a
	/// deferred key is unresolved.
	pub specificity: Option<usize>,
}

/// Registry of converters keyed by runtime type.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use urlparams_converters::{ConverterRegistry, FnConverter};
/// use urlparams_core::{Conversion, StaticCatalog, TypeRef, Value};
///
/// let catalog = Arc::new(StaticCatalog::new());
/// let clock = TypeRef::new("app", "Clock", &TypeRef::object());
/// catalog.register(clock.clone());
///
/// let registry = ConverterRegistry::new(catalog);
/// registry
///     .register_deferred("app.Clock", FnConverter::new("clock", |_, _, _| {
///         Conversion::Converted(Value::from("tick"))
///     }))
///     .unwrap();
///
/// assert_eq!(registry.lookup(&clock).unwrap().name(), "clock");
/// assert_eq!(registry.lookup(&TypeRef::integer()).unwrap().name(), "passthrough");
/// ```
pub struct ConverterRegistry {
	catalog: Arc<dyn TypeCatalog>,
	settings: Arc<ConverterSettings>,
	entries: RwLock<Vec<Registration>>,
	named: RwLock<HashMap<String, Arc<dyn Converter>>>,
	cache: RwLock<HashMap<TypeRef, Arc<dyn Converter>>>,
	frozen: AtomicBool,
}

impl ConverterRegistry {
	/// A registry holding only the universal passthrough for
	/// `builtins.object`.
	pub fn new(catalog: Arc<dyn TypeCatalog>) -> Self {
		Self::with_settings(catalog, ConverterSettings::default())
	}

	/// Like [`new`](Self::new), keeping `settings` for
	/// [`settings`](Self::settings).
	pub fn with_settings(catalog: Arc<dyn TypeCatalog>, settings: ConverterSettings) -> Self {
		let registry = Self {
			catalog,
			settings: Arc::new(settings),
			entries: RwLock::new(Vec::new()),
			named: RwLock::new(HashMap::new()),
			cache: RwLock::new(HashMap::new()),
			frozen: AtomicBool::new(false),
		};
		registry.push(TypeRef::object().into(), Arc::new(PassthroughConverter));
		registry
	}

	/// A registry with the universal passthrough and every built-in converter.
	/// Without a `store`, entity parameters fail to convert.
	pub fn with_builtins(
		catalog: Arc<dyn TypeCatalog>,
		settings: ConverterSettings,
		store: Option<Arc<dyn EntityStore>>,
	) -> Self {
		let builtins = builtin_converters(&settings, store);
		let registry = Self::with_settings(catalog, settings);
		for (ty, converter) in builtins {
			registry.push(ty.into(), converter);
		}
		registry
	}

	pub fn settings(&self) -> &ConverterSettings {
		&self.settings
	}

	pub fn catalog(&self) -> &Arc<dyn TypeCatalog> {
		&self.catalog
	}

	fn push(&self, key: TypeKey, converter: Arc<dyn Converter>) {
		let mut entries = self.entries.write();
		let sequence = entries.len();
		debug!(
			key = %key,
			converter = converter.name(),
			sequence,
			"converter registered"
		);
		entries.push(Registration::new(key, sequence, converter));
		self.cache.write().clear();
	}

	fn ensure_open(&self) -> ConfigResult<()> {
		if self.is_frozen() {
			return Err(ConfigurationError::RegistryFrozen);
		}
		Ok(())
	}

	/// Registers `converter` for `key` and its subtypes.
	///
	/// # Errors
	///
	/// Returns [`ConfigurationError::RegistryFrozen`] after [`freeze`](Self::freeze).
	pub fn register<C>(&self, key: impl Into<TypeKey>, converter: C) -> ConfigResult<()>
	where
		C: Converter + 'static,
	{
		self.register_arc(key, Arc::new(converter))
	}

	pub fn register_arc(&self, key: impl Into<TypeKey>, converter: Arc<dyn Converter>) -> ConfigResult<()> {
		self.ensure_open()?;
		self.push(key.into(), converter);
		Ok(())
	}

	/// Registers `converter` for a `"<namespace>.<TypeName>"` path resolved on
	/// first lookup.
	pub fn register_deferred<C>(&self, path: &str, converter: C) -> ConfigResult<()>
	where
		C: Converter + 'static,
	{
		let key = TypeKey::deferred(path)?;
		self.register_arc(key, Arc::new(converter))
	}

	/// Registers a converter a handler can select as its override by name.
	pub fn register_named(&self, name: impl Into<String>, converter: Arc<dyn Converter>) -> ConfigResult<()> {
		self.ensure_open()?;
		let name = name.into();
		debug!(name = %name, converter = converter.name(), "named converter registered");
		self.named.write().insert(name, converter);
		Ok(())
	}

	/// # Errors
	///
	/// Returns [`ConfigurationError::UnknownConverter`] when nothing is
	/// registered under `name`.
	pub fn named(&self, name: &str) -> ConfigResult<Arc<dyn Converter>> {
		self.named
			.read()
			.get(name)
			.cloned()
			.ok_or_else(|| ConfigurationError::UnknownConverter(name.to_string()))
	}

	/// Returns the most specific converter for `ty`.
	///
	/// # Errors
	///
	/// Returns [`ConfigurationError::UnresolvedType`] when a deferred key
	/// cannot be resolved through the catalog.
	pub fn lookup(&self, ty: &TypeRef) -> ConfigResult<Arc<dyn Converter>> {
		if let Some(converter) = self.cache.read().get(ty) {
			return Ok(Arc::clone(converter));
		}

		let entries = self.entries.read();
		// (distance, sequence, index)
		let mut best: Option<(usize, usize, usize)> = None;
		for (index, entry) in entries.iter().enumerate() {
			let key_type = entry.resolve(self.catalog.as_ref()).inspect_err(|e| {
				error!(key = %entry.key, error = %e, "converter key could not be resolved");
			})?;
			let Some(distance) = ty.distance_to(key_type) else {
				continue;
			};
			let better = match best {
				None => true,
				Some((best_distance, best_sequence, _)) => {
					distance < best_distance
						|| (distance == best_distance && entry.sequence > best_sequence)
				}
			};
			if better {
				best = Some((distance, entry.sequence, index));
			}
		}

		let converter = match best {
			Some((distance, _, index)) => {
				let entry = &entries[index];
				trace!(
					ty = %ty,
					key = %entry.key,
					distance,
					converter = entry.converter.name(),
					"converter selected"
				);
				Arc::clone(&entry.converter)
			}
			// Only reachable for a type outside the builtins.object tree.
			None => Arc::new(PassthroughConverter),
		};
		drop(entries);

		self.cache.write().insert(ty.clone(), Arc::clone(&converter));
		Ok(converter)
	}

	/// The converter for untyped parameters.
	pub fn lookup_untyped(&self) -> ConfigResult<Arc<dyn Converter>> {
		self.lookup(&TypeRef::object())
	}

	/// Resolves every deferred key and rejects further registration.
	///
	/// # Errors
	///
	/// Returns the first [`ConfigurationError::UnresolvedType`]; the registry
	/// stays open in that case.
	pub fn freeze(&self) -> ConfigResult<()> {
		{
			let entries = self.entries.read();
			for entry in entries.iter() {
				entry.resolve(self.catalog.as_ref())?;
			}
		}
		self.frozen.store(true, Ordering::Release);
		debug!(registrations = self.len(), "converter registry frozen");
		Ok(())
	}

	pub fn is_frozen(&self) -> bool {
		self.frozen.load(Ordering::Acquire)
	}

	pub fn len(&self) -> usize {
		self.entries.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.read().is_empty()
	}

	/// Registrations in registration order.
	pub fn registrations(&self) -> Vec<RegistrationInfo> {
		self.entries
			.read()
			.iter()
			.map(|entry| RegistrationInfo {
				key: entry.key.to_string(),
				converter: entry.converter.name().to_string(),
				deferred: entry.key.is_deferred(),
				specificity: entry.resolved.get().map(TypeRef::depth),
			})
			.collect()
	}
}

impl std::fmt::Debug for ConverterRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ConverterRegistry")
			.field("registrations", &self.len())
			.field("named", &self.named.read().len())
			.field("frozen", &self.is_frozen())
			.finish()
	}
}

static DEFAULT_ACCESSED: AtomicBool = AtomicBool::new(false);
static INSTALLED: OnceCell<Arc<ConverterRegistry>> = OnceCell::new();
static FALLBACK: Lazy<Arc<ConverterRegistry>> = Lazy::new(|| {
	Arc::new(ConverterRegistry::with_builtins(
		Arc::new(StaticCatalog::new()),
		ConverterSettings::default(),
		None,
	))
});

/// Installs `registry` as the process default.
///
/// Call once at startup, before the first [`default_registry`]. When the
/// registry's settings ask for it, the registry is frozen first.
///
/// # Errors
///
/// Returns [`ConfigurationError::AlreadyInstalled`] if a registry was already
/// installed or the built-in default has already been handed out, or the
/// error from [`ConverterRegistry::freeze`].
pub fn install_default_registry(registry: Arc<ConverterRegistry>) -> ConfigResult<()> {
	if DEFAULT_ACCESSED.load(Ordering::Acquire) {
		return Err(ConfigurationError::AlreadyInstalled);
	}
	if registry.settings().freeze_on_install {
		registry.freeze()?;
	}
	INSTALLED
		.set(registry)
		.map_err(|_| ConfigurationError::AlreadyInstalled)?;
	debug!("default converter registry installed");
	Ok(())
}

/// The process default registry: the installed one, or a built-in registry
/// using the static catalog, default settings and no entity store.
pub fn default_registry() -> Arc<ConverterRegistry> {
	if let Some(registry) = INSTALLED.get() {
		return Arc::clone(registry);
	}
	DEFAULT_ACCESSED.store(true, Ordering::Release);
	// An install racing this call may have won.
	match INSTALLED.get() {
		Some(registry) => Arc::clone(registry),
		None => Arc::clone(&FALLBACK),
	}
}
