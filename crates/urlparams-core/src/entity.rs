//! Entity lookup by key
//!
//! The persistence layer is an external collaborator; converters only need
//! "fetch entity of type T by primary key string". [`EntityStore`] is that
//! capability, and [`MemoryEntityStore`] an in-process implementation.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

use crate::types::TypeRef;
use crate::value::EntityHandle;

/// Failure of a single entity lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
	#[error("{entity_type} matching key '{key}' does not exist")]
	NotFound { entity_type: String, key: String },
	#[error("Multiple {entity_type} objects returned for key '{key}'")]
	MultipleObjectsReturned { entity_type: String, key: String },
	#[error("Database error: {0}")]
	Backend(String),
}

impl LookupError {
	pub fn not_found(entity_type: &TypeRef, key: &str) -> Self {
		Self::NotFound {
			entity_type: entity_type.qualified_name().to_string(),
			key: key.to_string(),
		}
	}

	pub fn is_not_found(&self) -> bool {
		matches!(self, Self::NotFound { .. })
	}
}

/// Fetches entities of a given type by primary key.
///
/// Implementations may block on I/O; the caller waits on the calling thread.
/// Timeouts are the implementation's concern.
pub trait EntityStore: Send + Sync {
	fn fetch(&self, entity_type: &TypeRef, key: &str) -> Result<EntityHandle, LookupError>;
}

type StoredObject = Arc<dyn Any + Send + Sync>;

/// In-memory [`EntityStore`], keyed by qualified type name and key.
///
/// Lookup matches the requested type exactly; an entity stored under a
/// subtype is not returned for its parent type.
///
/// # Examples
///
/// ```
/// use urlparams_core::{EntityStore, MemoryEntityStore, TypeRef};
///
/// let product = TypeRef::new("shop", "Product", &TypeRef::model());
/// let store = MemoryEntityStore::new();
/// store.insert(&product, "7", "Widget".to_string());
///
/// let found = store.fetch(&product, "7").unwrap();
/// assert_eq!(found.downcast_ref::<String>().unwrap(), "Widget");
/// assert!(store.fetch(&product, "8").unwrap_err().is_not_found());
/// ```
#[derive(Default)]
pub struct MemoryEntityStore {
	entities: RwLock<HashMap<(String, String), StoredObject>>,
}

impl MemoryEntityStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert<T: Any + Send + Sync>(&self, entity_type: &TypeRef, key: impl Into<String>, object: T) {
		self.entities.write().insert(
			(entity_type.qualified_name().to_string(), key.into()),
			Arc::new(object),
		);
	}

	pub fn remove(&self, entity_type: &TypeRef, key: &str) -> bool {
		self.entities
			.write()
			.remove(&(entity_type.qualified_name().to_string(), key.to_string()))
			.is_some()
	}

	pub fn len(&self) -> usize {
		self.entities.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.entities.read().is_empty()
	}
}

impl EntityStore for MemoryEntityStore {
	fn fetch(&self, entity_type: &TypeRef, key: &str) -> Result<EntityHandle, LookupError> {
		let entities = self.entities.read();
		let object = entities
			.get(&(entity_type.qualified_name().to_string(), key.to_string()))
			.ok_or_else(|| LookupError::not_found(entity_type, key))?;
		Ok(EntityHandle::from_shared(entity_type.clone(), key, Arc::clone(object)))
	}
}
