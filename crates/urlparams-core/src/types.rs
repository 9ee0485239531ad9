//! Runtime type references
//!
//! Rust erases declared types at runtime, so handler signatures carry
//! [`TypeRef`] descriptors instead. A `TypeRef` names a type within a
//! namespace and points at its parent, forming a single-inheritance tree
//! rooted at `builtins.object`. Converter selection walks this tree.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::error::{ConfigResult, ConfigurationError};

/// Namespace of the built-in types.
pub const BUILTINS_NAMESPACE: &str = "builtins";

/// Namespace of the entity root type.
pub const MODELS_NAMESPACE: &str = "models";

#[derive(Debug)]
struct TypeInfo {
	namespace: String,
	name: String,
	qualified: String,
	parent: Option<TypeRef>,
}

/// A cheaply clonable reference to a runtime type.
///
/// Two references are equal when their qualified names (`namespace.Name`)
/// are equal.
///
/// # Examples
///
/// ```
/// use urlparams_core::TypeRef;
///
/// let product = TypeRef::new("shop", "Product", &TypeRef::model());
/// assert_eq!(product.qualified_name(), "shop.Product");
/// assert!(product.is_subtype_of(&TypeRef::model()));
/// assert!(product.is_subtype_of(&TypeRef::object()));
/// assert_eq!(product.depth(), 2);
/// ```
#[derive(Clone)]
pub struct TypeRef(Arc<TypeInfo>);

struct Builtins {
	object: TypeRef,
	string: TypeRef,
	integer: TypeRef,
	float: TypeRef,
	decimal: TypeRef,
	boolean: TypeRef,
	date: TypeRef,
	datetime: TypeRef,
	model: TypeRef,
}

static BUILTINS: Lazy<Builtins> = Lazy::new(|| {
	let object = TypeRef::from_parts(BUILTINS_NAMESPACE, "object", None);
	let child = |name: &str| TypeRef::new(BUILTINS_NAMESPACE, name, &object);
	Builtins {
		string: child("str"),
		integer: child("int"),
		float: child("float"),
		decimal: child("decimal"),
		boolean: child("bool"),
		date: child("date"),
		datetime: child("datetime"),
		model: TypeRef::new(MODELS_NAMESPACE, "Model", &object),
		object,
	}
});

impl TypeRef {
	/// Declares a type named `name` in `namespace`, deriving from `parent`.
	pub fn new(namespace: impl Into<String>, name: impl Into<String>, parent: &TypeRef) -> Self {
		Self::from_parts(namespace, name, Some(parent.clone()))
	}

	fn from_parts(
		namespace: impl Into<String>,
		name: impl Into<String>,
		parent: Option<TypeRef>,
	) -> Self {
		let namespace = namespace.into();
		let name = name.into();
		let qualified = format!("{}.{}", namespace, name);
		Self(Arc::new(TypeInfo {
			namespace,
			name,
			qualified,
			parent,
		}))
	}

	/// The universal root type; every type derives from it.
	pub fn object() -> Self {
		BUILTINS.object.clone()
	}

	pub fn string() -> Self {
		BUILTINS.string.clone()
	}

	pub fn integer() -> Self {
		BUILTINS.integer.clone()
	}

	pub fn float() -> Self {
		BUILTINS.float.clone()
	}

	pub fn decimal() -> Self {
		BUILTINS.decimal.clone()
	}

	pub fn boolean() -> Self {
		BUILTINS.boolean.clone()
	}

	pub fn date() -> Self {
		BUILTINS.date.clone()
	}

	pub fn datetime() -> Self {
		BUILTINS.datetime.clone()
	}

	/// Root of all entity (persisted model) types.
	pub fn model() -> Self {
		BUILTINS.model.clone()
	}

	/// All built-in types, root first.
	pub fn builtins() -> Vec<TypeRef> {
		let b = &*BUILTINS;
		vec![
			b.object.clone(),
			b.string.clone(),
			b.integer.clone(),
			b.float.clone(),
			b.decimal.clone(),
			b.boolean.clone(),
			b.date.clone(),
			b.datetime.clone(),
			b.model.clone(),
		]
	}

	pub fn namespace(&self) -> &str {
		&self.0.namespace
	}

	pub fn name(&self) -> &str {
		&self.0.name
	}

	/// `"<namespace>.<Name>"`
	pub fn qualified_name(&self) -> &str {
		&self.0.qualified
	}

	pub fn parent(&self) -> Option<&TypeRef> {
		self.0.parent.as_ref()
	}

	/// Iterates over this type and then each ancestor up to the root.
	pub fn ancestors(&self) -> Ancestors<'_> {
		Ancestors { next: Some(self) }
	}

	/// Distance from the root type (`object` has depth 0).
	pub fn depth(&self) -> usize {
		self.ancestors().count() - 1
	}

	/// Returns `true` if `self` is `other` or derives from it.
	pub fn is_subtype_of(&self, other: &TypeRef) -> bool {
		self.ancestors().any(|ancestor| ancestor == other)
	}

	/// Number of inheritance steps from `self` up to `ancestor`, if related.
	pub fn distance_to(&self, ancestor: &TypeRef) -> Option<usize> {
		self.ancestors().position(|candidate| candidate == ancestor)
	}
}

/// Iterator returned by [`TypeRef::ancestors`].
pub struct Ancestors<'a> {
	next: Option<&'a TypeRef>,
}

impl<'a> Iterator for Ancestors<'a> {
	type Item = &'a TypeRef;

	fn next(&mut self) -> Option<Self::Item> {
		let current = self.next?;
		self.next = current.parent();
		Some(current)
	}
}

impl PartialEq for TypeRef {
	fn eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.0, &other.0) || self.0.qualified == other.0.qualified
	}
}

impl Eq for TypeRef {}

impl Hash for TypeRef {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.0.qualified.hash(state);
	}
}

impl fmt::Debug for TypeRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "TypeRef({})", self.0.qualified)
	}
}

impl fmt::Display for TypeRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0.qualified)
	}
}

/// Key under which a converter is registered.
///
/// `Deferred` names a type that cannot be referenced yet when the registry is
/// built (its defining module initialises later). It is resolved through a
/// [`TypeCatalog`] on first lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKey {
	Concrete(TypeRef),
	Deferred { namespace: String, name: String },
}

impl TypeKey {
	/// Parses a deferred key of the form `"<namespace>.<TypeName>"`.
	///
	/// The namespace may itself contain dots; the type name is the last
	/// component.
	///
	/// # Examples
	///
	/// ```
	/// use urlparams_core::TypeKey;
	///
	/// let key = TypeKey::deferred("shop.models.Product").unwrap();
	/// assert_eq!(key.to_string(), "shop.models.Product");
	/// assert!(TypeKey::deferred("Product").is_err());
	/// assert!(TypeKey::deferred("shop.").is_err());
	/// ```
	pub fn deferred(path: &str) -> ConfigResult<Self> {
		match path.rsplit_once('.') {
			Some((namespace, name)) if !namespace.is_empty() && !name.is_empty() => {
				Ok(Self::Deferred {
					namespace: namespace.to_string(),
					name: name.to_string(),
				})
			}
			_ => Err(ConfigurationError::InvalidTypeKey(path.to_string())),
		}
	}

	pub fn is_deferred(&self) -> bool {
		matches!(self, Self::Deferred { .. })
	}

	/// Resolves the key to a concrete type.
	///
	/// # Errors
	///
	/// Returns [`ConfigurationError::UnresolvedType`] when the catalog does not
	/// know a deferred type.
	pub fn resolve(&self, catalog: &dyn TypeCatalog) -> ConfigResult<TypeRef> {
		match self {
			Self::Concrete(ty) => Ok(ty.clone()),
			Self::Deferred { namespace, name } => catalog
				.resolve(namespace, name)
				.ok_or_else(|| ConfigurationError::UnresolvedType(format!("{}.{}", namespace, name))),
		}
	}
}

impl From<TypeRef> for TypeKey {
	fn from(ty: TypeRef) -> Self {
		Self::Concrete(ty)
	}
}

impl From<&TypeRef> for TypeKey {
	fn from(ty: &TypeRef) -> Self {
		Self::Concrete(ty.clone())
	}
}

impl fmt::Display for TypeKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Concrete(ty) => write!(f, "{}", ty),
			Self::Deferred { namespace, name } => write!(f, "{}.{}", namespace, name),
		}
	}
}

/// Resolves deferred type names once the host environment has loaded them.
pub trait TypeCatalog: Send + Sync {
	fn resolve(&self, namespace: &str, name: &str) -> Option<TypeRef>;
}

/// In-memory [`TypeCatalog`].
///
/// [`StaticCatalog::new`] knows the built-in types; applications register
/// their own as their modules initialise.
///
/// # Examples
///
/// ```
/// use urlparams_core::{StaticCatalog, TypeCatalog, TypeRef};
///
/// let catalog = StaticCatalog::new();
/// assert_eq!(catalog.resolve("builtins", "int"), Some(TypeRef::integer()));
///
/// catalog.register(TypeRef::new("shop", "Product", &TypeRef::model()));
/// assert!(catalog.resolve("shop", "Product").is_some());
/// ```
#[derive(Debug)]
pub struct StaticCatalog {
	types: RwLock<HashMap<String, TypeRef>>,
}

impl StaticCatalog {
	/// Creates a catalog pre-populated with the built-in types.
	pub fn new() -> Self {
		let catalog = Self::empty();
		for ty in TypeRef::builtins() {
			catalog.register(ty);
		}
		catalog
	}

	pub fn empty() -> Self {
		Self {
			types: RwLock::new(HashMap::new()),
		}
	}

	/// Adds a type, replacing any previous type with the same qualified name.
	pub fn register(&self, ty: TypeRef) {
		self.types
			.write()
			.insert(ty.qualified_name().to_string(), ty);
	}

	pub fn len(&self) -> usize {
		self.types.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.types.read().is_empty()
	}
}

impl Default for StaticCatalog {
	fn default() -> Self {
		Self::new()
	}
}

impl TypeCatalog for StaticCatalog {
	fn resolve(&self, namespace: &str, name: &str) -> Option<TypeRef> {
		self.types
			.read()
			.get(&format!("{}.{}", namespace, name))
			.cloned()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_builtins_derive_from_object() {
		// Arrange
		let object = TypeRef::object();

		// Act & Assert
		for ty in TypeRef::builtins() {
			assert!(ty.is_subtype_of(&object), "{} should derive from object", ty);
		}
		assert_eq!(object.depth(), 0);
		assert!(object.parent().is_none());
	}

	#[rstest]
	fn test_subtype_relationships() {
		// Arrange
		let animal = TypeRef::new("zoo", "Animal", &TypeRef::model());
		let cat = TypeRef::new("zoo", "Cat", &animal);

		// Assert
		assert!(cat.is_subtype_of(&animal));
		assert!(cat.is_subtype_of(&TypeRef::model()));
		assert!(!animal.is_subtype_of(&cat));
		assert!(!cat.is_subtype_of(&TypeRef::integer()));
		assert_eq!(cat.distance_to(&animal), Some(1));
		assert_eq!(cat.distance_to(&TypeRef::object()), Some(3));
		assert_eq!(cat.distance_to(&TypeRef::string()), None);
	}

	#[rstest]
	fn test_equality_by_qualified_name() {
		// Arrange
		let a = TypeRef::new("shop", "Product", &TypeRef::model());
		let b = TypeRef::new("shop", "Product", &TypeRef::model());

		// Assert
		assert_eq!(a, b);
		assert_ne!(a, TypeRef::new("shop", "Order", &TypeRef::model()));
	}

	#[rstest]
	#[case("shop.Product", "shop", "Product")]
	#[case("app.models.Order", "app.models", "Order")]
	fn test_deferred_key_parsing(#[case] path: &str, #[case] ns: &str, #[case] name: &str) {
		// Act
		let key = TypeKey::deferred(path).unwrap();

		// Assert
		assert_eq!(
			key,
			TypeKey::Deferred {
				namespace: ns.to_string(),
				name: name.to_string(),
			}
		);
	}

	#[rstest]
	#[case("")]
	#[case("Product")]
	#[case(".Product")]
	#[case("shop.")]
	fn test_deferred_key_rejects_malformed(#[case] path: &str) {
		// Act
		let result = TypeKey::deferred(path);

		// Assert
		assert_eq!(
			result,
			Err(ConfigurationError::InvalidTypeKey(path.to_string()))
		);
	}

	#[rstest]
	fn test_deferred_key_resolution() {
		// Arrange
		let catalog = StaticCatalog::new();
		let key = TypeKey::deferred("shop.Product").unwrap();

		// Act - before the type is loaded
		let before = key.resolve(&catalog);
		catalog.register(TypeRef::new("shop", "Product", &TypeRef::model()));
		let after = key.resolve(&catalog);

		// Assert
		assert_eq!(
			before,
			Err(ConfigurationError::UnresolvedType("shop.Product".to_string()))
		);
		assert_eq!(after.unwrap().qualified_name(), "shop.Product");
	}
}
