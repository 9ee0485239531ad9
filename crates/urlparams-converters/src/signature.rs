//! Handler signatures and parameter descriptors
//!
//! A handler is described by its declared [`Signature`]. The first declared
//! parameter receives the request and is never converted; variadic
//! parameters are skipped; every other parameter becomes a
//! [`ParameterDescriptor`] numbered from 0 in declaration order.
//!
//! Wrappers placed around a handler must expose the handler they wrap through
//! [`EntryPoint::inner`]. A wrapper that does not is resolved with its own
//! signature, which for a generic `(*args, **kwargs)` wrapper yields no
//! parameters at all: every URL segment is then silently ignored.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};
use urlparams_core::{ConfigResult, ConfigurationError, HandlerId, ParameterDescriptor, TypeRef, Value};

/// Wrapper chains deeper than this are treated as cyclic.
const MAX_UNWRAP_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
	Positional,
	/// Collects remaining positional arguments (`*args`).
	VarPositional,
	/// Collects remaining keyword arguments (`**kwargs`).
	VarKeyword,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeclaredParam {
	name: String,
	kind: ParamKind,
	declared_type: Option<TypeRef>,
	default: Option<Value>,
}

impl DeclaredParam {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			kind: ParamKind::Positional,
			declared_type: None,
			default: None,
		}
	}

	pub fn var_positional(name: impl Into<String>) -> Self {
		Self {
			kind: ParamKind::VarPositional,
			..Self::new(name)
		}
	}

	pub fn var_keyword(name: impl Into<String>) -> Self {
		Self {
			kind: ParamKind::VarKeyword,
			..Self::new(name)
		}
	}

	pub fn typed(mut self, declared_type: TypeRef) -> Self {
		self.declared_type = Some(declared_type);
		self
	}

	pub fn with_default(mut self, default: impl Into<Value>) -> Self {
		self.default = Some(default.into());
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn kind(&self) -> ParamKind {
		self.kind
	}

	pub fn is_variadic(&self) -> bool {
		self.kind != ParamKind::Positional
	}

	pub fn declared_type(&self) -> Option<&TypeRef> {
		self.declared_type.as_ref()
	}

	pub fn default_value(&self) -> Option<&Value> {
		self.default.as_ref()
	}
}

/// Declared parameters of a handler, in order.
///
/// # Examples
///
/// ```
/// use urlparams_converters::{DeclaredParam, Signature};
/// use urlparams_core::TypeRef;
///
/// let signature = Signature::new()
///     .request("request")
///     .param(DeclaredParam::new("hrs").typed(TypeRef::integer()).with_default(12i64))
///     .param(DeclaredParam::new("forward").typed(TypeRef::boolean()).with_default(true));
///
/// assert_eq!(signature.len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signature {
	params: Vec<DeclaredParam>,
}

impl Signature {
	pub fn new() -> Self {
		Self::default()
	}

	/// The generic `(*args, **kwargs)` signature of a pass-through wrapper.
	pub fn variadic() -> Self {
		Self::new()
			.param(DeclaredParam::var_positional("args"))
			.param(DeclaredParam::var_keyword("kwargs"))
	}

	/// Appends the leading, untyped request parameter.
	pub fn request(self, name: impl Into<String>) -> Self {
		self.param(DeclaredParam::new(name))
	}

	pub fn param(mut self, param: DeclaredParam) -> Self {
		self.params.push(param);
		self
	}

	pub fn params(&self) -> &[DeclaredParam] {
		&self.params
	}

	pub fn len(&self) -> usize {
		self.params.len()
	}

	pub fn is_empty(&self) -> bool {
		self.params.is_empty()
	}
}

/// Something a route can dispatch to.
pub trait EntryPoint: Send + Sync {
	fn id(&self) -> &HandlerId;

	fn signature(&self) -> &Signature;

	/// The entry point this one wraps, if it is a wrapper that exposes it.
	fn inner(&self) -> Option<&dyn EntryPoint> {
		None
	}
}

/// A plain handler.
#[derive(Debug, Clone)]
pub struct Handler {
	id: HandlerId,
	signature: Signature,
}

impl Handler {
	pub fn new(id: impl Into<HandlerId>, signature: Signature) -> Self {
		Self {
			id: id.into(),
			signature,
		}
	}
}

impl EntryPoint for Handler {
	fn id(&self) -> &HandlerId {
		&self.id
	}

	fn signature(&self) -> &Signature {
		&self.signature
	}
}

/// A wrapper around another entry point, with the generic variadic
/// signature.
///
/// [`Wrapped::new`] exposes the wrapped entry point so parameters are read
/// from the original handler. [`Wrapped::unmarked`] does not, and resolves to
/// no parameters.
pub struct Wrapped<E> {
	id: HandlerId,
	inner: E,
	signature: Signature,
	exposes_inner: bool,
}

impl<E: EntryPoint> Wrapped<E> {
	/// Wraps `inner` under the same identity.
	pub fn new(inner: E) -> Self {
		let id = inner.id().clone();
		Self::with_id(id, inner)
	}

	/// Wraps `inner` under a separate identity.
	pub fn with_id(id: impl Into<HandlerId>, inner: E) -> Self {
		Self {
			id: id.into(),
			inner,
			signature: Signature::variadic(),
			exposes_inner: true,
		}
	}

	/// A wrapper that hides `inner`.
	pub fn unmarked(id: impl Into<HandlerId>, inner: E) -> Self {
		Self {
			exposes_inner: false,
			..Self::with_id(id, inner)
		}
	}

	pub fn get_ref(&self) -> &E {
		&self.inner
	}
}

impl<E: EntryPoint> EntryPoint for Wrapped<E> {
	fn id(&self) -> &HandlerId {
		&self.id
	}

	fn signature(&self) -> &Signature {
		&self.signature
	}

	fn inner(&self) -> Option<&dyn EntryPoint> {
		self.exposes_inner.then_some(&self.inner as &dyn EntryPoint)
	}
}

impl<E: EntryPoint + ?Sized> EntryPoint for Arc<E> {
	fn id(&self) -> &HandlerId {
		(**self).id()
	}

	fn signature(&self) -> &Signature {
		(**self).signature()
	}

	fn inner(&self) -> Option<&dyn EntryPoint> {
		(**self).inner()
	}
}

/// Follows [`EntryPoint::inner`] to the innermost entry point.
pub fn innermost(entry: &dyn EntryPoint) -> &dyn EntryPoint {
	let mut current = entry;
	for _ in 0..MAX_UNWRAP_DEPTH {
		match current.inner() {
			Some(inner) => current = inner,
			None => return current,
		}
	}
	warn!(
		handler = %entry.id(),
		depth = MAX_UNWRAP_DEPTH,
		"wrapper chain too deep, using the deepest entry point reached"
	);
	current
}

/// Builds the descriptors for one signature.
///
/// # Errors
///
/// Returns [`ConfigurationError::MissingRequestParameter`] for an empty
/// signature and [`ConfigurationError::DuplicateParameter`] when two
/// parameters share a name.
pub fn describe(handler: &HandlerId, signature: &Signature) -> ConfigResult<Vec<ParameterDescriptor>> {
	let Some((_request, rest)) = signature.params().split_first() else {
		return Err(ConfigurationError::MissingRequestParameter(handler.to_string()));
	};

	let mut seen = HashSet::new();
	let mut descriptors = Vec::new();
	for param in signature.params() {
		if !seen.insert(param.name()) {
			return Err(ConfigurationError::DuplicateParameter {
				handler: handler.to_string(),
				name: param.name().to_string(),
			});
		}
	}
	for param in rest.iter().filter(|p| !p.is_variadic()) {
		let mut descriptor = ParameterDescriptor::new(param.name(), descriptors.len());
		if let Some(ty) = param.declared_type() {
			descriptor = descriptor.with_type(ty.clone());
		}
		if let Some(default) = param.default_value() {
			descriptor = descriptor.with_default(default.clone());
		}
		descriptors.push(descriptor);
	}
	Ok(descriptors)
}

#[derive(Debug)]
struct Resolved {
	source: HandlerId,
	signature: Signature,
	descriptors: Arc<[ParameterDescriptor]>,
}

impl Resolved {
	fn matches(&self, target: &dyn EntryPoint) -> bool {
		self.source == *target.id() && self.signature == *target.signature()
	}
}

/// Resolves and caches parameter descriptors per handler identity.
#[derive(Debug, Default)]
pub struct SignatureResolver {
	cache: RwLock<HashMap<HandlerId, Resolved>>,
}

impl SignatureResolver {
	pub fn new() -> Self {
		Self::default()
	}

	/// Descriptors for `entry`, read from its innermost entry point and cached
	/// under `entry`'s own identity.
	///
	/// # Errors
	///
	/// Returns [`ConfigurationError::DuplicateHandler`] when `entry`'s identity
	/// is already cached for a handler with another innermost identity or
	/// signature, plus any error from [`describe`].
	pub fn resolve(&self, entry: &dyn EntryPoint) -> ConfigResult<Arc<[ParameterDescriptor]>> {
		let target = innermost(entry);
		if let Some(cached) = self.cache.read().get(entry.id()) {
			return Self::reuse(entry, target, cached);
		}

		let descriptors: Arc<[ParameterDescriptor]> = describe(target.id(), target.signature())?.into();
		debug!(
			handler = %entry.id(),
			resolved_from = %target.id(),
			parameters = descriptors.len(),
			"handler signature resolved"
		);

		let mut cache = self.cache.write();
		let slot = cache.entry(entry.id().clone()).or_insert_with(|| Resolved {
			source: target.id().clone(),
			signature: target.signature().clone(),
			descriptors,
		});
		Self::reuse(entry, target, slot)
	}

	fn reuse(
		entry: &dyn EntryPoint,
		target: &dyn EntryPoint,
		cached: &Resolved,
	) -> ConfigResult<Arc<[ParameterDescriptor]>> {
		if !cached.matches(target) {
			warn!(
				handler = %entry.id(),
				cached_from = %cached.source,
				resolved_from = %target.id(),
				"handler identity reused for a different signature"
			);
			return Err(ConfigurationError::DuplicateHandler(entry.id().to_string()));
		}
		Ok(Arc::clone(&cached.descriptors))
	}

	pub fn is_cached(&self, id: &HandlerId) -> bool {
		self.cache.read().contains_key(id)
	}

	pub fn len(&self) -> usize {
		self.cache.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.cache.read().is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn clock_handler() -> Handler {
		Handler::new(
			"clock.views.index",
			Signature::new()
				.request("request")
				.param(DeclaredParam::new("hrs").typed(TypeRef::integer()).with_default(12i64))
				.param(DeclaredParam::new("mins").typed(TypeRef::integer()).with_default(30i64))
				.param(DeclaredParam::new("forward").typed(TypeRef::boolean()).with_default(true)),
		)
	}

	#[rstest]
	fn test_request_parameter_is_dropped() {
		// Arrange
		let resolver = SignatureResolver::new();

		// Act
		let descriptors = resolver.resolve(&clock_handler()).unwrap();

		// Assert
		let names: Vec<(&str, usize)> = descriptors.iter().map(|d| (d.name(), d.position())).collect();
		assert_eq!(names, vec![("hrs", 0), ("mins", 1), ("forward", 2)]);
		assert_eq!(descriptors[2].default_value(), Some(&Value::Bool(true)));
	}

	#[rstest]
	fn test_variadic_parameters_are_skipped() {
		// Arrange
		let handler = Handler::new(
			"app.views.search",
			Signature::new()
				.request("request")
				.param(DeclaredParam::new("query"))
				.param(DeclaredParam::var_positional("args"))
				.param(DeclaredParam::new("page").typed(TypeRef::integer()))
				.param(DeclaredParam::var_keyword("kwargs")),
		);

		// Act
		let descriptors = SignatureResolver::new().resolve(&handler).unwrap();

		// Assert
		let names: Vec<(&str, usize)> = descriptors.iter().map(|d| (d.name(), d.position())).collect();
		assert_eq!(names, vec![("query", 0), ("page", 1)]);
		assert!(descriptors[0].declared_type().is_none());
	}

	#[rstest]
	fn test_marked_wrapper_resolves_inner_signature() {
		// Arrange
		let wrapped = Wrapped::with_id("clock.views.index@login_required", clock_handler());
		let resolver = SignatureResolver::new();

		// Act
		let descriptors = resolver.resolve(&wrapped).unwrap();

		// Assert
		assert_eq!(descriptors.len(), 3);
		assert!(resolver.is_cached(&HandlerId::new("clock.views.index@login_required")));
		assert!(!resolver.is_cached(&HandlerId::new("clock.views.index")));
	}

	#[rstest]
	fn test_nested_wrappers_are_unwrapped() {
		// Arrange
		let wrapped = Wrapped::new(Wrapped::new(Wrapped::new(clock_handler())));

		// Act
		let descriptors = SignatureResolver::new().resolve(&wrapped).unwrap();

		// Assert
		assert_eq!(descriptors.len(), 3);
	}

	#[rstest]
	fn test_unmarked_wrapper_hides_parameters() {
		// Arrange
		let wrapped = Wrapped::unmarked("clock.views.index@cache", clock_handler());

		// Act
		let descriptors = SignatureResolver::new().resolve(&wrapped).unwrap();

		// Assert
		assert!(descriptors.is_empty());
	}

	#[rstest]
	fn test_duplicate_names_rejected() {
		// Arrange
		let handler = Handler::new(
			"app.views.bad",
			Signature::new()
				.request("request")
				.param(DeclaredParam::new("id"))
				.param(DeclaredParam::new("id")),
		);

		// Act
		let result = SignatureResolver::new().resolve(&handler);

		// Assert
		assert_eq!(
			result.err(),
			Some(ConfigurationError::DuplicateParameter {
				handler: "app.views.bad".to_string(),
				name: "id".to_string(),
			})
		);
	}

	#[rstest]
	fn test_empty_signature_rejected() {
		// Arrange
		let handler = Handler::new("app.views.empty", Signature::new());

		// Act
		let result = SignatureResolver::new().resolve(&handler);

		// Assert
		assert!(matches!(result, Err(ConfigurationError::MissingRequestParameter(_))));
	}

	#[rstest]
	fn test_resolution_is_cached() {
		// Arrange
		let resolver = SignatureResolver::new();
		let handler = clock_handler();

		// Act
		let first = resolver.resolve(&handler).unwrap();
		let second = resolver.resolve(&handler).unwrap();

		// Assert
		assert!(Arc::ptr_eq(&first, &second));
		assert_eq!(resolver.len(), 1);
	}

	#[rstest]
	fn test_reused_identity_with_other_signature_rejected() {
		// Arrange
		let resolver = SignatureResolver::new();
		let index = Handler::new(
			"app.views.index",
			Signature::new()
				.request("request")
				.param(DeclaredParam::new("n").typed(TypeRef::integer())),
		);
		let other = Handler::new(
			"app.views.index",
			Signature::new()
				.request("request")
				.param(DeclaredParam::new("slug").typed(TypeRef::string()))
				.param(DeclaredParam::new("page").typed(TypeRef::integer()).with_default(1i64)),
		);
		resolver.resolve(&index).unwrap();

		// Act
		let result = resolver.resolve(&other);

		// Assert
		assert_eq!(
			result.err(),
			Some(ConfigurationError::DuplicateHandler("app.views.index".to_string()))
		);
		assert_eq!(resolver.resolve(&index).unwrap()[0].name(), "n");
	}

	#[rstest]
	fn test_wrapper_identity_reused_for_other_inner_handler_rejected() {
		// Arrange
		let resolver = SignatureResolver::new();
		let first = Wrapped::with_id("app.views.guarded", clock_handler());
		let second = Wrapped::with_id(
			"app.views.guarded",
			Handler::new("app.views.search", Signature::new().request("request").param(DeclaredParam::new("q"))),
		);
		resolver.resolve(&first).unwrap();

		// Act
		let result = resolver.resolve(&second);

		// Assert
		assert!(matches!(result, Err(ConfigurationError::DuplicateHandler(_))));
	}

	#[rstest]
	fn test_rebuilt_handler_with_same_signature_reuses_cache() {
		// Arrange
		let resolver = SignatureResolver::new();
		let first = resolver.resolve(&clock_handler()).unwrap();

		// Act
		let second = resolver.resolve(&clock_handler()).unwrap();

		// Assert
		assert!(Arc::ptr_eq(&first, &second));
	}
}
