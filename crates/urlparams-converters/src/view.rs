//! Handler registration with per-call configuration
//!
//! A [`ViewFunction`] is built once per handler at startup: its parameter
//! descriptors are resolved, its options collected and its override
//! converter (if any) looked up. Each request then calls
//! [`ViewFunction::bind`] with the raw segments to get the argument list.

use std::fmt;
use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::debug;
use urlparams_core::{
	CallContext, ConfigResult, Conversion, HandlerId, Options, ParameterDescriptor, RawSegments,
	RequestHandle, Value,
};

use crate::converter::Converter;
use crate::engine::ConversionEngine;
use crate::signature::{EntryPoint, SignatureResolver};

enum OverrideSpec {
	None,
	Instance(Arc<dyn Converter>),
	Named(String),
}

/// Builder returned by [`ViewFunction::builder`].
pub struct ViewFunctionBuilder {
	entry: Arc<dyn EntryPoint>,
	options: Options,
	converter: OverrideSpec,
}

impl ViewFunctionBuilder {
	pub fn option(mut self, key: impl Into<String>, value: JsonValue) -> Self {
		self.options.insert(key, value);
		self
	}

	/// Merges `options` into those set so far; `options` wins on conflicts.
	pub fn options(mut self, options: Options) -> Self {
		self.options = self.options.merged(&options);
		self
	}

	/// Uses `converter` for every parameter of this handler.
	pub fn converter(mut self, converter: Arc<dyn Converter>) -> Self {
		self.converter = OverrideSpec::Instance(converter);
		self
	}

	/// Uses the converter registered under `name` for every parameter.
	pub fn converter_named(mut self, name: impl Into<String>) -> Self {
		self.converter = OverrideSpec::Named(name.into());
		self
	}

	/// Resolves the handler's descriptors and override converter.
	///
	/// # Errors
	///
	/// Returns the resolver's [`ConfigurationError`](urlparams_core::ConfigurationError)
	/// for a malformed signature, or
	/// [`ConfigurationError::UnknownConverter`](urlparams_core::ConfigurationError::UnknownConverter)
	/// for an unregistered named override.
	pub fn build(self, resolver: &SignatureResolver, engine: ConversionEngine) -> ConfigResult<ViewFunction> {
		let descriptors = resolver.resolve(self.entry.as_ref())?;
		let override_converter = match self.converter {
			OverrideSpec::None => None,
			OverrideSpec::Instance(converter) => Some(converter),
			OverrideSpec::Named(name) => Some(engine.registry().named(&name)?),
		};
		let id = self.entry.id().clone();
		debug!(
			handler = %id,
			parameters = descriptors.len(),
			options = self.options.len(),
			has_override = override_converter.is_some(),
			"view function registered"
		);
		Ok(ViewFunction {
			id,
			entry: self.entry,
			descriptors,
			options: Arc::new(self.options),
			override_converter,
			engine,
		})
	}
}

/// A handler ready to have its URL parameters converted.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use urlparams_converters::{
///     ConversionEngine, ConverterRegistry, DeclaredParam, Handler, Signature, SignatureResolver,
///     ViewFunction,
/// };
/// use urlparams_conf::ConverterSettings;
/// use urlparams_core::{RawSegments, RequestHandle, StaticCatalog, TypeRef, Value};
///
/// let registry = Arc::new(ConverterRegistry::with_builtins(
///     Arc::new(StaticCatalog::new()),
///     ConverterSettings::default(),
///     None,
/// ));
/// let handler = Handler::new(
///     "clock.views.index",
///     Signature::new()
///         .request("request")
///         .param(DeclaredParam::new("hrs").typed(TypeRef::integer()).with_default(12i64)),
/// );
///
/// let view = ViewFunction::builder(Arc::new(handler))
///     .build(&SignatureResolver::new(), ConversionEngine::new(registry))
///     .unwrap();
///
/// let call = view
///     .bind(RequestHandle::empty(), &RawSegments::from(vec!["7"]))
///     .converted()
///     .unwrap();
/// assert_eq!(call.arg("hrs"), Some(&Value::Int(7)));
/// ```
pub struct ViewFunction {
	id: HandlerId,
	entry: Arc<dyn EntryPoint>,
	descriptors: Arc<[ParameterDescriptor]>,
	options: Arc<Options>,
	override_converter: Option<Arc<dyn Converter>>,
	engine: ConversionEngine,
}

impl ViewFunction {
	pub fn builder(entry: Arc<dyn EntryPoint>) -> ViewFunctionBuilder {
		ViewFunctionBuilder {
			entry,
			options: Options::new(),
			converter: OverrideSpec::None,
		}
	}

	pub fn id(&self) -> &HandlerId {
		&self.id
	}

	pub fn entry_point(&self) -> &Arc<dyn EntryPoint> {
		&self.entry
	}

	pub fn descriptors(&self) -> &[ParameterDescriptor] {
		&self.descriptors
	}

	pub fn options(&self) -> &Options {
		&self.options
	}

	pub fn has_override(&self) -> bool {
		self.override_converter.is_some()
	}

	/// Converts `segments` for one invocation.
	pub fn bind(&self, request: RequestHandle, segments: &RawSegments) -> Conversion<BoundCall> {
		let ctx = CallContext::new(request, self.id.clone(), Arc::clone(&self.options));
		self.engine
			.convert(
				&self.descriptors,
				segments,
				&ctx,
				self.override_converter.as_deref(),
			)
			.map(|args| BoundCall {
				request: ctx.request().clone(),
				descriptors: Arc::clone(&self.descriptors),
				args,
			})
	}
}

impl fmt::Debug for ViewFunction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ViewFunction")
			.field("id", &self.id)
			.field("descriptors", &self.descriptors)
			.field("options", &self.options)
			.field("has_override", &self.has_override())
			.finish()
	}
}

/// The request and converted arguments for one handler invocation.
#[derive(Debug, Clone)]
pub struct BoundCall {
	request: RequestHandle,
	descriptors: Arc<[ParameterDescriptor]>,
	args: Vec<Value>,
}

impl BoundCall {
	pub fn request(&self) -> &RequestHandle {
		&self.request
	}

	/// Arguments in position order.
	pub fn args(&self) -> &[Value] {
		&self.args
	}

	/// The argument for the parameter called `name`.
	pub fn arg(&self, name: &str) -> Option<&Value> {
		self.descriptors
			.iter()
			.find(|d| d.name() == name)
			.and_then(|d| self.args.get(d.position()))
	}

	pub fn into_parts(self) -> (RequestHandle, Vec<Value>) {
		(self.request, self.args)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::builtin::{BooleanConverter, REDIRECT_OPTION};
	use crate::registry::ConverterRegistry;
	use crate::signature::{DeclaredParam, Handler, Signature};
	use rstest::rstest;
	use serde_json::json;
	use urlparams_conf::ConverterSettings;
	use urlparams_core::{ConfigurationError, MemoryEntityStore, Redirect, StaticCatalog, TypeRef};

	fn product() -> TypeRef {
		TypeRef::new("shop", "Product", &TypeRef::model())
	}

	fn engine() -> ConversionEngine {
		let store = Arc::new(MemoryEntityStore::new());
		store.insert(&product(), "7", "Widget".to_string());
		ConversionEngine::new(Arc::new(ConverterRegistry::with_builtins(
			Arc::new(StaticCatalog::new()),
			ConverterSettings::default(),
			Some(store),
		)))
	}

	fn detail_handler() -> Arc<dyn EntryPoint> {
		Arc::new(Handler::new(
			"shop.views.detail",
			Signature::new()
				.request("request")
				.param(DeclaredParam::new("product").typed(product())),
		))
	}

	struct FakeRequest {
		user: &'static str,
	}

	#[rstest]
	fn test_bind_keeps_request() {
		// Arrange
		let view = ViewFunction::builder(detail_handler())
			.build(&SignatureResolver::new(), engine())
			.unwrap();

		// Act
		let call = view
			.bind(RequestHandle::new(FakeRequest { user: "ana" }), &RawSegments::from(vec!["7"]))
			.converted()
			.unwrap();

		// Assert
		assert_eq!(call.request().downcast_ref::<FakeRequest>().map(|r| r.user), Some("ana"));
		assert_eq!(call.arg("product").and_then(Value::as_entity).map(|e| e.key()), Some("7"));
		assert!(call.arg("missing").is_none());
	}

	#[rstest]
	fn test_redirect_option_reaches_entity_converter() {
		// Arrange
		let view = ViewFunction::builder(detail_handler())
			.option(REDIRECT_OPTION, json!("/shop/"))
			.build(&SignatureResolver::new(), engine())
			.unwrap();

		// Act
		let result = view.bind(RequestHandle::empty(), &RawSegments::from(vec!["404"]));

		// Assert
		assert_eq!(result.redirect(), Some(&Redirect::to("/shop/")));
		assert_eq!(result.status_code(), Some(302));
	}

	#[rstest]
	fn test_options_merge_later_wins() {
		// Arrange
		let view = ViewFunction::builder(detail_handler())
			.option("a", json!(1))
			.options(Options::new().with("a", json!(2)).with("b", json!(3)))
			.build(&SignatureResolver::new(), engine())
			.unwrap();

		// Assert
		assert_eq!(view.options().get("a"), Some(&json!(2)));
		assert_eq!(view.options().get("b"), Some(&json!(3)));
	}

	#[rstest]
	fn test_named_override_is_resolved_at_build() {
		// Arrange
		let engine = engine();
		engine
			.registry()
			.register_named("flags", Arc::new(BooleanConverter))
			.unwrap();
		let handler: Arc<dyn EntryPoint> = Arc::new(Handler::new(
			"app.views.flags",
			Signature::new()
				.request("request")
				.param(DeclaredParam::new("a"))
				.param(DeclaredParam::new("b")),
		));

		// Act
		let view = ViewFunction::builder(handler)
			.converter_named("flags")
			.build(&SignatureResolver::new(), engine)
			.unwrap();
		let call = view
			.bind(RequestHandle::empty(), &RawSegments::from(vec!["0", "yes"]))
			.converted()
			.unwrap();

		// Assert
		assert!(view.has_override());
		assert_eq!(call.args(), &[Value::Bool(false), Value::Bool(true)]);
	}

	#[rstest]
	fn test_unknown_named_override_fails_build() {
		// Act
		let result = ViewFunction::builder(detail_handler())
			.converter_named("nope")
			.build(&SignatureResolver::new(), engine());

		// Assert
		assert_eq!(
			result.err().map(|e| e.to_string()),
			Some(ConfigurationError::UnknownConverter("nope".to_string()).to_string())
		);
	}
}
