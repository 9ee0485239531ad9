//! Conversion engine
//!
//! Converts the raw URL segments of one invocation into the handler's
//! argument list, parameter by parameter in position order. The first
//! parameter that fails or redirects ends the invocation; later parameters
//! are never converted.

use std::sync::Arc;

use tracing::{debug, error, trace};
use urlparams_core::{
	CallContext, Conversion, ConversionError, ParameterDescriptor, RawSegments, Value,
};

use crate::converter::Converter;
use crate::registry::ConverterRegistry;

/// Drives conversion of a handler's parameters against a registry.
#[derive(Debug, Clone)]
pub struct ConversionEngine {
	registry: Arc<ConverterRegistry>,
}

impl ConversionEngine {
	pub fn new(registry: Arc<ConverterRegistry>) -> Self {
		Self { registry }
	}

	pub fn registry(&self) -> &Arc<ConverterRegistry> {
		&self.registry
	}

	/// Converts every descriptor into an argument.
	///
	/// Without an override, each parameter's converter is looked up by its
	/// declared type; a sentinel value with a declared default yields the
	/// default without invoking the converter. With `override_converter`, that
	/// converter receives every parameter: the segment when present, else the
	/// declared default, else `""`.
	pub fn convert(
		&self,
		descriptors: &[ParameterDescriptor],
		segments: &RawSegments,
		ctx: &CallContext,
		override_converter: Option<&dyn Converter>,
	) -> Conversion<Vec<Value>> {
		let mut ordered: Vec<&ParameterDescriptor> = descriptors.iter().collect();
		ordered.sort_by_key(|param| param.position());

		let mut args = Vec::with_capacity(ordered.len());
		for param in ordered {
			let outcome = match override_converter {
				Some(converter) => Self::convert_with(converter, param, segments, ctx),
				None => self.convert_parameter(param, segments.get(param.position()), ctx),
			};
			match outcome {
				Conversion::Converted(value) => args.push(value),
				Conversion::Failed(error) => {
					debug!(
						handler = %ctx.handler(),
						parameter = param.name(),
						position = param.position(),
						error = %error,
						"parameter conversion failed"
					);
					return Conversion::Failed(error);
				}
				Conversion::Redirect(redirect) => {
					debug!(
						handler = %ctx.handler(),
						parameter = param.name(),
						redirect_to = redirect.target(),
						"parameter conversion redirected"
					);
					return Conversion::Redirect(redirect);
				}
			}
		}
		Conversion::Converted(args)
	}

	/// Converts one raw value through the registry.
	pub fn convert_parameter(&self, param: &ParameterDescriptor, raw: &str, ctx: &CallContext) -> Conversion {
		let ty = param.effective_type();
		let converter = match self.registry.lookup(&ty) {
			Ok(converter) => converter,
			Err(e) => {
				error!(
					handler = %ctx.handler(),
					parameter = param.name(),
					ty = %ty,
					error = %e,
					"converter lookup failed"
				);
				return Conversion::Failed(ConversionError::Configuration(e));
			}
		};

		if let Some(default) = param.default_value()
			&& converter.sentinel_policy().is_missing(raw)
		{
			trace!(
				parameter = param.name(),
				raw,
				"missing value, using declared default"
			);
			return Conversion::Converted(default.clone());
		}

		trace!(
			parameter = param.name(),
			ty = %ty,
			converter = converter.name(),
			"converting parameter"
		);
		converter.convert(&Value::Str(raw.to_string()), param, ctx)
	}

	fn convert_with(
		converter: &dyn Converter,
		param: &ParameterDescriptor,
		segments: &RawSegments,
		ctx: &CallContext,
	) -> Conversion {
		let value = if segments.contains(param.position()) {
			Value::Str(segments.get(param.position()).to_string())
		} else {
			param
				.default_value()
				.cloned()
				.unwrap_or_else(|| Value::Str(String::new()))
		};
		trace!(
			parameter = param.name(),
			converter = converter.name(),
			"converting parameter with handler override"
		);
		converter.convert(&value, param, ctx)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::converter::FnConverter;
	use rstest::rstest;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use urlparams_conf::ConverterSettings;
	use urlparams_core::{ConfigurationError, StaticCatalog, TypeRef};

	fn engine() -> ConversionEngine {
		ConversionEngine::new(Arc::new(ConverterRegistry::with_builtins(
			Arc::new(StaticCatalog::new()),
			ConverterSettings::default(),
			None,
		)))
	}

	fn clock() -> Vec<ParameterDescriptor> {
		vec![
			ParameterDescriptor::new("hrs", 0)
				.with_type(TypeRef::integer())
				.with_default(12i64),
			ParameterDescriptor::new("mins", 1)
				.with_type(TypeRef::integer())
				.with_default(30i64),
			ParameterDescriptor::new("forward", 2)
				.with_type(TypeRef::boolean())
				.with_default(true),
		]
	}

	#[rstest]
	#[case(vec!["6", "15", "0"], vec![Value::Int(6), Value::Int(15), Value::Bool(false)])]
	#[case(vec!["6"], vec![Value::Int(6), Value::Int(30), Value::Bool(true)])]
	#[case(vec!["-", "", "f"], vec![Value::Int(12), Value::Int(30), Value::Bool(false)])]
	fn test_convert_clock(#[case] segments: Vec<&str>, #[case] expected: Vec<Value>) {
		// Arrange
		let ctx = CallContext::detached("clock.views.index");

		// Act
		let result = engine().convert(&clock(), &RawSegments::from(segments), &ctx, None);

		// Assert
		assert_eq!(result.converted(), Some(expected));
	}

	#[rstest]
	fn test_descriptors_are_processed_in_position_order() {
		// Arrange
		let mut descriptors = clock();
		descriptors.reverse();
		let ctx = CallContext::detached("clock.views.index");

		// Act
		let result = engine().convert(&descriptors, &RawSegments::from(vec!["1", "2"]), &ctx, None);

		// Assert
		assert_eq!(
			result.converted(),
			Some(vec![Value::Int(1), Value::Int(2), Value::Bool(true)])
		);
	}

	#[rstest]
	fn test_first_failure_stops_conversion() {
		// Arrange
		let calls = Arc::new(AtomicUsize::new(0));
		let counter = Arc::clone(&calls);
		let engine = engine();
		let spy = TypeRef::new("tests", "Spy", &TypeRef::object());
		engine
			.registry()
			.register(
				spy.clone(),
				FnConverter::new("spy", move |value: &Value, _: &ParameterDescriptor, _: &CallContext| {
					counter.fetch_add(1, Ordering::SeqCst);
					Conversion::Converted(value.clone())
				}),
			)
			.unwrap();
		let descriptors = vec![
			ParameterDescriptor::new("a", 0).with_type(TypeRef::integer()),
			ParameterDescriptor::new("b", 1).with_type(spy),
		];
		let ctx = CallContext::detached("tests.view");

		// Act
		let result = engine.convert(&descriptors, &RawSegments::from(vec!["x", "y"]), &ctx, None);

		// Assert
		assert_eq!(result.error().and_then(ConversionError::parameter), Some("a"));
		assert_eq!(calls.load(Ordering::SeqCst), 0);
	}

	#[rstest]
	fn test_unresolved_key_is_configuration_failure() {
		// Arrange
		let engine = engine();
		engine
			.registry()
			.register_deferred("ghost.Missing", crate::builtin::PassthroughConverter)
			.unwrap();
		let descriptors = vec![ParameterDescriptor::new("a", 0)];
		let ctx = CallContext::detached("tests.view");

		// Act
		let result = engine.convert(&descriptors, &RawSegments::from(vec!["x"]), &ctx, None);

		// Assert
		assert_eq!(
			result.error(),
			Some(&ConversionError::Configuration(ConfigurationError::UnresolvedType(
				"ghost.Missing".to_string()
			)))
		);
		assert_eq!(result.status_code(), Some(500));
	}

	#[rstest]
	fn test_override_receives_defaults_for_missing_positions() {
		// Arrange
		let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
		let sink = Arc::clone(&seen);
		let recorder = move |value: &Value, _: &ParameterDescriptor, _: &CallContext| -> Conversion {
			sink.lock().push(value.clone());
			Conversion::Converted(value.clone())
		};
		let ctx = CallContext::detached("clock.views.index");

		// Act
		let result = engine().convert(&clock(), &RawSegments::from(vec!["", "-"]), &ctx, Some(&recorder));

		// Assert
		assert!(result.is_converted());
		assert_eq!(
			*seen.lock(),
			vec![Value::from(""), Value::from("-"), Value::Bool(true)]
		);
	}

	#[rstest]
	fn test_empty_descriptor_list_converts_to_no_arguments() {
		// Arrange
		let ctx = CallContext::detached("tests.view");

		// Act
		let result = engine().convert(&[], &RawSegments::from(vec!["ignored"]), &ctx, None);

		// Assert
		assert_eq!(result.converted(), Some(Vec::new()));
	}
}
