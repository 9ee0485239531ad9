//! The converter trait

use std::fmt;

use urlparams_core::{CallContext, Conversion, ParameterDescriptor, SentinelPolicy, Value};

/// Converts one raw URL value into a typed argument.
///
/// Registry dispatch always passes a `Value::Str`. A converter installed as a
/// handler-wide override may also receive a declared default that already has
/// the target type, and must pass such values through.
///
/// Closures with the right signature implement this trait:
///
/// ```
/// use std::sync::Arc;
/// use urlparams_converters::Converter;
/// use urlparams_core::{CallContext, Conversion, ParameterDescriptor, Value};
///
/// let upper: Arc<dyn Converter> = Arc::new(
///     |value: &Value, _: &ParameterDescriptor, _: &CallContext| -> Conversion {
///         Conversion::Converted(Value::from(value.as_str().unwrap_or_default().to_uppercase()))
///     },
/// );
///
/// let ctx = CallContext::detached("demo.view");
/// let param = ParameterDescriptor::new("code", 0);
/// let result = upper.convert(&Value::from("ab"), &param, &ctx);
/// assert_eq!(result.converted(), Some(Value::from("AB")));
/// ```
pub trait Converter: Send + Sync {
	fn convert(&self, value: &Value, parameter: &ParameterDescriptor, ctx: &CallContext) -> Conversion;

	/// Raw values this converter treats as "missing".
	fn sentinel_policy(&self) -> SentinelPolicy {
		SentinelPolicy::Empty
	}

	/// Name used in log output.
	fn name(&self) -> &str {
		"converter"
	}
}

impl<F> Converter for F
where
	F: Fn(&Value, &ParameterDescriptor, &CallContext) -> Conversion + Send + Sync,
{
	fn convert(&self, value: &Value, parameter: &ParameterDescriptor, ctx: &CallContext) -> Conversion {
		self(value, parameter, ctx)
	}

	fn name(&self) -> &str {
		"closure"
	}
}

/// A closure converter with an explicit name and sentinel policy.
///
/// ```
/// use urlparams_converters::{Converter, FnConverter};
/// use urlparams_core::{Conversion, SentinelPolicy, Value};
///
/// let slug = FnConverter::new("slug", |value, _, _| {
///     Conversion::Converted(Value::from(value.as_str().unwrap_or_default().replace(' ', "-")))
/// })
/// .with_policy(SentinelPolicy::EmptyOrDash);
///
/// assert_eq!(slug.name(), "slug");
/// assert_eq!(slug.sentinel_policy(), SentinelPolicy::EmptyOrDash);
/// ```
pub struct FnConverter<F> {
	name: String,
	policy: SentinelPolicy,
	func: F,
}

impl<F> FnConverter<F>
where
	F: Fn(&Value, &ParameterDescriptor, &CallContext) -> Conversion + Send + Sync,
{
	pub fn new(name: impl Into<String>, func: F) -> Self {
		Self {
			name: name.into(),
			policy: SentinelPolicy::Empty,
			func,
		}
	}

	pub fn with_policy(mut self, policy: SentinelPolicy) -> Self {
		self.policy = policy;
		self
	}
}

impl<F> Converter for FnConverter<F>
where
	F: Fn(&Value, &ParameterDescriptor, &CallContext) -> Conversion + Send + Sync,
{
	fn convert(&self, value: &Value, parameter: &ParameterDescriptor, ctx: &CallContext) -> Conversion {
		(self.func)(value, parameter, ctx)
	}

	fn sentinel_policy(&self) -> SentinelPolicy {
		self.policy
	}

	fn name(&self) -> &str {
		&self.name
	}
}

impl<F> fmt::Debug for FnConverter<F> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FnConverter")
			.field("name", &self.name)
			.field("policy", &self.policy)
			.finish_non_exhaustive()
	}
}
