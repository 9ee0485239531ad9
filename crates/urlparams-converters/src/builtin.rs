//! Built-in converters
//!
//! One converter per built-in type category, plus the universal passthrough
//! registered for `builtins.object`. Each converter also handles a missing
//! value that reaches it without a default, so the same instances work as
//! handler-wide overrides.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use tracing::{debug, trace, warn};
use urlparams_conf::ConverterSettings;
use urlparams_core::{
	CallContext, Conversion, ConversionError, EntityStore, LookupError, MissingBehavior,
	ParameterDescriptor, Redirect, SentinelPolicy, TypeRef, Value, parse_flag,
};

use crate::converter::Converter;

/// Call-site option naming where the entity converter redirects on a miss.
pub const REDIRECT_OPTION: &str = "redirect";

/// Outcome for a missing `value`, or `None` when a value is present.
fn resolve_missing(
	value: &Value,
	parameter: &ParameterDescriptor,
	policy: SentinelPolicy,
	behavior: MissingBehavior,
) -> Option<Conversion> {
	if !policy.is_missing_value(value) {
		return None;
	}
	if let Some(default) = parameter.default_value() {
		return Some(Conversion::Converted(default.clone()));
	}
	Some(match behavior {
		MissingBehavior::Fail => Conversion::Failed(ConversionError::missing(parameter)),
		MissingBehavior::EmptyString => {
			Conversion::Converted(Value::Str(value.as_str().unwrap_or_default().to_string()))
		}
		MissingBehavior::Null => Conversion::Converted(Value::Null),
	})
}

fn unexpected(parameter: &ParameterDescriptor, value: &Value) -> Conversion {
	Conversion::Failed(ConversionError::invalid(
		parameter,
		value.kind(),
		format!("cannot convert a {} value", value.kind()),
	))
}

/// Returns the value unchanged. Registered for `builtins.object` and
/// `builtins.str`; a missing value without a default stays `""`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughConverter;

impl Converter for PassthroughConverter {
	fn convert(&self, value: &Value, parameter: &ParameterDescriptor, _ctx: &CallContext) -> Conversion {
		if let Some(outcome) = resolve_missing(
			value,
			parameter,
			SentinelPolicy::Empty,
			MissingBehavior::EmptyString,
		) {
			return outcome;
		}
		Conversion::Converted(value.clone())
	}

	fn name(&self) -> &str {
		"passthrough"
	}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerConverter;

impl Converter for IntegerConverter {
	fn convert(&self, value: &Value, parameter: &ParameterDescriptor, _ctx: &CallContext) -> Conversion {
		if let Some(outcome) =
			resolve_missing(value, parameter, self.sentinel_policy(), MissingBehavior::Fail)
		{
			return outcome;
		}
		match value {
			Value::Str(raw) => raw
				.parse::<i64>()
				.map(Value::Int)
				.map_err(|e| ConversionError::invalid(parameter, raw, e))
				.into(),
			Value::Int(_) => Conversion::Converted(value.clone()),
			other => unexpected(parameter, other),
		}
	}

	fn sentinel_policy(&self) -> SentinelPolicy {
		SentinelPolicy::EmptyOrDash
	}

	fn name(&self) -> &str {
		"int"
	}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FloatConverter;

impl Converter for FloatConverter {
	fn convert(&self, value: &Value, parameter: &ParameterDescriptor, _ctx: &CallContext) -> Conversion {
		if let Some(outcome) =
			resolve_missing(value, parameter, self.sentinel_policy(), MissingBehavior::Fail)
		{
			return outcome;
		}
		match value {
			Value::Str(raw) => raw
				.parse::<f64>()
				.map(Value::Float)
				.map_err(|e| ConversionError::invalid(parameter, raw, e))
				.into(),
			Value::Int(i) => Conversion::Converted(Value::Float(*i as f64)),
			Value::Float(_) => Conversion::Converted(value.clone()),
			other => unexpected(parameter, other),
		}
	}

	fn sentinel_policy(&self) -> SentinelPolicy {
		SentinelPolicy::EmptyOrDash
	}

	fn name(&self) -> &str {
		"float"
	}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DecimalConverter;

impl Converter for DecimalConverter {
	fn convert(&self, value: &Value, parameter: &ParameterDescriptor, _ctx: &CallContext) -> Conversion {
		if let Some(outcome) =
			resolve_missing(value, parameter, self.sentinel_policy(), MissingBehavior::Fail)
		{
			return outcome;
		}
		match value {
			Value::Str(raw) => Decimal::from_str(raw)
				.or_else(|_| Decimal::from_scientific(raw))
				.map(Value::Decimal)
				.map_err(|e| ConversionError::invalid(parameter, raw, e))
				.into(),
			Value::Int(i) => Conversion::Converted(Value::Decimal(Decimal::from(*i))),
			Value::Decimal(_) => Conversion::Converted(value.clone()),
			other => unexpected(parameter, other),
		}
	}

	fn sentinel_policy(&self) -> SentinelPolicy {
		SentinelPolicy::EmptyOrDash
	}

	fn name(&self) -> &str {
		"decimal"
	}
}

/// `f`, `F` or `0` as the first character is false; any other text is true.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanConverter;

impl Converter for BooleanConverter {
	fn convert(&self, value: &Value, parameter: &ParameterDescriptor, _ctx: &CallContext) -> Conversion {
		if let Some(outcome) =
			resolve_missing(value, parameter, self.sentinel_policy(), MissingBehavior::Fail)
		{
			return outcome;
		}
		match value {
			Value::Str(raw) => Conversion::Converted(Value::Bool(parse_flag(raw))),
			Value::Int(i) => Conversion::Converted(Value::Bool(*i != 0)),
			Value::Bool(_) => Conversion::Converted(value.clone()),
			other => unexpected(parameter, other),
		}
	}

	fn sentinel_policy(&self) -> SentinelPolicy {
		SentinelPolicy::EmptyOrDash
	}

	fn name(&self) -> &str {
		"bool"
	}
}

/// Parses dates with the configured input formats, tried in order.
#[derive(Debug, Clone)]
pub struct DateConverter {
	formats: Vec<String>,
}

impl DateConverter {
	pub fn new(formats: Vec<String>) -> Self {
		Self { formats }
	}

	pub fn from_settings(settings: &ConverterSettings) -> Self {
		Self::new(settings.date_input_formats.clone())
	}

	pub fn formats(&self) -> &[String] {
		&self.formats
	}

	fn parse(&self, raw: &str) -> Option<NaiveDate> {
		parse_date(&self.formats, raw)
	}
}

impl Default for DateConverter {
	fn default() -> Self {
		Self::from_settings(&ConverterSettings::default())
	}
}

fn parse_date(formats: &[String], raw: &str) -> Option<NaiveDate> {
	formats
		.iter()
		.find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
}

impl Converter for DateConverter {
	fn convert(&self, value: &Value, parameter: &ParameterDescriptor, _ctx: &CallContext) -> Conversion {
		if let Some(outcome) =
			resolve_missing(value, parameter, self.sentinel_policy(), MissingBehavior::Fail)
		{
			return outcome;
		}
		match value {
			Value::Str(raw) => match self.parse(raw) {
				Some(date) => Conversion::Converted(Value::Date(date)),
				None => Conversion::Failed(ConversionError::invalid(
					parameter,
					raw,
					"does not match any configured date input format",
				)),
			},
			Value::Date(_) => Conversion::Converted(value.clone()),
			Value::DateTime(dt) => Conversion::Converted(Value::Date(dt.date())),
			other => unexpected(parameter, other),
		}
	}

	fn sentinel_policy(&self) -> SentinelPolicy {
		SentinelPolicy::EmptyOrDash
	}

	fn name(&self) -> &str {
		"date"
	}
}

/// Parses datetimes with the configured input formats. A value matching only
/// a date format is taken as midnight of that date.
#[derive(Debug, Clone)]
pub struct DateTimeConverter {
	formats: Vec<String>,
	date_formats: Vec<String>,
}

impl DateTimeConverter {
	pub fn new(formats: Vec<String>, date_formats: Vec<String>) -> Self {
		Self {
			formats,
			date_formats,
		}
	}

	pub fn from_settings(settings: &ConverterSettings) -> Self {
		Self::new(
			settings.datetime_input_formats.clone(),
			settings.date_input_formats.clone(),
		)
	}

	fn parse(&self, raw: &str) -> Option<NaiveDateTime> {
		self.formats
			.iter()
			.find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
			.or_else(|| parse_date(&self.date_formats, raw).map(|d| d.and_time(NaiveTime::MIN)))
	}
}

impl Default for DateTimeConverter {
	fn default() -> Self {
		Self::from_settings(&ConverterSettings::default())
	}
}

impl Converter for DateTimeConverter {
	fn convert(&self, value: &Value, parameter: &ParameterDescriptor, _ctx: &CallContext) -> Conversion {
		if let Some(outcome) =
			resolve_missing(value, parameter, self.sentinel_policy(), MissingBehavior::Fail)
		{
			return outcome;
		}
		match value {
			Value::Str(raw) => match self.parse(raw) {
				Some(dt) => Conversion::Converted(Value::DateTime(dt)),
				None => Conversion::Failed(ConversionError::invalid(
					parameter,
					raw,
					"does not match any configured datetime input format",
				)),
			},
			Value::DateTime(_) => Conversion::Converted(value.clone()),
			Value::Date(d) => Conversion::Converted(Value::DateTime(d.and_time(NaiveTime::MIN))),
			other => unexpected(parameter, other),
		}
	}

	fn sentinel_policy(&self) -> SentinelPolicy {
		SentinelPolicy::EmptyOrDash
	}

	fn name(&self) -> &str {
		"datetime"
	}
}

/// Fetches an entity of the parameter's declared type by primary key.
///
/// `""`, `"-"` and `"0"` mean "no entity" and produce `Value::Null` when the
/// parameter has no default. When the key does not exist and the handler was
/// registered with a [`REDIRECT_OPTION`], the invocation is redirected there
/// instead of failing.
#[derive(Clone)]
pub struct EntityConverter {
	store: Option<Arc<dyn EntityStore>>,
}

impl EntityConverter {
	pub fn new(store: Arc<dyn EntityStore>) -> Self {
		Self { store: Some(store) }
	}

	/// An entity converter without a store; every non-missing key fails.
	pub fn unconfigured() -> Self {
		Self { store: None }
	}

	pub fn has_store(&self) -> bool {
		self.store.is_some()
	}
}

impl std::fmt::Debug for EntityConverter {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("EntityConverter")
			.field("has_store", &self.has_store())
			.finish()
	}
}

impl Converter for EntityConverter {
	fn convert(&self, value: &Value, parameter: &ParameterDescriptor, ctx: &CallContext) -> Conversion {
		if let Some(outcome) =
			resolve_missing(value, parameter, self.sentinel_policy(), MissingBehavior::Null)
		{
			return outcome;
		}
		let key = match value {
			Value::Str(raw) => raw.clone(),
			Value::Int(i) => i.to_string(),
			Value::Entity(_) => return Conversion::Converted(value.clone()),
			other => return unexpected(parameter, other),
		};
		let Some(store) = &self.store else {
			return Conversion::Failed(ConversionError::lookup(
				parameter,
				&key,
				"no entity store is configured",
			));
		};

		let entity_type = parameter.effective_type();
		match store.fetch(&entity_type, &key) {
			Ok(entity) => {
				trace!(entity_type = %entity_type, key = %key, "entity fetched");
				Conversion::Converted(Value::Entity(entity))
			}
			Err(LookupError::NotFound { .. }) => match ctx.option_str(REDIRECT_OPTION) {
				Some(target) => {
					debug!(
						handler = %ctx.handler(),
						entity_type = %entity_type,
						key = %key,
						redirect_to = target,
						"entity not found, redirecting"
					);
					Conversion::Redirect(Redirect::to(target))
				}
				None => Conversion::Failed(ConversionError::not_found(parameter, &key)),
			},
			Err(error) => {
				warn!(entity_type = %entity_type, key = %key, error = %error, "entity lookup failed");
				Conversion::Failed(ConversionError::lookup(parameter, &key, error))
			}
		}
	}

	fn sentinel_policy(&self) -> SentinelPolicy {
		SentinelPolicy::EmptyDashOrZero
	}

	fn name(&self) -> &str {
		"entity"
	}
}

/// The built-in `(type, converter)` pairs in registration order.
pub fn builtin_converters(
	settings: &ConverterSettings,
	store: Option<Arc<dyn EntityStore>>,
) -> Vec<(TypeRef, Arc<dyn Converter>)> {
	let entity = match store {
		Some(store) => EntityConverter::new(store),
		None => EntityConverter::unconfigured(),
	};
	vec![
		(TypeRef::string(), Arc::new(PassthroughConverter)),
		(TypeRef::integer(), Arc::new(IntegerConverter)),
		(TypeRef::float(), Arc::new(FloatConverter)),
		(TypeRef::decimal(), Arc::new(DecimalConverter)),
		(TypeRef::boolean(), Arc::new(BooleanConverter)),
		(TypeRef::date(), Arc::new(DateConverter::from_settings(settings))),
		(TypeRef::datetime(), Arc::new(DateTimeConverter::from_settings(settings))),
		(TypeRef::model(), Arc::new(entity)),
	]
}
