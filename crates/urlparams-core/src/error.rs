//! Error taxonomy
//!
//! [`ConversionError`] is request-class: the web layer turns it into a
//! "not found" response. [`ConfigurationError`] is startup-class: it means the
//! registry or a handler registration is broken and should abort startup.

use std::fmt::Display;

use thiserror::Error;

use crate::descriptor::ParameterDescriptor;

/// Startup-class failure.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
	#[error("Invalid type key '{0}': expected \"<namespace>.<TypeName>\"")]
	InvalidTypeKey(String),

	#[error("Type '{0}' could not be resolved; check that the module defining it is loaded")]
	UnresolvedType(String),

	#[error("No converter is registered under the name '{0}'")]
	UnknownConverter(String),

	#[error("The converter registry is frozen; register converters before serving requests")]
	RegistryFrozen,

	#[error("A default converter registry is already installed")]
	AlreadyInstalled,

	#[error("Handler {handler} declares parameter '{name}' more than once")]
	DuplicateParameter { handler: String, name: String },

	#[error("Handler {0} does not declare a leading request parameter")]
	MissingRequestParameter(String),

	#[error("Handler identity '{0}' is already registered for a different handler")]
	DuplicateHandler(String),
}

/// Result type alias for registry and registration operations.
pub type ConfigResult<T> = Result<T, ConfigurationError>;

/// Request-class failure of a converter.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
	/// The raw value could not be converted to the declared type.
	#[error("Could not convert '{raw}' to {type_name} for parameter {position} ({parameter}): {reason}")]
	Invalid {
		parameter: String,
		position: usize,
		type_name: String,
		raw: String,
		reason: String,
	},

	/// A missing sentinel arrived for a parameter without a default.
	#[error(
		"Value was empty, but no default value is given in the handler for parameter {position} ({parameter})"
	)]
	Missing {
		parameter: String,
		position: usize,
		type_name: String,
	},

	/// Entity lookup found no row for the key.
	#[error("{type_name} matching key '{key}' does not exist (parameter {parameter})")]
	NotFound {
		parameter: String,
		type_name: String,
		key: String,
	},

	/// Entity lookup failed for a reason other than not-found.
	#[error("Lookup of {type_name} '{key}' failed for parameter {parameter}: {message}")]
	Lookup {
		parameter: String,
		type_name: String,
		key: String,
		message: String,
	},

	#[error("{0}")]
	Custom(String),

	/// A configuration fault that surfaced while serving a request.
	#[error("Configuration error: {0}")]
	Configuration(#[from] ConfigurationError),
}

impl ConversionError {
	pub fn invalid(parameter: &ParameterDescriptor, raw: &str, reason: impl Display) -> Self {
		Self::Invalid {
			parameter: parameter.name().to_string(),
			position: parameter.position(),
			type_name: parameter.effective_type().qualified_name().to_string(),
			raw: raw.to_string(),
			reason: reason.to_string(),
		}
	}

	pub fn missing(parameter: &ParameterDescriptor) -> Self {
		Self::Missing {
			parameter: parameter.name().to_string(),
			position: parameter.position(),
			type_name: parameter.effective_type().qualified_name().to_string(),
		}
	}

	pub fn not_found(parameter: &ParameterDescriptor, key: &str) -> Self {
		Self::NotFound {
			parameter: parameter.name().to_string(),
			type_name: parameter.effective_type().qualified_name().to_string(),
			key: key.to_string(),
		}
	}

	pub fn lookup(parameter: &ParameterDescriptor, key: &str, message: impl Display) -> Self {
		Self::Lookup {
			parameter: parameter.name().to_string(),
			type_name: parameter.effective_type().qualified_name().to_string(),
			key: key.to_string(),
			message: message.to_string(),
		}
	}

	pub fn custom(message: impl Into<String>) -> Self {
		Self::Custom(message.into())
	}

	/// Name of the parameter that failed, when known.
	pub fn parameter(&self) -> Option<&str> {
		match self {
			Self::Invalid { parameter, .. }
			| Self::Missing { parameter, .. }
			| Self::NotFound { parameter, .. }
			| Self::Lookup { parameter, .. } => Some(parameter),
			Self::Custom(_) | Self::Configuration(_) => None,
		}
	}

	pub fn is_not_found(&self) -> bool {
		matches!(self, Self::NotFound { .. })
	}

	pub fn is_configuration(&self) -> bool {
		matches!(self, Self::Configuration(_))
	}

	/// 404 for every request-class failure, 500 for configuration faults.
	pub fn status_code(&self) -> u16 {
		match self {
			Self::Configuration(_) => 500,
			_ => 404,
		}
	}
}
