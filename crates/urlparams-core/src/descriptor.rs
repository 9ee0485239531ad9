//! Parameter descriptors

use crate::types::TypeRef;
use crate::value::Value;

/// One URL-convertible parameter of a handler.
///
/// Built by the signature resolver when a handler is registered and never
/// modified afterwards. `position` counts only convertible parameters, so the
/// leading request parameter is not numbered.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDescriptor {
	name: String,
	position: usize,
	declared_type: Option<TypeRef>,
	default: Option<Value>,
}

impl ParameterDescriptor {
	pub fn new(name: impl Into<String>, position: usize) -> Self {
		Self {
			name: name.into(),
			position,
			declared_type: None,
			default: None,
		}
	}

	pub fn with_type(mut self, declared_type: TypeRef) -> Self {
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

	pub fn position(&self) -> usize {
		self.position
	}

	/// The declared type, `None` for an untyped parameter.
	pub fn declared_type(&self) -> Option<&TypeRef> {
		self.declared_type.as_ref()
	}

	/// The declared type, with untyped parameters mapped to `builtins.object`.
	pub fn effective_type(&self) -> TypeRef {
		self.declared_type.clone().unwrap_or_else(TypeRef::object)
	}

	pub fn has_default(&self) -> bool {
		self.default.is_some()
	}

	pub fn default_value(&self) -> Option<&Value> {
		self.default.as_ref()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_untyped_parameter_is_object() {
		// Arrange
		let param = ParameterDescriptor::new("slug", 0);

		// Assert
		assert!(param.declared_type().is_none());
		assert_eq!(param.effective_type(), TypeRef::object());
		assert!(!param.has_default());
	}

	#[rstest]
	fn test_builder_sets_type_and_default() {
		// Arrange
		let param = ParameterDescriptor::new("mins", 1)
			.with_type(TypeRef::integer())
			.with_default(30i64);

		// Assert
		assert_eq!(param.name(), "mins");
		assert_eq!(param.position(), 1);
		assert_eq!(param.effective_type(), TypeRef::integer());
		assert_eq!(param.default_value(), Some(&Value::Int(30)));
	}
}
