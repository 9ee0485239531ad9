//! Tagged conversion outcome
//!
//! A converter either produces a value, fails, or redirects the whole
//! invocation elsewhere. The three cases are distinct variants so the web
//! layer can answer "not found" and "go elsewhere" without inspecting error
//! subtypes.

use crate::error::ConversionError;
use crate::value::Value;

/// Navigational signal: abandon the invocation and send the client to
/// `target`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Redirect {
	target: String,
	permanent: bool,
}

impl Redirect {
	/// A temporary (302) redirect.
	pub fn to(target: impl Into<String>) -> Self {
		Self {
			target: target.into(),
			permanent: false,
		}
	}

	/// A permanent (301) redirect.
	pub fn permanent(target: impl Into<String>) -> Self {
		Self {
			target: target.into(),
			permanent: true,
		}
	}

	pub fn target(&self) -> &str {
		&self.target
	}

	pub fn is_permanent(&self) -> bool {
		self.permanent
	}

	pub fn status_code(&self) -> u16 {
		if self.permanent { 301 } else { 302 }
	}
}

/// Result of converting one parameter, or a whole argument list.
///
/// # Examples
///
/// ```
/// use urlparams_core::{Conversion, ConversionError, Redirect, Value};
///
/// let ok: Conversion = Ok::<_, ConversionError>(Value::Int(3)).into();
/// assert_eq!(ok.converted(), Some(Value::Int(3)));
///
/// let moved: Conversion<Vec<Value>> = Redirect::to("/login/").into();
/// assert_eq!(moved.redirect().map(Redirect::target), Some("/login/"));
/// ```
#[must_use]
#[derive(Debug)]
pub enum Conversion<T = Value> {
	Converted(T),
	Failed(ConversionError),
	Redirect(Redirect),
}

impl<T> Conversion<T> {
	pub fn is_converted(&self) -> bool {
		matches!(self, Self::Converted(_))
	}

	pub fn is_failed(&self) -> bool {
		matches!(self, Self::Failed(_))
	}

	pub fn is_redirect(&self) -> bool {
		matches!(self, Self::Redirect(_))
	}

	pub fn converted(self) -> Option<T> {
		match self {
			Self::Converted(value) => Some(value),
			_ => None,
		}
	}

	pub fn error(&self) -> Option<&ConversionError> {
		match self {
			Self::Failed(error) => Some(error),
			_ => None,
		}
	}

	pub fn redirect(&self) -> Option<&Redirect> {
		match self {
			Self::Redirect(redirect) => Some(redirect),
			_ => None,
		}
	}

	pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Conversion<U> {
		match self {
			Self::Converted(value) => Conversion::Converted(f(value)),
			Self::Failed(error) => Conversion::Failed(error),
			Self::Redirect(redirect) => Conversion::Redirect(redirect),
		}
	}

	pub fn and_then<U>(self, f: impl FnOnce(T) -> Conversion<U>) -> Conversion<U> {
		match self {
			Self::Converted(value) => f(value),
			Self::Failed(error) => Conversion::Failed(error),
			Self::Redirect(redirect) => Conversion::Redirect(redirect),
		}
	}

	/// HTTP status the web layer should answer with when this is not a value.
	pub fn status_code(&self) -> Option<u16> {
		match self {
			Self::Converted(_) => None,
			Self::Failed(error) => Some(error.status_code()),
			Self::Redirect(redirect) => Some(redirect.status_code()),
		}
	}
}

impl<T> From<Result<T, ConversionError>> for Conversion<T> {
	fn from(result: Result<T, ConversionError>) -> Self {
		match result {
			Ok(value) => Self::Converted(value),
			Err(error) => Self::Failed(error),
		}
	}
}

impl<T> From<ConversionError> for Conversion<T> {
	fn from(error: ConversionError) -> Self {
		Self::Failed(error)
	}
}

impl<T> From<Redirect> for Conversion<T> {
	fn from(redirect: Redirect) -> Self {
		Self::Redirect(redirect)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_map_preserves_interruptions() {
		// Arrange
		let failed: Conversion<i64> = ConversionError::Custom("boom".to_string()).into();
		let moved: Conversion<i64> = Redirect::permanent("/new/").into();

		// Act
		let failed = failed.map(|v| v + 1);
		let moved = moved.map(|v| v + 1);

		// Assert
		assert!(failed.is_failed());
		assert_eq!(failed.status_code(), Some(404));
		assert_eq!(moved.redirect(), Some(&Redirect::permanent("/new/")));
		assert_eq!(moved.status_code(), Some(301));
	}

	#[rstest]
	fn test_and_then_chains_values() {
		// Arrange
		let start = Conversion::Converted(2i64);

		// Act
		let result = start.and_then(|v| Conversion::Converted(v * 10));

		// Assert
		assert_eq!(result.converted(), Some(20));
	}
}
