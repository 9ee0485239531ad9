//! Sentinel policy
//!
//! Decides which raw strings mean "no value supplied". When a raw value is a
//! sentinel for its type and the parameter declares a default, the default is
//! used and the converter is never invoked.
//!
//! | Category                                     | Sentinels        | Missing, no default |
//! |----------------------------------------------|------------------|---------------------|
//! | string, untyped                              | `""`             | `""`                |
//! | int, float, decimal, bool, date, datetime    | `""`, `"-"`      | error               |
//! | entity                                       | `""`, `"-"`, `"0"` | null              |

use crate::value::Value;

/// Set of raw strings a converter treats as "missing".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SentinelPolicy {
	/// Only the empty string.
	#[default]
	Empty,
	/// The empty string or a single dash.
	EmptyOrDash,
	/// The empty string, a single dash, or `"0"` (never a valid key).
	EmptyDashOrZero,
}

impl SentinelPolicy {
	pub const fn markers(self) -> &'static [&'static str] {
		match self {
			Self::Empty => &[""],
			Self::EmptyOrDash => &["", "-"],
			Self::EmptyDashOrZero => &["", "-", "0"],
		}
	}

	/// # Examples
	///
	/// ```
	/// use urlparams_core::SentinelPolicy;
	///
	/// assert!(SentinelPolicy::EmptyOrDash.is_missing("-"));
	/// assert!(!SentinelPolicy::Empty.is_missing("-"));
	/// assert!(SentinelPolicy::EmptyDashOrZero.is_missing("0"));
	/// ```
	pub fn is_missing(self, raw: &str) -> bool {
		self.markers().contains(&raw)
	}

	/// Like [`is_missing`](Self::is_missing), also treating `Value::Null` as
	/// missing. Non-string values are never sentinels.
	pub fn is_missing_value(self, value: &Value) -> bool {
		match value {
			Value::Null => true,
			Value::Str(raw) => self.is_missing(raw),
			_ => false,
		}
	}
}

/// What a converter produces for a missing value when no default exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MissingBehavior {
	/// Raise a conversion error.
	Fail,
	/// Pass the raw (empty) string through.
	EmptyString,
	/// Produce `Value::Null`.
	Null,
}

/// Boolean truth rule for URL segments.
///
/// Only the first character matters: `f`, `F` and `0` are false; anything
/// else, including a space or arbitrary text, is true.
///
/// # Examples
///
/// ```
/// use urlparams_core::parse_flag;
///
/// assert!(!parse_flag("false"));
/// assert!(!parse_flag("0"));
/// assert!(parse_flag("AA"));
/// assert!(parse_flag(" "));
/// ```
pub fn parse_flag(raw: &str) -> bool {
	!matches!(raw.chars().next(), Some('f' | 'F' | '0'))
}
