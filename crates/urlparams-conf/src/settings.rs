//! Converter settings
//!
//! Defaults follow the input formats Django accepts for `DATE_INPUT_FORMATS`
//! and `DATETIME_INPUT_FORMATS`, rewritten as chrono format strings.

use std::fs;
use std::path::Path;

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};

use crate::error::{SettingsError, SettingsResult};

/// Prefix of the environment variables read by [`ConverterSettings::apply_env`].
pub const ENV_PREFIX: &str = "URLPARAMS_";

/// Separator between formats in list-valued environment variables. Formats
/// themselves may contain commas (`%b %d, %Y`).
const ENV_LIST_SEPARATOR: char = '|';

pub const DEFAULT_DATE_INPUT_FORMATS: &[&str] = &[
	"%Y-%m-%d",
	"%m/%d/%Y",
	"%m/%d/%y",
	"%b %d %Y",
	"%b %d, %Y",
	"%d %b %Y",
	"%d %b, %Y",
	"%B %d %Y",
	"%B %d, %Y",
	"%d %B %Y",
	"%d %B, %Y",
];

pub const DEFAULT_DATETIME_INPUT_FORMATS: &[&str] = &[
	"%Y-%m-%d %H:%M:%S%.f",
	"%Y-%m-%dT%H:%M:%S%.f",
	"%Y-%m-%d %H:%M",
	"%m/%d/%Y %H:%M:%S%.f",
	"%m/%d/%Y %H:%M",
	"%m/%d/%y %H:%M:%S%.f",
	"%m/%d/%y %H:%M",
];

/// Settings for the built-in converters and the default registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterSettings {
	/// Formats tried in order by the date converter.
	pub date_input_formats: Vec<String>,
	/// Formats tried in order by the datetime converter. A plain date is
	/// accepted as midnight when none match.
	pub datetime_input_formats: Vec<String>,
	/// Freeze a registry when it is installed as the process default.
	pub freeze_on_install: bool,
}

impl Default for ConverterSettings {
	fn default() -> Self {
		Self {
			date_input_formats: to_owned_list(DEFAULT_DATE_INPUT_FORMATS),
			datetime_input_formats: to_owned_list(DEFAULT_DATETIME_INPUT_FORMATS),
			freeze_on_install: true,
		}
	}
}

fn to_owned_list(formats: &[&str]) -> Vec<String> {
	formats.iter().map(|f| f.to_string()).collect()
}

impl ConverterSettings {
	/// Parses settings from TOML; keys that are not present keep their defaults.
	pub fn from_toml_str(source: &str) -> SettingsResult<Self> {
		let settings: Self = toml::from_str(source)?;
		settings.validate()?;
		Ok(settings)
	}

	/// Reads settings from a TOML file.
	///
	/// # Errors
	///
	/// Returns [`SettingsError::Io`] if the file cannot be read,
	/// [`SettingsError::Toml`] if it does not parse, and
	/// [`SettingsError::Invalid`] if a value fails validation.
	pub fn from_file(path: impl AsRef<Path>) -> SettingsResult<Self> {
		let path = path.as_ref();
		let source = fs::read_to_string(path)?;
		tracing::debug!(path = %path.display(), "loading converter settings");
		Self::from_toml_str(&source)
	}

	/// Overrides values from `URLPARAMS_*` environment variables.
	///
	/// - `URLPARAMS_DATE_INPUT_FORMATS` and `URLPARAMS_DATETIME_INPUT_FORMATS`:
	///   formats separated by `|`
	/// - `URLPARAMS_FREEZE_ON_INSTALL`: `true`/`false`/`1`/`0`
	pub fn apply_env(self) -> SettingsResult<Self> {
		self.apply_env_from(std::env::vars())
	}

	/// Like [`apply_env`](Self::apply_env), reading from the given pairs.
	pub fn apply_env_from<I, K, V>(mut self, vars: I) -> SettingsResult<Self>
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: AsRef<str>,
	{
		for (key, value) in vars {
			let Some(name) = key.as_ref().strip_prefix(ENV_PREFIX) else {
				continue;
			};
			let value = value.as_ref();
			match name {
				"DATE_INPUT_FORMATS" => self.date_input_formats = split_list(value),
				"DATETIME_INPUT_FORMATS" => self.datetime_input_formats = split_list(value),
				"FREEZE_ON_INSTALL" => self.freeze_on_install = parse_bool(key.as_ref(), value)?,
				_ => {
					tracing::warn!(variable = key.as_ref(), "ignoring unknown urlparams setting");
					continue;
				}
			}
			tracing::debug!(variable = key.as_ref(), "converter setting overridden from environment");
		}
		self.validate()?;
		Ok(self)
	}

	/// Checks that every format list is non-empty and parses as a chrono
	/// format string.
	pub fn validate(&self) -> SettingsResult<()> {
		validate_formats("date_input_formats", &self.date_input_formats)?;
		validate_formats("datetime_input_formats", &self.datetime_input_formats)
	}
}

fn split_list(value: &str) -> Vec<String> {
	value
		.split(ENV_LIST_SEPARATOR)
		.map(str::trim)
		.filter(|item| !item.is_empty())
		.map(str::to_string)
		.collect()
}

fn parse_bool(key: &str, value: &str) -> SettingsResult<bool> {
	match value.trim().to_ascii_lowercase().as_str() {
		"true" | "1" | "yes" | "on" => Ok(true),
		"false" | "0" | "no" | "off" => Ok(false),
		other => Err(SettingsError::invalid(
			key,
			format!("expected a boolean, got '{}'", other),
		)),
	}
}

fn validate_formats(key: &str, formats: &[String]) -> SettingsResult<()> {
	if formats.is_empty() {
		return Err(SettingsError::invalid(key, "at least one format is required"));
	}
	for format in formats {
		if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
			return Err(SettingsError::invalid(
				key,
				format!("'{}' is not a valid format string", format),
			));
		}
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_defaults_are_valid() {
		// Arrange
		let settings = ConverterSettings::default();

		// Assert
		assert!(settings.validate().is_ok());
		assert_eq!(settings.date_input_formats[0], "%Y-%m-%d");
		assert!(settings.freeze_on_install);
	}

	#[rstest]
	fn test_env_overrides_formats() {
		// Arrange
		let vars = vec![
			("URLPARAMS_DATE_INPUT_FORMATS", "%d.%m.%Y | %b %d, %Y"),
			("URLPARAMS_FREEZE_ON_INSTALL", "off"),
			("PATH", "/usr/bin"),
		];

		// Act
		let settings = ConverterSettings::default().apply_env_from(vars).unwrap();

		// Assert
		assert_eq!(
			settings.date_input_formats,
			vec!["%d.%m.%Y".to_string(), "%b %d, %Y".to_string()]
		);
		assert!(!settings.freeze_on_install);
	}

	#[rstest]
	fn test_env_rejects_bad_boolean() {
		// Arrange
		let vars = vec![("URLPARAMS_FREEZE_ON_INSTALL", "maybe")];

		// Act
		let result = ConverterSettings::default().apply_env_from(vars);

		// Assert
		assert!(matches!(
			result,
			Err(SettingsError::Invalid { ref key, .. }) if key == "URLPARAMS_FREEZE_ON_INSTALL"
		));
	}

	#[rstest]
	#[case("date_input_formats = []")]
	#[case("datetime_input_formats = [\"%Y-%m-%d %\"]")]
	fn test_invalid_formats_rejected(#[case] source: &str) {
		// Act
		let result = ConverterSettings::from_toml_str(source);

		// Assert
		assert!(matches!(result, Err(SettingsError::Invalid { .. })));
	}

	#[rstest]
	fn test_malformed_toml_rejected() {
		// Act
		let result = ConverterSettings::from_toml_str("date_input_formats = [");

		// Assert
		assert!(matches!(result, Err(SettingsError::Toml(_))));
	}
}
