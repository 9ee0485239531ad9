//! # urlparams conf
//!
//! Settings consumed by the built-in converters.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! environment variables.
//!
//! ```
//! use urlparams_conf::ConverterSettings;
//!
//! let settings = ConverterSettings::from_toml_str(r#"
//! date_input_formats = ["%d.%m.%Y"]
//! "#).unwrap();
//!
//! assert_eq!(settings.date_input_formats, vec!["%d.%m.%Y".to_string()]);
//! // Unset keys keep their defaults
//! assert!(!settings.datetime_input_formats.is_empty());
//! ```

pub mod error;
pub mod settings;

pub use error::{SettingsError, SettingsResult};
pub use settings::{
	ConverterSettings, DEFAULT_DATE_INPUT_FORMATS, DEFAULT_DATETIME_INPUT_FORMATS, ENV_PREFIX,
};
