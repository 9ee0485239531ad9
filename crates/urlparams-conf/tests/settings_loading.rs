//! Settings loading from files and the process environment

use std::io::Write;

use rstest::rstest;
use serial_test::serial;
use tempfile::NamedTempFile;
use urlparams_conf::{ConverterSettings, SettingsError};

#[rstest]
fn from_file_reads_toml() {
	// Arrange
	let mut file = NamedTempFile::new().unwrap();
	writeln!(
		file,
		r#"
date_input_formats = ["%d/%m/%Y"]
freeze_on_install = false
"#
	)
	.unwrap();

	// Act
	let settings = ConverterSettings::from_file(file.path()).unwrap();

	// Assert
	assert_eq!(settings.date_input_formats, vec!["%d/%m/%Y".to_string()]);
	assert!(!settings.freeze_on_install);
	assert_eq!(
		settings.datetime_input_formats,
		ConverterSettings::default().datetime_input_formats
	);
}

#[rstest]
fn from_file_missing_is_io_error() {
	// Act
	let result = ConverterSettings::from_file("/nonexistent/urlparams.toml");

	// Assert
	assert!(matches!(result, Err(SettingsError::Io(_))));
}

#[rstest]
#[serial]
fn apply_env_reads_process_environment() {
	// SAFETY: Setting environment variables is unsafe in multi-threaded programs.
	// This test uses #[serial] to ensure exclusive access to environment variables.
	unsafe {
		std::env::set_var("URLPARAMS_DATETIME_INPUT_FORMATS", "%Y%m%d%H%M");
	}

	let settings = ConverterSettings::default().apply_env();

	// SAFETY: Removing environment variables is unsafe in multi-threaded programs.
	// This test uses #[serial] to ensure exclusive access to environment variables.
	unsafe {
		std::env::remove_var("URLPARAMS_DATETIME_INPUT_FORMATS");
	}

	assert_eq!(
		settings.unwrap().datetime_input_formats,
		vec!["%Y%m%d%H%M".to_string()]
	);
}
