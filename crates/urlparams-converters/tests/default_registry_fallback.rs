//! The built-in default registry, used when nothing is installed

use urlparams_converters::{PassthroughConverter, default_registry, install_default_registry};
use urlparams_core::{ConfigurationError, StaticCatalog, TypeRef};

#[test]
fn fallback_is_builtin_and_blocks_later_install() {
	// Act
	let registry = default_registry();
	let late = install_default_registry(std::sync::Arc::new(
		urlparams_converters::ConverterRegistry::new(std::sync::Arc::new(StaticCatalog::new())),
	));

	// Assert
	assert_eq!(registry.lookup(&TypeRef::integer()).unwrap().name(), "int");
	assert_eq!(registry.lookup(&TypeRef::model()).unwrap().name(), "entity");
	assert!(!registry.is_frozen());
	assert!(registry.register(TypeRef::float(), PassthroughConverter).is_ok());
	assert_eq!(late, Err(ConfigurationError::AlreadyInstalled));
}
