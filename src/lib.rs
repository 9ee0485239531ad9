//! # urlparams
//!
//! Typed URL parameters for view handlers.
//!
//! A handler declares typed parameters after its request parameter. The
//! segments of the URL path after the routing prefix arrive as raw strings;
//! urlparams converts each one to its parameter's declared type before the
//! handler runs, substituting defaults for "missing" markers and fetching
//! entities by key.
//!
//! ## Crates
//!
//! - `urlparams-core`: runtime types, values, descriptors, sentinels, outcomes
//!   and errors
//! - `urlparams-converters`: the converter registry, signature resolver,
//!   conversion engine and [`ViewFunction`]
//! - `urlparams-conf` (feature `conf`, default): [`ConverterSettings`] loaded
//!   from TOML and the environment
//!
//! ## Quick Example
//!
//! ```
//! use std::sync::Arc;
//! use urlparams::prelude::*;
//!
//! let product = TypeRef::new("shop", "Product", &TypeRef::model());
//! let store = Arc::new(MemoryEntityStore::new());
//! store.insert(&product, "7", "Widget".to_string());
//!
//! let registry = Arc::new(ConverterRegistry::with_builtins(
//!     Arc::new(StaticCatalog::new()),
//!     ConverterSettings::default(),
//!     Some(store),
//! ));
//!
//! let detail = Handler::new(
//!     "shop.views.detail",
//!     Signature::new()
//!         .request("request")
//!         .param(DeclaredParam::new("product").typed(product))
//!         .param(DeclaredParam::new("qty").typed(TypeRef::integer()).with_default(1i64)),
//! );
//! let view = ViewFunction::builder(Arc::new(detail))
//!     .option(REDIRECT_OPTION, serde_json::json!("/shop/"))
//!     .build(&SignatureResolver::new(), ConversionEngine::new(registry))
//!     .unwrap();
//!
//! match view.bind(RequestHandle::empty(), &RawSegments::from(vec!["7", "-"])) {
//!     Conversion::Converted(call) => {
//!         assert_eq!(call.arg("qty"), Some(&Value::Int(1)));
//!     }
//!     Conversion::Failed(error) => panic!("answer {}: {}", error.status_code(), error),
//!     Conversion::Redirect(redirect) => panic!("redirect to {}", redirect.target()),
//! }
//!
//! let missing = view.bind(RequestHandle::empty(), &RawSegments::from(vec!["99"]));
//! assert_eq!(missing.redirect().map(|r| r.target()), Some("/shop/"));
//! ```

pub use urlparams_core as core;
pub use urlparams_converters as converters;

#[cfg(feature = "conf")]
pub use urlparams_conf as conf;

// Re-export core types
pub use urlparams_core::{
	CallContext, ConfigResult, ConfigurationError, Conversion, ConversionError, EntityHandle,
	EntityStore, HandlerId, LookupError, MemoryEntityStore, MissingBehavior, Options,
	ParameterDescriptor, RawSegments, Redirect, RequestHandle, SentinelPolicy, StaticCatalog,
	TypeCatalog, TypeKey, TypeRef, Value, parse_flag,
};

// Re-export converters
pub use urlparams_converters::{
	BooleanConverter, BoundCall, ConversionEngine, Converter, ConverterRegistry, DateConverter,
	DateTimeConverter, DecimalConverter, DeclaredParam, EntityConverter, EntryPoint,
	FloatConverter, FnConverter, Handler, IntegerConverter, ParamKind, PassthroughConverter,
	REDIRECT_OPTION, RegistrationInfo, Signature, SignatureResolver, ViewFunction,
	ViewFunctionBuilder, Wrapped, default_registry, install_default_registry,
};

// Re-export settings
#[cfg(feature = "conf")]
pub use urlparams_conf::{ConverterSettings, SettingsError, SettingsResult};

/// Commonly used types for registering handlers and converting parameters.
pub mod prelude {
	pub use crate::{
		CallContext, Conversion, ConversionEngine, ConversionError, Converter, ConverterRegistry,
		DeclaredParam, EntityStore, EntryPoint, FnConverter, Handler, MemoryEntityStore, Options,
		ParameterDescriptor, REDIRECT_OPTION, RawSegments, Redirect, RequestHandle, SentinelPolicy,
		Signature, SignatureResolver, StaticCatalog, TypeRef, Value, ViewFunction, Wrapped,
	};

	#[cfg(feature = "conf")]
	pub use crate::ConverterSettings;
}
