//! # urlparams converters
//!
//! Turns raw URL path segments into typed handler arguments.
//!
//! ## Pieces
//!
//! - [`Converter`]: one conversion routine, with the [`SentinelPolicy`]
//!   deciding which raw strings count as missing
//! - [`ConverterRegistry`]: converters keyed by runtime type, most specific
//!   ancestor first, with deferred `"<namespace>.<TypeName>"` keys
//! - [`SignatureResolver`]: handler signatures to [`ParameterDescriptor`]s,
//!   following wrappers that expose their inner handler
//! - [`ConversionEngine`]: converts a descriptor list against the raw segments
//!   of one invocation
//! - [`ViewFunction`]: a registered handler with its options and optional
//!   override converter
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use urlparams_converters::{
//!     ConversionEngine, ConverterRegistry, DeclaredParam, Handler, Signature, SignatureResolver,
//!     ViewFunction,
//! };
//! use urlparams_conf::ConverterSettings;
//! use urlparams_core::{RawSegments, RequestHandle, StaticCatalog, TypeRef, Value};
//!
//! let registry = Arc::new(ConverterRegistry::with_builtins(
//!     Arc::new(StaticCatalog::new()),
//!     ConverterSettings::default(),
//!     None,
//! ));
//! let clock = Handler::new(
//!     "clock.views.index",
//!     Signature::new()
//!         .request("request")
//!         .param(DeclaredParam::new("hrs").typed(TypeRef::integer()).with_default(12i64))
//!         .param(DeclaredParam::new("mins").typed(TypeRef::integer()).with_default(30i64))
//!         .param(DeclaredParam::new("forward").typed(TypeRef::boolean()).with_default(true)),
//! );
//! let view = ViewFunction::builder(Arc::new(clock))
//!     .build(&SignatureResolver::new(), ConversionEngine::new(registry))
//!     .unwrap();
//!
//! let call = view
//!     .bind(RequestHandle::empty(), &RawSegments::from(vec!["-", "15"]))
//!     .converted()
//!     .unwrap();
//! assert_eq!(call.args(), &[Value::Int(12), Value::Int(15), Value::Bool(true)]);
//! ```
//!
//! [`SentinelPolicy`]: urlparams_core::SentinelPolicy
//! [`ParameterDescriptor`]: urlparams_core::ParameterDescriptor

pub mod builtin;
pub mod converter;
pub mod engine;
pub mod registry;
pub mod signature;
pub mod view;

pub use builtin::{
	BooleanConverter, DateConverter, DateTimeConverter, DecimalConverter, EntityConverter,
	FloatConverter, IntegerConverter, PassthroughConverter, REDIRECT_OPTION, builtin_converters,
};
pub use converter::{Converter, FnConverter};
pub use engine::ConversionEngine;
pub use registry::{ConverterRegistry, RegistrationInfo, default_registry, install_default_registry};
pub use signature::{
	DeclaredParam, EntryPoint, Handler, ParamKind, Signature, SignatureResolver, Wrapped, describe,
	innermost,
};
pub use view::{BoundCall, ViewFunction, ViewFunctionBuilder};
