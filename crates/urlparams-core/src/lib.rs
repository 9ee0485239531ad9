//! # urlparams core
//!
//! Data model shared by the urlparams crates.
//!
//! Handlers declare typed parameters; URL path segments arrive as raw strings.
//! This crate defines the vocabulary the converter layer uses to bridge the two:
//!
//! - **Runtime types**: [`TypeRef`] descriptors with single-parent inheritance,
//!   [`TypeKey`] for deferred (`"<namespace>.<TypeName>"`) registration and the
//!   [`TypeCatalog`] that resolves them
//! - **Values**: [`Value`], the typed argument handed to a handler
//! - **Parameters**: [`ParameterDescriptor`] and [`RawSegments`]
//! - **Call context**: [`CallContext`] with per-handler [`Options`]
//! - **Sentinels**: [`SentinelPolicy`], deciding which raw strings mean "no value"
//! - **Outcomes**: [`Conversion`], a tagged `Converted | Failed | Redirect` result
//! - **Errors**: request-class [`ConversionError`] and startup-class
//!   [`ConfigurationError`]
//!
//! ## Example
//!
//! ```
//! use urlparams_core::{ParameterDescriptor, RawSegments, TypeRef, Value};
//!
//! let hrs = ParameterDescriptor::new("hrs", 0)
//!     .with_type(TypeRef::integer())
//!     .with_default(Value::Int(12));
//!
//! let segments = RawSegments::from(vec!["111"]);
//! assert_eq!(segments.get(hrs.position()), "111");
//! assert_eq!(segments.get(50), "");
//! ```

pub mod context;
pub mod descriptor;
pub mod entity;
pub mod error;
pub mod outcome;
pub mod segments;
pub mod sentinel;
pub mod types;
pub mod value;

pub use context::{CallContext, HandlerId, Options, RequestHandle};
pub use descriptor::ParameterDescriptor;
pub use entity::{EntityStore, LookupError, MemoryEntityStore};
pub use error::{ConfigResult, ConfigurationError, ConversionError};
pub use outcome::{Conversion, Redirect};
pub use segments::RawSegments;
pub use sentinel::{MissingBehavior, SentinelPolicy, parse_flag};
pub use types::{StaticCatalog, TypeCatalog, TypeKey, TypeRef};
pub use value::{EntityHandle, Value};
