//! Typed argument values

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use crate::types::TypeRef;

/// A converted (or default) argument for a handler parameter.
///
/// `Opaque` carries application types produced by custom converters; two
/// opaque values are equal only when they share the same allocation.
#[derive(Clone, Default)]
pub enum Value {
	#[default]
	Null,
	Str(String),
	Int(i64),
	Float(f64),
	Decimal(Decimal),
	Bool(bool),
	Date(NaiveDate),
	DateTime(NaiveDateTime),
	Entity(EntityHandle),
	Opaque(Arc<dyn Any + Send + Sync>),
}

impl Value {
	/// Wraps an arbitrary application value.
	pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
		Self::Opaque(Arc::new(value))
	}

	pub fn is_null(&self) -> bool {
		matches!(self, Self::Null)
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::Str(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_int(&self) -> Option<i64> {
		match self {
			Self::Int(i) => Some(*i),
			_ => None,
		}
	}

	pub fn as_float(&self) -> Option<f64> {
		match self {
			Self::Float(f) => Some(*f),
			_ => None,
		}
	}

	pub fn as_decimal(&self) -> Option<Decimal> {
		match self {
			Self::Decimal(d) => Some(*d),
			_ => None,
		}
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Self::Bool(b) => Some(*b),
			_ => None,
		}
	}

	pub fn as_date(&self) -> Option<NaiveDate> {
		match self {
			Self::Date(d) => Some(*d),
			_ => None,
		}
	}

	pub fn as_datetime(&self) -> Option<NaiveDateTime> {
		match self {
			Self::DateTime(dt) => Some(*dt),
			_ => None,
		}
	}

	pub fn as_entity(&self) -> Option<&EntityHandle> {
		match self {
			Self::Entity(e) => Some(e),
			_ => None,
		}
	}

	/// Downcasts an `Opaque` value (or the object behind an `Entity`).
	pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
		match self {
			Self::Opaque(inner) => inner.downcast_ref::<T>(),
			Self::Entity(entity) => entity.downcast_ref::<T>(),
			_ => None,
		}
	}

	/// Short name of the variant, used in log fields and error messages.
	pub fn kind(&self) -> &'static str {
		match self {
			Self::Null => "null",
			Self::Str(_) => "str",
			Self::Int(_) => "int",
			Self::Float(_) => "float",
			Self::Decimal(_) => "decimal",
			Self::Bool(_) => "bool",
			Self::Date(_) => "date",
			Self::DateTime(_) => "datetime",
			Self::Entity(_) => "entity",
			Self::Opaque(_) => "opaque",
		}
	}
}

impl PartialEq for Value {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Null, Self::Null) => true,
			(Self::Str(a), Self::Str(b)) => a == b,
			(Self::Int(a), Self::Int(b)) => a == b,
			(Self::Float(a), Self::Float(b)) => a == b,
			(Self::Decimal(a), Self::Decimal(b)) => a == b,
			(Self::Bool(a), Self::Bool(b)) => a == b,
			(Self::Date(a), Self::Date(b)) => a == b,
			(Self::DateTime(a), Self::DateTime(b)) => a == b,
			(Self::Entity(a), Self::Entity(b)) => a == b,
			(Self::Opaque(a), Self::Opaque(b)) => Arc::ptr_eq(a, b),
			_ => false,
		}
	}
}

impl fmt::Debug for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Null => f.write_str("Null"),
			Self::Str(s) => f.debug_tuple("Str").field(s).finish(),
			Self::Int(i) => f.debug_tuple("Int").field(i).finish(),
			Self::Float(x) => f.debug_tuple("Float").field(x).finish(),
			Self::Decimal(d) => f.debug_tuple("Decimal").field(d).finish(),
			Self::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
			Self::Date(d) => f.debug_tuple("Date").field(d).finish(),
			Self::DateTime(dt) => f.debug_tuple("DateTime").field(dt).finish(),
			Self::Entity(e) => f.debug_tuple("Entity").field(e).finish(),
			Self::Opaque(_) => f.write_str("Opaque(..)"),
		}
	}
}

macro_rules! impl_from_for_value {
	($($ty:ty => $variant:ident),* $(,)?) => {
		$(
			impl From<$ty> for Value {
				fn from(value: $ty) -> Self {
					Self::$variant(value.into())
				}
			}
		)*
	};
}

impl_from_for_value! {
	String => Str,
	&str => Str,
	i64 => Int,
	i32 => Int,
	u32 => Int,
	f64 => Float,
	bool => Bool,
	Decimal => Decimal,
	NaiveDate => Date,
	NaiveDateTime => DateTime,
	EntityHandle => Entity,
}

impl<T: Into<Value>> From<Option<T>> for Value {
	fn from(value: Option<T>) -> Self {
		value.map(Into::into).unwrap_or(Value::Null)
	}
}

/// A fetched entity: its type, the key it was fetched by, and the object.
#[derive(Clone)]
pub struct EntityHandle {
	entity_type: TypeRef,
	key: String,
	object: Arc<dyn Any + Send + Sync>,
}

impl EntityHandle {
	pub fn new<T: Any + Send + Sync>(entity_type: TypeRef, key: impl Into<String>, object: T) -> Self {
		Self {
			entity_type,
			key: key.into(),
			object: Arc::new(object),
		}
	}

	/// Builds a handle around an object that is already shared, e.g. one held
	/// by an identity map.
	pub fn from_shared(
		entity_type: TypeRef,
		key: impl Into<String>,
		object: Arc<dyn Any + Send + Sync>,
	) -> Self {
		Self {
			entity_type,
			key: key.into(),
			object,
		}
	}

	pub fn entity_type(&self) -> &TypeRef {
		&self.entity_type
	}

	pub fn key(&self) -> &str {
		&self.key
	}

	pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
		self.object.downcast_ref::<T>()
	}
}

impl PartialEq for EntityHandle {
	fn eq(&self, other: &Self) -> bool {
		self.entity_type == other.entity_type && self.key == other.key
	}
}

impl fmt::Debug for EntityHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("EntityHandle")
			.field("entity_type", &self.entity_type)
			.field("key", &self.key)
			.finish_non_exhaustive()
	}
}
