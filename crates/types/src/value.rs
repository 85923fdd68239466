//! Dynamic values routed through the conversion engine.
//!
//! Absence ("null") is modelled as `Option<Value>::None` by callers; a [`Value`] is
//! always present. Primitive variants report their boxed class as runtime type.

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::descriptor::{Primitive, TypeRef};
use crate::system::TypeSystem;

/// Payload of an object value.
///
/// `text` is the textual representation used by to-string conversions; objects
/// without one cannot be rendered as text.
pub trait Object: Any + Send + Sync + fmt::Debug {
	fn text(&self) -> Option<String> {
		None
	}
}

/// An instance of a user-declared class.
#[derive(Clone)]
pub struct ObjectValue {
	ty: TypeRef,
	data: Arc<dyn Object>,
}

impl ObjectValue {
	pub fn new<T: Object>(ty: TypeRef, data: T) -> Self {
		Self {
			ty,
			data: Arc::new(data),
		}
	}

	pub fn from_arc(ty: TypeRef, data: Arc<dyn Object>) -> Self {
		Self { ty, data }
	}

	#[inline]
	pub fn type_ref(&self) -> &TypeRef {
		&self.ty
	}

	pub fn data(&self) -> &Arc<dyn Object> {
		&self.data
	}

	pub fn downcast_ref<T: Object>(&self) -> Option<&T> {
		let any: &dyn Any = &*self.data;
		any.downcast_ref::<T>()
	}

	/// Returns true when both values share the same payload allocation.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.data, &other.data)
	}
}

impl fmt::Debug for ObjectValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}({:?})", self.ty.name(), self.data)
	}
}

/// One constant of a declared enum.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct EnumConstant {
	ty: TypeRef,
	ordinal: u32,
}

impl EnumConstant {
	/// Returns `None` when `ty` is not an enum or `ordinal` is out of range.
	pub fn new(ty: &TypeRef, ordinal: u32) -> Option<Self> {
		(ty.is_enum() && (ordinal as usize) < ty.enum_constants().len()).then(|| Self {
			ty: ty.clone(),
			ordinal,
		})
	}

	/// Finds a constant by its exact name.
	pub fn by_name(ty: &TypeRef, name: &str) -> Option<Self> {
		let ordinal = ty.enum_constants().iter().position(|c| &**c == name)?;
		Self::new(ty, ordinal as u32)
	}

	#[inline]
	pub fn type_ref(&self) -> &TypeRef {
		&self.ty
	}

	#[inline]
	pub fn ordinal(&self) -> u32 {
		self.ordinal
	}

	pub fn name(&self) -> &str {
		&self.ty.enum_constants()[self.ordinal as usize]
	}
}

impl fmt::Debug for EnumConstant {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}::{}", self.ty.name(), self.name())
	}
}

/// A dynamically typed value.
#[derive(Clone, Debug)]
pub enum Value {
	Bool(bool),
	Char(char),
	Byte(i8),
	Short(i16),
	Int(i32),
	Long(i64),
	Float(f32),
	Double(f64),
	Str(Arc<str>),
	Enum(EnumConstant),
	Object(ObjectValue),
}

impl Value {
	pub fn string(s: impl Into<Arc<str>>) -> Self {
		Self::Str(s.into())
	}

	/// Returns the default value of a primitive (false, 0, 0.0 or `'\0'`).
	pub const fn zero(p: Primitive) -> Self {
		match p {
			Primitive::Boolean => Self::Bool(false),
			Primitive::Char => Self::Char('\0'),
			Primitive::Byte => Self::Byte(0),
			Primitive::Short => Self::Short(0),
			Primitive::Int => Self::Int(0),
			Primitive::Long => Self::Long(0),
			Primitive::Float => Self::Float(0.0),
			Primitive::Double => Self::Double(0.0),
		}
	}

	/// Returns the primitive a boxed variant carries.
	pub const fn primitive(&self) -> Option<Primitive> {
		Some(match self {
			Self::Bool(_) => Primitive::Boolean,
			Self::Char(_) => Primitive::Char,
			Self::Byte(_) => Primitive::Byte,
			Self::Short(_) => Primitive::Short,
			Self::Int(_) => Primitive::Int,
			Self::Long(_) => Primitive::Long,
			Self::Float(_) => Primitive::Float,
			Self::Double(_) => Primitive::Double,
			_ => return None,
		})
	}

	/// Resolves the runtime type of this value.
	pub fn runtime_type<'a>(&'a self, types: &'a TypeSystem) -> &'a TypeRef {
		match self {
			Self::Str(_) => types.string(),
			Self::Enum(e) => e.type_ref(),
			Self::Object(o) => o.type_ref(),
			Self::Bool(_) => types.boxed_of(Primitive::Boolean),
			Self::Char(_) => types.boxed_of(Primitive::Char),
			Self::Byte(_) => types.boxed_of(Primitive::Byte),
			Self::Short(_) => types.boxed_of(Primitive::Short),
			Self::Int(_) => types.boxed_of(Primitive::Int),
			Self::Long(_) => types.boxed_of(Primitive::Long),
			Self::Float(_) => types.boxed_of(Primitive::Float),
			Self::Double(_) => types.boxed_of(Primitive::Double),
		}
	}

	/// Returns true when this value can be used where `ty` is expected.
	pub fn is_instance_of(&self, ty: &TypeRef, types: &TypeSystem) -> bool {
		ty.is_assignable_from(self.runtime_type(types))
	}

	/// Textual representation, if the value has one.
	pub fn text(&self) -> Option<Cow<'_, str>> {
		Some(match self {
			Self::Bool(v) => Cow::Owned(v.to_string()),
			Self::Char(v) => Cow::Owned(v.to_string()),
			Self::Byte(v) => Cow::Owned(v.to_string()),
			Self::Short(v) => Cow::Owned(v.to_string()),
			Self::Int(v) => Cow::Owned(v.to_string()),
			Self::Long(v) => Cow::Owned(v.to_string()),
			Self::Float(v) => Cow::Owned(v.to_string()),
			Self::Double(v) => Cow::Owned(v.to_string()),
			Self::Str(s) => Cow::Borrowed(&**s),
			Self::Enum(e) => Cow::Borrowed(e.name()),
			Self::Object(o) => Cow::Owned(o.data.text()?),
		})
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Self::Bool(v) => Some(*v),
			_ => None,
		}
	}

	pub fn as_int(&self) -> Option<i32> {
		match self {
			Self::Int(v) => Some(*v),
			_ => None,
		}
	}

	pub fn as_long(&self) -> Option<i64> {
		match self {
			Self::Long(v) => Some(*v),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::Str(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_enum(&self) -> Option<&EnumConstant> {
		match self {
			Self::Enum(e) => Some(e),
			_ => None,
		}
	}

	pub fn as_object(&self) -> Option<&ObjectValue> {
		match self {
			Self::Object(o) => Some(o),
			_ => None,
		}
	}
}

impl PartialEq for Value {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Bool(a), Self::Bool(b)) => a == b,
			(Self::Char(a), Self::Char(b)) => a == b,
			(Self::Byte(a), Self::Byte(b)) => a == b,
			(Self::Short(a), Self::Short(b)) => a == b,
			(Self::Int(a), Self::Int(b)) => a == b,
			(Self::Long(a), Self::Long(b)) => a == b,
			(Self::Float(a), Self::Float(b)) => a == b,
			(Self::Double(a), Self::Double(b)) => a == b,
			(Self::Str(a), Self::Str(b)) => a == b,
			(Self::Enum(a), Self::Enum(b)) => a == b,
			(Self::Object(a), Self::Object(b)) => a.type_ref() == b.type_ref() && a.ptr_eq(b),
			_ => false,
		}
	}
}

macro_rules! impl_from {
	($($ty:ty => $variant:ident),* $(,)?) => {
		$(impl From<$ty> for Value {
			fn from(v: $ty) -> Self {
				Self::$variant(v)
			}
		})*
	};
}

impl_from! {
	bool => Bool,
	char => Char,
	i8 => Byte,
	i16 => Short,
	i32 => Int,
	i64 => Long,
	f32 => Float,
	f64 => Double,
	EnumConstant => Enum,
	ObjectValue => Object,
}

impl From<&str> for Value {
	fn from(v: &str) -> Self {
		Self::Str(v.into())
	}
}

impl From<String> for Value {
	fn from(v: String) -> Self {
		Self::Str(v.into())
	}
}
