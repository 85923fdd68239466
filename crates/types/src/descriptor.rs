//! Interned runtime type descriptors.
//!
//! # Role
//!
//! A [`TypeRef`] is the identity of one runtime type inside a [`crate::TypeSystem`]. It
//! carries the supertype link and the directly implemented interfaces, so hierarchy walks
//! never go back through the owning system.
//!
//! # Invariants
//!
//! - Equality and hashing use the dense id assigned at declaration, never the name.
//! - The hierarchy is acyclic: parents must exist before a child can name them.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// The eight primitive kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
	Boolean,
	Char,
	Byte,
	Short,
	Int,
	Long,
	Float,
	Double,
}

impl Primitive {
	pub const ALL: [Primitive; 8] = [
		Primitive::Boolean,
		Primitive::Char,
		Primitive::Byte,
		Primitive::Short,
		Primitive::Int,
		Primitive::Long,
		Primitive::Float,
		Primitive::Double,
	];

	/// Returns the primitive type name (`int`, `boolean`, ...).
	pub const fn name(self) -> &'static str {
		match self {
			Self::Boolean => "boolean",
			Self::Char => "char",
			Self::Byte => "byte",
			Self::Short => "short",
			Self::Int => "int",
			Self::Long => "long",
			Self::Float => "float",
			Self::Double => "double",
		}
	}

	/// Returns the name of the boxed equivalent (`Integer`, `Boolean`, ...).
	pub const fn boxed_name(self) -> &'static str {
		match self {
			Self::Boolean => "Boolean",
			Self::Char => "Character",
			Self::Byte => "Byte",
			Self::Short => "Short",
			Self::Int => "Integer",
			Self::Long => "Long",
			Self::Float => "Float",
			Self::Double => "Double",
		}
	}

	/// Returns true for the six numeric kinds.
	pub const fn is_numeric(self) -> bool {
		!matches!(self, Self::Boolean | Self::Char)
	}

	pub(crate) const fn index(self) -> usize {
		self as usize
	}
}

impl fmt::Display for Primitive {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// Classification of a declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
	Class,
	Interface,
	Enum,
	Array,
	Primitive(Primitive),
}

pub(crate) struct TypeDescriptor {
	pub(crate) id: u32,
	pub(crate) name: Box<str>,
	pub(crate) kind: TypeKind,
	pub(crate) supertype: Option<TypeRef>,
	pub(crate) interfaces: Box<[TypeRef]>,
	/// Enum constants in ordinal order; empty for every other kind.
	pub(crate) constants: Box<[Box<str>]>,
	/// Element type for arrays.
	pub(crate) component: Option<TypeRef>,
	/// Set on the boxed class of a primitive.
	pub(crate) boxes: Option<Primitive>,
}

/// Shared handle to an interned type descriptor.
#[derive(Clone)]
pub struct TypeRef(pub(crate) Arc<TypeDescriptor>);

impl TypeRef {
	/// Returns the dense id assigned by the owning type system.
	#[inline]
	pub fn id(&self) -> u32 {
		self.0.id
	}

	pub fn name(&self) -> &str {
		&self.0.name
	}

	#[inline]
	pub fn kind(&self) -> TypeKind {
		self.0.kind
	}

	/// Returns the immediate supertype. Interfaces, primitives and the root have none.
	#[inline]
	pub fn supertype(&self) -> Option<&TypeRef> {
		self.0.supertype.as_ref()
	}

	/// Returns the directly implemented (or extended, for interfaces) interfaces.
	#[inline]
	pub fn interfaces(&self) -> &[TypeRef] {
		&self.0.interfaces
	}

	#[inline]
	pub fn is_primitive(&self) -> bool {
		matches!(self.0.kind, TypeKind::Primitive(_))
	}

	#[inline]
	pub fn is_enum(&self) -> bool {
		self.0.kind == TypeKind::Enum
	}

	#[inline]
	pub fn is_array(&self) -> bool {
		self.0.kind == TypeKind::Array
	}

	#[inline]
	pub fn is_interface(&self) -> bool {
		self.0.kind == TypeKind::Interface
	}

	/// Returns true for the universal root type.
	#[inline]
	pub fn is_root(&self) -> bool {
		self.0.kind == TypeKind::Class && self.0.supertype.is_none()
	}

	/// Returns the primitive kind when this is a primitive type.
	pub fn primitive(&self) -> Option<Primitive> {
		match self.0.kind {
			TypeKind::Primitive(p) => Some(p),
			_ => None,
		}
	}

	/// Returns the primitive this class boxes, if any.
	pub fn boxed_primitive(&self) -> Option<Primitive> {
		self.0.boxes
	}

	pub fn enum_constants(&self) -> &[Box<str>] {
		&self.0.constants
	}

	/// Returns the element type of an array type.
	pub fn component(&self) -> Option<&TypeRef> {
		self.0.component.as_ref()
	}

	/// Returns true when a value of type `other` can be used where `self` is expected.
	///
	/// Primitives are only assignable from themselves; the root accepts every
	/// non-primitive type.
	pub fn is_assignable_from(&self, other: &TypeRef) -> bool {
		if self == other {
			return true;
		}
		if self.is_primitive() || other.is_primitive() {
			return false;
		}
		if self.is_root() {
			return true;
		}
		other.inherits(self)
	}

	fn inherits(&self, target: &TypeRef) -> bool {
		if let Some(sup) = &self.0.supertype
			&& (sup == target || sup.inherits(target))
		{
			return true;
		}
		self.0
			.interfaces
			.iter()
			.any(|iface| iface == target || iface.inherits(target))
	}
}

impl PartialEq for TypeRef {
	#[inline]
	fn eq(&self, other: &Self) -> bool {
		self.0.id == other.0.id
	}
}

impl Eq for TypeRef {}

impl Hash for TypeRef {
	#[inline]
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.0.id.hash(state);
	}
}

impl fmt::Display for TypeRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0.name)
	}
}

impl fmt::Debug for TypeRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "TypeRef({}#{})", self.0.name, self.0.id)
	}
}
