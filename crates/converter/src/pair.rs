use std::fmt;

use transit_types::TypeRef;

/// Identifies one conversion: source runtime type to target type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypePair {
	from: TypeRef,
	to: TypeRef,
}

impl TypePair {
	pub fn new(from: TypeRef, to: TypeRef) -> Self {
		Self { from, to }
	}

	#[inline]
	pub fn from(&self) -> &TypeRef {
		&self.from
	}

	#[inline]
	pub fn to(&self) -> &TypeRef {
		&self.to
	}

	pub fn into_parts(self) -> (TypeRef, TypeRef) {
		(self.from, self.to)
	}
}

impl fmt::Display for TypePair {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} -> {}", self.from, self.to)
	}
}
