//! Owned table of declared types.
//!
//! # Role
//!
//! One [`TypeSystem`] exists per engine instance. It pre-declares the well-known types
//! (root, strings, primitives and their boxed classes) and interns user declarations by
//! name so every distinct runtime type maps to exactly one [`TypeRef`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::descriptor::{Primitive, TypeDescriptor, TypeKind, TypeRef};
use crate::error::TypeError;

/// Types every [`TypeSystem`] declares up front.
#[derive(Debug, Clone)]
pub struct WellKnown {
	pub object: TypeRef,
	pub char_sequence: TypeRef,
	pub comparable: TypeRef,
	pub number: TypeRef,
	pub enum_base: TypeRef,
	pub string: TypeRef,
	primitives: [TypeRef; 8],
	boxed: [TypeRef; 8],
}

impl WellKnown {
	#[inline]
	pub fn primitive(&self, p: Primitive) -> &TypeRef {
		&self.primitives[p.index()]
	}

	#[inline]
	pub fn boxed(&self, p: Primitive) -> &TypeRef {
		&self.boxed[p.index()]
	}
}

struct Draft<'a> {
	name: &'a str,
	kind: TypeKind,
	supertype: Option<TypeRef>,
	interfaces: Vec<TypeRef>,
	constants: Vec<Box<str>>,
	component: Option<TypeRef>,
	boxes: Option<Primitive>,
}

impl<'a> Draft<'a> {
	fn new(name: &'a str, kind: TypeKind) -> Self {
		Self {
			name,
			kind,
			supertype: None,
			interfaces: Vec::new(),
			constants: Vec::new(),
			component: None,
			boxes: None,
		}
	}

	fn finish(self, id: u32) -> TypeRef {
		TypeRef(Arc::new(TypeDescriptor {
			id,
			name: self.name.into(),
			kind: self.kind,
			supertype: self.supertype,
			interfaces: self.interfaces.into_boxed_slice(),
			constants: self.constants.into_boxed_slice(),
			component: self.component,
			boxes: self.boxes,
		}))
	}
}

/// Interning table for runtime types.
pub struct TypeSystem {
	by_name: RwLock<FxHashMap<Box<str>, TypeRef>>,
	arrays: RwLock<FxHashMap<u32, TypeRef>>,
	next_id: AtomicU32,
	known: WellKnown,
}

impl Default for TypeSystem {
	fn default() -> Self {
		Self::new()
	}
}

impl TypeSystem {
	/// Creates a type system holding only the well-known types.
	pub fn new() -> Self {
		let mut next = 0u32;
		let mut by_name = FxHashMap::default();
		let mut put = |draft: Draft<'_>| {
			let ty = draft.finish(next);
			next += 1;
			by_name.insert(Box::from(ty.name()), ty.clone());
			ty
		};

		let object = put(Draft::new("Object", TypeKind::Class));
		let char_sequence = put(Draft::new("CharSequence", TypeKind::Interface));
		let comparable = put(Draft::new("Comparable", TypeKind::Interface));

		let class = |name, interfaces: Vec<TypeRef>, sup: &TypeRef| Draft {
			supertype: Some(sup.clone()),
			interfaces,
			..Draft::new(name, TypeKind::Class)
		};

		let number = put(class("Number", Vec::new(), &object));
		let enum_base = put(class("Enum", vec![comparable.clone()], &object));
		let string = put(class(
			"String",
			vec![char_sequence.clone(), comparable.clone()],
			&object,
		));

		let primitives =
			Primitive::ALL.map(|p| put(Draft::new(p.name(), TypeKind::Primitive(p))));
		let boxed = Primitive::ALL.map(|p| {
			let parent = if p.is_numeric() { &number } else { &object };
			put(Draft {
				boxes: Some(p),
				..class(p.boxed_name(), vec![comparable.clone()], parent)
			})
		});

		Self {
			by_name: RwLock::new(by_name),
			arrays: RwLock::new(FxHashMap::default()),
			next_id: AtomicU32::new(next),
			known: WellKnown {
				object,
				char_sequence,
				comparable,
				number,
				enum_base,
				string,
				primitives,
				boxed,
			},
		}
	}

	#[inline]
	pub fn well_known(&self) -> &WellKnown {
		&self.known
	}

	/// Returns the universal root type.
	#[inline]
	pub fn object(&self) -> &TypeRef {
		&self.known.object
	}

	#[inline]
	pub fn string(&self) -> &TypeRef {
		&self.known.string
	}

	#[inline]
	pub fn primitive(&self, p: Primitive) -> &TypeRef {
		self.known.primitive(p)
	}

	#[inline]
	pub fn boxed_of(&self, p: Primitive) -> &TypeRef {
		self.known.boxed(p)
	}

	/// Maps a primitive to its boxed class; any other type maps to itself.
	#[inline]
	pub fn boxed<'a>(&'a self, ty: &'a TypeRef) -> &'a TypeRef {
		match ty.primitive() {
			Some(p) => self.known.boxed(p),
			None => ty,
		}
	}

	/// Maps a boxed class back to its primitive.
	pub fn unboxed(&self, ty: &TypeRef) -> Option<&TypeRef> {
		ty.boxed_primitive().map(|p| self.known.primitive(p))
	}

	pub fn get(&self, name: &str) -> Option<TypeRef> {
		self.by_name.read().get(name).cloned()
	}

	/// Returns the number of declared types, arrays included.
	pub fn len(&self) -> usize {
		self.by_name.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Declares a class. A missing supertype defaults to the root.
	pub fn declare_class(
		&self,
		name: &str,
		supertype: Option<&TypeRef>,
		interfaces: &[&TypeRef],
	) -> Result<TypeRef, TypeError> {
		let supertype = supertype.unwrap_or(&self.known.object);
		if supertype.is_primitive() || supertype.is_interface() || supertype.is_array() {
			return Err(TypeError::InvalidSupertype {
				name: name.to_string(),
				supertype: supertype.name().to_string(),
			});
		}
		let interfaces = self.interface_list(name, interfaces)?;
		self.insert(Draft {
			supertype: Some(supertype.clone()),
			interfaces,
			..Draft::new(name, TypeKind::Class)
		})
	}

	/// Declares an interface extending `supers`.
	pub fn declare_interface(&self, name: &str, supers: &[&TypeRef]) -> Result<TypeRef, TypeError> {
		let interfaces = self.interface_list(name, supers)?;
		self.insert(Draft {
			interfaces,
			..Draft::new(name, TypeKind::Interface)
		})
	}

	/// Declares an enum with its constants in ordinal order.
	pub fn declare_enum(&self, name: &str, constants: &[&str]) -> Result<TypeRef, TypeError> {
		if constants.is_empty() {
			return Err(TypeError::EmptyEnum(name.to_string()));
		}
		self.insert(Draft {
			supertype: Some(self.known.enum_base.clone()),
			constants: constants.iter().map(|c| Box::from(*c)).collect(),
			..Draft::new(name, TypeKind::Enum)
		})
	}

	/// Returns the array type for `component`, declaring it on first use. Fails when the
	/// array name is already taken by a declared type.
	pub fn array_of(&self, component: &TypeRef) -> Result<TypeRef, TypeError> {
		if let Some(ty) = self.arrays.read().get(&component.id()) {
			return Ok(ty.clone());
		}
		let mut arrays = self.arrays.write();
		if let Some(ty) = arrays.get(&component.id()) {
			return Ok(ty.clone());
		}
		let name = format!("{}[]", component.name());
		let mut by_name = self.by_name.write();
		if by_name.contains_key(name.as_str()) {
			return Err(TypeError::AlreadyDeclared(name));
		}
		let draft = Draft {
			supertype: Some(self.known.object.clone()),
			component: Some(component.clone()),
			..Draft::new(&name, TypeKind::Array)
		};
		let ty = draft.finish(self.next_id.fetch_add(1, Ordering::Relaxed));
		by_name.insert(Box::from(ty.name()), ty.clone());
		arrays.insert(component.id(), ty.clone());
		Ok(ty)
	}

	fn interface_list(&self, name: &str, interfaces: &[&TypeRef]) -> Result<Vec<TypeRef>, TypeError> {
		interfaces
			.iter()
			.map(|iface| {
				if iface.is_interface() {
					Ok((*iface).clone())
				} else {
					Err(TypeError::NotAnInterface {
						name: name.to_string(),
						interface: iface.name().to_string(),
					})
				}
			})
			.collect()
	}

	fn insert(&self, draft: Draft<'_>) -> Result<TypeRef, TypeError> {
		let mut by_name = self.by_name.write();
		if by_name.contains_key(draft.name) {
			return Err(TypeError::AlreadyDeclared(draft.name.to_string()));
		}
		let ty = draft.finish(self.next_id.fetch_add(1, Ordering::Relaxed));
		by_name.insert(Box::from(ty.name()), ty.clone());
		Ok(ty)
	}
}

impl std::fmt::Debug for TypeSystem {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("TypeSystem")
			.field("types", &self.len())
			.finish()
	}
}
