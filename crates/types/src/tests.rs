use pretty_assertions::assert_eq;
use proptest::prelude::*;

use crate::{EnumConstant, Object, ObjectValue, Primitive, TypeError, TypeKind, TypeSystem, Value};

#[derive(Debug)]
struct Apple;

impl Object for Apple {
	fn text(&self) -> Option<String> {
		Some("apple".into())
	}
}

#[test]
fn well_known_hierarchy() {
	let types = TypeSystem::new();
	let known = types.well_known();

	assert!(types.object().is_root());
	assert!(!types.string().is_root());
	assert!(known.char_sequence.is_assignable_from(types.string()));
	assert!(known.comparable.is_assignable_from(types.string()));

	let integer = types.boxed_of(Primitive::Int);
	assert_eq!(integer.supertype(), Some(&known.number));
	assert!(known.number.is_assignable_from(integer));
	assert!(!known.number.is_assignable_from(types.boxed_of(Primitive::Boolean)));
	assert_eq!(integer.boxed_primitive(), Some(Primitive::Int));
}

#[test]
fn primitives_only_assignable_from_themselves() {
	let types = TypeSystem::new();
	let int = types.primitive(Primitive::Int);
	let integer = types.boxed_of(Primitive::Int);

	assert!(int.is_assignable_from(int));
	assert!(!int.is_assignable_from(integer));
	assert!(!integer.is_assignable_from(int));
	assert!(!types.object().is_assignable_from(int));
	assert!(types.object().is_assignable_from(integer));
}

#[test]
fn boxing_round_trip() {
	let types = TypeSystem::new();
	for p in Primitive::ALL {
		let prim = types.primitive(p);
		let boxed = types.boxed(prim);
		assert_eq!(boxed.name(), p.boxed_name());
		assert_eq!(types.unboxed(boxed), Some(prim));
		assert_eq!(types.boxed(types.string()), types.string());
	}
}

#[test]
fn declared_classes_walk_interfaces_transitively() {
	let types = TypeSystem::new();
	let edible = types.declare_interface("Edible", &[]).unwrap();
	let food = types.declare_interface("Food", &[&edible]).unwrap();
	let fruit = types.declare_class("Fruit", None, &[&food]).unwrap();
	let apple = types.declare_class("Apple", Some(&fruit), &[]).unwrap();

	assert_eq!(apple.supertype(), Some(&fruit));
	assert_eq!(fruit.supertype(), Some(types.object()));
	assert!(edible.is_assignable_from(&apple));
	assert!(food.is_assignable_from(&apple));
	assert!(!apple.is_assignable_from(&fruit));
	assert_eq!(types.get("Apple"), Some(apple));
}

#[test]
fn declaration_errors() {
	let types = TypeSystem::new();
	let iface = types.declare_interface("Shape", &[]).unwrap();
	let int = types.primitive(Primitive::Int).clone();

	assert_eq!(
		types.declare_class("String", None, &[]),
		Err(TypeError::AlreadyDeclared("String".into()))
	);
	assert_eq!(
		types.declare_enum("Empty", &[]),
		Err(TypeError::EmptyEnum("Empty".into()))
	);
	assert!(matches!(
		types.declare_class("Circle", Some(&iface), &[]),
		Err(TypeError::InvalidSupertype { .. })
	));
	assert!(matches!(
		types.declare_class("Square", None, &[&int]),
		Err(TypeError::NotAnInterface { .. })
	));
}

#[test]
fn array_names_cannot_shadow_declared_types() {
	let types = TypeSystem::new();
	let widget = types.declare_class("Widget", None, &[]).unwrap();
	let impostor = types.declare_class("Widget[]", None, &[]).unwrap();

	assert!(matches!(types.array_of(&widget), Err(TypeError::AlreadyDeclared(name)) if name == "Widget[]"));
	assert_eq!(types.get("Widget[]"), Some(impostor));
}

#[test]
fn arrays_are_memoized() {
	let types = TypeSystem::new();
	let a = types.array_of(types.string()).unwrap();
	let b = types.array_of(types.string()).unwrap();

	assert_eq!(a, b);
	assert!(a.is_array());
	assert_eq!(a.name(), "String[]");
	assert_eq!(a.component(), Some(types.string()));
	assert!(types.object().is_assignable_from(&a));
}

#[test]
fn enum_constants() {
	let types = TypeSystem::new();
	let color = types.declare_enum("Color", &["RED", "GREEN"]).unwrap();

	assert_eq!(color.kind(), TypeKind::Enum);
	assert!(types.well_known().enum_base.is_assignable_from(&color));

	let green = EnumConstant::by_name(&color, "GREEN").unwrap();
	assert_eq!(green.ordinal(), 1);
	assert_eq!(green.name(), "GREEN");
	assert!(EnumConstant::new(&color, 2).is_none());
	assert!(EnumConstant::by_name(&color, "green").is_none());
}

#[test]
fn value_runtime_types() {
	let types = TypeSystem::new();
	let fruit = types.declare_class("Fruit", None, &[]).unwrap();
	let apple = ObjectValue::new(fruit.clone(), Apple);

	assert_eq!(Value::Int(1).runtime_type(&types), types.boxed_of(Primitive::Int));
	assert_eq!(Value::from("x").runtime_type(&types), types.string());
	assert_eq!(Value::from(apple.clone()).runtime_type(&types), &fruit);
	assert!(Value::from(apple.clone()).is_instance_of(types.object(), &types));
	assert!(!Value::Int(1).is_instance_of(types.primitive(Primitive::Int), &types));

	assert_eq!(Value::from(apple.clone()).text().as_deref(), Some("apple"));
	assert!(apple.downcast_ref::<Apple>().is_some());
}

#[test]
fn primitive_zero_values() {
	assert_eq!(Value::zero(Primitive::Boolean), Value::Bool(false));
	assert_eq!(Value::zero(Primitive::Int), Value::Int(0));
	assert_eq!(Value::zero(Primitive::Double), Value::Double(0.0));
	assert_eq!(Value::zero(Primitive::Char), Value::Char('\0'));
}

proptest! {
	#[test]
	fn long_text_parses_back(n in any::<i64>()) {
		let value = Value::Long(n);
		let text = value.text().unwrap();
		prop_assert_eq!(text.parse::<i64>().unwrap(), n);
	}

	#[test]
	fn class_chain_assignability(depth in 1usize..12) {
		let types = TypeSystem::new();
		let mut chain = vec![types.object().clone()];
		for i in 0..depth {
			let parent = chain.last().cloned();
			chain.push(types.declare_class(&format!("C{i}"), parent.as_ref(), &[]).unwrap());
		}
		let leaf = chain.last().unwrap();
		for ancestor in &chain {
			prop_assert!(ancestor.is_assignable_from(leaf));
		}
		prop_assert!(!leaf.is_assignable_from(&chain[depth - 1]));
	}
}
