#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use transit_types::{Object, ObjectValue, TypeRef, TypeSystem, Value};

use super::TypeConverterRegistry;
use crate::bulk::BulkConverters;
use crate::converter::{Context, Converted, Converter, converter_fn};
use crate::error::ConverterError;

#[derive(Debug)]
pub(crate) struct Payload(pub &'static str);

impl Object for Payload {
	fn text(&self) -> Option<String> {
		Some(self.0.to_string())
	}
}

/// `Dog extends Animal implements Named`, plus an unrelated `Tag` class and `Opaque` interface.
pub(crate) struct Zoo {
	pub types: Arc<TypeSystem>,
	pub named: TypeRef,
	pub opaque: TypeRef,
	pub animal: TypeRef,
	pub dog: TypeRef,
	pub tag: TypeRef,
}

impl Zoo {
	pub fn new() -> Self {
		let types = Arc::new(TypeSystem::new());
		let named = types.declare_interface("Named", &[]).unwrap();
		let opaque = types.declare_interface("Opaque", &[]).unwrap();
		let animal = types.declare_class("Animal", None, &[]).unwrap();
		let dog = types.declare_class("Dog", Some(&animal), &[&named]).unwrap();
		let tag = types.declare_class("Tag", None, &[]).unwrap();
		Self {
			types,
			named,
			opaque,
			animal,
			dog,
			tag,
		}
	}

	pub fn registry(&self) -> TypeConverterRegistry {
		TypeConverterRegistry::builder(self.types.clone()).statistics(true).build()
	}

	pub fn dog(&self, name: &'static str) -> Value {
		Value::Object(ObjectValue::new(self.dog.clone(), Payload(name)))
	}

	pub fn tag(&self, name: &'static str) -> Value {
		Value::Object(ObjectValue::new(self.tag.clone(), Payload(name)))
	}
}

/// Converter that always produces a clone of `value`.
pub(crate) fn returning(value: Value) -> Arc<dyn Converter> {
	Arc::new(converter_fn("returning", move |_, _, _| Ok(Converted::Value(value.clone()))))
}

/// Converter that counts its calls and answers `out`.
pub(crate) fn counting(calls: Arc<AtomicUsize>, out: Converted) -> Arc<dyn Converter> {
	Arc::new(converter_fn("counting", move |_, _, _| {
		calls.fetch_add(1, Ordering::SeqCst);
		Ok(out.clone())
	}))
}

/// Bulk set that converts nothing and counts how often the hierarchy search consults it.
#[derive(Debug, Default)]
pub(crate) struct CountingBulk {
	pub lookups: AtomicUsize,
}

impl CountingBulk {
	pub fn lookups(&self) -> usize {
		self.lookups.load(Ordering::SeqCst)
	}
}

impl BulkConverters for CountingBulk {
	fn convert(
		&self,
		_from: &TypeRef,
		_to: &TypeRef,
		_ctx: Option<&Context>,
		_value: &Value,
	) -> Result<Option<Value>, ConverterError> {
		Ok(None)
	}

	fn lookup(&self, _from: &TypeRef, _to: &TypeRef) -> Option<Arc<dyn Converter>> {
		self.lookups.fetch_add(1, Ordering::SeqCst);
		None
	}

	fn len(&self) -> usize {
		0
	}
}
