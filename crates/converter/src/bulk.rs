//! Grouped, hand-optimized converter sets.
//!
//! A bulk set answers many pairs from one table. The dispatcher tries every set before the
//! direct cache, and the hierarchy search asks sets first through [`BulkConverters::lookup`].

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use transit_types::{Primitive, TypeRef, TypeSystem, Value};

use crate::converter::{Context, Converted, Converter};
use crate::error::ConverterError;
use crate::fast_path::parse_bool;

/// Placement of a bulk set in the dispatch order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Order {
	/// Inserted ahead of every registered set.
	Highest,
	#[default]
	Normal,
}

pub trait BulkConverters: Send + Sync + fmt::Debug {
	/// Converts when this set covers `from -> to`; `Ok(None)` when it does not.
	fn convert(
		&self,
		from: &TypeRef,
		to: &TypeRef,
		ctx: Option<&Context>,
		value: &Value,
	) -> Result<Option<Value>, ConverterError>;

	/// Returns the converter this set uses for `from -> to`.
	fn lookup(&self, from: &TypeRef, to: &TypeRef) -> Option<Arc<dyn Converter>>;

	/// Number of conversions the set covers.
	fn len(&self) -> usize;

	fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn order(&self) -> Order {
		Order::Normal
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scalar {
	Str,
	Prim(Primitive),
}

#[derive(Clone, Copy)]
enum Num {
	Int(i64),
	Float(f64),
}

/// One string/primitive conversion of the core set.
#[derive(Debug)]
struct ScalarConverter {
	from: Scalar,
	to: Scalar,
}

impl Converter for ScalarConverter {
	fn convert(&self, _to: &TypeRef, _ctx: Option<&Context>, value: &Value) -> Result<Converted, ConverterError> {
		let out = match (self.from, self.to) {
			(_, Scalar::Str) => value.text().map(|t| Value::Str(Arc::from(t.as_ref()))),
			(Scalar::Str, Scalar::Prim(p)) => match value.as_str() {
				Some(s) => Some(parse(p, s)?),
				None => return Err(ConverterError::msg(format!("expected text, got {value:?}"))),
			},
			(Scalar::Prim(_), Scalar::Prim(p)) => cast(p, value),
		};
		Ok(out.into())
	}
}

fn parse(p: Primitive, s: &str) -> Result<Value, ConverterError> {
	Ok(match p {
		Primitive::Boolean => Value::Bool(
			parse_bool(s).ok_or_else(|| ConverterError::msg(format!("not a boolean: {s}")))?,
		),
		Primitive::Char => {
			let mut chars = s.chars();
			match (chars.next(), chars.next()) {
				(Some(c), None) => Value::Char(c),
				_ => return Err(ConverterError::msg(format!("not a single character: {s}"))),
			}
		}
		Primitive::Byte => Value::Byte(s.parse().map_err(ConverterError::failed)?),
		Primitive::Short => Value::Short(s.parse().map_err(ConverterError::failed)?),
		Primitive::Int => Value::Int(s.parse().map_err(ConverterError::failed)?),
		Primitive::Long => Value::Long(s.parse().map_err(ConverterError::failed)?),
		Primitive::Float => Value::Float(s.parse().map_err(ConverterError::failed)?),
		Primitive::Double => Value::Double(s.parse().map_err(ConverterError::failed)?),
	})
}

fn cast(p: Primitive, value: &Value) -> Option<Value> {
	let n = match *value {
		Value::Byte(v) => Num::Int(v.into()),
		Value::Short(v) => Num::Int(v.into()),
		Value::Int(v) => Num::Int(v.into()),
		Value::Long(v) => Num::Int(v),
		Value::Float(v) => Num::Float(v.into()),
		Value::Double(v) => Num::Float(v),
		_ => return None,
	};
	Some(match (p, n) {
		(Primitive::Byte, Num::Int(i)) => Value::Byte(i as i8),
		(Primitive::Byte, Num::Float(f)) => Value::Byte(f as i8),
		(Primitive::Short, Num::Int(i)) => Value::Short(i as i16),
		(Primitive::Short, Num::Float(f)) => Value::Short(f as i16),
		(Primitive::Int, Num::Int(i)) => Value::Int(i as i32),
		(Primitive::Int, Num::Float(f)) => Value::Int(f as i32),
		(Primitive::Long, Num::Int(i)) => Value::Long(i),
		(Primitive::Long, Num::Float(f)) => Value::Long(f as i64),
		(Primitive::Float, Num::Int(i)) => Value::Float(i as f32),
		(Primitive::Float, Num::Float(f)) => Value::Float(f as f32),
		(Primitive::Double, Num::Int(i)) => Value::Double(i as f64),
		(Primitive::Double, Num::Float(f)) => Value::Double(f),
		(Primitive::Boolean | Primitive::Char, _) => return None,
	})
}

/// Core set: text to and from every primitive, plus conversions between numerics.
#[derive(Debug)]
pub struct CoreBulkConverters {
	converters: Vec<Arc<ScalarConverter>>,
	/// `(from id, to id)` to index into `converters`; targets are keyed both boxed and primitive.
	index: FxHashMap<(u32, u32), usize>,
}

impl CoreBulkConverters {
	pub fn new(types: &TypeSystem) -> Self {
		let mut pairs = Vec::new();
		for p in Primitive::ALL {
			pairs.push((Scalar::Str, Scalar::Prim(p)));
			pairs.push((Scalar::Prim(p), Scalar::Str));
			if p.is_numeric() {
				for q in Primitive::ALL.into_iter().filter(|q| q.is_numeric() && *q != p) {
					pairs.push((Scalar::Prim(p), Scalar::Prim(q)));
				}
			}
		}

		let mut converters = Vec::with_capacity(pairs.len());
		let mut index = FxHashMap::default();
		for (from, to) in pairs {
			let slot = converters.len();
			converters.push(Arc::new(ScalarConverter { from, to }));
			let from_id = match from {
				Scalar::Str => types.string().id(),
				Scalar::Prim(p) => types.boxed_of(p).id(),
			};
			match to {
				Scalar::Str => {
					index.insert((from_id, types.string().id()), slot);
				}
				Scalar::Prim(q) => {
					index.insert((from_id, types.boxed_of(q).id()), slot);
					index.insert((from_id, types.primitive(q).id()), slot);
				}
			}
		}
		Self { converters, index }
	}

	fn find(&self, from: &TypeRef, to: &TypeRef) -> Option<&Arc<ScalarConverter>> {
		let slot = *self.index.get(&(from.id(), to.id()))?;
		self.converters.get(slot)
	}
}

impl BulkConverters for CoreBulkConverters {
	fn convert(
		&self,
		from: &TypeRef,
		to: &TypeRef,
		ctx: Option<&Context>,
		value: &Value,
	) -> Result<Option<Value>, ConverterError> {
		let Some(converter) = self.find(from, to) else {
			return Ok(None);
		};
		match converter.convert(to, ctx, value)? {
			Converted::Value(v) => Ok(Some(v)),
			Converted::Null | Converted::Miss => Ok(None),
		}
	}

	fn lookup(&self, from: &TypeRef, to: &TypeRef) -> Option<Arc<dyn Converter>> {
		self.find(from, to).map(|c| c.clone() as Arc<dyn Converter>)
	}

	fn len(&self) -> usize {
		self.converters.len()
	}

	fn order(&self) -> Order {
		Order::Highest
	}
}
