//! Conversion entry points.
//!
//! All three call shapes share [`TypeConverterRegistry::dispatch`]; they differ only in how a
//! missing result and a converter failure are reported.

use std::sync::Arc;

use tracing::{debug, trace};
use transit_types::{TypeRef, Value};

use super::TypeConverterRegistry;
use super::cache::Slot;
use crate::converter::{Context, Converted, Converter};
use crate::error::{ConvertError, ConverterError, TypeConversionError, render_value};
use crate::fast_path::{self, FastPath};
use crate::pair::TypePair;
use crate::statistics::Event;

enum Outcome {
	Value(Value),
	/// Null input, or a legitimate null from a converter that allows it.
	Null,
	Miss,
}

/// Result of offering a value to one converter.
enum Step {
	Done(Outcome),
	Continue,
}

fn offer(converter: &Arc<dyn Converter>, to: &TypeRef, ctx: Option<&Context>, value: &Value) -> Result<Step, ConverterError> {
	Ok(match converter.convert(to, ctx, value)? {
		Converted::Value(v) => Step::Done(Outcome::Value(v)),
		Converted::Null if converter.allows_null() => Step::Done(Outcome::Null),
		Converted::Null => Step::Continue,
		Converted::Miss => Step::Done(Outcome::Miss),
	})
}

impl TypeConverterRegistry {
	/// Converts `value` to `to`.
	///
	/// Returns `Ok(None)` when nothing could convert the value or a converter legitimately
	/// produced null. A null input yields the zero value for primitive targets.
	pub fn convert(&self, to: &TypeRef, ctx: Option<&Context>, value: Option<&Value>) -> Result<Option<Value>, ConvertError> {
		Ok(match self.dispatch(to, ctx, value, false)? {
			Outcome::Value(v) => Some(v),
			Outcome::Null | Outcome::Miss => None,
		})
	}

	/// Like [`Self::convert`], but a missing result is an error.
	///
	/// `Ok(None)` is returned only when a converter that allows null produced null.
	pub fn mandatory_convert(
		&self,
		to: &TypeRef,
		ctx: Option<&Context>,
		value: Option<&Value>,
	) -> Result<Option<Value>, ConvertError> {
		match self.dispatch(to, ctx, value, false)? {
			Outcome::Value(v) => Ok(Some(v)),
			Outcome::Null if value.is_some() => Ok(None),
			Outcome::Null | Outcome::Miss => Err(ConvertError::NoConversionAvailable {
				value: render_value(value),
				from: value.map_or_else(
					|| "null".to_string(),
					|v| v.runtime_type(&self.inner.types).name().to_string(),
				),
				to: to.clone(),
			}),
		}
	}

	/// Best-effort conversion: converter failures are swallowed and reported as `None`.
	///
	/// Only a failed lazy load is still an error.
	pub fn try_convert(&self, to: &TypeRef, ctx: Option<&Context>, value: Option<&Value>) -> Result<Option<Value>, ConvertError> {
		Ok(match self.dispatch(to, ctx, value, true)? {
			Outcome::Value(v) => Some(v),
			Outcome::Null | Outcome::Miss => None,
		})
	}

	fn dispatch(&self, to: &TypeRef, ctx: Option<&Context>, value: Option<&Value>, swallow: bool) -> Result<Outcome, ConvertError> {
		self.ensure_loaded()?;
		let inner = &self.inner;

		let Some(value) = value else {
			inner.stats.record(Event::Noop);
			return Ok(match to.primitive() {
				Some(p) => Outcome::Value(Value::zero(p)),
				None => Outcome::Null,
			});
		};
		if value.is_instance_of(to, &inner.types) {
			inner.stats.record(Event::Noop);
			return Ok(Outcome::Value(value.clone()));
		}

		let from = value.runtime_type(&inner.types).clone();
		match fast_path::apply(&inner.types, &inner.enums, to, value) {
			FastPath::Hit(v) => return Ok(Outcome::Value(v)),
			FastPath::Fail(_) if swallow => return Ok(Outcome::Miss),
			FastPath::Fail(e) => return Err(wrap_failure(&from, to, value, e)),
			FastPath::Pass => {}
		}

		inner.stats.record(Event::Attempt);
		trace!(from = %from, to = %to, "finding type converter");
		match self.resolve(&from, to, ctx, value) {
			Ok(outcome) => {
				inner.stats.record(match outcome {
					Outcome::Miss => Event::Miss,
					Outcome::Value(_) | Outcome::Null => Event::Hit,
				});
				Ok(outcome)
			}
			Err(e) => {
				inner.stats.record(Event::Failure);
				if swallow {
					trace!(from = %from, to = %to, error = %e, "ignoring failed conversion");
					return Ok(Outcome::Miss);
				}
				Err(wrap_failure(&from, to, value, e))
			}
		}
	}

	fn resolve(&self, from: &TypeRef, to: &TypeRef, ctx: Option<&Context>, value: &Value) -> Result<Outcome, ConverterError> {
		let inner = &self.inner;

		for set in inner.bulk.load().iter() {
			if let Some(v) = set.convert(from, to, ctx, value)? {
				trace!(bulk = ?set, from = %from, to = %to, "converted by bulk converters");
				return Ok(Outcome::Value(v));
			}
		}

		let target = inner.types.boxed(to).clone();
		let pair = TypePair::new(from.clone(), target.clone());
		let converter = match inner.cache.get(&pair) {
			Some(Slot::Converter { converter, .. }) => Some(converter),
			Some(Slot::Miss) => None,
			None => match self.search(from, to, false) {
				Some(converter) => {
					inner.cache.insert_derived(pair.clone(), converter.clone());
					Some(converter)
				}
				None => {
					inner.cache.insert_miss(pair.clone());
					None
				}
			},
		};

		if let Some(converter) = converter {
			trace!(converter = ?converter, pair = %pair, "using type converter");
			if let Step::Done(outcome) = offer(&converter, &target, ctx, value)? {
				return Ok(outcome);
			}
		}

		self.run_fallbacks(&pair, to, ctx, value)
	}

	fn run_fallbacks(&self, pair: &TypePair, to: &TypeRef, ctx: Option<&Context>, value: &Value) -> Result<Outcome, ConverterError> {
		for fallback in self.inner.fallbacks.load().iter() {
			match offer(&fallback.converter, to, ctx, value)? {
				Step::Done(Outcome::Value(v)) => {
					if fallback.can_promote {
						debug!(
							pair = %pair,
							converter = ?fallback.converter,
							"promoting fallback type converter"
						);
						self.inner.cache.insert_derived(pair.clone(), fallback.converter.clone());
					}
					trace!(converter = ?fallback.converter, pair = %pair, "converted by fallback");
					return Ok(Outcome::Value(v));
				}
				Step::Done(outcome) => return Ok(outcome),
				Step::Continue => {}
			}
		}
		Ok(Outcome::Miss)
	}
}

fn wrap_failure(from: &TypeRef, to: &TypeRef, value: &Value, error: ConverterError) -> ConvertError {
	match error {
		ConverterError::Conversion(e) if e.to == *to => ConvertError::ConversionFailed(e),
		ConverterError::Conversion(e) => ConvertError::ConversionFailed(TypeConversionError::new(
			Some(value),
			Some(from.clone()),
			to,
			Some(Box::new(e)),
		)),
		ConverterError::Execution(source) => ConvertError::Execution { to: to.clone(), source },
		ConverterError::Failed(cause) => {
			ConvertError::ConversionFailed(TypeConversionError::new(Some(value), Some(from.clone()), to, Some(cause)))
		}
	}
}
