//! Hand-written rules for the hottest conversions.
//!
//! Consulted after the same-instance check and before any table lookup. None of these
//! rules touch the cache or the statistics.

use std::sync::Arc;

use transit_types::{Primitive, TypeRef, TypeSystem, Value};

use crate::converter::{Converted, Converter};
use crate::enums::EnumConverter;
use crate::error::ConverterError;

pub(crate) enum FastPath {
	Hit(Value),
	Fail(ConverterError),
	Pass,
}

/// Literal `true` / `false`, ignoring case.
pub fn parse_bool(text: &str) -> Option<bool> {
	match text.len() {
		4 if text.eq_ignore_ascii_case("true") => Some(true),
		5 if text.eq_ignore_ascii_case("false") => Some(false),
		_ => None,
	}
}

pub(crate) fn apply(types: &TypeSystem, enums: &EnumConverter, to: &TypeRef, value: &Value) -> FastPath {
	if let Some(p) = to.primitive() {
		if p == Primitive::Boolean {
			return match value {
				Value::Bool(b) => FastPath::Hit(Value::Bool(*b)),
				Value::Str(s) => match parse_bool(s) {
					Some(b) => FastPath::Hit(Value::Bool(b)),
					None => FastPath::Fail(cannot_coerce_to_boolean(types, value)),
				},
				_ => FastPath::Fail(cannot_coerce_to_boolean(types, value)),
			};
		}
		// Boxed value for its own primitive passes through unchanged.
		if value.primitive() == Some(p) {
			return FastPath::Hit(value.clone());
		}
		return FastPath::Pass;
	}

	if to.boxed_primitive() == Some(Primitive::Boolean) {
		if let Value::Str(s) = value
			&& let Some(b) = parse_bool(s)
		{
			return FastPath::Hit(Value::Bool(b));
		}
		return FastPath::Pass;
	}

	if to == types.string() {
		if value.primitive().is_some()
			&& let Some(text) = value.text()
		{
			return FastPath::Hit(Value::Str(Arc::from(text.as_ref())));
		}
		return FastPath::Pass;
	}

	if to.is_enum() {
		return match enums.convert(to, None, value) {
			Ok(Converted::Value(v)) => FastPath::Hit(v),
			Ok(_) => FastPath::Pass,
			Err(e) => FastPath::Fail(e),
		};
	}

	FastPath::Pass
}

fn cannot_coerce_to_boolean(types: &TypeSystem, value: &Value) -> ConverterError {
	ConverterError::msg(format!(
		"cannot convert type: {} to boolean",
		value.runtime_type(types)
	))
}
