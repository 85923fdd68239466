//! Text to enum constant conversion.

use heck::ToShoutySnakeCase;
use transit_types::{EnumConstant, TypeRef, Value};

use crate::converter::{Context, Converted, Converter};
use crate::error::ConverterError;

/// Resolves enum constants from text.
///
/// Matching is case-insensitive, first on the text as given and then on its
/// upper-snake normalization (`darkGreen` and `dark-green` both become `DARK_GREEN`).
/// Text that matches no constant is an error, not a miss.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnumConverter;

impl EnumConverter {
	pub fn resolve(&self, to: &TypeRef, text: &str) -> Option<EnumConstant> {
		find_constant(to, text).or_else(|| find_constant(to, &text.to_shouty_snake_case()))
	}
}

fn find_constant(ty: &TypeRef, text: &str) -> Option<EnumConstant> {
	let ordinal = ty
		.enum_constants()
		.iter()
		.position(|c| c.eq_ignore_ascii_case(text))?;
	EnumConstant::new(ty, ordinal as u32)
}

impl Converter for EnumConverter {
	fn convert(&self, to: &TypeRef, _ctx: Option<&Context>, value: &Value) -> Result<Converted, ConverterError> {
		if !to.is_enum() {
			return Ok(Converted::Null);
		}
		let Some(text) = value.text() else {
			return Ok(Converted::Null);
		};
		match self.resolve(to, &text) {
			Some(constant) => Ok(Converted::Value(Value::Enum(constant))),
			None => Err(ConverterError::msg(format!(
				"enum {to} does not have any constant with value: {text}"
			))),
		}
	}
}

#[cfg(test)]
mod tests {
	use rstest::rstest;
	use transit_types::TypeSystem;

	use super::*;

	#[rstest]
	#[case("RED", Some("RED"))]
	#[case("red", Some("RED"))]
	#[case("Dark_Green", Some("DARK_GREEN"))]
	#[case("darkGreen", Some("DARK_GREEN"))]
	#[case("dark-green", Some("DARK_GREEN"))]
	#[case("purple", None)]
	fn resolves_constants(#[case] text: &str, #[case] expected: Option<&str>) {
		let types = TypeSystem::new();
		let color = types.declare_enum("Color", &["RED", "DARK_GREEN"]).unwrap();
		let found = EnumConverter.resolve(&color, text);
		assert_eq!(found.as_ref().map(|c| c.name()), expected);
	}

	#[test]
	fn unmatched_text_is_an_error() {
		let types = TypeSystem::new();
		let color = types.declare_enum("Color", &["RED"]).unwrap();
		let err = EnumConverter.convert(&color, None, &Value::from("purple")).unwrap_err();
		assert!(err.to_string().contains("purple"));
	}

	#[test]
	fn non_enum_target_yields_no_result() {
		let types = TypeSystem::new();
		let out = EnumConverter.convert(types.string(), None, &Value::from("RED")).unwrap();
		assert_eq!(out, Converted::Null);
	}
}
