//! Fallback converters.
//!
//! Fallbacks are generic converters tried, most recently registered first, whenever no
//! direct mapping produced a result. A successful promotable fallback is written into the
//! direct cache for the pair it just served.

use std::sync::Arc;

use transit_types::{TypeRef, TypeSystem, Value};

use crate::converter::{Context, Converted, Converter};
use crate::error::ConverterError;

/// One link of the fallback chain.
#[derive(Debug, Clone)]
pub struct Fallback {
	pub converter: Arc<dyn Converter>,
	pub can_promote: bool,
}

/// Converts anything with a textual representation to `String`.
///
/// Always last resort: it is registered first so later fallbacks run ahead of it, and it
/// refuses promotion.
#[derive(Debug)]
pub struct ToStringFallback {
	string: TypeRef,
}

impl ToStringFallback {
	pub fn new(types: &TypeSystem) -> Self {
		Self {
			string: types.string().clone(),
		}
	}
}

impl Converter for ToStringFallback {
	fn convert(&self, to: &TypeRef, _ctx: Option<&Context>, value: &Value) -> Result<Converted, ConverterError> {
		if *to != self.string {
			return Ok(Converted::Null);
		}
		Ok(value
			.text()
			.map(|text| Value::Str(Arc::from(text.as_ref())))
			.into())
	}

	fn promotable(&self) -> bool {
		false
	}
}
