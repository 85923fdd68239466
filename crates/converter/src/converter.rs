//! The converter capability.
//!
//! # Role
//!
//! Every conversion routine, whether registered for one exact [`crate::TypePair`] or used
//! as a fallback, implements [`Converter`]. Loaders build them directly (structs or
//! closures through [`converter_fn`]).
//!
//! # Null semantics
//!
//! [`Converted::Null`] means "no result". The dispatcher only treats it as a legitimate
//! null when [`Converter::allows_null`] is true; otherwise it keeps searching.
//! [`Converted::Miss`] is the definite-miss signal: the search stops immediately.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use transit_types::{TypeRef, Value};

use crate::error::ConverterError;
use crate::registry::WeakRegistry;

/// Per-call context handed through to converters (typically the message being routed).
pub type Context = dyn Any + Send + Sync;

/// Result of a single converter invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Converted {
	Value(Value),
	/// No result. Legitimate only for converters that allow null.
	Null,
	/// Definite miss: no conversion is possible, stop searching.
	Miss,
}

impl From<Value> for Converted {
	fn from(value: Value) -> Self {
		Self::Value(value)
	}
}

impl From<Option<Value>> for Converted {
	fn from(value: Option<Value>) -> Self {
		value.map_or(Self::Null, Self::Value)
	}
}

/// A conversion routine.
pub trait Converter: Send + Sync + fmt::Debug {
	/// Converts `value` to `to`.
	fn convert(&self, to: &TypeRef, ctx: Option<&Context>, value: &Value) -> Result<Converted, ConverterError>;

	/// Whether [`Converted::Null`] from this converter is a legitimate result.
	fn allows_null(&self) -> bool {
		false
	}

	/// Whether this converter may be promoted from the fallback chain into the direct cache.
	///
	/// Catch-all converters return false so they never claim every pair they touch.
	fn promotable(&self) -> bool {
		true
	}

	fn registry_aware(&self) -> Option<&dyn RegistryAware> {
		None
	}

	fn context_aware(&self) -> Option<&dyn ContextAware> {
		None
	}
}

/// Converters that perform nested conversions receive a registry handle at registration.
pub trait RegistryAware {
	fn set_registry(&self, registry: WeakRegistry);
}

/// Converters that need the engine context receive it at registration.
pub trait ContextAware {
	fn set_context(&self, context: Arc<Context>);
}

/// A converter backed by a closure.
pub struct FnConverter<F> {
	name: &'static str,
	allow_null: bool,
	f: F,
}

/// Builds a converter from a closure.
pub fn converter_fn<F>(name: &'static str, f: F) -> FnConverter<F>
where
	F: Fn(&TypeRef, Option<&Context>, &Value) -> Result<Converted, ConverterError> + Send + Sync + 'static,
{
	FnConverter {
		name,
		allow_null: false,
		f,
	}
}

impl<F> FnConverter<F> {
	/// Marks [`Converted::Null`] results as legitimate.
	pub fn allow_null(mut self) -> Self {
		self.allow_null = true;
		self
	}
}

impl<F> fmt::Debug for FnConverter<F> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FnConverter")
			.field("name", &self.name)
			.field("allow_null", &self.allow_null)
			.finish()
	}
}

impl<F> Converter for FnConverter<F>
where
	F: Fn(&TypeRef, Option<&Context>, &Value) -> Result<Converted, ConverterError> + Send + Sync + 'static,
{
	fn convert(&self, to: &TypeRef, ctx: Option<&Context>, value: &Value) -> Result<Converted, ConverterError> {
		(self.f)(to, ctx, value)
	}

	fn allows_null(&self) -> bool {
		self.allow_null
	}
}
