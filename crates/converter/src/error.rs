use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use transit_types::{TypeRef, Value};

/// Boxed cause carried by converter and loader failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Longest value rendering embedded in an error message.
pub const MAX_VALUE_CHARS: usize = 256;

pub(crate) fn render_value(value: Option<&Value>) -> String {
	let Some(value) = value else {
		return "null".to_string();
	};
	match value.text() {
		Some(text) if text.chars().count() > MAX_VALUE_CHARS => {
			let mut out: String = text.chars().take(MAX_VALUE_CHARS).collect();
			out.push_str("...");
			out
		}
		Some(text) => text.into_owned(),
		None => format!("{value:?}"),
	}
}

/// A conversion that was attempted and failed.
#[derive(Error, Debug)]
pub struct TypeConversionError {
	/// Rendered value, truncated to [`MAX_VALUE_CHARS`].
	pub value: String,
	pub from: Option<TypeRef>,
	pub to: TypeRef,
	#[source]
	pub cause: Option<BoxError>,
}

impl TypeConversionError {
	pub fn new(value: Option<&Value>, from: Option<TypeRef>, to: &TypeRef, cause: Option<BoxError>) -> Self {
		Self {
			value: render_value(value),
			from,
			to: to.clone(),
			cause,
		}
	}
}

impl fmt::Display for TypeConversionError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let from = self.from.as_ref().map_or("null", |t| t.name());
		write!(
			f,
			"error during type conversion from type: {from} to the required type: {} with value {}",
			self.to, self.value
		)?;
		if let Some(cause) = &self.cause {
			write!(f, " due to {cause}")?;
		}
		Ok(())
	}
}

/// Failure reported by a converter implementation.
#[derive(Error, Debug)]
pub enum ConverterError {
	/// Already a conversion-specific error; kept as-is when it names the same target type.
	#[error(transparent)]
	Conversion(#[from] TypeConversionError),
	/// A computation the converter waited on failed. Never wrapped by the dispatcher.
	#[error("execution failed: {0}")]
	Execution(#[source] BoxError),
	#[error(transparent)]
	Failed(BoxError),
}

impl ConverterError {
	pub fn msg(message: impl Into<String>) -> Self {
		let message: String = message.into();
		Self::Failed(message.into())
	}

	pub fn failed(cause: impl std::error::Error + Send + Sync + 'static) -> Self {
		Self::Failed(Box::new(cause))
	}

	pub fn execution(cause: impl Into<BoxError>) -> Self {
		Self::Execution(cause.into())
	}
}

/// A loader aborted while populating the registry.
#[derive(Error, Debug, Clone)]
#[error("failed to load type converters from {loader}: {source}")]
pub struct LoaderError {
	pub loader: String,
	pub source: Arc<dyn std::error::Error + Send + Sync + 'static>,
}

impl LoaderError {
	pub fn new(loader: impl Into<String>, source: BoxError) -> Self {
		Self {
			loader: loader.into(),
			source: Arc::from(source),
		}
	}
}

/// Errors surfaced by the conversion API.
#[derive(Error, Debug)]
pub enum ConvertError {
	#[error("no type converter available to convert from type: {from} to the required type: {to} with value {value}")]
	NoConversionAvailable { value: String, from: String, to: TypeRef },
	#[error(transparent)]
	ConversionFailed(TypeConversionError),
	#[error("execution failed while converting to {to}")]
	Execution {
		to: TypeRef,
		#[source]
		source: BoxError,
	},
	#[error(transparent)]
	LoaderFailed(#[from] LoaderError),
}

/// Errors surfaced by registration and lifecycle calls.
#[derive(Error, Debug)]
pub enum RegistryError {
	#[error("type converter to: {to} from: {from} already exists")]
	ConverterAlreadyExists { from: TypeRef, to: TypeRef },
	#[error(transparent)]
	LoaderFailed(#[from] LoaderError),
}

/// Invalid registry configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("invalid registry config: {0}")]
	Parse(#[from] toml::de::Error),
}
