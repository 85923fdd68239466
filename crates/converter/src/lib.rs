//! Runtime type conversion for the transit routing engine.
//!
//! Given a value and a target [`TypeRef`](transit_types::TypeRef), the
//! [`TypeConverterRegistry`] finds a conversion routine, memoizes it, and falls back to a chain
//! of generic converters when no direct mapping exists.
//!
//! ```text
//! convert(to, ctx, value)
//!   null / already an instance   -> noop
//!   fast path                    -> hot conversions, no cache
//!   bulk sets                    -> grouped converters
//!   direct cache                 -> converter | miss marker | vacant -> hierarchy search
//!   fallback chain               -> newest first, promotable ones are cached
//! ```
//!
//! Converters are supplied by [`ConverterLoader`]s at start-up, or registered directly at
//! any time.

mod bulk;
mod chain;
mod config;
mod converter;
mod enums;
mod error;
mod fallback;
mod fast_path;
mod loader;
mod pair;
mod registry;
mod statistics;

pub use bulk::{BulkConverters, CoreBulkConverters, Order};
pub use config::{DuplicatePolicy, LogLevel, RegistryConfig};
pub use converter::{Context, ContextAware, Converted, Converter, FnConverter, RegistryAware, converter_fn};
pub use enums::EnumConverter;
pub use error::{
	BoxError, ConfigError, ConvertError, ConverterError, LoaderError, MAX_VALUE_CHARS, RegistryError,
	TypeConversionError,
};
pub use fallback::{Fallback, ToStringFallback};
pub use fast_path::parse_bool;
pub use loader::{ConverterLoader, ConverterSetDef, InventoryLoader};
pub use pair::TypePair;
pub use registry::{RegistryBuilder, TypeConverterRegistry, WeakRegistry};
pub use statistics::{Statistics, StatisticsSnapshot};
pub use {inventory, transit_types};
