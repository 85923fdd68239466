//! Loader contract.
//!
//! Loaders populate a registry with converters. How a loader discovers its converters is
//! its own business; the registry only calls [`ConverterLoader::load`].
//!
//! Converter sets compiled into the binary can be submitted with [`inventory::submit!`]
//! as [`ConverterSetDef`]s and are picked up by [`InventoryLoader`].

use crate::error::BoxError;
use crate::registry::TypeConverterRegistry;

pub trait ConverterLoader: Send + Sync {
	fn name(&self) -> &str;

	/// Registers converters. Any error aborts start-up as [`crate::LoaderError`].
	fn load(&self, registry: &TypeConverterRegistry) -> Result<(), BoxError>;
}

/// A statically declared converter set.
pub struct ConverterSetDef {
	pub name: &'static str,
	pub load: fn(&TypeConverterRegistry) -> Result<(), BoxError>,
}

inventory::collect!(ConverterSetDef);

impl ConverterSetDef {
	pub const fn new(name: &'static str, load: fn(&TypeConverterRegistry) -> Result<(), BoxError>) -> Self {
		Self { name, load }
	}
}

impl ConverterLoader for ConverterSetDef {
	fn name(&self) -> &str {
		self.name
	}

	fn load(&self, registry: &TypeConverterRegistry) -> Result<(), BoxError> {
		(self.load)(registry)
	}
}

/// Runs every submitted [`ConverterSetDef`], ordered by name.
#[derive(Debug, Default, Clone, Copy)]
pub struct InventoryLoader;

impl ConverterLoader for InventoryLoader {
	fn name(&self) -> &str {
		"inventory"
	}

	fn load(&self, registry: &TypeConverterRegistry) -> Result<(), BoxError> {
		let mut sets: Vec<&ConverterSetDef> = inventory::iter::<ConverterSetDef>.into_iter().collect();
		sets.sort_by_key(|set| set.name);
		for set in sets {
			tracing::debug!(set = set.name, "loading converter set");
			(set.load)(registry).map_err(|e| format!("converter set {}: {e}", set.name))?;
		}
		Ok(())
	}
}
