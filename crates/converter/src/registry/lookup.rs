//! Hierarchy search for a converter.
//!
//! Order, first hit wins:
//!
//! 1. bulk sets,
//! 2. the exact pair (retried with the boxed target when the target is primitive),
//! 3. each interface of the source, recursively,
//! 4. the supertype of the source (never the root), recursively,
//! 5. at the top level only: the earliest registered converter whose pair is compatible,
//! 6. at the top level only: a converter registered from the root type.

use std::sync::Arc;

use transit_types::TypeRef;

use super::TypeConverterRegistry;
use crate::converter::Converter;
use crate::error::LoaderError;

impl TypeConverterRegistry {
	/// Finds the converter that would serve `from -> to`, without touching the cache.
	pub fn lookup(&self, from: &TypeRef, to: &TypeRef) -> Result<Option<Arc<dyn Converter>>, LoaderError> {
		self.ensure_loaded()?;
		Ok(self.search(from, to, false))
	}

	pub(super) fn search(&self, from: &TypeRef, to: &TypeRef, is_super: bool) -> Option<Arc<dyn Converter>> {
		let inner = &self.inner;

		if let Some(converter) = inner.bulk.load().iter().find_map(|set| set.lookup(from, to)) {
			return Some(converter);
		}
		if let Some(converter) = self.direct(from, to) {
			return Some(converter);
		}
		for iface in from.interfaces() {
			if let Some(converter) = self.search(iface, to, true) {
				return Some(converter);
			}
		}
		if let Some(sup) = from.supertype()
			&& !sup.is_root()
			&& let Some(converter) = self.search(sup, to, true)
		{
			return Some(converter);
		}

		if is_super || from.is_root() {
			return None;
		}
		if let Some(converter) = inner.cache.first_assignable(from, inner.types.boxed(to)) {
			return Some(converter);
		}
		self.direct(inner.types.object(), to)
	}

	fn direct(&self, from: &TypeRef, to: &TypeRef) -> Option<Arc<dyn Converter>> {
		let cache = &self.inner.cache;
		cache.get_converter(from, to).or_else(|| {
			to.is_primitive()
				.then(|| cache.get_converter(from, self.inner.types.boxed(to)))
				.flatten()
		})
	}
}
