//! Direct-mapping cache.
//!
//! # Role
//!
//! Holds at most one [`Slot`] per [`TypePair`]: a converter (registered, derived by the
//! hierarchy search, or promoted from the fallback chain) or a miss marker.
//!
//! # Invariants
//!
//! - Guards are never held across a converter call; lookups clone the slot out.
//! - Derived, promoted and miss writes never replace a converter, so racing writers for one
//!   pair are interchangeable.
//! - Purging by converter only touches derived slots; registrations are removed one pair
//!   at a time.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rustc_hash::FxBuildHasher;
use transit_types::TypeRef;

use crate::converter::Converter;
use crate::pair::TypePair;

/// How a converter slot was filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Origin {
	/// Explicit registration.
	Registered,
	/// Found by the hierarchy search or promoted from the fallback chain.
	Derived,
}

#[derive(Debug, Clone)]
pub(crate) enum Slot {
	Converter {
		converter: Arc<dyn Converter>,
		/// Write order, used to break ties in the assignability scan.
		ordinal: u64,
		origin: Origin,
	},
	/// The hierarchy search already proved no converter exists for this pair.
	Miss,
}

impl Slot {
	pub(crate) fn converter(&self) -> Option<&Arc<dyn Converter>> {
		match self {
			Slot::Converter { converter, .. } => Some(converter),
			Slot::Miss => None,
		}
	}
}

pub(crate) struct DirectCache {
	map: DashMap<TypePair, Slot, FxBuildHasher>,
	next_ordinal: AtomicU64,
}

impl DirectCache {
	pub(crate) fn new() -> Self {
		Self {
			map: DashMap::with_hasher(FxBuildHasher),
			next_ordinal: AtomicU64::new(0),
		}
	}

	fn slot_for(&self, converter: Arc<dyn Converter>, origin: Origin) -> Slot {
		Slot::Converter {
			converter,
			ordinal: self.next_ordinal.fetch_add(1, Ordering::Relaxed),
			origin,
		}
	}

	#[inline]
	pub(crate) fn get(&self, pair: &TypePair) -> Option<Slot> {
		self.map.get(pair).map(|slot| slot.value().clone())
	}

	pub(crate) fn get_converter(&self, from: &TypeRef, to: &TypeRef) -> Option<Arc<dyn Converter>> {
		let pair = TypePair::new(from.clone(), to.clone());
		self.map.get(&pair).and_then(|slot| slot.converter().cloned())
	}

	pub(crate) fn entry(&self, pair: TypePair) -> Entry<'_, TypePair, Slot> {
		self.map.entry(pair)
	}

	pub(crate) fn registered_slot(&self, converter: Arc<dyn Converter>) -> Slot {
		self.slot_for(converter, Origin::Registered)
	}

	/// Installs a converter found by search or promotion unless a converter is already there.
	pub(crate) fn insert_derived(&self, pair: TypePair, converter: Arc<dyn Converter>) {
		match self.map.entry(pair) {
			Entry::Vacant(v) => {
				v.insert(self.slot_for(converter, Origin::Derived));
			}
			Entry::Occupied(mut o) => {
				if matches!(o.get(), Slot::Miss) {
					o.insert(self.slot_for(converter, Origin::Derived));
				}
			}
		}
	}

	pub(crate) fn insert_miss(&self, pair: TypePair) {
		self.map.entry(pair).or_insert(Slot::Miss);
	}

	pub(crate) fn remove(&self, pair: &TypePair) -> Option<Slot> {
		self.map.remove(pair).map(|(_, slot)| slot)
	}

	pub(crate) fn purge_misses(&self) {
		self.map.retain(|_, slot| !matches!(slot, Slot::Miss));
	}

	/// Drops the derived entries pointing at `converter`. Registrations of the same
	/// instance for other pairs stay.
	pub(crate) fn purge_derived(&self, converter: &Arc<dyn Converter>) {
		self.map.retain(|_, slot| match slot {
			Slot::Converter {
				converter: c,
				origin: Origin::Derived,
				..
			} => !Arc::ptr_eq(c, converter),
			Slot::Converter { .. } | Slot::Miss => true,
		});
	}

	/// Finds the earliest written converter whose pair is compatible with `from -> to`:
	/// its target is assignable to `to` and its (non-root) source is assignable from `from`.
	pub(crate) fn first_assignable(&self, from: &TypeRef, to: &TypeRef) -> Option<Arc<dyn Converter>> {
		let mut best: Option<(u64, Arc<dyn Converter>)> = None;
		for item in self.map.iter() {
			let Slot::Converter { converter, ordinal, .. } = item.value() else {
				continue;
			};
			let pair = item.key();
			if !to.is_assignable_from(pair.to())
				|| pair.from().is_root()
				|| !pair.from().is_assignable_from(from)
			{
				continue;
			}
			if best.as_ref().is_none_or(|(o, _)| ordinal < o) {
				best = Some((*ordinal, converter.clone()));
			}
		}
		best.map(|(_, c)| c)
	}

	/// Returns every pair holding a converter, in write order.
	pub(crate) fn pairs(&self) -> Vec<TypePair> {
		let mut pairs: Vec<(u64, TypePair)> = self
			.map
			.iter()
			.filter_map(|item| match item.value() {
				Slot::Converter { ordinal, .. } => Some((*ordinal, item.key().clone())),
				Slot::Miss => None,
			})
			.collect();
		pairs.sort_unstable_by_key(|(o, _)| *o);
		pairs.into_iter().map(|(_, p)| p).collect()
	}

	/// Returns the registered `(pair, converter)` entries in write order.
	pub(crate) fn registrations(&self) -> Vec<(TypePair, Arc<dyn Converter>)> {
		let mut entries: Vec<(u64, TypePair, Arc<dyn Converter>)> = self
			.map
			.iter()
			.filter_map(|item| match item.value() {
				Slot::Converter {
					converter,
					ordinal,
					origin: Origin::Registered,
				} => Some((*ordinal, item.key().clone(), converter.clone())),
				Slot::Converter { .. } | Slot::Miss => None,
			})
			.collect();
		entries.sort_unstable_by_key(|(o, ..)| *o);
		entries.into_iter().map(|(_, p, c)| (p, c)).collect()
	}

	/// Installs a registration copied from another cache.
	pub(crate) fn insert_registered(&self, pair: TypePair, converter: Arc<dyn Converter>) {
		let slot = self.registered_slot(converter);
		self.map.insert(pair, slot);
	}

	pub(crate) fn converter_count(&self) -> usize {
		self.map
			.iter()
			.filter(|item| matches!(item.value(), Slot::Converter { .. }))
			.count()
	}

	pub(crate) fn miss_count(&self) -> usize {
		self.map
			.iter()
			.filter(|item| matches!(item.value(), Slot::Miss))
			.count()
	}

	pub(crate) fn clear(&self) {
		self.map.clear();
	}
}
